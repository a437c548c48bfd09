//! Catalog command handlers: init, types, sources, footprints, locations.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use stockroom_db::{
    InventoryRepository, Ledger, NewFootprint, NewSource, PartTypeFilter,
};

use super::open_db;
use crate::cli::{FootprintCommand, LocationCommand, SourceCommand, TypesCommand};

/// Handle `init`.
pub fn init(db_path: &Path) -> Result<()> {
    open_db(db_path)?;
    println!("Your inventory is ready at {}", db_path.display());
    Ok(())
}

/// Handle `types` subcommands.
pub fn handle_types(db_path: &Path, command: TypesCommand) -> Result<()> {
    let db = open_db(db_path)?;
    match command {
        TypesCommand::List {
            name,
            manufacturer,
            footprint,
            format,
        } => {
            let filter = PartTypeFilter {
                name,
                manufacturer,
                footprint,
                ..Default::default()
            };
            let ids: BTreeSet<i64> = db
                .list_part_types(&filter)?
                .into_iter()
                .map(|pt| pt.id)
                .collect();
            super::search::print_part_types(&db, &ids, format)
        }

        TypesCommand::Show { id } => {
            let part_type = db
                .get_part_type(id)?
                .with_context(|| format!("no part type {id}"))?;
            let footprint = db.get_footprint(part_type.footprint_id)?;

            println!("Name:          {}", part_type.name);
            println!("Summary:       {}", part_type.summary);
            println!("Manufacturer:  {}", part_type.manufacturer);
            if let Some(fp) = &footprint {
                println!("Footprint:     {} ({} pins)", fp.name, fp.pins);
            }
            println!(
                "Datasheet:     {}",
                part_type.datasheet.as_deref().unwrap_or("-")
            );
            println!("In stock:      {}", db.part_type_count(id)?);
            println!(
                "With assigned: {}",
                db.part_type_count_with_assigned(id)?
            );
            if !part_type.description.is_empty() {
                println!("Description:\n{}", part_type.description);
            }

            let links = db.find_part_sources(id)?;
            if !links.is_empty() {
                println!("Sources:");
                for link in links {
                    let vendor = db
                        .get_source(link.source_id)?
                        .map(|s| s.shortname)
                        .unwrap_or_default();
                    let price = db
                        .best_price(link.id, 1)?
                        .map(|p| format!("{} {}", p.price, p.currency.unwrap_or_default()))
                        .unwrap_or_else(|| "-".to_string());
                    println!("  {} / {}  {}", vendor, link.sku, price);
                }
            }
            Ok(())
        }
    }
}

/// Handle `source` subcommands.
pub fn handle_source(db_path: &Path, command: SourceCommand) -> Result<()> {
    let db = open_db(db_path)?;
    match command {
        SourceCommand::Add {
            name,
            shortname,
            vat,
            home,
            url,
            customs,
        } => {
            let source = db.add_source(&NewSource {
                name,
                shortname,
                vat,
                home,
                url,
                customs,
                ..Default::default()
            })?;
            println!("Added source {} ({})", source.shortname, source.id);
        }
        SourceCommand::List => {
            for source in db.list_sources()? {
                println!(
                    "{:>5}  {:<12} {:<30} {}",
                    source.id,
                    source.shortname,
                    source.name,
                    source.home.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

/// Handle `footprint` subcommands.
pub fn handle_footprint(db_path: &Path, command: FootprintCommand) -> Result<()> {
    let db = open_db(db_path)?;
    match command {
        FootprintCommand::Add {
            name,
            pins,
            holes,
            kicad,
        } => {
            let footprint = db.add_footprint(&NewFootprint {
                name,
                pins,
                holes,
                kicad,
                ..Default::default()
            })?;
            println!("Added footprint {} ({})", footprint.name, footprint.id);
        }
        FootprintCommand::List => {
            for footprint in db.list_footprints()? {
                println!(
                    "{:>5}  {:<15} pins: {:<4} holes: {}",
                    footprint.id,
                    footprint.name,
                    footprint.pins,
                    footprint
                        .holes
                        .map(|h| h.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
    }
    Ok(())
}

/// Handle `location` subcommands.
pub fn handle_location(db_path: &Path, command: LocationCommand) -> Result<()> {
    let db = open_db(db_path)?;
    match command {
        LocationCommand::Add { name, summary } => {
            let location = db.add_location(&name, summary.as_deref())?;
            println!("Added location {} ({})", location.name, location.id);
        }
        LocationCommand::List => {
            for location in db.list_locations()? {
                println!(
                    "{:>5}  {:<20} {}",
                    location.id,
                    location.name,
                    location.summary.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}
