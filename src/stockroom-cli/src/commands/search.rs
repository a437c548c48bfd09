//! Search, matcher, and term curation handlers.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use stockroom_db::{
    InventoryRepository, Ledger, MatchQuery, Matcher, PartType, SearchIndex, SqliteDb,
};

use super::{open_db, resolve_source};
use crate::cli::{OutputFormat, TermCommand};

/// Handle `search`.
pub fn search(db_path: &Path, query: &str, format: OutputFormat) -> Result<()> {
    let db = open_db(db_path)?;
    let ids = db.search(query)?;
    print_part_types(&db, &ids, format)
}

/// Explicit matcher input from the command line.
pub struct MatchArgs {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub manufacturer: Option<String>,
    pub footprint: Option<String>,
    pub source: Option<String>,
    pub item: Option<i64>,
    pub project: Option<i64>,
}

/// Handle `match`.
pub fn find_matches(db_path: &Path, args: MatchArgs) -> Result<()> {
    let db = open_db(db_path)?;
    let source = resolve_source(&db, args.source.as_deref())?;

    let query = MatchQuery {
        search_name: args.name,
        sku: args.sku,
        manufacturer: args.manufacturer,
        footprint: args.footprint,
        source,
        item: args.item,
        project: args.project,
        ..Default::default()
    };

    let matches = db.fill_matches(&query)?;
    if matches.is_empty() {
        println!("No matching part types.");
        return Ok(());
    }
    print_part_types(&db, &matches, OutputFormat::Table)
}

/// Handle `term` subcommands.
pub fn handle_term(db_path: &Path, command: TermCommand) -> Result<()> {
    let db = open_db(db_path)?;
    match command {
        TermCommand::Alias { term, canonical } => {
            db.set_term_alias(&term, &canonical)?;
            println!("{} -> {}", term, canonical);
        }
        TermCommand::Reindex => {
            let count = db.reindex_all()?;
            println!("Reindexed {} part type(s)", count);
        }
    }
    Ok(())
}

/// Print part types with live stock counts.
pub(crate) fn print_part_types(
    db: &SqliteDb,
    ids: &BTreeSet<i64>,
    format: OutputFormat,
) -> Result<()> {
    let mut rows: Vec<(PartType, String, i64)> = Vec::new();
    for id in ids {
        let Some(part_type) = db.get_part_type(*id)? else {
            continue;
        };
        let footprint = db
            .get_footprint(part_type.footprint_id)?
            .map(|f| f.name)
            .unwrap_or_default();
        let count = db.part_type_count(part_type.id)?;
        rows.push((part_type, footprint, count));
    }

    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = rows
                .iter()
                .map(|(pt, footprint, count)| {
                    serde_json::json!({
                        "id": pt.id,
                        "name": pt.name,
                        "manufacturer": pt.manufacturer,
                        "footprint": footprint,
                        "count": count,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => {
            println!(
                "{:>5}  {:<30} {:<12} {:<15} {:>7}",
                "id", "name", "footprint", "manufacturer", "count"
            );
            for (pt, footprint, count) in &rows {
                println!(
                    "{:>5}  {:<30} {:<12} {:<15} {:>7}",
                    pt.id, pt.name, footprint, pt.manufacturer, count
                );
            }
            println!("{} part type(s)", rows.len());
        }
    }

    Ok(())
}
