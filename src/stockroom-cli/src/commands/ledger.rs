//! Ledger command handlers: piles, state transitions, history, stats.

use anyhow::{Context, Result};
use std::path::Path;

use stockroom_db::{InventoryRepository, Ledger, Part, PartFilter};

use super::open_db;
use crate::cli::HistoryCommand;

fn print_pile(pile: &Part) {
    println!(
        "pile {}: type {} count {} status {}",
        pile.id,
        pile.part_type_id,
        pile.count,
        pile.status()
    );
}

/// Handle `parts`.
pub fn parts_list(
    db_path: &Path,
    part_type: Option<i64>,
    assignment: Option<i64>,
    free: bool,
) -> Result<()> {
    let db = open_db(db_path)?;
    let filter = PartFilter {
        part_type_id: part_type,
        assignment_id: assignment,
        free,
        ..Default::default()
    };
    let piles = db.list_parts(&filter)?;

    println!(
        "{:>5}  {:>5} {:>7} {:<10} {:<10} {:>8}",
        "id", "type", "count", "status", "date", "price"
    );
    for pile in &piles {
        println!(
            "{:>5}  {:>5} {:>7} {:<10} {:<10} {:>8}",
            pile.id,
            pile.part_type_id,
            pile.count,
            pile.status().to_string(),
            pile.date.map(|d| d.to_string()).unwrap_or_default(),
            pile.price.map(|p| p.to_string()).unwrap_or_default()
        );
    }
    println!("{} pile(s)", piles.len());
    Ok(())
}

/// Handle `take`.
pub fn take(db_path: &Path, part: i64, count: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let pile = db.take(part, count)?;
    print_pile(&pile);
    Ok(())
}

/// Handle `solder`.
pub fn solder(db_path: &Path, part: i64, count: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let pile = db.solder(part, count)?;
    print_pile(&pile);
    Ok(())
}

/// Handle `desolder`.
pub fn desolder(db_path: &Path, part: i64, count: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let pile = db.desolder(part, count)?;
    print_pile(&pile);
    Ok(())
}

/// Handle `unassign`.
pub fn unassign(db_path: &Path, part: i64, count: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let pile = db.unassign(part, count)?;
    print_pile(&pile);
    Ok(())
}

/// Handle `destroy`.
pub fn destroy(db_path: &Path, part: i64, count: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let pile = db.destroy(part, count)?;
    print_pile(&pile);
    Ok(())
}

/// Handle `history`.
pub fn history(db_path: &Path, command: HistoryCommand) -> Result<()> {
    let db = open_db(db_path)?;

    let head = match command {
        HistoryCommand::Part { id } => db
            .get_part(id)?
            .with_context(|| format!("no part {id}"))?
            .history_id
            .with_context(|| format!("part {id} has no history"))?,
        HistoryCommand::Item { id } => db
            .get_item(id)?
            .with_context(|| format!("no item {id}"))?
            .history_id
            .with_context(|| format!("item {id} has no history"))?,
    };

    for record in db.history_chain(head)? {
        println!(
            "{}  {:<10} {}",
            record.time.format("%Y-%m-%d %H:%M"),
            record.event.to_string(),
            record.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Handle `stats`.
pub fn stats(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let stats = db.stats()?;

    println!("Inventory statistics");
    println!("  Footprints:  {}", stats.footprint_count);
    println!("  Part types:  {}", stats.part_type_count);
    println!("  Sources:     {}", stats.source_count);
    println!("  Piles:       {}", stats.part_count);
    println!("  Projects:    {}", stats.project_count);
    println!("  Items:       {}", stats.item_count);
    println!("  Assignments: {}", stats.assignment_count);
    println!("  Terms:       {}", stats.term_count);
    println!("  History:     {}", stats.history_count);

    if let Some(created) = db.get_meta("created")? {
        println!("  Created:     {}", created);
    }
    Ok(())
}
