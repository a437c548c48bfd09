//! Project, item, and assignment command handlers.

use anyhow::{Context, Result};
use std::path::Path;

use stockroom_db::{InventoryRepository, Ledger, PartFilter};

use super::open_db;
use crate::cli::{ItemCommand, ProjectCommand};

/// Handle `project` subcommands.
pub fn handle_project(db_path: &Path, command: ProjectCommand) -> Result<()> {
    let db = open_db(db_path)?;
    match command {
        ProjectCommand::Add {
            name,
            summary,
            description,
        } => {
            let project = db.add_project(&name, &summary, &description)?;
            println!("Added project {} ({})", project.name, project.id);
        }
        ProjectCommand::List => {
            for project in db.list_projects()? {
                let items = db.list_items(project.id)?.len();
                println!(
                    "{:>5}  {:<20} {:<30} items: {}",
                    project.id, project.name, project.summary, items
                );
            }
        }
    }
    Ok(())
}

/// Handle `item` subcommands.
pub fn handle_item(db_path: &Path, command: ItemCommand) -> Result<()> {
    let db = open_db(db_path)?;
    match command {
        ItemCommand::Add {
            project,
            serial,
            kit,
            description,
        } => {
            db.get_project(project)?
                .with_context(|| format!("no project {project}"))?;
            let item = db.add_item(project, &serial, kit, description.as_deref())?;
            println!("Added item {} ({})", item.serial, item.id);
        }
        ItemCommand::List { project } => {
            for item in db.list_items(project)? {
                println!(
                    "{:>5}  {:<15} kit: {:<5} {}",
                    item.id,
                    item.serial,
                    item.kit,
                    item.description.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

/// Handle `request`: earmark parts of a type for an item. A sole free pile
/// of the type is linked right away.
pub fn request(db_path: &Path, item: i64, part_type: i64, count: i64) -> Result<()> {
    let db = open_db(db_path)?;
    db.get_item(item)?
        .with_context(|| format!("no item {item}"))?;
    db.get_part_type(part_type)?
        .with_context(|| format!("no part type {part_type}"))?;

    let assignment = db.add_assignment(item, part_type, count)?;
    println!("Requested {} of type {} (assignment {})", count, part_type, assignment.id);

    let free = db.list_parts(&PartFilter {
        part_type_id: Some(part_type),
        free: true,
        ..Default::default()
    })?;
    if let [pile] = free.as_slice() {
        if let Some(taken) = db.assign(assignment.id, pile.id, None)? {
            println!("Assigned {} from pile {}", taken.count, pile.id);
        }
    } else if free.len() > 1 {
        println!(
            "{} free piles available, use `assign` to pick one",
            free.len()
        );
    }
    Ok(())
}

/// Handle `assign`.
pub fn assign(db_path: &Path, assignment: i64, part: i64, max: Option<i64>) -> Result<()> {
    let db = open_db(db_path)?;
    match db.assign(assignment, part, max)? {
        Some(pile) => println!(
            "Assigned {} part(s) from pile {} (new pile {})",
            pile.count, part, pile.id
        ),
        None => println!("Nothing to assign, the request is already satisfied"),
    }
    Ok(())
}

/// Handle `assignments`: requested vs assigned vs soldered per line.
pub fn assignments(db_path: &Path, item: i64) -> Result<()> {
    let db = open_db(db_path)?;
    db.get_item(item)?
        .with_context(|| format!("no item {item}"))?;

    println!(
        "{:>5}  {:<30} {:>5} {:>5} {:>5}",
        "id", "type", "req", "cnt", "sld"
    );
    for assignment in db.list_assignments(item)? {
        let name = db
            .get_part_type(assignment.part_type_id)?
            .map(|pt| pt.name)
            .unwrap_or_default();
        println!(
            "{:>5}  {:<30} {:>5} {:>5} {:>5}",
            assignment.id,
            name,
            assignment.count,
            db.assignment_count_assigned(assignment.id)?,
            db.assignment_count_soldered(assignment.id)?
        );
    }
    Ok(())
}
