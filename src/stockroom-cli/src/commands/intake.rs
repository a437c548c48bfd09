//! Intake command handlers.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use stockroom::{verify_lines, RawPart};
use stockroom_db::{intake_batch, prepare_lines, IntakeResult, SqliteDb};

use super::{open_db, resolve_source};
use crate::cli::IntakeCommand;

/// Handle `intake` subcommands.
pub fn handle(db_path: &Path, command: IntakeCommand) -> Result<()> {
    match command {
        IntakeCommand::Add {
            name,
            footprint,
            pins,
            summary,
            description,
            manufacturer,
            datasheet,
            sku,
            count,
            date,
            price,
            vat,
            source,
            dry_run,
        } => {
            let db = open_db(db_path)?;
            let source_id = resolve_source(&db, source.as_deref())?;
            let date = match date {
                Some(s) => Some(
                    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                        .with_context(|| format!("invalid date: {s}"))?,
                ),
                None => Some(chrono::Utc::now().date_naive()),
            };

            let line = RawPart {
                part_type: None,
                search_name: name.clone(),
                name,
                summary: summary.unwrap_or_default(),
                description: description.unwrap_or_default(),
                footprint: footprint.unwrap_or_default(),
                pins: pins.unwrap_or(0),
                manufacturer: manufacturer.unwrap_or_default(),
                sku: sku.unwrap_or_default(),
                count,
                date,
                unit_price: price,
                vat,
                source: source_id,
                datasheet: datasheet.unwrap_or_default(),
            };

            run(&db, vec![line], dry_run)
        }

        IntakeCommand::File {
            path,
            source,
            dry_run,
        } => {
            let db = open_db(db_path)?;
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mut lines: Vec<RawPart> =
                serde_json::from_str(&text).context("intake file must be a JSON array of lines")?;

            if let Some(short) = source.as_deref() {
                let id = resolve_source(&db, Some(short))?;
                for line in &mut lines {
                    if line.source.is_none() {
                        line.source = id;
                    }
                }
            }

            run(&db, lines, dry_run)
        }
    }
}

fn run(db: &SqliteDb, mut lines: Vec<RawPart>, dry_run: bool) -> Result<()> {
    if dry_run {
        let matches = prepare_lines(db, &mut lines)?;
        for (index, (line, candidates)) in lines.iter().zip(&matches).enumerate() {
            let selected = line
                .part_type
                .map(|id| id.to_string())
                .unwrap_or_else(|| "new".to_string());
            println!(
                "[{}] {:<30} candidates: {:?}  selected: {}",
                index + 1,
                line.display_name(),
                candidates,
                selected
            );
        }
        let errors = verify_lines(&lines);
        for error in &errors {
            println!("line {}: {}", error.line + 1, error.message);
        }
        if errors.is_empty() {
            println!("All lines valid.");
        }
        return Ok(());
    }

    match intake_batch(db, &mut lines)? {
        IntakeResult::Received(report) => {
            println!(
                "Received {} pile(s); created {} part type(s), {} vendor link(s)",
                report.piles_created.len(),
                report.part_types_created.len(),
                report.part_sources_created
            );
            Ok(())
        }
        IntakeResult::Rejected(errors) => {
            for error in &errors {
                eprintln!("line {}: {}", error.line + 1, error.message);
            }
            bail!("intake rejected, fix the lines above and retry")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_db::{InventoryRepository, NewSource};

    #[test]
    fn test_add_line_round_trips_through_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("inventory.db");

        {
            let db = open_db(&db_path).unwrap();
            db.add_source(&NewSource {
                name: "Mouser".into(),
                shortname: "mouser".into(),
                ..Default::default()
            })
            .unwrap();
        }

        handle(
            &db_path,
            IntakeCommand::Add {
                name: "10k resistor".into(),
                footprint: Some("0805".into()),
                pins: Some(2),
                summary: None,
                description: None,
                manufacturer: Some("Yageo".into()),
                datasheet: None,
                sku: Some("YAG-10K".into()),
                count: 100,
                date: None,
                price: Some(0.04),
                vat: None,
                source: Some("mouser".into()),
                dry_run: false,
            },
        )
        .unwrap();

        let db = open_db(&db_path).unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.part_type_count, 1);
        assert_eq!(stats.part_count, 1);
    }

    #[test]
    fn test_dry_run_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("inventory.db");

        handle(
            &db_path,
            IntakeCommand::Add {
                name: "10k resistor".into(),
                footprint: Some("0805".into()),
                pins: Some(2),
                summary: None,
                description: None,
                manufacturer: None,
                datasheet: None,
                sku: None,
                count: 100,
                date: None,
                price: None,
                vat: None,
                source: None,
                dry_run: true,
            },
        )
        .unwrap();

        let db = open_db(&db_path).unwrap();
        assert_eq!(db.stats().unwrap().part_type_count, 0);
    }

    #[test]
    fn test_unknown_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("inventory.db");

        let result = handle(
            &db_path,
            IntakeCommand::Add {
                name: "10k resistor".into(),
                footprint: Some("0805".into()),
                pins: Some(2),
                summary: None,
                description: None,
                manufacturer: None,
                datasheet: None,
                sku: None,
                count: 100,
                date: None,
                price: None,
                vat: None,
                source: Some("nonexistent".into()),
                dry_run: false,
            },
        );
        assert!(result.is_err());
    }
}
