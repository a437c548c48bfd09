//! Intake workflows: receiving stock and requesting parts for a build.
//!
//! Both run match → verify → save. The save is one transaction per batch:
//! a failure partway through leaves no part type without its intake record
//! and no half-finished split.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension};

use crate::ledger::assign_on;
use crate::repository::{Matcher, RepoError, RepoResult};
use crate::search_index::register_part_type_on;
use crate::sqlite::{insert_history_on, insert_part_on, SqliteDb};
use crate::types::{MatchQuery, NewHistory, NewPart};
use stockroom::{verify_lines, HistoryEvent, LineError, RawPart};

/// What a stock intake created.
#[derive(Debug, Clone, Default)]
pub struct ReceiveReport {
    pub part_types_created: Vec<i64>,
    pub piles_created: Vec<i64>,
    pub part_sources_created: usize,
}

/// Outcome of a stock intake: saved, or returned for correction.
#[derive(Debug)]
pub enum IntakeResult {
    Received(ReceiveReport),
    Rejected(Vec<LineError>),
}

/// What an assignment intake created.
#[derive(Debug, Clone, Default)]
pub struct RequestReport {
    pub part_types_created: Vec<i64>,
    pub assignments_created: Vec<i64>,
    pub auto_assigned: usize,
}

/// Outcome of an assignment intake.
#[derive(Debug)]
pub enum RequestResult {
    Requested(RequestReport),
    Rejected(Vec<LineError>),
}

/// Run the matcher over every line and maintain its binding: a previously
/// selected part type that is no longer among the candidates is cleared,
/// and a sole candidate is auto-selected. Returns the candidate sets for
/// display.
pub fn prepare_lines(db: &SqliteDb, lines: &mut [RawPart]) -> RepoResult<Vec<BTreeSet<i64>>> {
    let mut all_matches = Vec::with_capacity(lines.len());

    for line in lines.iter_mut() {
        let matches = db.fill_matches(&MatchQuery::from_raw(line))?;

        if let Some(selected) = line.part_type {
            if !matches.contains(&selected) {
                line.part_type = None;
            }
        }
        if line.part_type.is_none() && matches.len() == 1 {
            line.part_type = matches.iter().next().copied();
        }

        all_matches.push(matches);
    }

    Ok(all_matches)
}

fn get_or_create_footprint_on(conn: &Connection, name: &str, pins: i64) -> RepoResult<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM footprints WHERE name = ?1 COLLATE NOCASE",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO footprints (name, pins) VALUES (?1, ?2)",
        params![name, pins],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Create the part type (and footprint, when new) for an unmatched line and
/// register its search terms.
fn create_part_type_on(conn: &Connection, line: &RawPart) -> RepoResult<i64> {
    let footprint_id = get_or_create_footprint_on(conn, &line.footprint, line.pins)?;

    conn.execute(
        "INSERT INTO types (name, summary, description, manufacturer, footprint_id, datasheet)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            line.display_name(),
            line.summary,
            line.description,
            line.manufacturer,
            footprint_id,
            line.datasheet
        ],
    )?;
    let part_type_id = conn.last_insert_rowid();

    register_part_type_on(conn, part_type_id)?;

    tracing::debug!(part_type = part_type_id, name = line.display_name(), "created part type");

    Ok(part_type_id)
}

/// Record the vendor link when an SKU was entered and the triple is new.
fn ensure_part_source_on(
    conn: &Connection,
    part_type_id: i64,
    source_id: i64,
    sku: &str,
) -> RepoResult<bool> {
    if sku.is_empty() {
        return Ok(false);
    }
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM types_sources
             WHERE part_type_id = ?1 AND source_id = ?2 AND sku = ?3",
            params![part_type_id, source_id, sku],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(false);
    }
    conn.execute(
        "INSERT INTO types_sources (part_type_id, source_id, sku) VALUES (?1, ?2, ?3)",
        params![part_type_id, source_id, sku],
    )?;
    Ok(true)
}

/// Save verified intake lines: create missing part types, add the piles
/// with a fresh INCOMING history head each, and record new vendor links.
/// One transaction; any failure rolls the whole batch back.
pub fn receive_parts(db: &SqliteDb, lines: &[RawPart]) -> RepoResult<ReceiveReport> {
    let tx = db.conn.unchecked_transaction()?;
    let mut report = ReceiveReport::default();

    for line in lines {
        let part_type_id = match line.part_type {
            Some(id) => id,
            None => {
                let id = create_part_type_on(&tx, line)?;
                report.part_types_created.push(id);
                id
            }
        };

        if line.source.is_some() && line.count > 0 {
            let head = insert_history_on(&tx, None, &NewHistory::event(HistoryEvent::Incoming))?;
            let pile = insert_part_on(
                &tx,
                &NewPart {
                    part_type_id,
                    source_id: line.source,
                    count: line.count,
                    date: line.date,
                    price: line.unit_price,
                    vat: line.vat,
                },
                Some(head.id),
            )?;
            report.piles_created.push(pile.id);
        }

        if let Some(source_id) = line.source {
            if ensure_part_source_on(&tx, part_type_id, source_id, &line.sku)? {
                report.part_sources_created += 1;
            }
        }
    }

    tx.commit()?;
    Ok(report)
}

/// Stock intake: match, verify, and save a batch of lines.
pub fn intake_batch(db: &SqliteDb, lines: &mut [RawPart]) -> RepoResult<IntakeResult> {
    prepare_lines(db, lines)?;

    let errors = verify_lines(lines);
    if !errors.is_empty() {
        return Ok(IntakeResult::Rejected(errors));
    }

    Ok(IntakeResult::Received(receive_parts(db, lines)?))
}

/// Assignment intake: request parts for a built item. Creates missing part
/// types like stock intake, then an assignment per line; when exactly one
/// free pile of the type exists it is assigned right away.
pub fn request_parts(
    db: &SqliteDb,
    item_id: i64,
    lines: &mut [RawPart],
) -> RepoResult<RequestResult> {
    prepare_lines(db, lines)?;

    let errors = verify_lines(lines);
    if !errors.is_empty() {
        return Ok(RequestResult::Rejected(errors));
    }

    let tx = db.conn.unchecked_transaction()?;

    let item_exists: Option<i64> = tx
        .query_row(
            "SELECT id FROM items WHERE id = ?1",
            params![item_id],
            |row| row.get(0),
        )
        .optional()?;
    if item_exists.is_none() {
        return Err(RepoError::NotFound(format!("item {item_id}")));
    }

    let mut report = RequestReport::default();

    for line in lines.iter() {
        let part_type_id = match line.part_type {
            Some(id) => id,
            None => {
                let id = create_part_type_on(&tx, line)?;
                report.part_types_created.push(id);
                id
            }
        };

        if line.count <= 0 {
            continue;
        }

        tx.execute(
            "INSERT INTO assignments (part_type_id, item_id, count) VALUES (?1, ?2, ?3)",
            params![part_type_id, item_id, line.count],
        )?;
        let assignment_id = tx.last_insert_rowid();
        report.assignments_created.push(assignment_id);

        let free_piles = {
            let mut stmt = tx.prepare(
                "SELECT id FROM parts
                 WHERE part_type_id = ?1 AND assignment_id IS NULL
                   AND soldered = 0 AND usable = 1",
            )?;
            let ids = stmt
                .query_map(params![part_type_id], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        };

        // a single free pile is unambiguous; more are left to the operator
        if let [pile_id] = free_piles[..] {
            if assign_on(&tx, assignment_id, pile_id, None)?.is_some() {
                report.auto_assigned += 1;
            }
        }
    }

    tx.commit()?;
    Ok(RequestResult::Requested(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InventoryRepository, Ledger, SearchIndex};
    use crate::sqlite::tests::{setup_db, setup_part_type};
    use crate::types::{NewPart, NewSource, PartFilter};
    use stockroom::HistoryEvent;

    fn intake_line(source: Option<i64>) -> RawPart {
        RawPart {
            search_name: "10k resistor".into(),
            name: "10k resistor".into(),
            footprint: "0805".into(),
            pins: 2,
            manufacturer: "Yageo".into(),
            sku: "YAG-10K".into(),
            count: 100,
            source,
            ..Default::default()
        }
    }

    fn add_source(db: &SqliteDb) -> i64 {
        db.add_source(&NewSource {
            name: "Mouser".into(),
            shortname: "mouser".into(),
            ..Default::default()
        })
        .unwrap()
        .id
    }

    #[test]
    fn test_intake_creates_full_record_set() {
        let db = setup_db();
        let source = add_source(&db);

        let mut lines = vec![intake_line(Some(source))];
        let result = intake_batch(&db, &mut lines).unwrap();

        let report = match result {
            IntakeResult::Received(report) => report,
            IntakeResult::Rejected(errors) => panic!("rejected: {errors:?}"),
        };
        assert_eq!(report.part_types_created.len(), 1);
        assert_eq!(report.piles_created.len(), 1);
        assert_eq!(report.part_sources_created, 1);

        let stats = db.stats().unwrap();
        assert_eq!(stats.footprint_count, 1);
        assert_eq!(stats.part_type_count, 1);
        assert_eq!(stats.part_count, 1);

        // the pile arrived with an INCOMING history head
        let pile = db.get_part(report.piles_created[0]).unwrap().unwrap();
        assert_eq!(pile.count, 100);
        let chain = db.history_chain(pile.history_id.unwrap()).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].event, HistoryEvent::Incoming);

        // vendor link carries the sku
        let links = db.find_part_sources(report.part_types_created[0]).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].sku, "YAG-10K");

        // the new type is searchable right away
        assert!(db
            .search("resistor yageo")
            .unwrap()
            .contains(&report.part_types_created[0]));
    }

    #[test]
    fn test_intake_twice_does_not_duplicate_catalog() {
        let db = setup_db();
        let source = add_source(&db);

        let mut first = vec![intake_line(Some(source))];
        intake_batch(&db, &mut first).unwrap();

        let mut second = vec![intake_line(Some(source))];
        let result = intake_batch(&db, &mut second).unwrap();
        let report = match result {
            IntakeResult::Received(report) => report,
            IntakeResult::Rejected(errors) => panic!("rejected: {errors:?}"),
        };

        // matched the existing type instead of creating another
        assert!(report.part_types_created.is_empty());
        assert_eq!(report.part_sources_created, 0);
        assert_eq!(report.piles_created.len(), 1);

        let stats = db.stats().unwrap();
        assert_eq!(stats.footprint_count, 1);
        assert_eq!(stats.part_type_count, 1);
        assert_eq!(stats.part_count, 2);
    }

    #[test]
    fn test_intake_rejects_invalid_lines_untouched() {
        let db = setup_db();
        let mut lines = vec![RawPart {
            search_name: "mystery part".into(),
            count: 5,
            ..Default::default()
        }];

        let result = intake_batch(&db, &mut lines).unwrap();
        let errors = match result {
            IntakeResult::Rejected(errors) => errors,
            IntakeResult::Received(_) => panic!("should have been rejected"),
        };
        assert!(errors.iter().any(|e| e.line == 0));

        let stats = db.stats().unwrap();
        assert_eq!(stats.part_type_count, 0);
        assert_eq!(stats.part_count, 0);
    }

    #[test]
    fn test_intake_without_source_creates_type_only() {
        let db = setup_db();
        let mut lines = vec![intake_line(None)];
        let result = intake_batch(&db, &mut lines).unwrap();

        let report = match result {
            IntakeResult::Received(report) => report,
            IntakeResult::Rejected(errors) => panic!("rejected: {errors:?}"),
        };
        assert_eq!(report.part_types_created.len(), 1);
        assert!(report.piles_created.is_empty());
        assert_eq!(report.part_sources_created, 0);
    }

    #[test]
    fn test_receive_rolls_back_whole_batch_on_failure() {
        let db = setup_db();

        let good = intake_line(None);
        let bad = RawPart {
            // nonexistent source trips the foreign key after the first
            // line's part type was already inserted
            source: Some(9999),
            ..intake_line(None)
        };

        let err = receive_parts(&db, &[good, bad]);
        assert!(err.is_err());

        let stats = db.stats().unwrap();
        assert_eq!(stats.part_type_count, 0);
        assert_eq!(stats.footprint_count, 0);
        assert_eq!(stats.part_count, 0);
    }

    #[test]
    fn test_prepare_clears_stale_selection_and_auto_picks_single() {
        let db = setup_db();
        let source = add_source(&db);
        let mut seed = vec![intake_line(Some(source))];
        intake_batch(&db, &mut seed).unwrap();
        let existing = seed[0].part_type.unwrap_or_else(|| {
            db.list_part_types(&Default::default()).unwrap()[0].id
        });

        let mut line = intake_line(Some(source));
        line.part_type = Some(existing + 100); // stale selection
        let mut lines = vec![line];
        let matches = prepare_lines(&db, &mut lines).unwrap();

        assert_eq!(matches[0].len(), 1);
        assert_eq!(lines[0].part_type, Some(existing));
    }

    #[test]
    fn test_request_creates_assignment_and_auto_assigns_single_pile() {
        let db = setup_db();
        let source = add_source(&db);
        let mut seed = vec![intake_line(Some(source))];
        intake_batch(&db, &mut seed).unwrap();

        let project = db.add_project("amp", "", "").unwrap();
        let item = db.add_item(project.id, "A-001", false, None).unwrap();

        let mut lines = vec![RawPart {
            count: 8,
            ..intake_line(None)
        }];
        let result = request_parts(&db, item.id, &mut lines).unwrap();
        let report = match result {
            RequestResult::Requested(report) => report,
            RequestResult::Rejected(errors) => panic!("rejected: {errors:?}"),
        };

        assert!(report.part_types_created.is_empty());
        assert_eq!(report.assignments_created.len(), 1);
        assert_eq!(report.auto_assigned, 1);

        let assignment_id = report.assignments_created[0];
        assert_eq!(db.assignment_count_assigned(assignment_id).unwrap(), 8);
    }

    #[test]
    fn test_request_leaves_multiple_piles_to_operator() {
        let db = setup_db();
        let pt = setup_part_type(&db, "10k resistor", "0805");
        db.register_part_type(pt.id).unwrap();
        for _ in 0..2 {
            db.add_part(&NewPart {
                part_type_id: pt.id,
                count: 50,
                ..Default::default()
            })
            .unwrap();
        }

        let project = db.add_project("amp", "", "").unwrap();
        let item = db.add_item(project.id, "A-001", false, None).unwrap();

        let mut lines = vec![RawPart {
            search_name: "10k resistor".into(),
            count: 8,
            ..Default::default()
        }];
        let result = request_parts(&db, item.id, &mut lines).unwrap();
        let report = match result {
            RequestResult::Requested(report) => report,
            RequestResult::Rejected(errors) => panic!("rejected: {errors:?}"),
        };

        assert_eq!(report.assignments_created.len(), 1);
        assert_eq!(report.auto_assigned, 0);
        assert_eq!(
            db.assignment_count_assigned(report.assignments_created[0])
                .unwrap(),
            0
        );

        // both piles remain free
        let free = db
            .list_parts(&PartFilter {
                part_type_id: Some(pt.id),
                free: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(free.len(), 2);
    }
}
