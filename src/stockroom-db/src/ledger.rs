//! Pile ledger: splits, assignments, state transitions, history chains,
//! and the derived aggregates.
//!
//! A pile transition that applies to fewer than the full count always
//! splits first, so a single pile never carries mixed state. Helpers take
//! `&Connection` and compose inside one caller transaction; the trait
//! methods own the transaction boundary.

use std::collections::HashSet;

use rusqlite::{params, Connection};

use crate::repository::{Ledger, RepoError, RepoResult};
use crate::sqlite::{
    get_assignment_on, get_history_on, get_part_on, insert_history_on, SqliteDb,
};
use crate::types::{History, NewHistory, Part};
use stockroom::HistoryEvent;

/// Split `count` parts off a pile. Taking the whole pile returns it
/// unchanged; otherwise the original shrinks in place and a copy with
/// every other field identical is inserted.
pub(crate) fn take_on(conn: &Connection, part_id: i64, count: i64) -> RepoResult<Part> {
    let part = get_part_on(conn, part_id)?
        .ok_or_else(|| RepoError::NotFound(format!("part {part_id}")))?;

    if count <= 0 || count > part.count {
        return Err(RepoError::InvalidCount {
            requested: count,
            available: part.count,
        });
    }

    if count == part.count {
        return Ok(part);
    }

    conn.execute(
        "UPDATE parts SET count = count - ?2 WHERE id = ?1",
        params![part.id, count],
    )?;
    conn.execute(
        "INSERT INTO parts (part_type_id, source_id, count, date, price, vat,
                            assignment_id, history_id, soldered, usable)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            part.part_type_id,
            part.source_id,
            count,
            part.date,
            part.price,
            part.vat,
            part.assignment_id,
            part.history_id,
            part.soldered,
            part.usable
        ],
    )?;

    tracing::debug!(part = part.id, taken = count, "split pile");

    Ok(Part {
        id: conn.last_insert_rowid(),
        count,
        ..part
    })
}

/// Clamp-and-take for an assignment; `None` when nothing can be assigned.
pub(crate) fn assign_on(
    conn: &Connection,
    assignment_id: i64,
    part_id: i64,
    maximum: Option<i64>,
) -> RepoResult<Option<Part>> {
    let assignment = get_assignment_on(conn, assignment_id)?
        .ok_or_else(|| RepoError::NotFound(format!("assignment {assignment_id}")))?;
    let part = get_part_on(conn, part_id)?
        .ok_or_else(|| RepoError::NotFound(format!("part {part_id}")))?;

    if assignment.part_type_id != part.part_type_id {
        return Err(RepoError::TypeMismatch {
            part_type: part.part_type_id,
            expected: assignment.part_type_id,
        });
    }

    let assigned = assignment_count_assigned_on(conn, assignment_id)?;
    let maximum = maximum.unwrap_or(part.count);
    let count = maximum.min(part.count).min(assignment.count - assigned);

    if count <= 0 {
        return Ok(None);
    }

    let pile = take_on(conn, part_id, count)?;
    conn.execute(
        "UPDATE parts SET assignment_id = ?2 WHERE id = ?1",
        params![pile.id, assignment_id],
    )?;

    tracing::debug!(
        assignment = assignment_id,
        part = pile.id,
        count,
        "assigned pile"
    );

    Ok(Some(Part {
        assignment_id: Some(assignment_id),
        ..pile
    }))
}

pub(crate) fn assignment_count_assigned_on(
    conn: &Connection,
    assignment_id: i64,
) -> RepoResult<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(count), 0) FROM parts WHERE assignment_id = ?1",
        params![assignment_id],
        |row| row.get(0),
    )?)
}

impl SqliteDb {
    /// Split, then flip the soldered flag on the taken piece.
    fn set_soldered_split(&self, part_id: i64, count: i64, soldered: bool) -> RepoResult<Part> {
        let tx = self.conn.unchecked_transaction()?;
        let pile = take_on(&tx, part_id, count)?;
        tx.execute(
            "UPDATE parts SET soldered = ?2 WHERE id = ?1",
            params![pile.id, soldered],
        )?;
        tx.commit()?;
        Ok(Part { soldered, ..pile })
    }
}

impl Ledger for SqliteDb {
    fn take(&self, part_id: i64, count: i64) -> RepoResult<Part> {
        let tx = self.conn.unchecked_transaction()?;
        let part = take_on(&tx, part_id, count)?;
        tx.commit()?;
        Ok(part)
    }

    fn assign(
        &self,
        assignment_id: i64,
        part_id: i64,
        maximum: Option<i64>,
    ) -> RepoResult<Option<Part>> {
        let tx = self.conn.unchecked_transaction()?;
        let assigned = assign_on(&tx, assignment_id, part_id, maximum)?;
        tx.commit()?;
        Ok(assigned)
    }

    fn unassign(&self, part_id: i64, count: i64) -> RepoResult<Part> {
        let tx = self.conn.unchecked_transaction()?;
        let pile = take_on(&tx, part_id, count)?;
        tx.execute(
            "UPDATE parts SET assignment_id = NULL WHERE id = ?1",
            params![pile.id],
        )?;
        tx.commit()?;
        Ok(Part {
            assignment_id: None,
            ..pile
        })
    }

    fn solder(&self, part_id: i64, count: i64) -> RepoResult<Part> {
        self.set_soldered_split(part_id, count, true)
    }

    fn desolder(&self, part_id: i64, count: i64) -> RepoResult<Part> {
        self.set_soldered_split(part_id, count, false)
    }

    fn destroy(&self, part_id: i64, count: i64) -> RepoResult<Part> {
        let tx = self.conn.unchecked_transaction()?;
        let pile = take_on(&tx, part_id, count)?;
        let record = insert_history_on(
            &tx,
            pile.history_id,
            &NewHistory::event(HistoryEvent::Destroyed),
        )?;
        tx.execute(
            "UPDATE parts SET assignment_id = NULL, usable = 0, history_id = ?2 WHERE id = ?1",
            params![pile.id, record.id],
        )?;
        tx.commit()?;
        Ok(Part {
            assignment_id: None,
            usable: false,
            history_id: Some(record.id),
            ..pile
        })
    }

    fn record_part_history(&self, part_id: i64, entry: &NewHistory) -> RepoResult<History> {
        let tx = self.conn.unchecked_transaction()?;
        let part = get_part_on(&tx, part_id)?
            .ok_or_else(|| RepoError::NotFound(format!("part {part_id}")))?;
        let record = insert_history_on(&tx, part.history_id, entry)?;
        tx.execute(
            "UPDATE parts SET history_id = ?2 WHERE id = ?1",
            params![part_id, record.id],
        )?;
        tx.commit()?;
        Ok(record)
    }

    fn record_item_history(&self, item_id: i64, entry: &NewHistory) -> RepoResult<History> {
        let tx = self.conn.unchecked_transaction()?;
        let head: Option<i64> = tx
            .query_row(
                "SELECT history_id FROM items WHERE id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    RepoError::NotFound(format!("item {item_id}"))
                }
                other => other.into(),
            })?;
        let record = insert_history_on(&tx, head, entry)?;
        tx.execute(
            "UPDATE items SET history_id = ?2 WHERE id = ?1",
            params![item_id, record.id],
        )?;
        tx.commit()?;
        Ok(record)
    }

    fn history_chain(&self, head_id: i64) -> RepoResult<Vec<History>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(head_id);

        while let Some(id) = next {
            if !visited.insert(id) {
                // broken data would otherwise loop forever
                break;
            }
            let Some(record) = get_history_on(&self.conn, id)? else {
                break;
            };
            next = record.parent_id;
            chain.push(record);
        }

        if chain.is_empty() {
            return Err(RepoError::NotFound(format!("history {head_id}")));
        }

        Ok(chain)
    }

    fn part_type_count(&self, part_type_id: i64) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM parts
             WHERE part_type_id = ?1 AND usable = 1 AND soldered = 0
               AND assignment_id IS NULL",
            params![part_type_id],
            |row| row.get(0),
        )?)
    }

    fn part_type_count_with_assigned(&self, part_type_id: i64) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM parts
             WHERE part_type_id = ?1 AND usable = 1 AND soldered = 0",
            params![part_type_id],
            |row| row.get(0),
        )?)
    }

    fn assignment_count_assigned(&self, assignment_id: i64) -> RepoResult<i64> {
        assignment_count_assigned_on(&self.conn, assignment_id)
    }

    fn assignment_count_soldered(&self, assignment_id: i64) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM parts
             WHERE assignment_id = ?1 AND soldered = 1",
            params![assignment_id],
            |row| row.get(0),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InventoryRepository;
    use crate::sqlite::tests::{setup_db, setup_part_type};
    use crate::types::{NewPart, PileStatus};
    use chrono::NaiveDate;

    fn setup_pile(db: &SqliteDb, count: i64) -> (i64, Part) {
        let pt = setup_part_type(db, "10k resistor", "0805");
        let pile = db
            .add_part(&NewPart {
                part_type_id: pt.id,
                count,
                date: NaiveDate::from_ymd_opt(2024, 3, 1),
                price: Some(0.04),
                vat: Some(21.0),
                ..Default::default()
            })
            .unwrap();
        (pt.id, pile)
    }

    #[test]
    fn test_take_splits_and_conserves_count() {
        let db = setup_db();
        let (_, pile) = setup_pile(&db, 100);

        let taken = db.take(pile.id, 30).unwrap();

        assert_ne!(taken.id, pile.id);
        assert_eq!(taken.count, 30);
        let rest = db.get_part(pile.id).unwrap().unwrap();
        assert_eq!(rest.count, 70);
        assert_eq!(rest.count + taken.count, 100);
    }

    #[test]
    fn test_take_copies_every_field() {
        let db = setup_db();
        let (_, pile) = setup_pile(&db, 100);

        let taken = db.take(pile.id, 30).unwrap();
        let rest = db.get_part(pile.id).unwrap().unwrap();

        assert_eq!(taken.part_type_id, rest.part_type_id);
        assert_eq!(taken.source_id, rest.source_id);
        assert_eq!(taken.date, rest.date);
        assert_eq!(taken.price, rest.price);
        assert_eq!(taken.vat, rest.vat);
        assert_eq!(taken.assignment_id, rest.assignment_id);
        assert_eq!(taken.history_id, rest.history_id);
        assert_eq!(taken.soldered, rest.soldered);
        assert_eq!(taken.usable, rest.usable);
    }

    #[test]
    fn test_take_whole_pile_is_noop() {
        let db = setup_db();
        let (_, pile) = setup_pile(&db, 100);

        let taken = db.take(pile.id, 100).unwrap();
        assert_eq!(taken.id, pile.id);
        assert_eq!(taken.count, 100);

        // no second row appeared
        let stats = db.stats().unwrap();
        assert_eq!(stats.part_count, 1);
    }

    #[test]
    fn test_take_rejects_bad_counts() {
        let db = setup_db();
        let (_, pile) = setup_pile(&db, 10);

        for bad in [0, -5, 11] {
            let err = db.take(pile.id, bad).unwrap_err();
            assert!(matches!(err, RepoError::InvalidCount { .. }));
        }
        // pile untouched
        assert_eq!(db.get_part(pile.id).unwrap().unwrap().count, 10);
    }

    fn setup_assignment(db: &SqliteDb, part_type_id: i64, requested: i64) -> i64 {
        let project = db.add_project("amp", "", "").unwrap();
        let item = db.add_item(project.id, "A-001", false, None).unwrap();
        db.add_assignment(item.id, part_type_id, requested)
            .unwrap()
            .id
    }

    #[test]
    fn test_assign_clamps_to_requested_count() {
        let db = setup_db();
        let (pt_id, pile) = setup_pile(&db, 100);
        let assignment_id = setup_assignment(&db, pt_id, 8);

        let assigned = db.assign(assignment_id, pile.id, None).unwrap().unwrap();
        assert_eq!(assigned.count, 8);
        assert_eq!(assigned.assignment_id, Some(assignment_id));
        assert_eq!(db.assignment_count_assigned(assignment_id).unwrap(), 8);

        // second call has nothing left to satisfy
        let rest = db.get_part(pile.id).unwrap().unwrap();
        assert_eq!(rest.count, 92);
        assert!(db.assign(assignment_id, pile.id, None).unwrap().is_none());
        assert_eq!(db.assignment_count_assigned(assignment_id).unwrap(), 8);
    }

    #[test]
    fn test_assign_sequence_never_exceeds_requested() {
        let db = setup_db();
        let (pt_id, pile) = setup_pile(&db, 100);
        let assignment_id = setup_assignment(&db, pt_id, 10);

        for maximum in [3, 3, 3, 3, 3] {
            db.assign(assignment_id, pile.id, Some(maximum)).unwrap();
            assert!(db.assignment_count_assigned(assignment_id).unwrap() <= 10);
        }
        assert_eq!(db.assignment_count_assigned(assignment_id).unwrap(), 10);
    }

    #[test]
    fn test_assign_respects_maximum() {
        let db = setup_db();
        let (pt_id, pile) = setup_pile(&db, 100);
        let assignment_id = setup_assignment(&db, pt_id, 50);

        let assigned = db
            .assign(assignment_id, pile.id, Some(5))
            .unwrap()
            .unwrap();
        assert_eq!(assigned.count, 5);
    }

    #[test]
    fn test_assign_rejects_type_mismatch() {
        let db = setup_db();
        let (_, pile) = setup_pile(&db, 10);
        let other = setup_part_type(&db, "1u cap", "0603");
        let assignment_id = setup_assignment(&db, other.id, 5);

        let err = db.assign(assignment_id, pile.id, None).unwrap_err();
        assert!(matches!(err, RepoError::TypeMismatch { .. }));
    }

    #[test]
    fn test_unassign_returns_parts_to_free_pool() {
        let db = setup_db();
        let (pt_id, pile) = setup_pile(&db, 20);
        let assignment_id = setup_assignment(&db, pt_id, 20);

        let assigned = db.assign(assignment_id, pile.id, None).unwrap().unwrap();
        let freed = db.unassign(assigned.id, 5).unwrap();

        assert!(freed.assignment_id.is_none());
        assert_eq!(freed.count, 5);
        assert_eq!(db.assignment_count_assigned(assignment_id).unwrap(), 15);
    }

    #[test]
    fn test_solder_partial_splits_pile() {
        let db = setup_db();
        let (pt_id, pile) = setup_pile(&db, 10);
        let assignment_id = setup_assignment(&db, pt_id, 10);
        let assigned = db.assign(assignment_id, pile.id, None).unwrap().unwrap();

        let soldered = db.solder(assigned.id, 4).unwrap();
        assert!(soldered.soldered);
        assert_eq!(soldered.count, 4);
        assert_eq!(soldered.status(), PileStatus::Soldered);

        let rest = db.get_part(assigned.id).unwrap().unwrap();
        assert!(!rest.soldered);
        assert_eq!(rest.count, 6);

        assert_eq!(db.assignment_count_soldered(assignment_id).unwrap(), 4);
        // soldered piles still count toward the assignment total
        assert_eq!(db.assignment_count_assigned(assignment_id).unwrap(), 10);

        let back = db.desolder(soldered.id, 4).unwrap();
        assert!(!back.soldered);
        assert_eq!(db.assignment_count_soldered(assignment_id).unwrap(), 0);
    }

    #[test]
    fn test_destroy_writes_off_and_records_event() {
        let db = setup_db();
        let (pt_id, pile) = setup_pile(&db, 10);

        let dead = db.destroy(pile.id, 3).unwrap();
        assert!(!dead.usable);
        assert!(dead.assignment_id.is_none());
        assert_eq!(dead.status(), PileStatus::Destroyed);

        let chain = db.history_chain(dead.history_id.unwrap()).unwrap();
        assert_eq!(chain[0].event, HistoryEvent::Destroyed);

        // destroyed parts no longer count as stock
        assert_eq!(db.part_type_count(pt_id).unwrap(), 7);
    }

    #[test]
    fn test_history_chain_walks_to_origin() {
        let db = setup_db();
        let (_, pile) = setup_pile(&db, 10);

        db.record_part_history(pile.id, &NewHistory::event(HistoryEvent::Incoming))
            .unwrap();
        db.record_part_history(
            pile.id,
            &NewHistory {
                event: HistoryEvent::Moved,
                description: Some("moved to drawer 3".into()),
                location_id: None,
            },
        )
        .unwrap();
        let head = db
            .record_part_history(pile.id, &NewHistory::event(HistoryEvent::Tested))
            .unwrap();

        let part = db.get_part(pile.id).unwrap().unwrap();
        assert_eq!(part.history_id, Some(head.id));

        let chain = db.history_chain(head.id).unwrap();
        let events: Vec<_> = chain.iter().map(|h| h.event).collect();
        assert_eq!(
            events,
            vec![
                HistoryEvent::Tested,
                HistoryEvent::Moved,
                HistoryEvent::Incoming
            ]
        );
        // oldest-first when reversed
        assert_eq!(chain.last().unwrap().event, HistoryEvent::Incoming);
        assert!(chain.last().unwrap().parent_id.is_none());
    }

    #[test]
    fn test_record_item_history_moves_head() {
        let db = setup_db();
        let project = db.add_project("amp", "", "").unwrap();
        let item = db.add_item(project.id, "A-001", false, None).unwrap();

        let shipped = db
            .record_item_history(item.id, &NewHistory::event(HistoryEvent::Shipped))
            .unwrap();

        let updated = db.get_item(item.id).unwrap().unwrap();
        assert_eq!(updated.history_id, Some(shipped.id));

        let chain = db.history_chain(shipped.id).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].event, HistoryEvent::New);
    }

    #[test]
    fn test_part_type_counts_exclude_by_state() {
        let db = setup_db();
        let (pt_id, pile) = setup_pile(&db, 100);
        let assignment_id = setup_assignment(&db, pt_id, 30);

        db.assign(assignment_id, pile.id, Some(30)).unwrap();
        assert_eq!(db.part_type_count(pt_id).unwrap(), 70);
        assert_eq!(db.part_type_count_with_assigned(pt_id).unwrap(), 100);

        // soldered parts drop out of both counts
        let assigned = db
            .list_parts(&crate::types::PartFilter {
                assignment_id: Some(assignment_id),
                ..Default::default()
            })
            .unwrap();
        db.solder(assigned[0].id, 30).unwrap();
        assert_eq!(db.part_type_count(pt_id).unwrap(), 70);
        assert_eq!(db.part_type_count_with_assigned(pt_id).unwrap(), 70);
    }
}
