//! Inverted term index over part-type text.
//!
//! Terms are normalized words from a part type's name, summary,
//! description, and manufacturer. A term may alias a canonical synonym;
//! registration attaches memberships to the canonical term, and queries
//! union memberships along the alias chain of every matched term.

use std::collections::{BTreeSet, HashSet};

use rusqlite::{params, Connection, OptionalExtension};

use crate::repository::{RepoError, RepoResult, SearchIndex};
use crate::shared::like_substring;
use crate::sqlite::{get_part_type_on, SqliteDb};
use crate::types::Term;
use stockroom::search::{normalize, parse_query, tokenize};

fn row_to_term(row: &rusqlite::Row<'_>) -> rusqlite::Result<Term> {
    Ok(Term {
        id: row.get(0)?,
        term: row.get(1)?,
        alias_for_id: row.get(2)?,
    })
}

fn get_term_on(conn: &Connection, id: i64) -> RepoResult<Option<Term>> {
    Ok(conn
        .query_row(
            "SELECT id, term, alias_for_id FROM terms WHERE id = ?1",
            params![id],
            row_to_term,
        )
        .optional()?)
}

fn find_term_on(conn: &Connection, word: &str) -> RepoResult<Option<Term>> {
    Ok(conn
        .query_row(
            "SELECT id, term, alias_for_id FROM terms WHERE term = ?1",
            params![word],
            row_to_term,
        )
        .optional()?)
}

fn get_or_create_term_on(conn: &Connection, word: &str) -> RepoResult<Term> {
    if let Some(term) = find_term_on(conn, word)? {
        return Ok(term);
    }
    conn.execute("INSERT INTO terms (term) VALUES (?1)", params![word])?;
    Ok(Term {
        id: conn.last_insert_rowid(),
        term: word.to_string(),
        alias_for_id: None,
    })
}

/// Follow the alias chain to its canonical end. A visited set bounds the
/// walk should the stored chain ever be damaged.
fn canonical_term_on(conn: &Connection, term: &Term) -> RepoResult<i64> {
    let mut visited = HashSet::new();
    let mut current = term.clone();
    while let Some(parent_id) = current.alias_for_id {
        if !visited.insert(current.id) {
            break;
        }
        match get_term_on(conn, parent_id)? {
            Some(parent) => current = parent,
            None => break,
        }
    }
    Ok(current.id)
}

fn memberships_on(conn: &Connection, term_id: i64) -> RepoResult<BTreeSet<i64>> {
    let mut stmt = conn.prepare("SELECT part_type_id FROM terms_types WHERE term_id = ?1")?;
    let ids = stmt
        .query_map(params![term_id], |row| row.get(0))?
        .collect::<Result<BTreeSet<i64>, _>>()?;
    Ok(ids)
}

/// Synchronize one part type's term memberships; see
/// [`SearchIndex::register_part_type`]. Runs on the caller's connection so
/// intake can keep it inside its transaction.
pub(crate) fn register_part_type_on(
    conn: &Connection,
    part_type_id: i64,
) -> RepoResult<BTreeSet<i64>> {
    let part_type = get_part_type_on(conn, part_type_id)?
        .ok_or_else(|| RepoError::NotFound(format!("part type {part_type_id}")))?;

    let text = format!(
        "{} {} {} {}",
        part_type.name, part_type.summary, part_type.description, part_type.manufacturer
    );

    let mut terms = BTreeSet::new();
    for token in tokenize(&text) {
        if token.is_empty() {
            continue;
        }
        let term_id = match find_term_on(conn, &token)? {
            Some(term) => canonical_term_on(conn, &term)?,
            None => get_or_create_term_on(conn, &token)?.id,
        };
        conn.execute(
            "INSERT OR IGNORE INTO terms_types (term_id, part_type_id) VALUES (?1, ?2)",
            params![term_id, part_type_id],
        )?;
        terms.insert(term_id);
    }

    // drop mappings for terms the current text no longer produces
    let mut stmt = conn.prepare("SELECT term_id FROM terms_types WHERE part_type_id = ?1")?;
    let existing = stmt
        .query_map(params![part_type_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    for term_id in existing {
        if !terms.contains(&term_id) {
            conn.execute(
                "DELETE FROM terms_types WHERE term_id = ?1 AND part_type_id = ?2",
                params![term_id, part_type_id],
            )?;
        }
    }

    tracing::debug!(part_type = part_type_id, terms = terms.len(), "indexed");

    Ok(terms)
}

/// Union a matched term's memberships with those of every ancestor on its
/// alias chain.
fn chain_memberships_on(conn: &Connection, term: Term) -> RepoResult<BTreeSet<i64>> {
    let mut result = BTreeSet::new();
    let mut visited = HashSet::new();
    let mut current = Some(term);
    while let Some(t) = current {
        if !visited.insert(t.id) {
            break;
        }
        result.extend(memberships_on(conn, t.id)?);
        current = match t.alias_for_id {
            Some(parent_id) => get_term_on(conn, parent_id)?,
            None => None,
        };
    }
    Ok(result)
}

impl SearchIndex for SqliteDb {
    fn register_part_type(&self, part_type_id: i64) -> RepoResult<BTreeSet<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let terms = register_part_type_on(&tx, part_type_id)?;
        tx.commit()?;
        Ok(terms)
    }

    fn search(&self, query: &str) -> RepoResult<BTreeSet<i64>> {
        let mut results: BTreeSet<i64> = BTreeSet::new();
        let mut first = true;
        let mut negated: Vec<BTreeSet<i64>> = Vec::new();

        for clause in parse_query(query) {
            let matched: Vec<Term> = if clause.exact {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id, term, alias_for_id FROM terms WHERE term = ?1")?;
                let terms = stmt
                    .query_map(params![clause.word], row_to_term)?
                    .collect::<Result<Vec<_>, _>>()?;
                terms
            } else {
                let mut stmt = self.conn.prepare(
                    "SELECT id, term, alias_for_id FROM terms WHERE term LIKE ?1 ESCAPE '\\'",
                )?;
                let terms = stmt
                    .query_map(params![like_substring(&clause.word)], row_to_term)?
                    .collect::<Result<Vec<_>, _>>()?;
                terms
            };

            let mut clause_set = BTreeSet::new();
            for term in matched {
                clause_set.extend(chain_memberships_on(&self.conn, term)?);
            }

            if clause.negated {
                negated.push(clause_set);
            } else if first {
                results = clause_set;
                first = false;
            } else {
                results = results.intersection(&clause_set).copied().collect();
            }
        }

        for neg in negated {
            results = results.difference(&neg).copied().collect();
        }

        Ok(results)
    }

    fn set_term_alias(&self, term: &str, canonical: &str) -> RepoResult<()> {
        let word = normalize(term);
        let canonical_word = normalize(canonical);
        if word == canonical_word {
            return Err(RepoError::AliasCycle(word));
        }

        let tx = self.conn.unchecked_transaction()?;
        let alias = get_or_create_term_on(&tx, &word)?;
        let target = get_or_create_term_on(&tx, &canonical_word)?;
        // aliasing to the resolved root keeps chains short; a cycle is only
        // possible when the root is the alias itself
        let root_id = canonical_term_on(&tx, &target)?;
        if root_id == alias.id {
            return Err(RepoError::AliasCycle(word));
        }
        tx.execute(
            "UPDATE terms SET alias_for_id = ?2 WHERE id = ?1",
            params![alias.id, root_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn reindex_all(&self) -> RepoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let ids = {
            let mut stmt = tx.prepare("SELECT id FROM types ORDER BY id")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        };
        for id in &ids {
            register_part_type_on(&tx, *id)?;
        }
        tx.commit()?;
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InventoryRepository;
    use crate::sqlite::tests::{setup_db, setup_part_type};
    use crate::types::PartTypeUpdate;

    fn indexed_type(db: &SqliteDb, name: &str, description: &str) -> i64 {
        let pt = setup_part_type(db, name, "0805");
        db.update_part_type(
            pt.id,
            &PartTypeUpdate {
                description: Some(description.to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        db.register_part_type(pt.id).unwrap();
        pt.id
    }

    #[test]
    fn test_register_returns_canonical_terms() {
        let db = setup_db();
        let pt = setup_part_type(&db, "10k resistor", "0805");
        let terms = db.register_part_type(pt.id).unwrap();
        // "10k" and "resistor"
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_register_deduplicates_repeated_words() {
        let db = setup_db();
        let id = indexed_type(&db, "resistor resistor", "resistor");
        let found = db.search("resistor").unwrap();
        assert!(found.contains(&id));
        let mapping_count: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM terms_types WHERE part_type_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(mapping_count, 1);
    }

    #[test]
    fn test_search_intersects_positive_clauses() {
        let db = setup_db();
        let both = indexed_type(&db, "10k resistor", "");
        let only_resistor = indexed_type(&db, "4k7 resistor", "");

        let found = db.search("resistor 10k").unwrap();
        assert!(found.contains(&both));
        assert!(!found.contains(&only_resistor));
    }

    #[test]
    fn test_search_subtracts_negated_clauses() {
        let db = setup_db();
        let smd = indexed_type(&db, "10k resistor", "smd");
        let tht = indexed_type(&db, "10k resistor", "tht");

        let found = db.search("resistor -smd").unwrap();
        assert!(!found.contains(&smd));
        assert!(found.contains(&tht));
    }

    #[test]
    fn test_search_exact_clause_skips_substring_matches() {
        let db = setup_db();
        let plain = indexed_type(&db, "10k resistor", "");
        let ohm = indexed_type(&db, "10kohm resistor", "");

        let substring = db.search("10k").unwrap();
        assert!(substring.contains(&plain) && substring.contains(&ohm));

        let exact = db.search("\"10k\"").unwrap();
        assert!(exact.contains(&plain));
        assert!(!exact.contains(&ohm));
    }

    #[test]
    fn test_search_unknown_word_collapses_result() {
        let db = setup_db();
        indexed_type(&db, "10k resistor", "");
        assert!(db.search("resistor flurble").unwrap().is_empty());
        assert!(db.search("flurble").unwrap().is_empty());
    }

    #[test]
    fn test_search_without_positive_clauses_is_empty() {
        let db = setup_db();
        indexed_type(&db, "10k resistor", "");
        assert!(db.search("").unwrap().is_empty());
        assert!(db.search("-resistor").unwrap().is_empty());
    }

    #[test]
    fn test_search_normalizes_query_words() {
        let db = setup_db();
        let id = indexed_type(&db, "Rezistór 10k", "");
        let found = db.search("rezistor").unwrap();
        assert!(found.contains(&id));
    }

    #[test]
    fn test_reindex_prunes_stale_terms() {
        let db = setup_db();
        let id = indexed_type(&db, "10k resistor", "obsolete");
        assert!(db.search("obsolete").unwrap().contains(&id));

        db.update_part_type(
            id,
            &PartTypeUpdate {
                description: Some("current".into()),
                ..Default::default()
            },
        )
        .unwrap();
        db.register_part_type(id).unwrap();

        assert!(db.search("obsolete").unwrap().is_empty());
        assert!(db.search("current").unwrap().contains(&id));
        // untouched words keep their mappings
        assert!(db.search("resistor").unwrap().contains(&id));
    }

    #[test]
    fn test_alias_attaches_new_registrations_to_canonical() {
        let db = setup_db();
        let old = indexed_type(&db, "resistor 10k", "");
        db.set_term_alias("resistors", "resistor").unwrap();

        let new = indexed_type(&db, "resistors 4k7", "");

        // both reachable through the canonical word
        let found = db.search("resistor").unwrap();
        assert!(found.contains(&old));
        assert!(found.contains(&new));
    }

    #[test]
    fn test_alias_chain_reached_from_alias_word() {
        let db = setup_db();
        let old = indexed_type(&db, "resistor 10k", "");
        db.set_term_alias("resistors", "resistor").unwrap();

        // exact match on the alias unions the canonical memberships
        let found = db.search("\"resistors\"").unwrap();
        assert!(found.contains(&old));
    }

    #[test]
    fn test_alias_rejects_self_and_cycles() {
        let db = setup_db();
        assert!(matches!(
            db.set_term_alias("resistor", "Resistor"),
            Err(RepoError::AliasCycle(_))
        ));

        db.set_term_alias("a", "b").unwrap();
        let err = db.set_term_alias("b", "a").unwrap_err();
        assert!(matches!(err, RepoError::AliasCycle(_)));
    }

    #[test]
    fn test_reindex_all_covers_every_type() {
        let db = setup_db();
        let a = setup_part_type(&db, "10k resistor", "0805");
        let b = setup_part_type(&db, "1u cap", "0603");

        let count = db.reindex_all().unwrap();
        assert_eq!(count, 2);
        assert!(db.search("resistor").unwrap().contains(&a.id));
        assert!(db.search("cap").unwrap().contains(&b.id));
    }
}
