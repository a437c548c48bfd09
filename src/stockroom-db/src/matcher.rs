//! Candidate matcher for loosely structured part descriptions.
//!
//! Stock intake works from free text typed per line; the matcher narrows
//! that to "is this a part type I already have" by intersecting one
//! candidate set per present input field instead of demanding an exact
//! key.

use std::collections::BTreeSet;

use crate::repository::{Matcher, RepoResult, SearchIndex};
use crate::shared::like_substring;
use crate::sqlite::SqliteDb;
use crate::types::MatchQuery;

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl SqliteDb {
    fn ids_for_query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> RepoResult<BTreeSet<i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params, |row| row.get(0))?
            .collect::<Result<BTreeSet<i64>, _>>()?;
        Ok(ids)
    }
}

impl Matcher for SqliteDb {
    fn fill_matches(&self, query: &MatchQuery) -> RepoResult<BTreeSet<i64>> {
        let mut filters: Vec<BTreeSet<i64>> = Vec::new();

        if let Some(name) = present(&query.search_name) {
            filters.push(self.search(name)?);
        }

        if let Some(sku) = present(&query.sku) {
            let pattern = like_substring(sku);
            let ids = match query.source {
                Some(source_id) => self.ids_for_query(
                    "SELECT DISTINCT part_type_id FROM types_sources
                     WHERE sku LIKE ?1 ESCAPE '\\' AND source_id = ?2",
                    &[&pattern, &source_id],
                )?,
                None => self.ids_for_query(
                    "SELECT DISTINCT part_type_id FROM types_sources
                     WHERE sku LIKE ?1 ESCAPE '\\'",
                    &[&pattern],
                )?,
            };
            // The same SKU string may legitimately live at another vendor:
            // when a source was given and nothing matched, the SKU filter is
            // dropped instead of vetoing the other evidence. A bare SKU
            // filter participates strictly.
            if query.source.is_none() || !ids.is_empty() {
                filters.push(ids);
            } else {
                tracing::debug!(sku, "no vendor match, sku filter dropped");
            }
        }

        if let Some(manufacturer) = present(&query.manufacturer) {
            let pattern = like_substring(manufacturer);
            let ids = if query.allow_blank_manufacturer {
                self.ids_for_query(
                    "SELECT id FROM types
                     WHERE manufacturer = '' OR manufacturer LIKE ?1 ESCAPE '\\'",
                    &[&pattern],
                )?
            } else {
                self.ids_for_query(
                    "SELECT id FROM types WHERE manufacturer LIKE ?1 ESCAPE '\\'",
                    &[&pattern],
                )?
            };
            filters.push(ids);
        }

        if let Some(footprint) = present(&query.footprint) {
            let pattern = like_substring(footprint);
            filters.push(self.ids_for_query(
                "SELECT t.id FROM types t
                 JOIN footprints f ON t.footprint_id = f.id
                 WHERE f.name LIKE ?1 ESCAPE '\\'",
                &[&pattern],
            )?);
        }

        if let Some(item_id) = query.item {
            filters.push(self.ids_for_query(
                "SELECT DISTINCT part_type_id FROM assignments WHERE item_id = ?1",
                &[&item_id],
            )?);
        }

        if let Some(project_id) = query.project {
            filters.push(self.ids_for_query(
                "SELECT DISTINCT a.part_type_id FROM assignments a
                 JOIN items i ON a.item_id = i.id
                 WHERE i.project_id = ?1",
                &[&project_id],
            )?);
        }

        // absence of any filter is not a wildcard
        let mut produced = filters.into_iter();
        let Some(mut result) = produced.next() else {
            return Ok(BTreeSet::new());
        };
        for set in produced {
            result = result.intersection(&set).copied().collect();
        }

        Ok(result)
    }
}
