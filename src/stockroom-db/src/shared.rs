//! SQL constants and query building utilities for the SQLite store.

use crate::types::{PartFilter, PartTypeFilter};

/// Column list for the footprints table; order matches the row mappers.
pub const FOOTPRINT_COLUMNS: &str = "id, name, summary, description, pins, holes, kicad";

/// Column list for the types table.
pub const PART_TYPE_COLUMNS: &str =
    "id, name, summary, description, manufacturer, footprint_id, datasheet";

/// Column list for the sources table.
pub const SOURCE_COLUMNS: &str =
    "id, name, shortname, summary, description, vat, home, url, prices, customs";

/// Column list for the parts table.
pub const PART_COLUMNS: &str =
    "id, part_type_id, source_id, count, date, price, vat, assignment_id, history_id, soldered, usable";

/// Column list for the history table.
pub const HISTORY_COLUMNS: &str = "id, parent_id, time, event, description, location_id";

/// Column list for the prices table.
pub const PRICE_COLUMNS: &str = "id, part_source_id, time, amount, price, vat, currency";

/// Schema version this library reads and writes.
pub const SCHEMA_VERSION: i64 = 1;

/// SQLite schema, applied as migration `0001_base_schema`.
pub const BASE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS footprints (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        summary TEXT,
        description TEXT,
        pins INTEGER NOT NULL DEFAULT 0,
        holes INTEGER,
        kicad TEXT
    );

    CREATE TABLE IF NOT EXISTS types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        summary TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        manufacturer TEXT NOT NULL DEFAULT '',
        footprint_id INTEGER NOT NULL REFERENCES footprints(id),
        datasheet TEXT
    );

    CREATE TABLE IF NOT EXISTS sources (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        shortname TEXT NOT NULL UNIQUE,
        summary TEXT,
        description TEXT,
        vat REAL,
        home TEXT,
        url TEXT,
        prices TEXT,
        customs BOOLEAN NOT NULL DEFAULT FALSE
    );

    CREATE TABLE IF NOT EXISTS types_sources (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        part_type_id INTEGER NOT NULL REFERENCES types(id) ON DELETE CASCADE,
        source_id INTEGER NOT NULL REFERENCES sources(id),
        sku TEXT NOT NULL DEFAULT '',
        UNIQUE(part_type_id, source_id, sku)
    );

    CREATE TABLE IF NOT EXISTS prices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        part_source_id INTEGER NOT NULL REFERENCES types_sources(id) ON DELETE CASCADE,
        time TIMESTAMP NOT NULL,
        amount INTEGER NOT NULL DEFAULT 1,
        price REAL NOT NULL,
        vat REAL,
        currency TEXT
    );

    CREATE TABLE IF NOT EXISTS locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        summary TEXT,
        description TEXT
    );

    CREATE TABLE IF NOT EXISTS history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        parent_id INTEGER REFERENCES history(id),
        time TIMESTAMP NOT NULL,
        event INTEGER NOT NULL,
        description TEXT,
        location_id INTEGER REFERENCES locations(id)
    );

    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        summary TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        started DATE
    );

    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        serial TEXT NOT NULL DEFAULT '',
        kit BOOLEAN NOT NULL DEFAULT FALSE,
        description TEXT,
        history_id INTEGER REFERENCES history(id)
    );

    CREATE TABLE IF NOT EXISTS assignments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        part_type_id INTEGER NOT NULL REFERENCES types(id),
        item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        count INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS parts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        part_type_id INTEGER NOT NULL REFERENCES types(id),
        source_id INTEGER REFERENCES sources(id),
        count INTEGER NOT NULL,
        date DATE,
        price REAL,
        vat REAL,
        assignment_id INTEGER REFERENCES assignments(id),
        history_id INTEGER REFERENCES history(id),
        soldered BOOLEAN NOT NULL DEFAULT FALSE,
        usable BOOLEAN NOT NULL DEFAULT TRUE
    );

    CREATE TABLE IF NOT EXISTS terms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        term TEXT NOT NULL UNIQUE,
        alias_for_id INTEGER REFERENCES terms(id)
    );

    CREATE TABLE IF NOT EXISTS terms_types (
        term_id INTEGER NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
        part_type_id INTEGER NOT NULL REFERENCES types(id) ON DELETE CASCADE,
        PRIMARY KEY (term_id, part_type_id)
    );

    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        changed TIMESTAMP
    );
"#;

/// Index definitions, applied after the tables exist.
pub const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_types_manufacturer ON types(manufacturer)",
    "CREATE INDEX IF NOT EXISTS idx_types_footprint ON types(footprint_id)",
    "CREATE INDEX IF NOT EXISTS idx_types_sources_type ON types_sources(part_type_id)",
    "CREATE INDEX IF NOT EXISTS idx_types_sources_sku ON types_sources(sku)",
    "CREATE INDEX IF NOT EXISTS idx_prices_part_source ON prices(part_source_id)",
    "CREATE INDEX IF NOT EXISTS idx_parts_type ON parts(part_type_id)",
    "CREATE INDEX IF NOT EXISTS idx_parts_assignment ON parts(assignment_id)",
    "CREATE INDEX IF NOT EXISTS idx_history_parent ON history(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_items_project ON items(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_assignments_item ON assignments(item_id)",
    "CREATE INDEX IF NOT EXISTS idx_terms_types_type ON terms_types(part_type_id)",
];

/// Escape `%`, `_`, and the escape character itself, then wrap the word in
/// wildcards for a substring LIKE. Queries using the result must carry
/// `ESCAPE '\'`.
pub fn like_substring(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len() + 2);
    escaped.push('%');
    for c in word.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Build a part-type list query with optional substring filters.
///
/// Returns the SQL and the parameter values in binding order; every filter
/// binds a [`like_substring`] pattern.
pub fn build_part_type_query(filter: &PartTypeFilter) -> (String, Vec<String>) {
    let mut sql = format!("SELECT {} FROM types WHERE 1=1", PART_TYPE_COLUMNS);
    let mut params = Vec::new();

    if let Some(name) = &filter.name {
        sql.push_str(" AND name LIKE ? ESCAPE '\\'");
        params.push(like_substring(name));
    }
    if let Some(manufacturer) = &filter.manufacturer {
        sql.push_str(" AND manufacturer LIKE ? ESCAPE '\\'");
        params.push(like_substring(manufacturer));
    }
    if let Some(footprint) = &filter.footprint {
        sql.push_str(
            " AND footprint_id IN (SELECT id FROM footprints WHERE name LIKE ? ESCAPE '\\')",
        );
        params.push(like_substring(footprint));
    }

    sql.push_str(" ORDER BY name, id");

    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = filter.offset {
        sql.push_str(&format!(" OFFSET {}", offset));
    }

    (sql, params)
}

/// Build a pile list query from a [`PartFilter`].
pub fn build_part_query(filter: &PartFilter) -> (String, Vec<i64>) {
    let mut sql = format!("SELECT {} FROM parts WHERE 1=1", PART_COLUMNS);
    let mut params = Vec::new();

    if let Some(part_type_id) = filter.part_type_id {
        sql.push_str(" AND part_type_id = ?");
        params.push(part_type_id);
    }
    if let Some(assignment_id) = filter.assignment_id {
        sql.push_str(" AND assignment_id = ?");
        params.push(assignment_id);
    }
    if let Some(usable) = filter.usable {
        sql.push_str(" AND usable = ?");
        params.push(i64::from(usable));
    }
    if filter.free {
        sql.push_str(" AND assignment_id IS NULL AND soldered = 0 AND usable = 1");
    }

    sql.push_str(" ORDER BY id");

    (sql, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_substring_wraps_and_escapes() {
        assert_eq!(like_substring("0805"), "%0805%");
        assert_eq!(like_substring("50%"), "%50\\%%");
        assert_eq!(like_substring("a_b"), "%a\\_b%");
        assert_eq!(like_substring("c\\d"), "%c\\\\d%");
    }

    #[test]
    fn test_build_part_type_query_no_filters() {
        let (sql, params) = build_part_type_query(&PartTypeFilter::default());
        assert!(sql.contains("FROM types"));
        assert!(sql.contains("ORDER BY name"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_part_type_query_with_filters() {
        let filter = PartTypeFilter {
            name: Some("resistor".into()),
            manufacturer: Some("Yageo".into()),
            footprint: Some("0805".into()),
            limit: Some(10),
            offset: Some(5),
        };
        let (sql, params) = build_part_type_query(&filter);
        assert!(sql.contains("name LIKE ?"));
        assert!(sql.contains("manufacturer LIKE ?"));
        assert!(sql.contains("footprints WHERE name LIKE ?"));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 5"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], "%resistor%");
    }

    #[test]
    fn test_build_part_query_free_only() {
        let filter = PartFilter {
            part_type_id: Some(3),
            free: true,
            ..Default::default()
        };
        let (sql, params) = build_part_query(&filter);
        assert!(sql.contains("part_type_id = ?"));
        assert!(sql.contains("assignment_id IS NULL"));
        assert!(sql.contains("soldered = 0"));
        assert_eq!(params, vec![3]);
    }
}
