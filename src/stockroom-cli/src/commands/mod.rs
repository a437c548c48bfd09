//! Command handlers for the stockroom CLI.

pub mod catalog;
pub mod intake;
pub mod ledger;
pub mod project;
pub mod search;

use anyhow::{Context, Result};
use std::path::Path;
use stockroom_db::{InventoryRepository, SqliteDb};

/// Open the store, creating parent directories and the schema as needed.
pub(crate) fn open_db(path: &Path) -> Result<SqliteDb> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = SqliteDb::open(path)?;
    db.init()?;
    Ok(db)
}

/// Resolve a vendor shortname to its id.
pub(crate) fn resolve_source(db: &SqliteDb, shortname: Option<&str>) -> Result<Option<i64>> {
    match shortname {
        None => Ok(None),
        Some(short) => {
            let source = db
                .find_source_by_shortname(short)?
                .with_context(|| format!("unknown source: {short}"))?;
            Ok(Some(source.id))
        }
    }
}
