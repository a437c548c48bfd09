//! Inventory store for stockroom.
//!
//! This crate owns persistence and the three cooperating engines on top of
//! it:
//!
//! - the **search index** ([`SearchIndex`]): an inverted word index from
//!   normalized terms to part types, with alias merging
//! - the **candidate matcher** ([`Matcher`]): intersects independent
//!   filters over a loosely structured part description
//! - the **inventory ledger** ([`Ledger`]): pile splitting, assignment
//!   clamping, history chains, and the derived stock aggregates
//!
//! Storage is a single SQLite file via rusqlite; every multi-entity
//! mutation runs in one transaction, rollback on any failure.
//!
//! # Example
//!
//! ```no_run
//! use stockroom_db::{InventoryRepository, Ledger, SqliteDb};
//!
//! # fn main() -> Result<(), stockroom_db::RepoError> {
//! let db = SqliteDb::open("stockroom.db").map_err(|e| stockroom_db::RepoError::Database(e.to_string()))?;
//! db.init()?;
//!
//! // split 30 parts off pile 1
//! let taken = db.take(1, 30)?;
//! assert_eq!(taken.count, 30);
//! # Ok(())
//! # }
//! ```

pub mod intake;
pub mod ledger;
pub mod matcher;
pub mod repository;
pub mod search_index;
pub mod shared;
pub mod sqlite;
pub mod types;

// Re-export types
pub use types::*;

// Re-export repository traits
pub use repository::{
    InventoryRepository, Ledger, Matcher, RepoError, RepoResult, SearchIndex,
};

// Re-export the intake workflows
pub use intake::{
    intake_batch, prepare_lines, receive_parts, request_parts, IntakeResult, ReceiveReport,
    RequestReport, RequestResult,
};

// Re-export the implementation
pub use sqlite::{SqliteDb, DEFAULT_DB_PATH};
