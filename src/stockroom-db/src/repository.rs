//! Repository traits for the inventory store.
//!
//! The traits split along the three cooperating components: catalog plus
//! bookkeeping ([`InventoryRepository`]), the pile ledger ([`Ledger`]), the
//! term index ([`SearchIndex`]), and the candidate matcher ([`Matcher`]).

use std::collections::BTreeSet;

use crate::types::*;
use stockroom::history::ParseEventError;

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseEventError),

    #[error("Invalid count: requested {requested}, available {available}")]
    InvalidCount { requested: i64, available: i64 },

    #[error("Part type mismatch: pile has type {part_type}, expected {expected}")]
    TypeMismatch { part_type: i64, expected: i64 },

    #[error("Unsupported schema version {found} (supported: {supported})")]
    SchemaVersion { found: String, supported: String },

    #[error("Term alias would create a cycle: {0}")]
    AliasCycle(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(e: rusqlite::Error) -> Self {
        RepoError::Database(e.to_string())
    }
}

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Catalog and bookkeeping operations of the inventory store.
pub trait InventoryRepository {
    /// Initialize or upgrade the database schema.
    fn init(&self) -> RepoResult<()>;

    // === Footprints ===

    fn add_footprint(&self, new: &NewFootprint) -> RepoResult<Footprint>;

    fn get_footprint(&self, id: i64) -> RepoResult<Option<Footprint>>;

    /// Case-insensitive exact lookup, used to avoid duplicate footprints at
    /// intake.
    fn find_footprint_by_name(&self, name: &str) -> RepoResult<Option<Footprint>>;

    fn list_footprints(&self) -> RepoResult<Vec<Footprint>>;

    // === Sources ===

    fn add_source(&self, new: &NewSource) -> RepoResult<Source>;

    fn get_source(&self, id: i64) -> RepoResult<Option<Source>>;

    fn find_source_by_shortname(&self, shortname: &str) -> RepoResult<Option<Source>>;

    fn list_sources(&self) -> RepoResult<Vec<Source>>;

    // === Locations ===

    fn add_location(&self, name: &str, summary: Option<&str>) -> RepoResult<Location>;

    fn list_locations(&self) -> RepoResult<Vec<Location>>;

    // === Part types ===

    fn add_part_type(&self, new: &NewPartType) -> RepoResult<PartType>;

    fn get_part_type(&self, id: i64) -> RepoResult<Option<PartType>>;

    /// Update textual fields. The caller re-registers search terms after
    /// edits to indexed fields.
    fn update_part_type(&self, id: i64, update: &PartTypeUpdate) -> RepoResult<()>;

    fn list_part_types(&self, filter: &PartTypeFilter) -> RepoResult<Vec<PartType>>;

    // === Vendor links and prices ===

    fn add_part_source(
        &self,
        part_type_id: i64,
        source_id: i64,
        sku: &str,
    ) -> RepoResult<PartSource>;

    fn find_part_sources(&self, part_type_id: i64) -> RepoResult<Vec<PartSource>>;

    fn add_price(&self, new: &NewPrice) -> RepoResult<Price>;

    fn list_prices(&self, part_source_id: i64) -> RepoResult<Vec<Price>>;

    /// Cheapest applicable price for a quantity: breaks with
    /// `amount <= quantity`, most recent first.
    fn best_price(&self, part_source_id: i64, quantity: i64) -> RepoResult<Option<Price>>;

    /// Smallest quantity break on record, defaulting to 1.
    fn min_amount(&self, part_source_id: i64) -> RepoResult<i64>;

    // === Piles ===

    fn add_part(&self, new: &NewPart) -> RepoResult<Part>;

    fn get_part(&self, id: i64) -> RepoResult<Option<Part>>;

    fn list_parts(&self, filter: &PartFilter) -> RepoResult<Vec<Part>>;

    // === Projects, items, assignments ===

    fn add_project(&self, name: &str, summary: &str, description: &str) -> RepoResult<Project>;

    fn get_project(&self, id: i64) -> RepoResult<Option<Project>>;

    fn list_projects(&self) -> RepoResult<Vec<Project>>;

    /// Create a built item under a project; the item starts its own history
    /// chain with a NEW event.
    fn add_item(
        &self,
        project_id: i64,
        serial: &str,
        kit: bool,
        description: Option<&str>,
    ) -> RepoResult<Item>;

    fn get_item(&self, id: i64) -> RepoResult<Option<Item>>;

    fn list_items(&self, project_id: i64) -> RepoResult<Vec<Item>>;

    fn add_assignment(&self, item_id: i64, part_type_id: i64, count: i64)
        -> RepoResult<Assignment>;

    fn get_assignment(&self, id: i64) -> RepoResult<Option<Assignment>>;

    fn list_assignments(&self, item_id: i64) -> RepoResult<Vec<Assignment>>;

    /// Change the requested count; refuses to drop below what is already
    /// assigned.
    fn set_assignment_count(&self, id: i64, count: i64) -> RepoResult<()>;

    // === Meta ===

    fn get_meta(&self, key: &str) -> RepoResult<Option<String>>;

    fn set_meta(&self, key: &str, value: &str) -> RepoResult<()>;

    fn stats(&self) -> RepoResult<DbStats>;
}

/// Pile ledger: splits, state transitions, history chains, and the derived
/// aggregates. Every multi-entity mutation runs in one transaction.
pub trait Ledger {
    /// Take `count` parts from a pile. Taking the whole pile returns it
    /// unchanged; otherwise the pile is split and the carved-off piece is
    /// returned, identical in every field except `count` and `id`.
    fn take(&self, part_id: i64, count: i64) -> RepoResult<Part>;

    /// Assign parts from a pile to an assignment, splitting as needed. The
    /// taken count is clamped so the assignment can never exceed its
    /// requested total; a clamp to zero is a no-op returning `None`.
    fn assign(
        &self,
        assignment_id: i64,
        part_id: i64,
        maximum: Option<i64>,
    ) -> RepoResult<Option<Part>>;

    /// Return `count` parts from an assigned pile to the free pool.
    fn unassign(&self, part_id: i64, count: i64) -> RepoResult<Part>;

    /// Mark `count` parts of a pile as soldered, splitting first if the
    /// pile is larger.
    fn solder(&self, part_id: i64, count: i64) -> RepoResult<Part>;

    fn desolder(&self, part_id: i64, count: i64) -> RepoResult<Part>;

    /// Write off `count` parts: split, clear the assignment, mark unusable,
    /// and record a DESTROYED event.
    fn destroy(&self, part_id: i64, count: i64) -> RepoResult<Part>;

    /// Prepend an event to a pile's history chain and move the head.
    fn record_part_history(&self, part_id: i64, entry: &NewHistory) -> RepoResult<History>;

    /// Prepend an event to an item's history chain and move the head.
    fn record_item_history(&self, item_id: i64, entry: &NewHistory) -> RepoResult<History>;

    /// Walk a chain from its head to the origin, newest first.
    fn history_chain(&self, head_id: i64) -> RepoResult<Vec<History>>;

    // === Derived aggregates (recomputed on every read, never cached) ===

    /// Free stock: unassigned, unsoldered, usable parts of a type.
    fn part_type_count(&self, part_type_id: i64) -> RepoResult<i64>;

    /// Stock including assigned parts, still excluding soldered ones.
    fn part_type_count_with_assigned(&self, part_type_id: i64) -> RepoResult<i64>;

    /// Sum of counts of all piles linked to an assignment.
    fn assignment_count_assigned(&self, assignment_id: i64) -> RepoResult<i64>;

    /// Sum of counts of soldered piles linked to an assignment.
    fn assignment_count_soldered(&self, assignment_id: i64) -> RepoResult<i64>;
}

/// Inverted word index over part-type text, with alias merging.
pub trait SearchIndex {
    /// Tokenize a part type's textual fields and synchronize its term
    /// memberships: new terms are created, alias chains are followed to the
    /// canonical term, and mappings for terms no longer produced are
    /// pruned. Returns the canonical term ids now associated.
    fn register_part_type(&self, part_type_id: i64) -> RepoResult<BTreeSet<i64>>;

    /// Evaluate a query string against the index. Positive clauses
    /// intersect, negated clauses subtract; a query without positive
    /// clauses yields nothing.
    fn search(&self, query: &str) -> RepoResult<BTreeSet<i64>>;

    /// Point one term at a canonical synonym. Self-aliases and cycles are
    /// rejected.
    fn set_term_alias(&self, term: &str, canonical: &str) -> RepoResult<()>;

    /// Re-register every part type; returns how many were processed.
    fn reindex_all(&self) -> RepoResult<usize>;
}

/// Candidate matcher for loosely structured part descriptions.
pub trait Matcher {
    /// Intersect the candidate filters produced by the present fields of
    /// the query; an empty query matches nothing.
    fn fill_matches(&self, query: &MatchQuery) -> RepoResult<BTreeSet<i64>>;
}
