//! # stockroom
//!
//! Core domain logic for the stockroom electronic-component inventory:
//! search-term normalization and query parsing, the audit event taxonomy,
//! and intake-line validation.
//!
//! Persistence lives in `stockroom-db`; this crate stays free of storage
//! dependencies so the text and validation logic is testable on its own.
//!
//! ## Example
//!
//! ```
//! use stockroom::search::{normalize, parse_query};
//!
//! assert_eq!(normalize("Rezistór"), "rezistor");
//!
//! let clauses = parse_query("resistor -smd \"0805\"");
//! assert_eq!(clauses.len(), 3);
//! assert!(clauses[1].negated);
//! assert!(clauses[2].exact);
//! ```

pub mod history;
pub mod intake;
pub mod search;

#[doc(inline)]
pub use history::HistoryEvent;
#[doc(inline)]
pub use intake::{verify_lines, LineError, RawPart};
#[doc(inline)]
pub use search::{normalize, parse_query, tokenize, Clause};
