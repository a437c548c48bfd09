//! CLI argument definitions for stockroom.
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod catalog;
mod core;
mod intake;
mod ledger;
mod project;

pub use catalog::{FootprintCommand, LocationCommand, SourceCommand, TermCommand, TypesCommand};
pub use core::{Cli, Commands, OutputFormat};
pub use intake::IntakeCommand;
pub use ledger::HistoryCommand;
pub use project::{ItemCommand, ProjectCommand};
