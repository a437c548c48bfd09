//! Core CLI definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::catalog::{FootprintCommand, LocationCommand, SourceCommand, TermCommand, TypesCommand};
use super::intake::IntakeCommand;
use super::ledger::HistoryCommand;
use super::project::{ItemCommand, ProjectCommand};

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(about = "Electronic component inventory", long_about = None)]
pub struct Cli {
    /// Path to the inventory database
    #[arg(long, global = true, default_value = stockroom_db::DEFAULT_DB_PATH)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the inventory database
    Init,

    /// Receive stock, with candidate matching against the catalog
    #[command(visible_alias = "in")]
    Intake {
        #[command(subcommand)]
        command: IntakeCommand,
    },

    /// Free-text search over part types
    ///
    /// Whitespace-separated words are ANDed; `-word` excludes matches and
    /// `"word"` requires an exact term.
    #[command(visible_alias = "s")]
    Search {
        query: String,

        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Run the candidate matcher from explicit fields
    Match {
        /// Free-text name
        #[arg(long)]
        name: Option<String>,

        /// Vendor SKU substring
        #[arg(long)]
        sku: Option<String>,

        /// Manufacturer substring
        #[arg(long)]
        manufacturer: Option<String>,

        /// Footprint name substring
        #[arg(long)]
        footprint: Option<String>,

        /// Vendor shortname constraining the SKU filter
        #[arg(long)]
        source: Option<String>,

        /// Only part types already assigned to this item
        #[arg(long)]
        item: Option<i64>,

        /// Only part types assigned somewhere in this project
        #[arg(long)]
        project: Option<i64>,
    },

    /// Browse the part type catalog
    #[command(visible_alias = "t")]
    Types {
        #[command(subcommand)]
        command: TypesCommand,
    },

    /// List part piles
    Parts {
        /// Filter by part type
        #[arg(long = "type")]
        part_type: Option<i64>,

        /// Filter by assignment
        #[arg(long)]
        assignment: Option<i64>,

        /// Only free piles (unassigned, unsoldered, usable)
        #[arg(long)]
        free: bool,
    },

    /// Split parts off a pile
    Take {
        /// Pile id
        part: i64,
        count: i64,
    },

    /// Mark parts of a pile as soldered
    Solder { part: i64, count: i64 },

    /// Clear the soldered flag on parts of a pile
    Desolder { part: i64, count: i64 },

    /// Return assigned parts to the free pool
    Unassign { part: i64, count: i64 },

    /// Write off parts as destroyed
    Destroy { part: i64, count: i64 },

    /// Walk the history chain of a pile or item
    #[command(visible_alias = "h")]
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Manage vendors
    Source {
        #[command(subcommand)]
        command: SourceCommand,
    },

    /// Manage footprints
    Footprint {
        #[command(subcommand)]
        command: FootprintCommand,
    },

    /// Manage locations
    Location {
        #[command(subcommand)]
        command: LocationCommand,
    },

    /// Manage projects
    #[command(visible_alias = "p")]
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Manage built items
    Item {
        #[command(subcommand)]
        command: ItemCommand,
    },

    /// Request parts of a type for a built item
    Request {
        /// Item the parts are for
        #[arg(long)]
        item: i64,

        /// Requested part type
        #[arg(long = "type")]
        part_type: i64,

        /// Requested number of units
        #[arg(long)]
        count: i64,
    },

    /// Link a pile to an assignment (splits the pile as needed)
    Assign {
        #[arg(long)]
        assignment: i64,

        /// Pile to take parts from
        #[arg(long)]
        part: i64,

        /// Cap on the number of parts taken
        #[arg(long)]
        max: Option<i64>,
    },

    /// List the assignments of an item with assigned/soldered tallies
    Assignments {
        #[arg(long)]
        item: i64,
    },

    /// Curate search terms
    Term {
        #[command(subcommand)]
        command: TermCommand,
    },

    /// Database statistics
    Stats,
}
