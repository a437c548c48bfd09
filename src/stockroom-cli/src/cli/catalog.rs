//! Catalog command CLI definitions: types, sources, footprints, locations,
//! terms.

use clap::Subcommand;

use super::core::OutputFormat;

#[derive(Subcommand)]
pub enum TypesCommand {
    /// List part types
    List {
        /// Filter by name substring
        #[arg(long)]
        name: Option<String>,

        /// Filter by manufacturer substring
        #[arg(long)]
        manufacturer: Option<String>,

        /// Filter by footprint name substring
        #[arg(long)]
        footprint: Option<String>,

        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one part type with stock counts and vendor links
    Show {
        /// Part type id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum SourceCommand {
    /// Add a vendor
    Add {
        #[arg(long)]
        name: String,

        /// Short handle used on the command line
        #[arg(long)]
        shortname: String,

        /// Default VAT in percent
        #[arg(long)]
        vat: Option<f64>,

        /// Homepage
        #[arg(long)]
        home: Option<String>,

        /// Direct-link template with %s replaced by the SKU
        #[arg(long)]
        url: Option<String>,

        /// Shipments pass through customs
        #[arg(long)]
        customs: bool,
    },

    /// List vendors
    List,
}

#[derive(Subcommand)]
pub enum FootprintCommand {
    /// Add a footprint
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        pins: i64,

        /// Holes to the PCB
        #[arg(long)]
        holes: Option<i64>,

        /// Formatting template with %d replaced by the pin count
        #[arg(long)]
        kicad: Option<String>,
    },

    /// List footprints
    List,
}

#[derive(Subcommand)]
pub enum LocationCommand {
    /// Add a location
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        summary: Option<String>,
    },

    /// List locations
    List,
}

#[derive(Subcommand)]
pub enum TermCommand {
    /// Point a term at a canonical synonym
    Alias {
        /// Term to redirect
        term: String,

        /// Canonical term
        canonical: String,
    },

    /// Rebuild the search index for every part type
    Reindex,
}
