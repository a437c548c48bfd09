//! Intake command CLI definitions.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum IntakeCommand {
    /// Receive one line of stock
    Add {
        /// Free-text part name, also used for candidate matching
        #[arg(long)]
        name: String,

        /// Footprint name (created on first use)
        #[arg(long)]
        footprint: Option<String>,

        /// Pin count for a new footprint
        #[arg(long)]
        pins: Option<i64>,

        #[arg(long)]
        summary: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        manufacturer: Option<String>,

        /// Datasheet link
        #[arg(long)]
        datasheet: Option<String>,

        /// Vendor SKU
        #[arg(long)]
        sku: Option<String>,

        /// Number of parts received
        #[arg(long)]
        count: i64,

        /// Acquisition date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Unit price
        #[arg(long)]
        price: Option<f64>,

        /// VAT in percent (omit when included in the price)
        #[arg(long)]
        vat: Option<f64>,

        /// Vendor shortname
        #[arg(long)]
        source: Option<String>,

        /// Match and verify only, save nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Receive a batch of lines from a JSON file
    File {
        /// JSON array of intake lines
        path: PathBuf,

        /// Vendor shortname applied to lines without a source
        #[arg(long)]
        source: Option<String>,

        /// Match and verify only, save nothing
        #[arg(long)]
        dry_run: bool,
    },
}
