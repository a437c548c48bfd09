//! Ledger command CLI definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// History chain of a pile
    Part {
        /// Pile id
        id: i64,
    },

    /// History chain of a built item
    Item {
        /// Item id
        id: i64,
    },
}
