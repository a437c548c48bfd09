//! Project and item command CLI definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Start a project
    Add {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        summary: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// List projects with item counts
    List,
}

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Add a built item to a project
    Add {
        #[arg(long)]
        project: i64,

        /// Serial number
        #[arg(long)]
        serial: String,

        /// Put together as a kit rather than assembled
        #[arg(long)]
        kit: bool,

        #[arg(long)]
        description: Option<String>,
    },

    /// List the items of a project
    List {
        #[arg(long)]
        project: i64,
    },
}
