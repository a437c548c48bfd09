mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = cli.db.as_path();

    match cli.command {
        Commands::Init => {
            commands::catalog::init(db)?;
        }

        Commands::Intake { command } => {
            commands::intake::handle(db, command)?;
        }

        Commands::Search { query, format } => {
            commands::search::search(db, &query, format)?;
        }

        Commands::Match {
            name,
            sku,
            manufacturer,
            footprint,
            source,
            item,
            project,
        } => {
            commands::search::find_matches(
                db,
                commands::search::MatchArgs {
                    name,
                    sku,
                    manufacturer,
                    footprint,
                    source,
                    item,
                    project,
                },
            )?;
        }

        Commands::Types { command } => {
            commands::catalog::handle_types(db, command)?;
        }

        Commands::Parts {
            part_type,
            assignment,
            free,
        } => {
            commands::ledger::parts_list(db, part_type, assignment, free)?;
        }

        Commands::Take { part, count } => {
            commands::ledger::take(db, part, count)?;
        }

        Commands::Solder { part, count } => {
            commands::ledger::solder(db, part, count)?;
        }

        Commands::Desolder { part, count } => {
            commands::ledger::desolder(db, part, count)?;
        }

        Commands::Unassign { part, count } => {
            commands::ledger::unassign(db, part, count)?;
        }

        Commands::Destroy { part, count } => {
            commands::ledger::destroy(db, part, count)?;
        }

        Commands::History { command } => {
            commands::ledger::history(db, command)?;
        }

        Commands::Source { command } => {
            commands::catalog::handle_source(db, command)?;
        }

        Commands::Footprint { command } => {
            commands::catalog::handle_footprint(db, command)?;
        }

        Commands::Location { command } => {
            commands::catalog::handle_location(db, command)?;
        }

        Commands::Project { command } => {
            commands::project::handle_project(db, command)?;
        }

        Commands::Item { command } => {
            commands::project::handle_item(db, command)?;
        }

        Commands::Request {
            item,
            part_type,
            count,
        } => {
            commands::project::request(db, item, part_type, count)?;
        }

        Commands::Assign {
            assignment,
            part,
            max,
        } => {
            commands::project::assign(db, assignment, part, max)?;
        }

        Commands::Assignments { item } => {
            commands::project::assignments(db, item)?;
        }

        Commands::Term { command } => {
            commands::search::handle_term(db, command)?;
        }

        Commands::Stats => {
            commands::ledger::stats(db)?;
        }
    }

    Ok(())
}
