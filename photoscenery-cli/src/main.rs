//! Photoscenery CLI
//!
//! Downloads orthophoto tiles for a region into an X-Plane style
//! `Orthophotos` tree and maintains what is already there.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::fetch::FetchArgs;
use commands::store::{CheckArgs, PruneArgs, RemoveArgs};
use error::CliError;
use runner::{CliRunner, GlobalArgs};

#[derive(Parser)]
#[command(name = "photoscenery")]
#[command(version = photoscenery::VERSION)]
#[command(about = "Download orthophoto scenery tiles for flight simulators", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every tile of a region that is not already stored
    Fetch(FetchArgs),
    /// List the artifacts stored for one or more cells
    Check(CheckArgs),
    /// Delete a cell, or selected tiles inside it
    Remove(RemoveArgs),
    /// Delete misplaced or corrupt artifacts
    Prune(PruneArgs),
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(&cli.global)?;
    match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, runner).await,
        Commands::Check(args) => commands::store::check(args, runner),
        Commands::Remove(args) => commands::store::remove(args, runner),
        Commands::Prune(args) => commands::store::prune(args, runner),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        e.exit();
    }
}
