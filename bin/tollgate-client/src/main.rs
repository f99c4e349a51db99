//! Tollgate bidding client.

mod cli;
mod exchange;
mod run;
mod stress;

use clap::Parser;
use cli::{Cli, Commands};
use eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    tollgate_observability::init_logging(&cli.logs)?;

    match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Stress(args) => stress::run(args).await,
    }
}
