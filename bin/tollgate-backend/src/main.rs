//! Mock model backend streaming a scripted reply.

use clap::Parser;
use eyre::Result;
use std::{net::SocketAddr, time::Duration};
use tollgate_gateway::{ChatScript, backend_router, bind, serve, shutdown_signal};
use tollgate_observability::LogArgs;
use tracing::info;

/// Mock model backend for Tollgate
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    logs: LogArgs,

    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:9001", value_name = "ADDR")]
    listen: SocketAddr,

    /// Shortest pause before each chunk, in milliseconds.
    #[arg(long, default_value_t = 50, value_name = "MS")]
    min_delay_ms: u64,

    /// Longest pause before each chunk, in milliseconds.
    #[arg(long, default_value_t = 150, value_name = "MS")]
    max_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    tollgate_observability::init_logging(&cli.logs)?;

    let script = ChatScript {
        min_delay: Duration::from_millis(cli.min_delay_ms),
        max_delay: Duration::from_millis(cli.max_delay_ms),
        ..ChatScript::default()
    };
    info!(listen = %cli.listen, chunks = script.chunks.len(), "starting mock backend");

    let listener = bind(cli.listen).await?;
    serve(listener, backend_router(script), shutdown_signal()).await?;
    Ok(())
}
