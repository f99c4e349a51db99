//! Tollgate gateway binary.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, GatewayArgs};
use eyre::{Result, WrapErr};
use tollgate_gateway::{GatewayConfig, GatewayState, bind, router, serve, shutdown_signal};
use tollgate_metrics::{install_prometheus_recorder, metrics_router};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    tollgate_observability::init_logging(&cli.logs)?;

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Config(args) => {
            let config = load_config(&args)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(args: &GatewayArgs) -> Result<GatewayConfig> {
    let mut config = GatewayConfig::load(args.config.as_deref())
        .wrap_err("failed to load gateway configuration")?;
    config.apply_args(&args.server, &args.pricing, &args.admission);
    Ok(config)
}

async fn run(args: GatewayArgs) -> Result<()> {
    let config = load_config(&args)?;
    let state = GatewayState::from_config(&config).wrap_err("invalid gateway configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen,
        backends = ?config.server.backends,
        initial_price = config.pricing.initial_price,
        fixed_price = ?config.admission.fixed_price,
        deadline_ms = ?config.admission.deadline_ms,
        "starting tollgate"
    );

    let mut app = router(state.clone(), &config.admission);
    if config.metrics.enabled {
        let recorder = install_prometheus_recorder(&config.metrics)?;
        recorder.spawn_upkeep(config.metrics.upkeep_interval_secs);
        app = app.merge(metrics_router(recorder.handle().clone(), state.metrics_hooks()));
    }

    let listener = bind(config.server.listen).await?;
    serve(listener, app, shutdown_signal()).await?;

    info!("tollgate stopped");
    Ok(())
}
