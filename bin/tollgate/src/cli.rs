//! CLI argument assembly and top-level parser.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tollgate_gateway::{AdmissionArgs, ServerArgs};
use tollgate_observability::LogArgs;
use tollgate_pricing::PricingArgs;

/// Tollgate - price-gated admission for expensive endpoints
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Gateway commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run the gateway.
    Run(GatewayArgs),
    /// Print the effective configuration as TOML and exit.
    Config(GatewayArgs),
}

/// Arguments shared by `run` and `config`.
#[derive(Debug, Args)]
pub(crate) struct GatewayArgs {
    /// Configuration file (TOML). Missing files are ignored.
    #[arg(long, short, value_name = "FILE", env = "TOLLGATE_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Listener and backend configuration.
    #[command(flatten)]
    pub(crate) server: ServerArgs,

    /// Price controller configuration.
    #[command(flatten)]
    pub(crate) pricing: PricingArgs,

    /// Admission configuration.
    #[command(flatten)]
    pub(crate) admission: AdmissionArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "tollgate",
            "-v",
            "run",
            "--config",
            "tollgate.toml",
            "--pricing.max-step",
            "4",
            "--server.backends",
            "http://a:9001",
        ])
        .unwrap();

        assert_eq!(cli.logs.verbosity, 1);
        let Commands::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.config, Some(PathBuf::from("tollgate.toml")));
        assert_eq!(args.pricing.max_step, Some(4));
        assert_eq!(args.server.backends, vec!["http://a:9001"]);
    }

    #[test]
    fn test_parse_config() {
        let cli =
            Cli::try_parse_from(["tollgate", "config", "--admission.deadline-ms", "100"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(args) if args.admission.deadline_ms == Some(100)
        ));
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
