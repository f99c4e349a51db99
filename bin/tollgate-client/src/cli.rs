//! CLI argument assembly and top-level parser.

use clap::{Args, Parser, Subcommand};
use rand::Rng;
use std::time::Duration;
use tollgate_observability::LogArgs;
use tollgate_wallet::{BidArgs, RefillArgs, WalletArgs};
use url::Url;

const DEFAULT_TARGET: &str = "http://localhost:8080/mcp/chat";

/// Tollgate client - bids for access with a replenishing token wallet
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

/// Client commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run one bidding agent with a refilling wallet.
    Run(RunArgs),
    /// Run fixed-budget user groups against the gateway.
    Stress(StressArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Endpoint to call.
    #[arg(long, default_value = DEFAULT_TARGET, value_name = "URL")]
    pub(crate) target: Url,

    /// Number of request cycles.
    #[arg(long, default_value_t = 50)]
    pub(crate) requests: u64,

    #[command(flatten)]
    pub(crate) wallet: WalletArgs,

    #[command(flatten)]
    pub(crate) refill: RefillArgs,

    #[command(flatten)]
    pub(crate) bid: BidArgs,

    #[command(flatten)]
    pub(crate) think: ThinkArgs,
}

/// Arguments for the `stress` command.
#[derive(Debug, Args)]
pub(crate) struct StressArgs {
    /// Endpoint to call.
    #[arg(long, default_value = DEFAULT_TARGET, value_name = "URL")]
    pub(crate) target: Url,

    /// Concurrent users in each group.
    #[arg(long, default_value_t = 5)]
    pub(crate) users_per_group: usize,

    /// Stop after this many seconds instead of waiting for ctrl-c.
    #[arg(long, value_name = "SECS")]
    pub(crate) duration_secs: Option<u64>,

    #[command(flatten)]
    pub(crate) think: ThinkArgs,
}

/// Pause between requests, drawn uniformly.
#[derive(Debug, Clone, Copy, Args)]
#[command(next_help_heading = "Think time")]
pub(crate) struct ThinkArgs {
    /// Shortest pause between requests.
    #[arg(long = "think.min-ms", default_value_t = 500, value_name = "MS")]
    pub(crate) min_ms: u64,

    /// Longest pause between requests.
    #[arg(long = "think.max-ms", default_value_t = 1_500, value_name = "MS")]
    pub(crate) max_ms: u64,
}

impl ThinkArgs {
    /// Draw the next pause.
    pub(crate) fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["tollgate-client", "run"]).unwrap();
        let Commands::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.target.as_str(), DEFAULT_TARGET);
        assert_eq!(args.requests, 50);
        assert_eq!((args.think.min_ms, args.think.max_ms), (500, 1_500));
    }

    #[test]
    fn test_stress_args() {
        let cli = Cli::try_parse_from([
            "tollgate-client",
            "stress",
            "--users-per-group",
            "2",
            "--duration-secs",
            "30",
        ])
        .unwrap();
        let Commands::Stress(args) = cli.command else { panic!("expected stress") };
        assert_eq!(args.users_per_group, 2);
        assert_eq!(args.duration_secs, Some(30));
    }

    #[test]
    fn test_think_time_bounds() {
        let think = ThinkArgs { min_ms: 500, max_ms: 1_500 };
        for _ in 0..100 {
            let pause = think.sample();
            assert!(pause >= Duration::from_millis(500) && pause <= Duration::from_millis(1_500));
        }
        let fixed = ThinkArgs { min_ms: 10, max_ms: 10 };
        assert_eq!(fixed.sample(), Duration::from_millis(10));
    }
}
