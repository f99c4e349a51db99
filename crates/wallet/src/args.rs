//! CLI arguments for the client token economy.

use crate::{BidStrategy, BidStrategyKind, RefillDistribution, Wallet};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default starting balance.
const DEFAULT_INITIAL_BALANCE: u64 = 50;

/// Default wallet cap.
const DEFAULT_WALLET_CAP: u64 = 500;

/// Default refill period or mean interval in milliseconds.
const DEFAULT_REFILL_INTERVAL_MS: u64 = 200;

/// Default tokens per refill.
const DEFAULT_REFILL_STEP: u64 = 15;

/// Invalid client arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    /// A wallet that can hold nothing can never bid.
    #[error("wallet cap must be at least 1")]
    ZeroCap,

    /// Starting balance above the cap.
    #[error("initial balance {initial} exceeds cap {cap}")]
    InitialAboveCap { initial: u64, cap: u64 },

    /// Refill interval of zero.
    #[error("refill interval must be at least 1ms")]
    ZeroInterval,
}

/// Wallet CLI arguments.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Wallet")]
#[serde(default)]
pub struct WalletArgs {
    /// Starting balance
    #[arg(long = "wallet.initial", default_value_t = DEFAULT_INITIAL_BALANCE)]
    pub initial: u64,

    /// Maximum balance; refills above it are discarded
    #[arg(long = "wallet.cap", default_value_t = DEFAULT_WALLET_CAP)]
    pub cap: u64,
}

impl Default for WalletArgs {
    fn default() -> Self {
        Self { initial: DEFAULT_INITIAL_BALANCE, cap: DEFAULT_WALLET_CAP }
    }
}

impl WalletArgs {
    /// Validate and build the wallet.
    pub fn build(&self) -> Result<Wallet, ArgsError> {
        if self.cap == 0 {
            return Err(ArgsError::ZeroCap);
        }
        if self.initial > self.cap {
            return Err(ArgsError::InitialAboveCap { initial: self.initial, cap: self.cap });
        }
        Ok(Wallet::new(self.initial, self.cap))
    }
}

/// Refill distribution selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RefillKind {
    /// Constant amount at constant intervals.
    Fixed,
    /// Random amount around the step at constant intervals.
    Uniform,
    /// Constant amount at exponentially distributed intervals.
    #[default]
    Poisson,
}

/// Refill CLI arguments.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Refill")]
#[serde(default)]
pub struct RefillArgs {
    /// Distribution of refills
    #[arg(long = "refill.dist", value_enum, default_value_t = RefillKind::Poisson)]
    pub kind: RefillKind,

    /// Refill period, or mean interval for poisson, in milliseconds
    #[arg(long = "refill.interval-ms", default_value_t = DEFAULT_REFILL_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Tokens per refill (mean for uniform)
    #[arg(long = "refill.step", default_value_t = DEFAULT_REFILL_STEP)]
    pub step: u64,
}

impl Default for RefillArgs {
    fn default() -> Self {
        Self {
            kind: RefillKind::default(),
            interval_ms: DEFAULT_REFILL_INTERVAL_MS,
            step: DEFAULT_REFILL_STEP,
        }
    }
}

impl RefillArgs {
    /// Validate and build the distribution.
    pub fn distribution(&self) -> Result<RefillDistribution, ArgsError> {
        if self.interval_ms == 0 {
            return Err(ArgsError::ZeroInterval);
        }
        let interval = Duration::from_millis(self.interval_ms);
        Ok(match self.kind {
            RefillKind::Fixed => RefillDistribution::Fixed { step: self.step, period: interval },
            RefillKind::Uniform => {
                RefillDistribution::Uniform { step: self.step, period: interval }
            }
            RefillKind::Poisson => {
                RefillDistribution::Poisson { step: self.step, mean_interval: interval }
            }
        })
    }
}

/// Bidding CLI arguments.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Bidding")]
#[serde(default)]
pub struct BidArgs {
    /// How much of the balance to bid per request
    #[arg(long = "bid.strategy", value_enum, default_value_t = BidStrategyKind::Random)]
    pub strategy: BidStrategyKind,
}

impl BidArgs {
    /// Build the selected strategy.
    pub fn build(&self) -> Box<dyn BidStrategy> {
        self.strategy.build()
    }
}
