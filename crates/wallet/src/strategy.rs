//! Bidding strategies.

use clap::ValueEnum;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decides how much of the balance to bid on one request.
///
/// Called with a non-zero balance; the result is clamped to `[1, balance]`.
pub trait BidStrategy: Send + Sync + fmt::Debug {
    /// Bid for a wallet holding `balance` tokens.
    fn bid(&self, balance: u64, rng: &mut dyn RngCore) -> u64;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Bid the whole balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllIn;

impl BidStrategy for AllIn {
    fn bid(&self, balance: u64, _rng: &mut dyn RngCore) -> u64 {
        balance
    }

    fn name(&self) -> &'static str {
        "all-in"
    }
}

/// Bid a uniformly random amount between 1 and the balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUniform;

impl BidStrategy for RandomUniform {
    fn bid(&self, balance: u64, rng: &mut dyn RngCore) -> u64 {
        if balance <= 1 {
            return balance;
        }
        rng.random_range(1..=balance)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Strategy selection for the CLI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BidStrategyKind {
    /// Uniform in [1, balance].
    #[default]
    Random,
    /// The whole balance.
    AllIn,
}

impl BidStrategyKind {
    /// Instantiate the strategy.
    pub fn build(self) -> Box<dyn BidStrategy> {
        match self {
            Self::Random => Box::new(RandomUniform),
            Self::AllIn => Box::new(AllIn),
        }
    }
}
