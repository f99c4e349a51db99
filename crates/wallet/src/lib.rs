//! The client side of the token economy.
//!
//! A [`Wallet`] holds a capped balance. A [`TokenGenerator`] credits it in the
//! background following a [`RefillDistribution`]. A [`BiddingAgent`] turns the
//! balance into bids using a [`BidStrategy`] and skips requests locally when the
//! bid could not cover the last price the gateway quoted.

mod agent;
mod args;
mod generator;
mod strategy;
mod wallet;

pub use agent::{BidDecision, BiddingAgent};
pub use args::{ArgsError, BidArgs, RefillArgs, RefillKind, WalletArgs};
pub use generator::{Credit, GeneratorHandle, RefillDistribution, TokenGenerator};
pub use strategy::{AllIn, BidStrategy, BidStrategyKind, RandomUniform};
pub use wallet::Wallet;
