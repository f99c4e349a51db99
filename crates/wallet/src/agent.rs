//! Bid preparation with a local circuit breaker.

use crate::{BidStrategy, Wallet};
use rand::RngCore;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tollgate_metrics::catalogue;
use tracing::debug;

/// What to do with the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    /// Send the request with this bid.
    Submit(u64),
    /// Nothing to bid with.
    EmptyWallet,
    /// The bid was taken from the wallet but cannot cover the last known price,
    /// so the request is not sent. The tokens are not returned.
    BelowLastPrice { bid: u64, last_price: u64 },
}

impl BidDecision {
    /// Label used in metrics and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submitted",
            Self::EmptyWallet => "empty_wallet",
            Self::BelowLastPrice { .. } => "below_last_price",
        }
    }
}

/// Turns a wallet and a strategy into per-request bids.
#[derive(Debug)]
pub struct BiddingAgent {
    wallet: Arc<Wallet>,
    strategy: Box<dyn BidStrategy>,
    /// Last price seen in a response; 0 until the first response.
    last_price: AtomicU64,
}

impl BiddingAgent {
    /// Create an agent spending from `wallet`.
    pub fn new(wallet: Arc<Wallet>, strategy: Box<dyn BidStrategy>) -> Self {
        Self { wallet, strategy, last_price: AtomicU64::new(0) }
    }

    /// The wallet this agent spends from.
    pub fn wallet(&self) -> &Arc<Wallet> {
        &self.wallet
    }

    /// The strategy in use.
    pub fn strategy(&self) -> &dyn BidStrategy {
        self.strategy.as_ref()
    }

    /// Last price observed, 0 if none yet.
    pub fn last_price(&self) -> u64 {
        self.last_price.load(Ordering::Acquire)
    }

    /// Remember the price from a response. Returns the previous one.
    pub fn observe_price(&self, price: u64) -> u64 {
        self.last_price.swap(price, Ordering::AcqRel)
    }

    /// Decide on the next request, debiting the wallet if a bid is made.
    pub fn prepare_bid(&self) -> BidDecision {
        self.prepare_bid_with(&mut rand::rng())
    }

    /// [`prepare_bid`](Self::prepare_bid) with an explicit random source.
    pub fn prepare_bid_with(&self, rng: &mut dyn RngCore) -> BidDecision {
        let decision = match self.wallet.bid_and_spend_with(self.strategy.as_ref(), rng) {
            None => BidDecision::EmptyWallet,
            Some(bid) => {
                let last_price = self.last_price();
                if last_price > 0 && bid < last_price {
                    BidDecision::BelowLastPrice { bid, last_price }
                } else {
                    BidDecision::Submit(bid)
                }
            }
        };

        catalogue::client::record_bid(decision.as_str());
        debug!(
            strategy = self.strategy.name(),
            decision = decision.as_str(),
            balance = self.wallet.balance(),
            "bid prepared"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllIn, RandomUniform};
    use rand::{SeedableRng, rngs::StdRng};

    fn agent(balance: u64, strategy: Box<dyn BidStrategy>) -> BiddingAgent {
        BiddingAgent::new(Arc::new(Wallet::new(balance, 500)), strategy)
    }

    #[test]
    fn test_empty_wallet() {
        let agent = agent(0, Box::new(AllIn));
        assert_eq!(agent.prepare_bid(), BidDecision::EmptyWallet);
    }

    #[test]
    fn test_unknown_price_always_submits() {
        let agent = agent(3, Box::new(AllIn));
        assert_eq!(agent.prepare_bid(), BidDecision::Submit(3));
        assert_eq!(agent.wallet().balance(), 0);
    }

    #[test]
    fn test_short_circuit_forfeits_tokens() {
        let agent = agent(5, Box::new(AllIn));
        assert_eq!(agent.observe_price(7), 0);

        assert_eq!(agent.prepare_bid(), BidDecision::BelowLastPrice { bid: 5, last_price: 7 });
        assert_eq!(agent.wallet().balance(), 0);
    }

    #[test]
    fn test_bid_at_last_price_submits() {
        let agent = agent(9, Box::new(AllIn));
        agent.observe_price(7);
        assert_eq!(agent.prepare_bid(), BidDecision::Submit(9));
        assert_eq!(agent.observe_price(8), 7);
        assert_eq!(agent.last_price(), 8);
    }

    #[test]
    fn test_random_bids_debit_exactly() {
        let agent = agent(100, Box::new(RandomUniform));
        let mut rng = StdRng::seed_from_u64(3);

        let mut spent = 0;
        while let BidDecision::Submit(bid) = agent.prepare_bid_with(&mut rng) {
            spent += bid;
        }
        assert_eq!(spent, 100);
        assert_eq!(agent.wallet().balance(), 0);
    }
}
