//! Capped token balance.

use crate::BidStrategy;
use parking_lot::Mutex;
use rand::RngCore;

/// A token balance between 0 and `cap`.
///
/// Shared between the agent spending from it and the generator refilling it.
/// All operations take the internal lock, so a bid can never spend tokens that
/// a concurrent spend already took.
#[derive(Debug)]
pub struct Wallet {
    balance: Mutex<u64>,
    cap: u64,
}

impl Wallet {
    /// Create a wallet. `initial` is clamped to `cap`.
    pub fn new(initial: u64, cap: u64) -> Self {
        Self { balance: Mutex::new(initial.min(cap)), cap }
    }

    /// Current balance.
    pub fn balance(&self) -> u64 {
        *self.balance.lock()
    }

    /// Maximum balance.
    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Credit tokens; anything above the cap is discarded. Returns the new balance.
    pub fn add(&self, amount: u64) -> u64 {
        let mut balance = self.balance.lock();
        *balance = balance.saturating_add(amount).min(self.cap);
        *balance
    }

    /// Debit `amount` if the balance covers it.
    pub fn try_spend(&self, amount: u64) -> bool {
        let mut balance = self.balance.lock();
        if *balance >= amount {
            *balance -= amount;
            true
        } else {
            false
        }
    }

    /// Choose a bid with `strategy` and debit it, atomically.
    ///
    /// Returns `None` when the wallet is empty.
    pub fn bid_and_spend(&self, strategy: &dyn BidStrategy) -> Option<u64> {
        self.bid_and_spend_with(strategy, &mut rand::rng())
    }

    /// [`bid_and_spend`](Self::bid_and_spend) with an explicit random source.
    pub fn bid_and_spend_with(
        &self,
        strategy: &dyn BidStrategy,
        rng: &mut dyn RngCore,
    ) -> Option<u64> {
        let mut balance = self.balance.lock();
        if *balance == 0 {
            return None;
        }
        let bid = strategy.bid(*balance, rng).clamp(1, *balance);
        *balance -= bid;
        Some(bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllIn, RandomUniform};

    #[test]
    fn test_initial_clamped_to_cap() {
        assert_eq!(Wallet::new(900, 500).balance(), 500);
    }

    #[test]
    fn test_add_clamps() {
        let wallet = Wallet::new(490, 500);
        assert_eq!(wallet.add(5), 495);
        assert_eq!(wallet.add(15), 500);
        assert_eq!(wallet.add(u64::MAX), 500);
    }

    #[test]
    fn test_try_spend() {
        let wallet = Wallet::new(10, 100);
        assert!(wallet.try_spend(4));
        assert!(!wallet.try_spend(7));
        assert_eq!(wallet.balance(), 6);
        assert!(wallet.try_spend(6));
        assert_eq!(wallet.balance(), 0);
        assert!(wallet.try_spend(0));
    }

    #[test]
    fn test_bid_and_spend_all_in() {
        let wallet = Wallet::new(9, 100);
        assert_eq!(wallet.bid_and_spend(&AllIn), Some(9));
        assert_eq!(wallet.balance(), 0);
        assert_eq!(wallet.bid_and_spend(&AllIn), None);
    }

    #[test]
    fn test_bid_and_spend_random_debits_the_bid() {
        let wallet = Wallet::new(50, 100);
        let bid = wallet.bid_and_spend(&RandomUniform).unwrap();
        assert!((1..=50).contains(&bid));
        assert_eq!(wallet.balance(), 50 - bid);
    }
}
