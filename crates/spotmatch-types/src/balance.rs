//! Balance tracking types for the spotmatch ledger.
//!
//! Every account has an `available` balance (usable for new orders or
//! withdrawal) and a `locked` balance (reserved by open orders awaiting
//! matching or settlement).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single balance entry for an (account, asset) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceEntry {
    /// Available for new orders / withdrawal.
    pub available: Decimal,
    /// Locked by open orders' reservations.
    pub locked: Decimal,
}

impl BalanceEntry {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    /// Total balance (available + locked).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }

    /// Whether this entry has no balance at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.locked.is_zero()
    }
}

impl Default for BalanceEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// Type alias for asset identifiers (e.g., "BTC", "USDT", "ETH").
pub type Asset = String;
