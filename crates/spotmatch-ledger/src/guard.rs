//! Double-settlement guard.
//!
//! Each trade settles exactly once: a second attempt for the same `TradeId`
//! returns [`SpotmatchError::TradeAlreadySettled`]. To keep memory bounded in
//! long-running processes the guard keeps two generations of trade IDs and
//! drops the older generation when the newer one fills up, so it remembers
//! at least `capacity / 2` and at most `capacity` recent trades.

use std::collections::HashSet;

use spotmatch_types::{Result, SpotmatchError, TradeId};

/// Remembers recently settled trades across two rotating generations.
pub struct SettlementGuard {
    capacity: usize,
    current: HashSet<TradeId>,
    previous: HashSet<TradeId>,
}

impl SettlementGuard {
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SettlementGuard capacity must be > 0");
        Self {
            capacity,
            current: HashSet::new(),
            previous: HashSet::new(),
        }
    }

    /// Record a settlement.
    ///
    /// # Errors
    /// Returns [`SpotmatchError::TradeAlreadySettled`] if this trade was
    /// already recorded.
    pub fn record(&mut self, trade_id: TradeId) -> Result<()> {
        if self.contains(&trade_id) {
            return Err(SpotmatchError::TradeAlreadySettled(trade_id));
        }
        if self.current.len() * 2 >= self.capacity {
            self.previous = std::mem::take(&mut self.current);
        }
        self.current.insert(trade_id);
        Ok(())
    }

    /// Whether this trade is still remembered as settled.
    #[must_use]
    pub fn contains(&self, trade_id: &TradeId) -> bool {
        self.current.contains(trade_id) || self.previous.contains(trade_id)
    }

    /// Number of trades currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len() + self.previous.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }
}
