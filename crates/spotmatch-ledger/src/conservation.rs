//! Supply conservation audit.
//!
//! The invariant checked after any operation sequence:
//!
//! ```text
//! ∀ asset: Σ over all accounts of (available + locked) == deposits − withdrawals
//! ```
//!
//! Matching and settlement only move balances between accounts (fees land on
//! the fee-collection account, which is itself inside the sum), so only
//! deposits and withdrawals may change an asset's total. A mismatch means
//! funds were created or destroyed and is surfaced as a critical
//! `SupplyInvariantViolation`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use spotmatch_types::{Asset, Result, SpotmatchError};

/// Tracks net minted supply (deposits − withdrawals) per asset.
#[derive(Debug, Default)]
pub struct SupplyAudit {
    net_minted: HashMap<Asset, Decimal>,
}

impl SupplyAudit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit.
    pub fn record_deposit(&mut self, asset: &str, amount: Decimal) {
        *self.net_minted.entry(asset.to_string()).or_default() += amount;
    }

    /// Record a withdrawal.
    pub fn record_withdrawal(&mut self, asset: &str, amount: Decimal) {
        *self.net_minted.entry(asset.to_string()).or_default() -= amount;
    }

    /// What the sum of all balances for `asset` must currently be.
    #[must_use]
    pub fn expected_supply(&self, asset: &str) -> Decimal {
        self.net_minted.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Compare an observed balance sum against the expectation.
    ///
    /// # Errors
    /// [`SpotmatchError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, asset: &str, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(SpotmatchError::SupplyInvariantViolation {
                reason: format!(
                    "asset {asset}: balance sum {actual_supply} != net minted {expected}"
                ),
            });
        }
        Ok(())
    }

    /// All assets that ever saw a deposit or withdrawal.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<Asset> {
        self.net_minted.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn untracked_asset_expects_zero() {
        let audit = SupplyAudit::new();
        assert_eq!(audit.expected_supply("BTC"), Decimal::ZERO);
        assert!(audit.verify("BTC", Decimal::ZERO).is_ok());
    }

    #[test]
    fn deposits_and_withdrawals_net_out() {
        let mut audit = SupplyAudit::new();
        audit.record_deposit("USDT", d("1000"));
        audit.record_deposit("USDT", d("500"));
        audit.record_withdrawal("USDT", d("300"));
        assert_eq!(audit.expected_supply("USDT"), d("1200"));
        assert!(audit.verify("USDT", d("1200")).is_ok());
    }

    #[test]
    fn mismatch_is_violation() {
        let mut audit = SupplyAudit::new();
        audit.record_deposit("BTC", d("10"));
        let err = audit.verify("BTC", d("11")).unwrap_err();
        assert!(matches!(
            err,
            SpotmatchError::SupplyInvariantViolation { .. }
        ));
    }

    #[test]
    fn assets_are_independent() {
        let mut audit = SupplyAudit::new();
        audit.record_deposit("BTC", d("5"));
        audit.record_deposit("USDT", d("50000"));
        assert!(audit.verify("BTC", d("5")).is_ok());
        assert!(audit.verify("USDT", d("50000")).is_ok());

        let mut assets = audit.tracked_assets();
        assets.sort();
        assert_eq!(assets, vec!["BTC".to_string(), "USDT".to_string()]);
    }
}
