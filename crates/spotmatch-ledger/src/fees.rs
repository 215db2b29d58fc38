//! Trading fee schedule.
//!
//! Fees are fixed basis points of the amount each party *receives* (base for
//! the buyer, quote for the seller), rounded **down** to
//! [`constants::FEE_PRECISION`] decimal places. Rounding down means the fee
//! collector can only ever under-collect relative to the exact rate, never
//! over-collect.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use spotmatch_types::{EngineConfig, constants};

/// Maker/taker fee rates in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_bps: u32,
    pub taker_bps: u32,
}

impl FeeSchedule {
    #[must_use]
    pub fn new(maker_bps: u32, taker_bps: u32) -> Self {
        Self {
            maker_bps,
            taker_bps,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.maker_fee_bps, config.taker_fee_bps)
    }

    /// No fees at all; settlement becomes a pure transfer.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Fee on `amount` at the maker rate, rounded down.
    #[must_use]
    pub fn maker_fee(&self, amount: Decimal) -> Decimal {
        Self::fee(amount, self.maker_bps)
    }

    /// Fee on `amount` at the taker rate, rounded down.
    #[must_use]
    pub fn taker_fee(&self, amount: Decimal) -> Decimal {
        Self::fee(amount, self.taker_bps)
    }

    /// Fee at the rate owed by the receiving party: makers pay the maker
    /// rate, takers the taker rate.
    #[must_use]
    pub fn fee_for(&self, amount: Decimal, receiver_is_maker: bool) -> Decimal {
        if receiver_is_maker {
            self.maker_fee(amount)
        } else {
            self.taker_fee(amount)
        }
    }

    fn fee(amount: Decimal, bps: u32) -> Decimal {
        if bps == 0 || amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (amount * Decimal::from(bps) / Decimal::from(constants::BPS_DENOMINATOR))
            .round_dp_with_strategy(constants::FEE_PRECISION, RoundingStrategy::ToZero)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::new(
            constants::DEFAULT_MAKER_FEE_BPS,
            constants::DEFAULT_TAKER_FEE_BPS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn basis_point_arithmetic() {
        let fees = FeeSchedule::new(10, 20);
        // 10 bps of 50000 = 50; 20 bps = 100
        assert_eq!(fees.maker_fee(d("50000")), d("50"));
        assert_eq!(fees.taker_fee(d("50000")), d("100"));
    }

    #[test]
    fn fees_round_down() {
        let fees = FeeSchedule::new(1, 1);
        // 1 bp of 0.00001 = 0.000000001 -> rounds down to 0 at 8 dp
        assert_eq!(fees.maker_fee(d("0.00001")), Decimal::ZERO);
        // 1 bp of 0.033333333 = 0.0000033333333 -> truncated at 8 dp
        assert_eq!(fees.maker_fee(d("0.033333333")), d("0.00000333"));
    }

    #[test]
    fn zero_schedule_charges_nothing() {
        let fees = FeeSchedule::zero();
        assert_eq!(fees.maker_fee(d("1000000")), Decimal::ZERO);
        assert_eq!(fees.taker_fee(d("1000000")), Decimal::ZERO);
    }

    #[test]
    fn receiver_role_selects_rate() {
        let fees = FeeSchedule::new(10, 20);
        assert_eq!(fees.fee_for(d("10000"), true), d("10"));
        assert_eq!(fees.fee_for(d("10000"), false), d("20"));
    }

    #[test]
    fn from_config_matches() {
        let cfg = EngineConfig::default();
        let fees = FeeSchedule::from_config(&cfg);
        assert_eq!(fees.maker_bps, cfg.maker_fee_bps);
        assert_eq!(fees.taker_bps, cfg.taker_fee_bps);
    }

    #[test]
    fn schedule_serde_roundtrip() {
        let fees = FeeSchedule::new(5, 15);
        let json = serde_json::to_string(&fees).unwrap();
        let back: FeeSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(fees, back);
    }
}
