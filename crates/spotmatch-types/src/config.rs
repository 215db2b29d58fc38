//! Engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunable knobs shared by the matching engine and the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maker fee in basis points of the received amount.
    pub maker_fee_bps: u32,
    /// Taker fee in basis points of the received amount.
    pub taker_fee_bps: u32,
    /// Multiplier over best ask when reserving quote for a market buy.
    /// The matching loop additionally stops when the reserved budget cannot
    /// buy one more lot, so the factor only bounds how deep a market buy may
    /// walk the book.
    pub market_buy_reserve_factor: Decimal,
    /// Depth levels returned when the caller does not specify a count.
    pub default_depth_levels: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maker_fee_bps: constants::DEFAULT_MAKER_FEE_BPS,
            taker_fee_bps: constants::DEFAULT_TAKER_FEE_BPS,
            market_buy_reserve_factor: Decimal::TWO,
            default_depth_levels: constants::DEFAULT_DEPTH_LEVELS,
        }
    }
}

impl EngineConfig {
    /// A zero-fee configuration, convenient for tests that audit
    /// conservation without fee arithmetic.
    #[must_use]
    pub fn zero_fees() -> Self {
        Self {
            maker_fee_bps: 0,
            taker_fee_bps: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert!(cfg.maker_fee_bps <= cfg.taker_fee_bps);
        assert!(cfg.market_buy_reserve_factor >= Decimal::ONE);
        assert!(cfg.default_depth_levels > 0);
    }

    #[test]
    fn zero_fees_config() {
        let cfg = EngineConfig::zero_fees();
        assert_eq!(cfg.maker_fee_bps, 0);
        assert_eq!(cfg.taker_fee_bps, 0);
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.maker_fee_bps, back.maker_fee_bps);
        assert_eq!(cfg.market_buy_reserve_factor, back.market_buy_reserve_factor);
    }
}
