//! Instrument definitions: the rounding and validity rules for one market.
//!
//! An [`Instrument`] is immutable once registered. Every order intent for a
//! symbol is checked against its tick size, lot size, and precision before it
//! can consume a sequence number.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Asset, Side, Symbol};

/// A tradable pair and its validity rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Routing key, e.g. "BTC/USDT".
    pub symbol: Symbol,
    /// Asset being bought/sold, e.g. "BTC".
    pub base_asset: Asset,
    /// Asset prices are quoted in, e.g. "USDT".
    pub quote_asset: Asset,
    /// Minimum price increment.
    pub price_tick: Decimal,
    /// Minimum quantity increment.
    pub lot_size: Decimal,
    /// Maximum decimal places for prices.
    pub price_precision: u32,
    /// Maximum decimal places for quantities.
    pub quantity_precision: u32,
}

impl Instrument {
    /// A valid limit price: positive, within precision, tick-aligned.
    pub fn validate_price(&self, price: Decimal) -> crate::Result<()> {
        if price <= Decimal::ZERO {
            return Err(crate::SpotmatchError::InvalidOrder {
                reason: format!("price {price} must be positive"),
            });
        }
        if price.normalize().scale() > self.price_precision {
            return Err(crate::SpotmatchError::InvalidOrder {
                reason: format!(
                    "price {price} exceeds precision of {} decimal places",
                    self.price_precision
                ),
            });
        }
        if !(price % self.price_tick).is_zero() {
            return Err(crate::SpotmatchError::InvalidOrder {
                reason: format!("price {price} is not aligned to tick {}", self.price_tick),
            });
        }
        Ok(())
    }

    /// A valid quantity: positive, within precision, lot-aligned.
    pub fn validate_quantity(&self, quantity: Decimal) -> crate::Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(crate::SpotmatchError::InvalidOrder {
                reason: format!("quantity {quantity} must be positive"),
            });
        }
        if quantity.normalize().scale() > self.quantity_precision {
            return Err(crate::SpotmatchError::InvalidOrder {
                reason: format!(
                    "quantity {quantity} exceeds precision of {} decimal places",
                    self.quantity_precision
                ),
            });
        }
        if !(quantity % self.lot_size).is_zero() {
            return Err(crate::SpotmatchError::InvalidOrder {
                reason: format!(
                    "quantity {quantity} is not aligned to lot size {}",
                    self.lot_size
                ),
            });
        }
        Ok(())
    }

    /// Round a raw base-asset quantity down to a whole number of lots.
    #[must_use]
    pub fn align_quantity_down(&self, quantity: Decimal) -> Decimal {
        if quantity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (quantity / self.lot_size).floor() * self.lot_size
    }

    /// The asset an order on `side` pays with (and therefore reserves).
    #[must_use]
    pub fn reserve_asset(&self, side: Side) -> &Asset {
        match side {
            Side::Buy => &self.quote_asset,
            Side::Sell => &self.base_asset,
        }
    }

    /// Default BTC/USDT instrument.
    #[must_use]
    pub fn btc_usdt() -> Self {
        Self {
            symbol: Symbol::new("BTC/USDT"),
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
            price_tick: Decimal::new(1, 2),    // 0.01 USDT
            lot_size: Decimal::new(1, 5),      // 0.00001 BTC
            price_precision: 2,
            quantity_precision: 5,
        }
    }

    /// Default ETH/USDT instrument.
    #[must_use]
    pub fn eth_usdt() -> Self {
        Self {
            symbol: Symbol::new("ETH/USDT"),
            base_asset: "ETH".to_string(),
            quote_asset: "USDT".to_string(),
            price_tick: Decimal::new(1, 2),    // 0.01 USDT
            lot_size: Decimal::new(1, 4),      // 0.0001 ETH
            price_precision: 2,
            quantity_precision: 4,
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn valid_price_passes() {
        let inst = Instrument::btc_usdt();
        assert!(inst.validate_price(d("30000.00")).is_ok());
        assert!(inst.validate_price(d("0.01")).is_ok());
    }

    #[test]
    fn misaligned_price_rejected() {
        let inst = Instrument::btc_usdt();
        let err = inst.validate_price(d("30000.005")).unwrap_err();
        assert!(matches!(err, crate::SpotmatchError::InvalidOrder { .. }));
    }

    #[test]
    fn non_positive_price_rejected() {
        let inst = Instrument::btc_usdt();
        assert!(inst.validate_price(Decimal::ZERO).is_err());
        assert!(inst.validate_price(d("-1")).is_err());
    }

    #[test]
    fn valid_quantity_passes() {
        let inst = Instrument::btc_usdt();
        assert!(inst.validate_quantity(d("1")).is_ok());
        assert!(inst.validate_quantity(d("0.00001")).is_ok());
        assert!(inst.validate_quantity(d("2.5")).is_ok());
    }

    #[test]
    fn misaligned_quantity_rejected() {
        let inst = Instrument::btc_usdt();
        assert!(inst.validate_quantity(d("0.000015")).is_err());
        assert!(inst.validate_quantity(Decimal::ZERO).is_err());
    }

    #[test]
    fn align_quantity_down_floors_to_lot() {
        let inst = Instrument::btc_usdt();
        assert_eq!(inst.align_quantity_down(d("1.000019")), d("1.00001"));
        assert_eq!(inst.align_quantity_down(d("0.000009")), Decimal::ZERO);
        assert_eq!(inst.align_quantity_down(d("-3")), Decimal::ZERO);
    }

    #[test]
    fn reserve_asset_per_side() {
        let inst = Instrument::btc_usdt();
        assert_eq!(inst.reserve_asset(Side::Buy), "USDT");
        assert_eq!(inst.reserve_asset(Side::Sell), "BTC");
    }

    #[test]
    fn instrument_serde_roundtrip() {
        let inst = Instrument::eth_usdt();
        let json = serde_json::to_string(&inst).unwrap();
        let back: Instrument = serde_json::from_str(&json).unwrap();
        assert_eq!(inst, back);
    }
}
