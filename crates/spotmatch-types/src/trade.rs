//! Trade types produced by the matching engine.
//!
//! A [`Trade`] is the immutable record of one fill between a taker and a
//! maker. The execution price is always the resting (maker) order's price;
//! price improvement goes to the taker.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, OrderId, Side, Symbol, TradeId};

/// One fill between an incoming taker order and a resting maker order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Deterministic from the taker's sequence number and fill index.
    pub id: TradeId,
    pub symbol: Symbol,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_account_id: AccountId,
    pub taker_account_id: AccountId,
    /// Execution price: the maker's resting price.
    pub price: Decimal,
    /// Executed quantity in base asset.
    pub quantity: Decimal,
    /// Quote amount = price × quantity.
    pub quote_amount: Decimal,
    /// Which side the maker was resting on.
    pub maker_side: Side,
    /// The taker intent's sequence number.
    pub sequence: u64,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// The fee-relevant notional value (quote amount).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.quote_amount
    }

    #[must_use]
    pub fn taker_side(&self) -> Side {
        self.maker_side.opposite()
    }

    /// The account receiving base asset.
    #[must_use]
    pub fn buyer_account(&self) -> AccountId {
        match self.maker_side {
            Side::Buy => self.maker_account_id,
            Side::Sell => self.taker_account_id,
        }
    }

    /// The account receiving quote asset.
    #[must_use]
    pub fn seller_account(&self) -> AccountId {
        match self.maker_side {
            Side::Buy => self.taker_account_id,
            Side::Sell => self.maker_account_id,
        }
    }

    /// The order id on the buy side of this fill.
    #[must_use]
    pub fn buy_order_id(&self) -> OrderId {
        match self.maker_side {
            Side::Buy => self.maker_order_id,
            Side::Sell => self.taker_order_id,
        }
    }

    /// The order id on the sell side of this fill.
    #[must_use]
    pub fn sell_order_id(&self) -> OrderId {
        match self.maker_side {
            Side::Buy => self.taker_order_id,
            Side::Sell => self.maker_order_id,
        }
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} {} {} @ {} = {}",
            self.id,
            self.symbol,
            self.taker_side(),
            self.quantity,
            self.price,
            self.quote_amount,
        )
    }
}
