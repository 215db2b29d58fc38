//! The sequenced event model published per instrument.
//!
//! Every admitted intent draws exactly one sequence number; all events
//! produced while processing that intent carry it. Subscribers therefore see
//! a total order over their instrument's mutations. Rejected intents never
//! mutate state, never draw a sequence number, and never appear on the
//! stream — they are reported synchronously to the caller only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, OrderId, OrderStatus, OrderType, Side, Symbol, Trade};

/// One entry in an instrument's append-only event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    /// An intent passed validation and reservation and was admitted.
    OrderAccepted {
        sequence: u64,
        order_id: OrderId,
        account_id: AccountId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: Option<Decimal>,
        quantity: Decimal,
    },
    /// A fill was executed at the maker's price.
    TradePrinted { sequence: u64, trade: Trade },
    /// An order's remaining quantity decreased (maker or taker).
    OrderFilled {
        sequence: u64,
        order_id: OrderId,
        fill_qty: Decimal,
        remaining_qty: Decimal,
        status: OrderStatus,
    },
    /// Resting or remainder quantity was withdrawn from the book.
    OrderCanceled {
        sequence: u64,
        order_id: OrderId,
        canceled_qty: Decimal,
        released_funds: Decimal,
    },
    /// The aggregate quantity at one price level changed; zero means the
    /// level was removed.
    BookDelta {
        sequence: u64,
        side: Side,
        price: Decimal,
        level_qty: Decimal,
    },
}

impl MarketEvent {
    /// The sequence number of the admitted intent that produced this event.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        match self {
            Self::OrderAccepted { sequence, .. }
            | Self::TradePrinted { sequence, .. }
            | Self::OrderFilled { sequence, .. }
            | Self::OrderCanceled { sequence, .. }
            | Self::BookDelta { sequence, .. } => *sequence,
        }
    }

    /// Short tag for logging / test assertions.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderAccepted { .. } => "order_accepted",
            Self::TradePrinted { .. } => "trade_printed",
            Self::OrderFilled { .. } => "order_filled",
            Self::OrderCanceled { .. } => "order_canceled",
            Self::BookDelta { .. } => "book_delta",
        }
    }
}
