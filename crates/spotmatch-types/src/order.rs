//! Order types for the spotmatch matching core.
//!
//! A [`NewOrder`] is the caller's intent; it becomes an [`Order`] only once
//! funds are reserved and the sequencer has admitted it. From that point on
//! the owning instrument executor is the only mutator: `remaining_qty`
//! strictly decreases and [`OrderStatus`] transitions are monotone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, OrderId, Symbol};

/// Which side of the book an order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order consumes liquidity from.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// The type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
            Self::Market => write!(f, "MARKET"),
        }
    }
}

/// Lifecycle status of an order.
///
/// Transitions are monotone: once terminal (`Filled`, `Canceled`,
/// `Rejected`) an order never changes again, and a `Filled` order can never
/// regress to `PartiallyFilled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    /// Whether an order in this status can still rest or match.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Canceled | Self::Rejected)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::New => !matches!(next, Self::New),
            Self::PartiallyFilled => {
                matches!(next, Self::PartiallyFilled | Self::Filled | Self::Canceled)
            }
            Self::Filled | Self::Canceled | Self::Rejected => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// An order intent as submitted by a client, before admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Required for limit orders, absent for market orders.
    pub price: Option<Decimal>,
    pub quantity: Decimal,
}

impl NewOrder {
    #[must_use]
    pub fn limit(
        account_id: AccountId,
        symbol: Symbol,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            account_id,
            symbol,
            side,
            order_type: OrderType::Limit,
            price: Some(price),
            quantity,
        }
    }

    #[must_use]
    pub fn market(account_id: AccountId, symbol: Symbol, side: Side, quantity: Decimal) -> Self {
        Self {
            account_id,
            symbol,
            side,
            order_type: OrderType::Market,
            price: None,
            quantity,
        }
    }
}

/// An admitted order. Mutated only by its instrument's executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub remaining_qty: Decimal,
    /// Ledger funds still locked for this order: quote for buys, base for
    /// sells. Drops to zero exactly when the order reaches a terminal state.
    pub reserved: Decimal,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build an admitted order from an intent, a drawn sequence number, and
    /// the reservation that backs it.
    #[must_use]
    pub fn admit(intent: NewOrder, sequence: u64, reserved: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            account_id: intent.account_id,
            symbol: intent.symbol,
            side: intent.side,
            order_type: intent.order_type,
            status: OrderStatus::New,
            price: intent.price,
            quantity: intent.quantity,
            remaining_qty: intent.quantity,
            reserved,
            sequence,
            created_at: now,
            updated_at: now,
        }
    }

    /// The limit price, if this is a limit order.
    #[must_use]
    pub fn limit_price(&self) -> Option<Decimal> {
        match self.order_type {
            OrderType::Limit => self.price,
            OrderType::Market => None,
        }
    }

    /// Whether this order would trade against a resting order at `price`.
    /// Market orders cross any price.
    #[must_use]
    pub fn crosses(&self, price: Decimal) -> bool {
        match self.limit_price() {
            None => true,
            Some(limit) => match self.side {
                Side::Buy => limit >= price,
                Side::Sell => limit <= price,
            },
        }
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining_qty.is_zero()
    }

    #[must_use]
    pub fn filled_qty(&self) -> Decimal {
        self.quantity - self.remaining_qty
    }

    /// Apply a monotone status transition.
    ///
    /// # Errors
    /// An illegal transition is an [`crate::SpotmatchError::EngineInvariantViolation`]:
    /// it means the engine's own bookkeeping is wrong, and the caller must
    /// halt the affected instrument rather than continue.
    pub fn transition(&mut self, next: OrderStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(crate::SpotmatchError::EngineInvariantViolation {
                reason: format!("order {}: illegal transition {} -> {next}", self.id, self.status),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Synchronous result of a successful `place_order` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub sequence: u64,
    pub status: OrderStatus,
    pub filled_qty: Decimal,
    pub remaining_qty: Decimal,
}

/// Synchronous result of a successful `cancel_order` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelReceipt {
    pub order_id: OrderId,
    pub sequence: u64,
    /// Base quantity that was still resting and is now withdrawn.
    pub canceled_qty: Decimal,
    /// Ledger funds unlocked back to available (quote for buys, base for sells).
    pub released_funds: Decimal,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy_limit(side: Side, price: Decimal, qty: Decimal) -> Self {
        Self::dummy_limit_for_account(AccountId::new(), side, price, qty)
    }

    pub fn dummy_limit_for_account(
        account_id: AccountId,
        side: Side,
        price: Decimal,
        qty: Decimal,
    ) -> Self {
        let reserved = match side {
            Side::Buy => price * qty,
            Side::Sell => qty,
        };
        let intent = NewOrder::limit(account_id, Symbol::new("BTC/USDT"), side, price, qty);
        Self::admit(intent, 0, reserved)
    }
}
