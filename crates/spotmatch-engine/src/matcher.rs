//! The continuous price-time matching engine for one instrument.
//!
//! One [`InstrumentEngine`] per instrument, driven serially by that
//! instrument's executor. Per incoming intent the state machine is:
//!
//! ```text
//! Received -> Validated -> Matching -> FullyFilled
//!                                    | PartiallyResting
//!                                    | FullyResting
//!                                    | Canceled(remainder)   (market / self-trade)
//!                                    | Rejected              (validation, pre-sequence)
//! ```
//!
//! Fills always execute at the **resting order's price**; price improvement
//! goes to the taker and the improvement delta is reported back as a refund
//! so the caller can release it from locked balance.
//!
//! The engine never touches the ledger. It computes reservation amounts
//! ([`InstrumentEngine::reservation_for`]) and reports refunds; settlement is
//! the gateway's job. Any internal inconsistency is returned as
//! `EngineInvariantViolation` and must halt this instrument's executor.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use spotmatch_types::{
    AccountId, EngineConfig, Instrument, MarketEvent, NewOrder, Order, OrderId, OrderStatus,
    OrderType, Result, Side, SpotmatchError, Trade, TradeId,
};

use crate::orderbook::{DepthSnapshot, OrderBook};
use crate::stats::{MarketStatsSnapshot, RollingStats};

/// Everything that happened while processing one admitted intent.
#[derive(Debug)]
pub struct ExecutionReport {
    /// The taker's final state.
    pub taker: Order,
    /// Fills in execution order. `trades[i].id` is deterministic from the
    /// taker's sequence number and `i`.
    pub trades: Vec<Trade>,
    /// Events to publish, in order, all tagged with the taker's sequence.
    pub events: Vec<MarketEvent>,
    /// Locked funds to release back to the taker's account after the fills
    /// settle: price-improvement deltas plus any canceled remainder's
    /// reservation (quote for buys, base for sells).
    pub refund: Decimal,
}

/// Result of a successful cancel.
#[derive(Debug)]
pub struct CancelRecord {
    /// The removed order, now `Canceled`.
    pub order: Order,
    /// Locked funds to release back to the owner.
    pub released_funds: Decimal,
    /// Aggregate quantity left at the order's price level (zero = level gone).
    pub level_qty_after: Decimal,
}

/// The matching engine and book for a single instrument.
pub struct InstrumentEngine {
    instrument: Arc<Instrument>,
    config: Arc<EngineConfig>,
    book: OrderBook,
    stats: RollingStats,
    /// Terminal statuses, kept so a late cancel can distinguish
    /// "already filled" from "never heard of it".
    completed: HashMap<OrderId, OrderStatus>,
}

impl InstrumentEngine {
    #[must_use]
    pub fn new(instrument: Arc<Instrument>, config: Arc<EngineConfig>) -> Self {
        let book = OrderBook::new(instrument.symbol.clone());
        Self {
            instrument,
            config,
            book,
            stats: RollingStats::new(),
            completed: HashMap::new(),
        }
    }

    #[must_use]
    pub fn instrument(&self) -> &Arc<Instrument> {
        &self.instrument
    }

    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    // =================================================================
    // Validation & reservation
    // =================================================================

    /// Structural validation of an intent. Never mutates state; a failure
    /// here must not consume a sequence number.
    pub fn validate(&self, intent: &NewOrder) -> Result<()> {
        if intent.symbol != self.instrument.symbol {
            return Err(SpotmatchError::InvalidOrder {
                reason: format!(
                    "intent for {} routed to {} engine",
                    intent.symbol, self.instrument.symbol
                ),
            });
        }
        self.instrument.validate_quantity(intent.quantity)?;
        match (intent.order_type, intent.price) {
            (OrderType::Limit, Some(price)) => self.instrument.validate_price(price),
            (OrderType::Limit, None) => Err(SpotmatchError::InvalidOrder {
                reason: "limit order requires a price".to_string(),
            }),
            (OrderType::Market, None) => Ok(()),
            (OrderType::Market, Some(_)) => Err(SpotmatchError::InvalidOrder {
                reason: "market order must not carry a price".to_string(),
            }),
        }
    }

    /// The amount of the reserve asset (quote for buys, base for sells) the
    /// ledger must lock before this intent is admitted.
    ///
    /// Limit buys reserve worst-case notional. Market buys reserve a
    /// conservative upper bound: best ask × quantity × configured factor;
    /// the matching loop additionally stops once the budget cannot buy one
    /// more lot, so the bound is safe even when the book is walked deep.
    #[must_use]
    pub fn reservation_for(&self, intent: &NewOrder) -> Decimal {
        match (intent.side, intent.order_type, intent.price) {
            (Side::Sell, _, _) => intent.quantity,
            (Side::Buy, OrderType::Limit, Some(price)) => price * intent.quantity,
            (Side::Buy, OrderType::Market, _) => self.book.best_ask().map_or(
                Decimal::ZERO,
                |top| top.price * intent.quantity * self.config.market_buy_reserve_factor,
            ),
            // unreachable after validate(); reserve nothing rather than guess
            (Side::Buy, OrderType::Limit, None) => Decimal::ZERO,
        }
    }

    // =================================================================
    // Matching
    // =================================================================

    /// Process one admitted order: match, then rest or cancel the remainder.
    ///
    /// # Errors
    /// `EngineInvariantViolation` means the engine state is inconsistent and
    /// the caller must halt this instrument.
    pub fn execute(&mut self, mut taker: Order) -> Result<ExecutionReport> {
        let sequence = taker.sequence;
        let opposite = taker.side.opposite();
        let mut trades: Vec<Trade> = Vec::new();
        let mut events: Vec<MarketEvent> = Vec::new();
        let mut refund = Decimal::ZERO;
        let mut self_trade = false;

        while !taker.remaining_qty.is_zero() {
            let Some(front) = self.book.peek_front(opposite) else {
                break;
            };
            let Some(maker_price) = front.limit_price() else {
                return Err(SpotmatchError::EngineInvariantViolation {
                    reason: format!("resting order {} has no price", front.id),
                });
            };
            if !taker.crosses(maker_price) {
                break;
            }
            if front.account_id == taker.account_id {
                // Never trade an account against itself; cancel the taker's
                // remainder instead of resting a crossing order.
                self_trade = true;
                break;
            }

            let mut qty = taker.remaining_qty.min(front.remaining_qty);
            if taker.side == Side::Buy && taker.order_type == OrderType::Market {
                let affordable = self
                    .instrument
                    .align_quantity_down(taker.reserved / maker_price);
                if affordable.is_zero() {
                    break;
                }
                qty = qty.min(affordable);
            }

            let notional = maker_price * qty;
            let charged = match (taker.side, taker.limit_price()) {
                (Side::Buy, Some(limit)) => {
                    refund += (limit - maker_price) * qty;
                    limit * qty
                }
                (Side::Buy, None) => notional,
                (Side::Sell, _) => qty,
            };
            if charged > taker.reserved {
                return Err(SpotmatchError::EngineInvariantViolation {
                    reason: format!(
                        "order {} fill charge {charged} exceeds reservation {}",
                        taker.id, taker.reserved
                    ),
                });
            }

            let (maker, level_qty) = self.book.fill_front(opposite, qty)?;

            taker.remaining_qty -= qty;
            taker.reserved -= charged;
            let next_status = if taker.remaining_qty.is_zero() {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            taker.transition(next_status)?;

            if maker.status.is_terminal() {
                self.completed.insert(maker.id, maker.status);
            }

            #[allow(clippy::cast_possible_truncation)]
            let fill_index = trades.len() as u64;
            let trade = Trade {
                id: TradeId::deterministic(sequence, fill_index),
                symbol: self.instrument.symbol.clone(),
                maker_order_id: maker.id,
                taker_order_id: taker.id,
                maker_account_id: maker.account_id,
                taker_account_id: taker.account_id,
                price: maker_price,
                quantity: qty,
                quote_amount: notional,
                maker_side: maker.side,
                sequence,
                executed_at: Utc::now(),
            };
            self.stats.record(&trade);
            tracing::debug!(
                symbol = %self.instrument.symbol,
                price = %maker_price,
                quantity = %qty,
                "trade executed"
            );

            events.push(MarketEvent::TradePrinted {
                sequence,
                trade: trade.clone(),
            });
            events.push(MarketEvent::OrderFilled {
                sequence,
                order_id: maker.id,
                fill_qty: qty,
                remaining_qty: maker.remaining_qty,
                status: maker.status,
            });
            events.push(MarketEvent::BookDelta {
                sequence,
                side: opposite,
                price: maker_price,
                level_qty,
            });
            trades.push(trade);
        }

        if !trades.is_empty() {
            events.push(MarketEvent::OrderFilled {
                sequence,
                order_id: taker.id,
                fill_qty: taker.filled_qty(),
                remaining_qty: taker.remaining_qty,
                status: taker.status,
            });
        }

        if taker.remaining_qty.is_zero() {
            // Fully filled; a market buy may still hold unspent budget.
            if !taker.reserved.is_zero() {
                if taker.order_type == OrderType::Limit {
                    return Err(SpotmatchError::EngineInvariantViolation {
                        reason: format!(
                            "filled limit order {} left reservation {}",
                            taker.id, taker.reserved
                        ),
                    });
                }
                refund += taker.reserved;
                taker.reserved = Decimal::ZERO;
            }
        } else if taker.order_type == OrderType::Market || self_trade {
            // Unfillable remainder is canceled, never rested.
            let canceled_qty = taker.remaining_qty;
            let released = taker.reserved;
            refund += released;
            taker.reserved = Decimal::ZERO;
            taker.transition(OrderStatus::Canceled)?;
            events.push(MarketEvent::OrderCanceled {
                sequence,
                order_id: taker.id,
                canceled_qty,
                released_funds: released,
            });
        } else {
            let Some(price) = taker.limit_price() else {
                return Err(SpotmatchError::EngineInvariantViolation {
                    reason: format!("order {} cannot rest without a price", taker.id),
                });
            };
            let level_qty = self.book.add_resting(taker.clone())?;
            events.push(MarketEvent::BookDelta {
                sequence,
                side: taker.side,
                price,
                level_qty,
            });
        }

        if taker.status.is_terminal() {
            self.completed.insert(taker.id, taker.status);
        }

        #[cfg(debug_assertions)]
        self.book.check_invariants()?;

        Ok(ExecutionReport {
            taker,
            trades,
            events,
            refund,
        })
    }

    // =================================================================
    // Cancellation
    // =================================================================

    /// Cancel a resting order.
    ///
    /// A cancel is sequenced like any other intent: it either finds the
    /// order still resting, or loses the race to an earlier fill.
    ///
    /// # Errors
    /// - `OrderAlreadyFilled` if the order terminated as `Filled`
    /// - `OrderNotFound` if unknown, already canceled, or owned by someone else
    pub fn cancel(&mut self, account_id: AccountId, order_id: OrderId) -> Result<CancelRecord> {
        match self.book.get(&order_id) {
            Some(resting) if resting.account_id == account_id => {}
            Some(_) => return Err(SpotmatchError::OrderNotFound(order_id)),
            None => {
                return Err(match self.completed.get(&order_id) {
                    Some(OrderStatus::Filled) => SpotmatchError::OrderAlreadyFilled(order_id),
                    _ => SpotmatchError::OrderNotFound(order_id),
                });
            }
        }

        let (mut order, level_qty_after) = self.book.remove(&order_id)?;
        let released_funds = order.reserved;
        order.reserved = Decimal::ZERO;
        order.transition(OrderStatus::Canceled)?;
        self.completed.insert(order.id, OrderStatus::Canceled);

        Ok(CancelRecord {
            order,
            released_funds,
            level_qty_after,
        })
    }

    // =================================================================
    // Read path
    // =================================================================

    /// Depth snapshot `levels` deep per side.
    #[must_use]
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        self.book.depth(levels)
    }

    /// Current ticker for this instrument.
    pub fn market_stats(&mut self) -> MarketStatsSnapshot {
        let best_bid = self.book.best_bid().map(|t| t.price);
        let best_ask = self.book.best_ask().map(|t| t.price);
        self.stats
            .snapshot(self.instrument.symbol.clone(), best_bid, best_ask)
    }
}
