//! The order book for a single instrument.
//!
//! Uses `BTreeMap` for price-level ordering:
//! - **Bids** (buys): `BTreeMap<Reverse<Decimal>, PriceLevel>` -- highest price first
//! - **Asks** (sells): `BTreeMap<Decimal, PriceLevel>` -- lowest price first
//!
//! An auxiliary `HashMap<OrderId, (Side, Price)>` enables O(log P)
//! cancellation, and the top of book is cached after every mutation so
//! `best_bid`/`best_ask` reads are O(1).

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spotmatch_types::{Order, OrderId, Result, Side, SpotmatchError, Symbol};

use crate::price_level::PriceLevel;

/// Best price and aggregate quantity on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// One `(price, aggregate quantity)` row of a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// A point-in-time view of the book, best prices first on both sides.
/// Re-querying always reflects current state; this is a snapshot, not a
/// live cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// The order book for a single instrument.
#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    /// Buy side: highest price first (`Reverse` key).
    bids: BTreeMap<Reverse<Decimal>, PriceLevel>,
    /// Sell side: lowest price first.
    asks: BTreeMap<Decimal, PriceLevel>,
    /// Fast lookup: `OrderId -> (side, price)` for O(log P) cancel.
    index: HashMap<OrderId, (Side, Decimal)>,
    /// Cached tops, refreshed on every mutation so reads are O(1).
    top_bid: Option<TopOfBook>,
    top_ask: Option<TopOfBook>,
}

impl OrderBook {
    /// Create a new empty order book for the given symbol.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            top_bid: None,
            top_ask: None,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    // =================================================================
    // Mutation
    // =================================================================

    /// Rest an order at its limit price, appended to that level's FIFO queue.
    /// Matching has already consumed whatever it could; market orders never
    /// rest.
    ///
    /// Returns the level's aggregate quantity after the insert.
    pub fn add_resting(&mut self, order: Order) -> Result<Decimal> {
        if self.index.contains_key(&order.id) {
            return Err(SpotmatchError::DuplicateOrder(order.id));
        }
        let Some(price) = order.limit_price() else {
            return Err(SpotmatchError::EngineInvariantViolation {
                reason: format!("market order {} cannot rest", order.id),
            });
        };
        if order.remaining_qty <= Decimal::ZERO || order.status.is_terminal() {
            return Err(SpotmatchError::EngineInvariantViolation {
                reason: format!("order {} is not restable", order.id),
            });
        }

        self.index.insert(order.id, (order.side, price));
        let level_qty = match order.side {
            Side::Buy => {
                let level = self
                    .bids
                    .entry(Reverse(price))
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(order);
                level.total_quantity()
            }
            Side::Sell => {
                let level = self
                    .asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(order);
                level.total_quantity()
            }
        };
        self.refresh_tops();
        Ok(level_qty)
    }

    /// Withdraw a resting order. Empty levels are deleted.
    ///
    /// Returns the removed order and the level's aggregate quantity after
    /// removal (zero if the level is gone).
    ///
    /// # Errors
    /// `OrderNotFound` if the order is not resting in this book.
    pub fn remove(&mut self, order_id: &OrderId) -> Result<(Order, Decimal)> {
        let (side, price) = self
            .index
            .remove(order_id)
            .ok_or(SpotmatchError::OrderNotFound(*order_id))?;

        let (order, level_qty) = match side {
            Side::Buy => {
                let level = self
                    .bids
                    .get_mut(&Reverse(price))
                    .ok_or(SpotmatchError::OrderNotFound(*order_id))?;
                let order = level
                    .remove(order_id)
                    .ok_or(SpotmatchError::OrderNotFound(*order_id))?;
                let qty = level.total_quantity();
                if level.is_empty() {
                    self.bids.remove(&Reverse(price));
                }
                (order, qty)
            }
            Side::Sell => {
                let level = self
                    .asks
                    .get_mut(&price)
                    .ok_or(SpotmatchError::OrderNotFound(*order_id))?;
                let order = level
                    .remove(order_id)
                    .ok_or(SpotmatchError::OrderNotFound(*order_id))?;
                let qty = level.total_quantity();
                if level.is_empty() {
                    self.asks.remove(&price);
                }
                (order, qty)
            }
        };
        self.refresh_tops();
        Ok((order, level_qty))
    }

    /// Fill `qty` against the front order of the best level on `side`.
    /// Exhausted orders and emptied levels are removed.
    ///
    /// Returns the maker's updated state and the level's aggregate quantity
    /// after the fill (zero if the level is gone).
    pub fn fill_front(&mut self, side: Side, qty: Decimal) -> Result<(Order, Decimal)> {
        let (maker, level_qty) = match side {
            Side::Buy => {
                let Some((key, level)) = self.bids.iter_mut().next() else {
                    return Err(SpotmatchError::EngineInvariantViolation {
                        reason: "fill against empty bid side".to_string(),
                    });
                };
                let key = *key;
                let maker = level.fill_front(qty)?;
                let level_qty = level.total_quantity();
                if level.is_empty() {
                    self.bids.remove(&key);
                }
                (maker, level_qty)
            }
            Side::Sell => {
                let Some((key, level)) = self.asks.iter_mut().next() else {
                    return Err(SpotmatchError::EngineInvariantViolation {
                        reason: "fill against empty ask side".to_string(),
                    });
                };
                let key = *key;
                let maker = level.fill_front(qty)?;
                let level_qty = level.total_quantity();
                if level.is_empty() {
                    self.asks.remove(&key);
                }
                (maker, level_qty)
            }
        };
        if maker.remaining_qty.is_zero() {
            self.index.remove(&maker.id);
        }
        self.refresh_tops();
        Ok((maker, level_qty))
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Best (highest) bid, or `None` if no bids. O(1).
    #[must_use]
    pub fn best_bid(&self) -> Option<TopOfBook> {
        self.top_bid
    }

    /// Best (lowest) ask, or `None` if no asks. O(1).
    #[must_use]
    pub fn best_ask(&self) -> Option<TopOfBook> {
        self.top_ask
    }

    /// Spread = best ask price - best bid price. `None` if either side is empty.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.top_bid, self.top_ask) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// The front (oldest) order of the best level on `side`.
    #[must_use]
    pub fn peek_front(&self, side: Side) -> Option<&Order> {
        match side {
            Side::Buy => self.bids.values().next().and_then(PriceLevel::front),
            Side::Sell => self.asks.values().next().and_then(PriceLevel::front),
        }
    }

    /// Look at a resting order by ID.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        let (side, price) = self.index.get(order_id)?;
        match side {
            Side::Buy => self.bids.get(&Reverse(*price))?.get(order_id),
            Side::Sell => self.asks.get(price)?.get(order_id),
        }
    }

    /// Check if an order is resting in the book.
    #[must_use]
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// A depth snapshot `levels` deep per side, best prices first.
    #[must_use]
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        let row = |level: &PriceLevel| DepthLevel {
            price: level.price,
            quantity: level.total_quantity(),
        };
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.values().take(levels).map(row).collect(),
            asks: self.asks.values().take(levels).map(row).collect(),
        }
    }

    /// Total number of orders currently resting.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Number of distinct bid price levels.
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of distinct ask price levels.
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Returns `true` if the book has no orders on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // =================================================================
    // Invariants
    // =================================================================

    /// Verify structural invariants: the book is never crossed at rest,
    /// cached tops match the trees, and the index is consistent.
    ///
    /// Exercised by tests and by the engine in debug builds.
    pub fn check_invariants(&self) -> Result<()> {
        if let (Some(bid), Some(ask)) = (self.top_bid, self.top_ask) {
            if bid.price >= ask.price {
                return Err(SpotmatchError::EngineInvariantViolation {
                    reason: format!("crossed book at rest: bid {} >= ask {}", bid.price, ask.price),
                });
            }
        }

        let expect_top = |level: Option<&PriceLevel>| {
            level.map(|l| TopOfBook {
                price: l.price,
                quantity: l.total_quantity(),
            })
        };
        if self.top_bid != expect_top(self.bids.values().next()) {
            return Err(SpotmatchError::EngineInvariantViolation {
                reason: "stale cached best bid".to_string(),
            });
        }
        if self.top_ask != expect_top(self.asks.values().next()) {
            return Err(SpotmatchError::EngineInvariantViolation {
                reason: "stale cached best ask".to_string(),
            });
        }

        let resting: usize = self
            .bids
            .values()
            .chain(self.asks.values())
            .map(PriceLevel::len)
            .sum();
        if resting != self.index.len() {
            return Err(SpotmatchError::EngineInvariantViolation {
                reason: format!("index size {} != resting orders {resting}", self.index.len()),
            });
        }

        for level in self.bids.values().chain(self.asks.values()) {
            if level.is_empty() {
                return Err(SpotmatchError::EngineInvariantViolation {
                    reason: format!("empty level retained at {}", level.price),
                });
            }
            let sum: Decimal = level.iter().map(|o| o.remaining_qty).sum();
            if sum != level.total_quantity() {
                return Err(SpotmatchError::EngineInvariantViolation {
                    reason: format!("aggregate drift at level {}", level.price),
                });
            }
        }
        Ok(())
    }

    fn refresh_tops(&mut self) {
        self.top_bid = self.bids.values().next().map(|l| TopOfBook {
            price: l.price,
            quantity: l.total_quantity(),
        });
        self.top_ask = self.asks.values().next().map(|l| TopOfBook {
            price: l.price,
            quantity: l.total_quantity(),
        });
    }
}

#[cfg(test)]
mod tests {
    use spotmatch_types::Side;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn make_order(side: Side, price: &str, qty: &str) -> Order {
        Order::dummy_limit(side, d(price), d(qty))
    }

    fn book_with(orders: Vec<Order>) -> OrderBook {
        let mut book = OrderBook::new(Symbol::new("BTC/USDT"));
        for order in orders {
            book.add_resting(order).unwrap();
        }
        book
    }

    #[test]
    fn insert_and_query_tops() {
        let book = book_with(vec![
            make_order(Side::Buy, "100", "1"),
            make_order(Side::Buy, "99", "2"),
            make_order(Side::Sell, "101", "1"),
            make_order(Side::Sell, "102", "3"),
        ]);

        let bid = book.best_bid().unwrap();
        assert_eq!(bid.price, d("100"));
        assert_eq!(bid.quantity, d("1"));
        let ask = book.best_ask().unwrap();
        assert_eq!(ask.price, d("101"));
        assert_eq!(book.spread(), Some(d("1")));
        assert_eq!(book.order_count(), 4);
        book.check_invariants().unwrap();
    }

    #[test]
    fn top_aggregates_same_price() {
        let book = book_with(vec![
            make_order(Side::Buy, "100", "1"),
            make_order(Side::Buy, "100", "2.5"),
        ]);
        assert_eq!(book.best_bid().unwrap().quantity, d("3.5"));
    }

    #[test]
    fn remove_prunes_level_and_refreshes_top() {
        let o1 = make_order(Side::Buy, "100", "1");
        let o2 = make_order(Side::Buy, "99", "2");
        let id1 = o1.id;
        let mut book = book_with(vec![o1, o2]);

        let (removed, level_qty) = book.remove(&id1).unwrap();
        assert_eq!(removed.id, id1);
        assert_eq!(level_qty, Decimal::ZERO);
        assert_eq!(book.best_bid().unwrap().price, d("99"));
        assert_eq!(book.bid_depth(), 1);
        book.check_invariants().unwrap();
    }

    #[test]
    fn remove_unknown_order_errors() {
        let mut book = OrderBook::new(Symbol::new("BTC/USDT"));
        let err = book.remove(&OrderId::new()).unwrap_err();
        assert!(matches!(err, SpotmatchError::OrderNotFound(_)));
    }

    #[test]
    fn duplicate_order_rejected() {
        let order = make_order(Side::Buy, "100", "1");
        let dup = order.clone();
        let mut book = book_with(vec![order]);

        let result = book.add_resting(dup);
        assert!(matches!(result, Err(SpotmatchError::DuplicateOrder(_))));
    }

    #[test]
    fn market_order_cannot_rest() {
        let mut book = OrderBook::new(Symbol::new("BTC/USDT"));
        let intent = spotmatch_types::NewOrder::market(
            spotmatch_types::AccountId::new(),
            Symbol::new("BTC/USDT"),
            Side::Buy,
            d("1"),
        );
        let order = Order::admit(intent, 1, d("100"));
        let err = book.add_resting(order).unwrap_err();
        assert!(matches!(
            err,
            SpotmatchError::EngineInvariantViolation { .. }
        ));
    }

    #[test]
    fn fill_front_partial_keeps_maker() {
        let o1 = make_order(Side::Sell, "101", "5");
        let id1 = o1.id;
        let mut book = book_with(vec![o1]);

        let (maker, level_qty) = book.fill_front(Side::Sell, d("2")).unwrap();
        assert_eq!(maker.id, id1);
        assert_eq!(maker.remaining_qty, d("3"));
        assert_eq!(level_qty, d("3"));
        assert!(book.contains(&id1));
        assert_eq!(book.best_ask().unwrap().quantity, d("3"));
        book.check_invariants().unwrap();
    }

    #[test]
    fn fill_front_exhausts_maker_and_level() {
        let o1 = make_order(Side::Sell, "101", "2");
        let o2 = make_order(Side::Sell, "102", "1");
        let id1 = o1.id;
        let mut book = book_with(vec![o1, o2]);

        let (maker, level_qty) = book.fill_front(Side::Sell, d("2")).unwrap();
        assert!(maker.remaining_qty.is_zero());
        assert_eq!(level_qty, Decimal::ZERO);
        assert!(!book.contains(&id1));
        assert_eq!(book.best_ask().unwrap().price, d("102"));
        book.check_invariants().unwrap();
    }

    #[test]
    fn fill_front_respects_time_priority() {
        let o1 = make_order(Side::Sell, "101", "1");
        let o2 = make_order(Side::Sell, "101", "1");
        let id1 = o1.id;
        let id2 = o2.id;
        let mut book = book_with(vec![o1, o2]);

        let (first, _) = book.fill_front(Side::Sell, d("1")).unwrap();
        assert_eq!(first.id, id1, "earlier arrival must fill first");
        let (second, _) = book.fill_front(Side::Sell, d("1")).unwrap();
        assert_eq!(second.id, id2);
        assert!(book.is_empty());
    }

    #[test]
    fn fill_front_on_empty_side_is_invariant_violation() {
        let mut book = OrderBook::new(Symbol::new("BTC/USDT"));
        assert!(book.fill_front(Side::Buy, d("1")).is_err());
    }

    #[test]
    fn depth_snapshot_ordering() {
        let book = book_with(vec![
            make_order(Side::Buy, "90", "1"),
            make_order(Side::Buy, "100", "2"),
            make_order(Side::Buy, "95", "3"),
            make_order(Side::Sell, "110", "1"),
            make_order(Side::Sell, "101", "2"),
            make_order(Side::Sell, "105", "3"),
        ]);

        let depth = book.depth(2);
        let bid_prices: Vec<Decimal> = depth.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<Decimal> = depth.asks.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![d("100"), d("95")]);
        assert_eq!(ask_prices, vec![d("101"), d("105")]);
    }

    #[test]
    fn depth_is_restartable_snapshot() {
        let mut book = book_with(vec![make_order(Side::Buy, "100", "2")]);
        let before = book.depth(10);
        assert_eq!(before.bids.len(), 1);

        let extra = make_order(Side::Buy, "100", "1");
        book.add_resting(extra).unwrap();
        let after = book.depth(10);
        assert_eq!(before.bids[0].quantity, d("2"), "snapshot is immutable");
        assert_eq!(after.bids[0].quantity, d("3"), "re-query sees new state");
    }

    #[test]
    fn get_returns_resting_order() {
        let order = make_order(Side::Sell, "105", "1");
        let id = order.id;
        let account = order.account_id;
        let book = book_with(vec![order]);

        let found = book.get(&id).unwrap();
        assert_eq!(found.account_id, account);
        assert!(book.get(&OrderId::new()).is_none());
    }

    #[test]
    fn depth_snapshot_serializes() {
        let book = book_with(vec![make_order(Side::Buy, "100", "2")]);
        let json = serde_json::to_string(&book.depth(5)).unwrap();
        let back: DepthSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bids.len(), 1);
        assert_eq!(back.bids[0].price, d("100"));
    }

    #[test]
    fn empty_book() {
        let book = OrderBook::new(Symbol::new("BTC/USDT"));
        assert!(book.is_empty());
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
        assert!(book.spread().is_none());
        assert!(book.peek_front(Side::Buy).is_none());
        book.check_invariants().unwrap();
    }
}
