//! Rolling market statistics per instrument.
//!
//! Tracks executed trades over a sliding 24-hour window and derives the
//! ticker numbers a market-data consumer expects: last price, 24h high/low,
//! 24h volume, plus top-of-book and spread taken from the live book at query
//! time. Recording never mutates matching state.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spotmatch_types::{Symbol, Trade, constants};

/// Point-in-time ticker for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStatsSnapshot {
    pub symbol: Symbol,
    pub last_price: Option<Decimal>,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    pub volume_24h: Decimal,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub spread: Option<Decimal>,
    pub as_of: DateTime<Utc>,
}

/// One print retained inside the window.
#[derive(Debug, Clone, Copy)]
struct Print {
    at: DateTime<Utc>,
    price: Decimal,
    quantity: Decimal,
}

/// Sliding window over executed trades.
#[derive(Debug)]
pub struct RollingStats {
    window: Duration,
    prints: VecDeque<Print>,
    last_price: Option<Decimal>,
}

impl RollingStats {
    /// Standard 24-hour window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Duration::seconds(constants::STATS_WINDOW_SECS))
    }

    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            prints: VecDeque::new(),
            last_price: None,
        }
    }

    /// Record one executed trade.
    pub fn record(&mut self, trade: &Trade) {
        self.last_price = Some(trade.price);
        self.prints.push_back(Print {
            at: trade.executed_at,
            price: trade.price,
            quantity: trade.quantity,
        });
    }

    /// Drop prints older than the window relative to `now`.
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while self.prints.front().is_some_and(|p| p.at < cutoff) {
            self.prints.pop_front();
        }
    }

    /// Current ticker, merging windowed trade data with live top-of-book.
    pub fn snapshot(
        &mut self,
        symbol: Symbol,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
    ) -> MarketStatsSnapshot {
        let now = Utc::now();
        self.prune(now);

        let mut high = None;
        let mut low = None;
        let mut volume = Decimal::ZERO;
        for print in &self.prints {
            volume += print.quantity;
            high = Some(high.map_or(print.price, |h: Decimal| h.max(print.price)));
            low = Some(low.map_or(print.price, |l: Decimal| l.min(print.price)));
        }

        let spread = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        };

        MarketStatsSnapshot {
            symbol,
            last_price: self.last_price,
            high_24h: high,
            low_24h: low,
            volume_24h: volume,
            best_bid,
            best_ask,
            spread,
            as_of: now,
        }
    }
}

impl Default for RollingStats {
    fn default() -> Self {
        Self::new()
    }
}
