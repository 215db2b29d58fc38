//! # spotmatch-engine
//!
//! **Order book and continuous price-time matching for spotmatch.**
//!
//! This crate is the compute plane for a single instrument. It owns:
//!
//! - **Instrument registry**: immutable tick/lot/precision definitions
//! - **Order book**: bids/asks as price-ordered FIFO levels with a cached
//!   top-of-book and restartable depth snapshots
//! - **Matching engine**: consumes admitted intents one at a time, fills at
//!   the resting order's price, rests limit remainders, cancels market
//!   remainders
//! - **Market statistics**: a rolling 24h window over executed trades
//!
//! The engine is pure with respect to balances: it never touches the ledger.
//! Reservation amounts are computed here ([`InstrumentEngine::reservation_for`])
//! and refunds are reported in the [`ExecutionReport`], but all balance
//! mutation is the caller's (the gateway executor's) job.

pub mod matcher;
pub mod orderbook;
pub mod price_level;
pub mod registry;
pub mod stats;

pub use matcher::{CancelRecord, ExecutionReport, InstrumentEngine};
pub use orderbook::{DepthLevel, DepthSnapshot, OrderBook, TopOfBook};
pub use price_level::PriceLevel;
pub use registry::InstrumentRegistry;
pub use stats::{MarketStatsSnapshot, RollingStats};
