//! # spotmatch-gateway
//!
//! **The admission plane**: the single authority for ordering and the public
//! surface of the matching core.
//!
//! ## Architecture
//!
//! 1. **Sequencer**: one global monotonic counter; every admitted intent
//!    draws exactly one sequence number
//! 2. **Executors**: one serial worker thread per instrument — all intents
//!    for an instrument are processed strictly one at a time in admission
//!    order, so the book needs no internal locking
//! 3. **EventBus**: per-instrument fan-out of [`spotmatch_types::MarketEvent`]
//!    to subscribers, in sequence order, exactly once per subscriber
//! 4. **Exchange**: the facade the network layer calls — place/cancel,
//!    depth, stats, balances, subscriptions
//!
//! ## Order flow
//!
//! ```text
//! Exchange::place_order -> executor: validate -> Ledger::reserve
//!     -> Sequencer::next -> InstrumentEngine::execute
//!     -> Ledger::settle_trade per fill -> EventBus::publish
//! ```
//!
//! Different instruments run fully in parallel; the ledger is the only
//! shared resource, and its critical sections are short and bounded.

pub mod bus;
pub mod exchange;
mod executor;
pub mod sequencer;

pub use bus::{EventBus, EventStream};
pub use exchange::Exchange;
pub use sequencer::Sequencer;

// The read-model types callers get back from the facade.
pub use spotmatch_engine::{DepthLevel, DepthSnapshot, MarketStatsSnapshot};
