//! # spotmatch-types
//!
//! Shared types, errors, and configuration for the **spotmatch** matching core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`AccountId`], [`TradeId`], [`Symbol`]
//! - **Instrument model**: [`Instrument`] (tick, lot, precision rules)
//! - **Order model**: [`Order`], [`NewOrder`], [`Side`], [`OrderType`], [`OrderStatus`]
//! - **Trade model**: [`Trade`]
//! - **Balance model**: [`BalanceEntry`], [`Asset`]
//! - **Event model**: [`MarketEvent`] (the sequenced stream published per instrument)
//! - **Receipts**: [`OrderReceipt`], [`CancelReceipt`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`SpotmatchError`] with `SPM_ERR_` prefix codes

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ids;
pub mod instrument;
pub mod order;
pub mod trade;

#[cfg(any(test, feature = "test-helpers"))]
pub mod fixtures;

// Re-export all primary types at crate root for ergonomic imports:
//   use spotmatch_types::{Order, Side, Trade, Instrument, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use instrument::*;
pub use order::*;
pub use trade::*;

// Constants are accessed via `spotmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
