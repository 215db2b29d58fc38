//! # spotmatch-ledger
//!
//! **The balance plane**: per-(account, asset) available/locked balances and
//! the only component allowed to mutate them.
//!
//! ## Architecture
//!
//! 1. **Ledger**: sharded per-account balances behind short-lived locks
//! 2. **Reservations**: `reserve` / `release` move funds between available
//!    and locked when orders are admitted or canceled
//! 3. **Settlement**: `settle_trade` transfers locked funds between the two
//!    counterparties atomically, net of fees
//! 4. **FeeSchedule**: fixed maker/taker basis points, rounded down
//! 5. **SettlementGuard**: each trade settles exactly once
//! 6. **SupplyAudit**: Σ(available + locked) per asset always equals
//!    deposits − withdrawals (fees stay inside, on the fee-collection
//!    account)
//!
//! The ledger is the one resource shared across instrument executors, so
//! every critical section here is short and bounded: at most two account
//! locks held at once, acquired in canonical `AccountId` order.

pub mod accounts;
pub mod conservation;
pub mod fees;
pub mod guard;
pub mod settlement;

pub use accounts::Ledger;
pub use conservation::SupplyAudit;
pub use fees::FeeSchedule;
pub use guard::SettlementGuard;
