//! System-wide constants for the spotmatch matching core.

/// Default maker fee in basis points of the received amount.
pub const DEFAULT_MAKER_FEE_BPS: u32 = 10;

/// Default taker fee in basis points of the received amount.
pub const DEFAULT_TAKER_FEE_BPS: u32 = 20;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Decimal places fees are rounded down to.
pub const FEE_PRECISION: u32 = 8;

/// Default number of price levels returned by a depth query.
pub const DEFAULT_DEPTH_LEVELS: usize = 50;

/// Hard cap on price levels per side in a depth snapshot.
pub const MAX_DEPTH_LEVELS: usize = 500;

/// Rolling market-statistics window in seconds (24 hours).
pub const STATS_WINDOW_SECS: i64 = 86_400;

/// Double-settlement guard capacity (number of trade IDs remembered).
pub const SETTLEMENT_GUARD_CAPACITY: usize = 500_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "spotmatch";
