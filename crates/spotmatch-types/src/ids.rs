//! Identifiers used throughout spotmatch.
//!
//! Entity IDs use UUIDv7 for time-ordered lexicographic sorting. `TradeId`
//! additionally offers a deterministic constructor so that a replayed event
//! log regenerates the exact same trade identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Globally unique order identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Unique identifier for a trading account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The well-known account that accumulates trading fees.
    ///
    /// Using the nil UUID keeps it stable across restarts and replay.
    #[must_use]
    pub const fn fee_collector() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the fee-collection account.
    #[must_use]
    pub fn is_fee_collector(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TradeId
// ---------------------------------------------------------------------------

/// Globally unique trade identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TradeId(pub Uuid);

impl TradeId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Deterministic `TradeId` from the taker intent's sequence number and
    /// the zero-based fill index within that intent.
    ///
    /// Replaying the same admitted intents regenerates the exact same trade
    /// identifiers, which is what makes the sequenced event stream a viable
    /// durability mechanism.
    #[must_use]
    pub fn deterministic(sequence: u64, fill_index: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"spotmatch:trade_id:v1:");
        hasher.update(sequence.to_le_bytes());
        hasher.update(fill_index.to_le_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// An instrument symbol (e.g., "BTC/USDT").
///
/// The symbol is the routing key for every order intent and subscription;
/// the full [`crate::Instrument`] definition lives in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_uniqueness() {
        let a = OrderId::new();
        let b = OrderId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn order_id_ordering() {
        let a = OrderId::new();
        let b = OrderId::new();
        assert!(a < b);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn order_id_timestamp_extraction() {
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let id = OrderId::new();
        let after = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = id.timestamp_ms();
        assert!(
            ts >= before && ts <= after,
            "ts={ts}, before={before}, after={after}"
        );
    }

    #[test]
    fn fee_collector_is_stable() {
        assert_eq!(AccountId::fee_collector(), AccountId::fee_collector());
        assert!(AccountId::fee_collector().is_fee_collector());
        assert!(!AccountId::new().is_fee_collector());
    }

    #[test]
    fn trade_id_deterministic() {
        let a = TradeId::deterministic(100, 0);
        let b = TradeId::deterministic(100, 0);
        assert_eq!(a, b);
        let c = TradeId::deterministic(100, 1);
        assert_ne!(a, c);
        let d = TradeId::deterministic(101, 0);
        assert_ne!(a, d);
    }

    #[test]
    fn symbol_display() {
        let sym = Symbol::new("BTC/USDT");
        assert_eq!(sym.to_string(), "BTC/USDT");
        assert_eq!(sym.as_str(), "BTC/USDT");
    }

    #[test]
    fn serde_roundtrips() {
        let oid = OrderId::new();
        let json = serde_json::to_string(&oid).unwrap();
        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(oid, back);

        let sym = Symbol::new("ETH/USDT");
        let json = serde_json::to_string(&sym).unwrap();
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(sym, back);
    }
}
