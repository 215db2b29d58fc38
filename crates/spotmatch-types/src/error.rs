//! Error types for the spotmatch matching core.
//!
//! All errors use the `SPM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Balance errors
//! - 3xx: Instrument errors
//! - 5xx: Engine errors
//! - 6xx: Settlement errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{OrderId, Symbol, TradeId};

/// Central error enum for all spotmatch operations.
#[derive(Debug, Error)]
pub enum SpotmatchError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order is not resting in the book (unknown, already
    /// canceled, or belonging to another account).
    #[error("SPM_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The intent failed validation (tick/lot/precision, missing price, etc.).
    /// Never mutates state and never consumes a sequence number.
    #[error("SPM_ERR_101: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// An order with this ID already rests in the book.
    #[error("SPM_ERR_102: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// Cancel lost the race: the order was fully filled by an
    /// earlier-sequenced intent.
    #[error("SPM_ERR_103: Order already filled: {0}")]
    OrderAlreadyFilled(OrderId),

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough available balance to reserve for the order.
    #[error("SPM_ERR_200: Insufficient available balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// Not enough locked balance to release or settle. In the settlement
    /// path this indicates broken reservation accounting and is escalated
    /// to an engine invariant violation.
    #[error("SPM_ERR_201: Insufficient locked balance")]
    InsufficientLocked,

    // =================================================================
    // Instrument Errors (3xx)
    // =================================================================
    /// No instrument registered under this symbol.
    #[error("SPM_ERR_300: Unknown instrument: {0}")]
    UnknownInstrument(Symbol),

    /// An instrument with this symbol is already registered.
    #[error("SPM_ERR_301: Duplicate instrument: {0}")]
    DuplicateInstrument(Symbol),

    // =================================================================
    // Engine Errors (5xx)
    // =================================================================
    /// The engine's own bookkeeping is inconsistent (negative remainder,
    /// illegal status transition, settlement refused mid-match). Fatal for
    /// the affected instrument: its executor halts rather than risk
    /// double-settlement.
    #[error("SPM_ERR_500: Engine invariant violation: {reason}")]
    EngineInvariantViolation { reason: String },

    /// The instrument's executor has halted after an invariant violation;
    /// mutating intents are refused until an operator intervenes.
    #[error("SPM_ERR_501: Engine halted for instrument: {0}")]
    EngineHalted(Symbol),

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// A trade has already been settled (double-settlement guard).
    #[error("SPM_ERR_600: Trade already settled: {0}")]
    TradeAlreadySettled(TradeId),

    /// Per-asset supply conservation failed an audit — critical safety alert.
    #[error("SPM_ERR_601: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SPM_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SpotmatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SpotmatchError::OrderNotFound(OrderId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("SPM_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = SpotmatchError::InsufficientBalance {
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("SPM_ERR_200"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn unknown_instrument_display() {
        let err = SpotmatchError::UnknownInstrument(Symbol::new("DOGE/USDT"));
        let msg = format!("{err}");
        assert!(msg.contains("SPM_ERR_300"));
        assert!(msg.contains("DOGE/USDT"));
    }

    #[test]
    fn all_errors_have_spm_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(SpotmatchError::InsufficientLocked),
            Box::new(SpotmatchError::OrderAlreadyFilled(OrderId::new())),
            Box::new(SpotmatchError::DuplicateInstrument(Symbol::new("BTC/USDT"))),
            Box::new(SpotmatchError::EngineHalted(Symbol::new("BTC/USDT"))),
            Box::new(SpotmatchError::TradeAlreadySettled(TradeId::new())),
            Box::new(SpotmatchError::Internal("test".into())),
            Box::new(SpotmatchError::EngineInvariantViolation {
                reason: "negative remainder".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("SPM_ERR_"),
                "Error missing SPM_ERR_ prefix: {msg}"
            );
        }
    }
}
