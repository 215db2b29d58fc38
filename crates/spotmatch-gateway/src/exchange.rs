//! The `Exchange` facade.
//!
//! This is the surface the excluded network/UI layer consumes: place and
//! cancel orders, query depth, stats, and balances, subscribe to the
//! per-instrument event stream, and move funds in and out of the ledger.
//! Each call routes to the owning instrument's executor over its command
//! channel and blocks on a one-shot reply.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{Sender, bounded};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use spotmatch_engine::{DepthSnapshot, InstrumentRegistry, MarketStatsSnapshot};
use spotmatch_ledger::{FeeSchedule, Ledger};
use spotmatch_types::{
    AccountId, BalanceEntry, CancelReceipt, EngineConfig, Instrument, NewOrder, OrderId,
    OrderReceipt, Result, SpotmatchError, Symbol, constants,
};

use crate::bus::EventStream;
use crate::executor::{self, Command, OrderRouter, Shard};
use crate::sequencer::Sequencer;

/// The matching core's public face.
pub struct Exchange {
    config: Arc<EngineConfig>,
    registry: Arc<InstrumentRegistry>,
    ledger: Arc<Ledger>,
    sequencer: Arc<Sequencer>,
    router: Arc<OrderRouter>,
    shards: RwLock<HashMap<Symbol, Shard>>,
}

impl Exchange {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let fees = FeeSchedule::from_config(&config);
        Self {
            config: Arc::new(config),
            registry: Arc::new(InstrumentRegistry::new()),
            ledger: Arc::new(Ledger::new(fees)),
            sequencer: Arc::new(Sequencer::new()),
            router: Arc::new(Mutex::new(HashMap::new())),
            shards: RwLock::new(HashMap::new()),
        }
    }

    // =================================================================
    // Bootstrap
    // =================================================================

    /// Register an instrument and start its executor.
    pub fn register_instrument(&self, instrument: Instrument) -> Result<()> {
        let instrument = self.registry.register(instrument)?;
        let symbol = instrument.symbol.clone();
        let shard = executor::spawn(
            instrument,
            Arc::clone(&self.config),
            Arc::clone(&self.ledger),
            Arc::clone(&self.sequencer),
            Arc::clone(&self.router),
        )?;
        self.shards.write().insert(symbol, shard);
        Ok(())
    }

    #[must_use]
    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    // =================================================================
    // Trading
    // =================================================================

    /// Submit an order intent.
    ///
    /// # Errors
    /// `UnknownInstrument`, the validation taxonomy, `InsufficientBalance`,
    /// or `EngineHalted`. A rejection consumes no sequence number.
    pub fn place_order(&self, intent: NewOrder) -> Result<OrderReceipt> {
        let sender = self.shard_sender(&intent.symbol)?;
        let (reply, response) = bounded(1);
        sender
            .send(Command::Place { intent, reply })
            .map_err(|_| executor_gone())?;
        response.recv().map_err(|_| executor_gone())?
    }

    /// Cancel a resting order.
    ///
    /// # Errors
    /// `OrderNotFound` if the order was never admitted (or belongs to
    /// someone else), `OrderAlreadyFilled` if a fill won the race.
    pub fn cancel_order(&self, account_id: AccountId, order_id: OrderId) -> Result<CancelReceipt> {
        let symbol = self
            .router
            .lock()
            .get(&order_id)
            .cloned()
            .ok_or(SpotmatchError::OrderNotFound(order_id))?;
        let sender = self.shard_sender(&symbol)?;
        let (reply, response) = bounded(1);
        sender
            .send(Command::Cancel {
                account_id,
                order_id,
                reply,
            })
            .map_err(|_| executor_gone())?;
        response.recv().map_err(|_| executor_gone())?
    }

    // =================================================================
    // Market data
    // =================================================================

    /// Depth snapshot; `levels == 0` means the configured default, and the
    /// result is capped at [`constants::MAX_DEPTH_LEVELS`].
    pub fn depth(&self, symbol: &Symbol, levels: usize) -> Result<DepthSnapshot> {
        let levels = if levels == 0 {
            self.config.default_depth_levels
        } else {
            levels.min(constants::MAX_DEPTH_LEVELS)
        };
        let sender = self.shard_sender(symbol)?;
        let (reply, response) = bounded(1);
        sender
            .send(Command::Depth { levels, reply })
            .map_err(|_| executor_gone())?;
        response.recv().map_err(|_| executor_gone())
    }

    /// Rolling 24h ticker for one instrument.
    pub fn market_stats(&self, symbol: &Symbol) -> Result<MarketStatsSnapshot> {
        let sender = self.shard_sender(symbol)?;
        let (reply, response) = bounded(1);
        sender
            .send(Command::Stats { reply })
            .map_err(|_| executor_gone())?;
        response.recv().map_err(|_| executor_gone())
    }

    /// Subscribe to one instrument's event stream, starting from the
    /// current sequence. History replay is a persistence collaborator's
    /// concern.
    pub fn subscribe(&self, symbol: &Symbol) -> Result<EventStream> {
        let sender = self.shard_sender(symbol)?;
        let (reply, response) = bounded(1);
        sender
            .send(Command::Subscribe { reply })
            .map_err(|_| executor_gone())?;
        response.recv().map_err(|_| executor_gone())
    }

    // =================================================================
    // Funds
    // =================================================================

    pub fn deposit(&self, account_id: AccountId, asset: &str, amount: Decimal) {
        self.ledger.deposit(account_id, asset, amount);
    }

    pub fn withdraw(&self, account_id: AccountId, asset: &str, amount: Decimal) -> Result<()> {
        self.ledger.withdraw(account_id, asset, amount)
    }

    #[must_use]
    pub fn balance(&self, account_id: AccountId, asset: &str) -> BalanceEntry {
        self.ledger.balance(account_id, asset)
    }

    /// Direct ledger access for audits and operational tooling.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // =================================================================
    // Internals
    // =================================================================

    fn shard_sender(&self, symbol: &Symbol) -> Result<Sender<Command>> {
        self.shards
            .read()
            .get(symbol)
            .map(Shard::sender)
            .ok_or_else(|| SpotmatchError::UnknownInstrument(symbol.clone()))
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn executor_gone() -> SpotmatchError {
    SpotmatchError::Internal("instrument executor is gone".to_string())
}

#[cfg(test)]
mod tests {
    use spotmatch_types::Side;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn exchange_with_btc() -> Exchange {
        let exchange = Exchange::default();
        exchange.register_instrument(Instrument::btc_usdt()).unwrap();
        exchange
    }

    #[test]
    fn duplicate_instrument_rejected() {
        let exchange = exchange_with_btc();
        let err = exchange
            .register_instrument(Instrument::btc_usdt())
            .unwrap_err();
        assert!(matches!(err, SpotmatchError::DuplicateInstrument(_)));
    }

    #[test]
    fn unknown_symbol_is_rejected_everywhere() {
        let exchange = exchange_with_btc();
        let ghost = Symbol::new("DOGE/USDT");
        assert!(matches!(
            exchange.depth(&ghost, 5).unwrap_err(),
            SpotmatchError::UnknownInstrument(_)
        ));
        assert!(matches!(
            exchange.subscribe(&ghost).unwrap_err(),
            SpotmatchError::UnknownInstrument(_)
        ));
        let intent = NewOrder::market(AccountId::new(), ghost, Side::Buy, d("1"));
        assert!(matches!(
            exchange.place_order(intent).unwrap_err(),
            SpotmatchError::UnknownInstrument(_)
        ));
    }

    #[test]
    fn cancel_of_never_admitted_order_is_not_found() {
        let exchange = exchange_with_btc();
        let err = exchange
            .cancel_order(AccountId::new(), OrderId::new())
            .unwrap_err();
        assert!(matches!(err, SpotmatchError::OrderNotFound(_)));
    }

    #[test]
    fn deposit_and_balance_roundtrip() {
        let exchange = exchange_with_btc();
        let account = AccountId::new();
        exchange.deposit(account, "USDT", d("1000"));
        assert_eq!(exchange.balance(account, "USDT").available, d("1000"));
        exchange.withdraw(account, "USDT", d("250")).unwrap();
        assert_eq!(exchange.balance(account, "USDT").available, d("750"));
    }

    #[test]
    fn depth_on_fresh_book_is_empty() {
        let exchange = exchange_with_btc();
        let depth = exchange.depth(&Symbol::new("BTC/USDT"), 0).unwrap();
        assert!(depth.bids.is_empty());
        assert!(depth.asks.is_empty());
    }
}
