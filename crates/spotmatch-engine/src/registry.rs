//! The instrument registry.
//!
//! Registration happens at bootstrap; from then on the registry is
//! effectively read-only and `get` is queried on every order intent. Reads
//! take an uncontended `RwLock` read guard over a `HashMap`, so the hot path
//! is a constant-time lookup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use spotmatch_types::{Instrument, Result, SpotmatchError, Symbol};

/// Holds the immutable definitions of every tradable instrument.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    instruments: RwLock<HashMap<Symbol, Arc<Instrument>>>,
}

impl InstrumentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new instrument.
    ///
    /// # Errors
    /// Returns `DuplicateInstrument` if the symbol is already registered.
    pub fn register(&self, instrument: Instrument) -> Result<Arc<Instrument>> {
        let mut map = self.instruments.write();
        if map.contains_key(&instrument.symbol) {
            return Err(SpotmatchError::DuplicateInstrument(instrument.symbol));
        }
        let symbol = instrument.symbol.clone();
        let instrument = Arc::new(instrument);
        map.insert(symbol.clone(), Arc::clone(&instrument));
        tracing::info!(%symbol, "instrument registered");
        Ok(instrument)
    }

    /// Look up an instrument definition.
    ///
    /// # Errors
    /// Returns `UnknownInstrument` if no instrument has this symbol.
    pub fn get(&self, symbol: &Symbol) -> Result<Arc<Instrument>> {
        self.instruments
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| SpotmatchError::UnknownInstrument(symbol.clone()))
    }

    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.instruments.read().contains_key(symbol)
    }

    /// All registered symbols, in no particular order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.instruments.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.read().is_empty()
    }
}
