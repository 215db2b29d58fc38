//! The per-instrument serial executor.
//!
//! One dedicated worker thread per instrument consumes commands from a
//! channel, so every mutating intent for that instrument runs strictly
//! one-at-a-time in admission order — the matching engine and book need no
//! internal locking. Read commands (depth, stats, subscribe) ride the same
//! queue and therefore see consistent state.
//!
//! An `EngineInvariantViolation` (from the engine or escalated from a
//! refused settlement) halts the executor: the error is logged, and every
//! subsequent mutating command is answered with `EngineHalted` until an
//! operator intervenes. Reads stay available on a halted instrument.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use spotmatch_engine::{DepthSnapshot, InstrumentEngine, MarketStatsSnapshot};
use spotmatch_ledger::Ledger;
use spotmatch_types::{
    AccountId, CancelReceipt, EngineConfig, Instrument, MarketEvent, NewOrder, Order, OrderId,
    OrderReceipt, Result, SpotmatchError, Symbol,
};

use crate::bus::{EventBus, EventStream};
use crate::sequencer::Sequencer;

/// Maps every order ever admitted to its instrument, for cancel routing.
pub(crate) type OrderRouter = Mutex<HashMap<OrderId, Symbol>>;

/// Commands accepted by an instrument executor.
pub(crate) enum Command {
    Place {
        intent: NewOrder,
        reply: Sender<Result<OrderReceipt>>,
    },
    Cancel {
        account_id: AccountId,
        order_id: OrderId,
        reply: Sender<Result<CancelReceipt>>,
    },
    Depth {
        levels: usize,
        reply: Sender<DepthSnapshot>,
    },
    Stats {
        reply: Sender<MarketStatsSnapshot>,
    },
    Subscribe {
        reply: Sender<EventStream>,
    },
}

/// Handle to a running instrument executor.
pub(crate) struct Shard {
    sender: Sender<Command>,
    _worker: thread::JoinHandle<()>,
}

impl Shard {
    pub(crate) fn sender(&self) -> Sender<Command> {
        self.sender.clone()
    }
}

/// Spawn the executor thread for one instrument.
pub(crate) fn spawn(
    instrument: Arc<Instrument>,
    config: Arc<EngineConfig>,
    ledger: Arc<Ledger>,
    sequencer: Arc<Sequencer>,
    router: Arc<OrderRouter>,
) -> Result<Shard> {
    let (sender, receiver) = unbounded();
    let name = format!("spotmatch-{}", instrument.symbol);
    let worker = thread::Builder::new()
        .name(name)
        .spawn(move || run(instrument, config, ledger, sequencer, router, receiver))
        .map_err(|e| SpotmatchError::Internal(format!("failed to spawn executor: {e}")))?;
    Ok(Shard {
        sender,
        _worker: worker,
    })
}

fn run(
    instrument: Arc<Instrument>,
    config: Arc<EngineConfig>,
    ledger: Arc<Ledger>,
    sequencer: Arc<Sequencer>,
    router: Arc<OrderRouter>,
    receiver: Receiver<Command>,
) {
    let mut executor = Executor {
        engine: InstrumentEngine::new(instrument, config),
        ledger,
        sequencer,
        router,
        bus: EventBus::new(),
        halted: false,
    };
    // Exits when the exchange drops the shard's sender.
    while let Ok(command) = receiver.recv() {
        executor.dispatch(command);
    }
}

struct Executor {
    engine: InstrumentEngine,
    ledger: Arc<Ledger>,
    sequencer: Arc<Sequencer>,
    router: Arc<OrderRouter>,
    bus: EventBus,
    halted: bool,
}

impl Executor {
    fn dispatch(&mut self, command: Command) {
        match command {
            Command::Place { intent, reply } => {
                let result = self.place(intent);
                let _ = reply.send(result);
            }
            Command::Cancel {
                account_id,
                order_id,
                reply,
            } => {
                let result = self.cancel(account_id, order_id);
                let _ = reply.send(result);
            }
            Command::Depth { levels, reply } => {
                let _ = reply.send(self.engine.depth(levels));
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.engine.market_stats());
            }
            Command::Subscribe { reply } => {
                let _ = reply.send(self.bus.subscribe());
            }
        }
    }

    fn guard_halted(&self) -> Result<()> {
        if self.halted {
            Err(SpotmatchError::EngineHalted(
                self.engine.instrument().symbol.clone(),
            ))
        } else {
            Ok(())
        }
    }

    fn halt(&mut self, err: &SpotmatchError) {
        self.halted = true;
        tracing::error!(
            symbol = %self.engine.instrument().symbol,
            %err,
            "instrument executor halted; operator intervention required"
        );
    }

    /// Validate → reserve → sequence → match → settle → publish.
    ///
    /// Validation and reservation failures return before a sequence number
    /// is drawn: a rejected intent leaves no trace in the event stream.
    fn place(&mut self, intent: NewOrder) -> Result<OrderReceipt> {
        self.guard_halted()?;
        self.engine.validate(&intent)?;
        let account_id = intent.account_id;
        let asset = self.engine.instrument().reserve_asset(intent.side).clone();
        let amount = self.engine.reservation_for(&intent);
        self.ledger.reserve(account_id, &asset, amount)?;

        let sequence = self.sequencer.next();
        let order = Order::admit(intent, sequence, amount);
        let order_id = order.id;
        let accepted = MarketEvent::OrderAccepted {
            sequence,
            order_id,
            account_id,
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            price: order.price,
            quantity: order.quantity,
        };
        self.router
            .lock()
            .insert(order_id, self.engine.instrument().symbol.clone());

        let report = match self.engine.execute(order) {
            Ok(report) => report,
            Err(err) => {
                // Reserved funds stay locked; releasing them blindly could
                // double-pay once the inconsistency is repaired.
                self.halt(&err);
                return Err(err);
            }
        };

        for trade in &report.trades {
            if let Err(err) = self.ledger.settle_trade(trade, self.engine.instrument()) {
                let err = SpotmatchError::EngineInvariantViolation {
                    reason: format!("settlement of trade {} refused: {err}", trade.id),
                };
                self.halt(&err);
                return Err(err);
            }
        }
        if !report.refund.is_zero() {
            if let Err(err) = self.ledger.release(account_id, &asset, report.refund) {
                let err = SpotmatchError::EngineInvariantViolation {
                    reason: format!("refund release for order {order_id} refused: {err}"),
                };
                self.halt(&err);
                return Err(err);
            }
        }

        let mut events = Vec::with_capacity(report.events.len() + 1);
        events.push(accepted);
        events.extend(report.events);
        self.bus.publish(&events);

        Ok(OrderReceipt {
            order_id,
            sequence,
            status: report.taker.status,
            filled_qty: report.taker.filled_qty(),
            remaining_qty: report.taker.remaining_qty,
        })
    }

    /// Cancels are sequenced like any other intent, but only draw a
    /// sequence number once the order is actually found resting.
    fn cancel(&mut self, account_id: AccountId, order_id: OrderId) -> Result<CancelReceipt> {
        self.guard_halted()?;
        let record = self.engine.cancel(account_id, order_id)?;
        let sequence = self.sequencer.next();

        let asset = self
            .engine
            .instrument()
            .reserve_asset(record.order.side)
            .clone();
        if !record.released_funds.is_zero() {
            if let Err(err) = self
                .ledger
                .release(account_id, &asset, record.released_funds)
            {
                let err = SpotmatchError::EngineInvariantViolation {
                    reason: format!("release for canceled order {order_id} refused: {err}"),
                };
                self.halt(&err);
                return Err(err);
            }
        }

        let Some(price) = record.order.limit_price() else {
            let err = SpotmatchError::EngineInvariantViolation {
                reason: format!("canceled order {order_id} was resting without a price"),
            };
            self.halt(&err);
            return Err(err);
        };
        self.bus.publish(&[
            MarketEvent::OrderCanceled {
                sequence,
                order_id,
                canceled_qty: record.order.remaining_qty,
                released_funds: record.released_funds,
            },
            MarketEvent::BookDelta {
                sequence,
                side: record.order.side,
                price,
                level_qty: record.level_qty_after,
            },
        ]);

        Ok(CancelReceipt {
            order_id,
            sequence,
            canceled_qty: record.order.remaining_qty,
            released_funds: record.released_funds,
        })
    }
}
