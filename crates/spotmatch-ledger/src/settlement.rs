//! Atomic trade settlement.
//!
//! Settling a trade performs four balance mutations: the seller's locked
//! base and the buyer's locked quote are debited, and each counterparty's
//! receiving side is credited net of fees. All four happen under the two
//! account locks (acquired in canonical `AccountId` order), with both debits
//! validated before anything is touched, so a refused settlement leaves
//! every balance exactly as it was.
//!
//! Fees are charged on the amount each party receives and credited to the
//! fee-collection account, keeping per-asset supply conserved across the
//! ledger as a whole.

use rust_decimal::Decimal;
use spotmatch_types::{AccountId, Instrument, Result, Side, SpotmatchError, Trade};

use crate::accounts::Ledger;

impl Ledger {
    /// Settle one trade atomically.
    ///
    /// The matching engine never produces self-trades, so `settle_trade`
    /// requires distinct counterparties; a buyer-==-seller trade here means
    /// matching is broken and is reported as an invariant violation.
    ///
    /// # Errors
    /// - `TradeAlreadySettled` if this trade was settled before
    /// - `InsufficientLocked` if either party's reservation does not cover
    ///   its debit — reservation accounting upstream is broken, and the
    ///   caller must treat this as an engine invariant violation
    pub fn settle_trade(&self, trade: &Trade, instrument: &Instrument) -> Result<()> {
        let buyer = trade.buyer_account();
        let seller = trade.seller_account();
        if buyer == seller {
            return Err(SpotmatchError::EngineInvariantViolation {
                reason: format!("trade {} settles an account against itself", trade.id),
            });
        }

        let base = instrument.base_asset.as_str();
        let quote = instrument.quote_asset.as_str();
        let buyer_is_maker = trade.maker_side == Side::Buy;
        let base_fee = self.fees.fee_for(trade.quantity, buyer_is_maker);
        let quote_fee = self.fees.fee_for(trade.quote_amount, !buyer_is_maker);

        {
            // Canonical lock order prevents deadlock against concurrent
            // settlements touching the same accounts from other executors.
            let (first, second) = if buyer < seller {
                (buyer, seller)
            } else {
                (seller, buyer)
            };
            let first_handle = self.account(first);
            let second_handle = self.account(second);
            let mut first_balances = first_handle.lock();
            let mut second_balances = second_handle.lock();
            let (buyer_balances, seller_balances) = if buyer == first {
                (&mut *first_balances, &mut *second_balances)
            } else {
                (&mut *second_balances, &mut *first_balances)
            };

            // Validate both debits before mutating anything.
            let seller_base = seller_balances
                .get(base)
                .map_or(Decimal::ZERO, |e| e.locked);
            if seller_base < trade.quantity {
                return Err(SpotmatchError::InsufficientLocked);
            }
            let buyer_quote = buyer_balances
                .get(quote)
                .map_or(Decimal::ZERO, |e| e.locked);
            if buyer_quote < trade.quote_amount {
                return Err(SpotmatchError::InsufficientLocked);
            }

            self.guard.lock().record(trade.id)?;

            // Base: seller's locked -> buyer's available, net of fee.
            if let Some(entry) = seller_balances.get_mut(base) {
                entry.locked -= trade.quantity;
            }
            buyer_balances.entry(base.to_string()).or_default().available +=
                trade.quantity - base_fee;

            // Quote: buyer's locked -> seller's available, net of fee.
            if let Some(entry) = buyer_balances.get_mut(quote) {
                entry.locked -= trade.quote_amount;
            }
            seller_balances.entry(quote.to_string()).or_default().available +=
                trade.quote_amount - quote_fee;
        }

        if !base_fee.is_zero() {
            self.credit_available(AccountId::fee_collector(), base, base_fee);
        }
        if !quote_fee.is_zero() {
            self.credit_available(AccountId::fee_collector(), quote, quote_fee);
        }

        tracing::debug!(
            trade_id = %trade.id,
            price = %trade.price,
            quantity = %trade.quantity,
            "trade settled"
        );
        Ok(())
    }
}
