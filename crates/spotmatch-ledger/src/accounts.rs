//! The ledger: the single owner of all balance state.
//!
//! Balances are sharded per account: the outer map hands out
//! `Arc<Mutex<...>>` handles, and every operation locks only the accounts it
//! touches, for a short and bounded critical section. This is what lets
//! instrument executors settle in parallel without racing each other on
//! shared accounts.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use spotmatch_types::{
    AccountId, Asset, BalanceEntry, Result, SpotmatchError, constants,
};

use crate::conservation::SupplyAudit;
use crate::fees::FeeSchedule;
use crate::guard::SettlementGuard;

pub(crate) type AccountBalances = HashMap<Asset, BalanceEntry>;

/// Per-(account, asset) available/locked balances.
pub struct Ledger {
    pub(crate) fees: FeeSchedule,
    pub(crate) accounts: RwLock<HashMap<AccountId, Arc<Mutex<AccountBalances>>>>,
    pub(crate) audit: Mutex<SupplyAudit>,
    pub(crate) guard: Mutex<SettlementGuard>,
}

impl Ledger {
    #[must_use]
    pub fn new(fees: FeeSchedule) -> Self {
        Self {
            fees,
            accounts: RwLock::new(HashMap::new()),
            audit: Mutex::new(SupplyAudit::new()),
            guard: Mutex::new(SettlementGuard::new(
                constants::SETTLEMENT_GUARD_CAPACITY,
            )),
        }
    }

    #[must_use]
    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    /// The lock handle for one account, created on first use.
    pub(crate) fn account(&self, account_id: AccountId) -> Arc<Mutex<AccountBalances>> {
        if let Some(handle) = self.accounts.read().get(&account_id) {
            return Arc::clone(handle);
        }
        let mut map = self.accounts.write();
        Arc::clone(map.entry(account_id).or_default())
    }

    // =================================================================
    // Deposits / withdrawals
    // =================================================================

    /// Credit available balance from outside the system.
    pub fn deposit(&self, account_id: AccountId, asset: &str, amount: Decimal) {
        let handle = self.account(account_id);
        let mut balances = handle.lock();
        balances.entry(asset.to_string()).or_default().available += amount;
        drop(balances);
        self.audit.lock().record_deposit(asset, amount);
    }

    /// Debit available balance out of the system.
    ///
    /// # Errors
    /// `InsufficientBalance` if available funds do not cover `amount`.
    pub fn withdraw(&self, account_id: AccountId, asset: &str, amount: Decimal) -> Result<()> {
        let handle = self.account(account_id);
        let mut balances = handle.lock();
        let entry = balances.entry(asset.to_string()).or_default();
        if entry.available < amount {
            return Err(SpotmatchError::InsufficientBalance {
                needed: amount,
                available: entry.available,
            });
        }
        entry.available -= amount;
        drop(balances);
        self.audit.lock().record_withdrawal(asset, amount);
        Ok(())
    }

    // =================================================================
    // Reservations
    // =================================================================

    /// Move `amount` from available to locked, backing a new order.
    ///
    /// # Errors
    /// `InsufficientBalance` if available funds do not cover `amount`.
    /// Nothing is mutated on failure.
    pub fn reserve(&self, account_id: AccountId, asset: &str, amount: Decimal) -> Result<()> {
        let handle = self.account(account_id);
        let mut balances = handle.lock();
        let entry = balances.entry(asset.to_string()).or_default();
        if entry.available < amount {
            return Err(SpotmatchError::InsufficientBalance {
                needed: amount,
                available: entry.available,
            });
        }
        entry.available -= amount;
        entry.locked += amount;
        Ok(())
    }

    /// Return previously reserved funds from locked back to available
    /// (cancel of an unmatched remainder, or a price-improvement refund).
    ///
    /// # Errors
    /// `InsufficientLocked` if locked funds do not cover `amount`.
    pub fn release(&self, account_id: AccountId, asset: &str, amount: Decimal) -> Result<()> {
        let handle = self.account(account_id);
        let mut balances = handle.lock();
        let entry = balances.entry(asset.to_string()).or_default();
        if entry.locked < amount {
            return Err(SpotmatchError::InsufficientLocked);
        }
        entry.locked -= amount;
        entry.available += amount;
        Ok(())
    }

    /// Credit available balance internally (fee collection).
    pub(crate) fn credit_available(&self, account_id: AccountId, asset: &str, amount: Decimal) {
        let handle = self.account(account_id);
        handle.lock().entry(asset.to_string()).or_default().available += amount;
    }

    // =================================================================
    // Read path
    // =================================================================

    /// Balance for an (account, asset) pair; zero if never touched.
    #[must_use]
    pub fn balance(&self, account_id: AccountId, asset: &str) -> BalanceEntry {
        self.account(account_id)
            .lock()
            .get(asset)
            .cloned()
            .unwrap_or_default()
    }

    /// Sum of available + locked across all accounts for one asset.
    #[must_use]
    pub fn total_supply(&self, asset: &str) -> Decimal {
        let handles: Vec<Arc<Mutex<AccountBalances>>> =
            self.accounts.read().values().map(Arc::clone).collect();
        handles
            .iter()
            .map(|handle| {
                handle
                    .lock()
                    .get(asset)
                    .map_or(Decimal::ZERO, BalanceEntry::total)
            })
            .sum()
    }

    /// Audit one asset: balance sum must equal deposits − withdrawals.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` if funds were created or destroyed.
    pub fn verify_supply(&self, asset: &str) -> Result<()> {
        let actual = self.total_supply(asset);
        let result = self.audit.lock().verify(asset, actual);
        if let Err(ref err) = result {
            tracing::error!(%asset, %err, "supply conservation audit failed");
        }
        result
    }

    /// Audit every asset that ever saw a deposit or withdrawal.
    pub fn verify_all_supplies(&self) -> Result<()> {
        let assets = self.audit.lock().tracked_assets();
        for asset in assets {
            self.verify_supply(&asset)?;
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(FeeSchedule::default())
    }
}
