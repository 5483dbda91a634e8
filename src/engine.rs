// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Pilgrim Ledger Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Balance-mutation engine.
//!
//! The [`Engine`] owns the rule set for mutating customer balances: every
//! operation validates its preconditions, applies the balance change and the
//! ledger entry atomically on the account, accrues the bank-wide aggregates
//! where the rules say so, and records one audit event.
//!
//! # Operations
//!
//! - **Admin credit/debit**: direct balance changes with profit-pool accrual
//!   (2% on credit, 1% on debit).
//! - **Transfers**: internal two-account moves, fee-charging external
//!   transfers with a lifecycle shadow record, and withdrawals.
//! - **Coin mining**: manual and stepped auto-mining with a cycle bonus.
//! - **Trading**: robot trades, forex ticks, and pair trades.
//!
//! # Thread Safety
//!
//! Accounts are reached through a [`Store`] keyed by id; each account
//! serializes its own mutations behind a mutex, and two-account transfers
//! lock in ascending id order. Aggregates sit behind their own mutex.

use crate::account::{Account, MiningOutcome};
use crate::aggregates::Aggregates;
use crate::audit::{AuditEvent, AuditLog};
use crate::base::{AccountId, Currency, TransferId};
use crate::clock::Clock;
use crate::entry::{EntryKind, LedgerEntry};
use crate::error::LedgerError;
use crate::forex;
use crate::store::{MemoryStore, Store};
use crate::transfer::{TransferBook, TransferRecord, TransferRoute, WithdrawSource};
use parking_lot::Mutex;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;

/// The balance-mutation engine.
///
/// Generic over the account [`Store`]; [`MemoryStore`] is the default.
///
/// # Invariants
///
/// - No operation leaves a currency balance negative; insufficient funds
///   reject the whole operation before any mutation.
/// - Every committed mutation appends exactly one ledger entry on the
///   affected account, atomically with the balance change.
/// - Aggregate accrual follows the rules table exactly: admin credit 2% to
///   the pool plus the full amount to the main balance, admin debit 1% to
///   the pool, trading profits to the main balance, everything else nothing.
pub struct Engine<S: Store = MemoryStore> {
    store: S,
    aggregates: Mutex<Aggregates>,
    transfers: TransferBook,
    audit: AuditLog,
}

impl Engine<MemoryStore> {
    pub fn new() -> Self {
        Engine::with_store(MemoryStore::new())
    }
}

impl Default for Engine<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> Engine<S> {
    pub fn with_store(store: S) -> Self {
        Engine {
            store,
            aggregates: Mutex::new(Aggregates::new()),
            transfers: TransferBook::new(),
            audit: AuditLog::new(),
        }
    }

    // === Accounts ===

    /// Creates an account with all balances at zero.
    pub fn create_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.store.insert(Arc::new(Account::new(id)))
    }

    /// Removes an account and its ledger. Completed or pending transfer
    /// records referencing the account are left untouched.
    pub fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.store
            .remove(id)
            .map(|_| ())
            .ok_or(LedgerError::AccountNotFound)
    }

    pub fn account(&self, id: AccountId) -> Option<Arc<Account>> {
        self.store.get(id)
    }

    pub fn account_count(&self) -> usize {
        self.store.len()
    }

    /// Visits every account. Iteration order is unspecified.
    pub fn for_each_account(&self, mut f: impl FnMut(&Arc<Account>)) {
        self.store.for_each(&mut f);
    }

    fn fetch(&self, id: AccountId) -> Result<Arc<Account>, LedgerError> {
        self.store.get(id).ok_or(LedgerError::AccountNotFound)
    }

    // === Admin operations ===

    /// Admin-initiated deposit. Accrues 2% of the amount to the profit pool
    /// and the full amount to the bank main balance.
    pub fn admin_credit(
        &self,
        id: AccountId,
        currency: Currency,
        amount: Decimal,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<LedgerEntry, LedgerError> {
        let account = self.fetch(id)?;
        let entry = account.apply_credit(EntryKind::Credit, currency, amount, description, clock.now())?;
        self.aggregates.lock().record_admin_credit(amount);
        self.audit(&entry, id, "admin_credit");
        Ok(entry)
    }

    /// Admin-initiated debit. Accrues 1% of the amount to the profit pool;
    /// the main balance is untouched.
    pub fn admin_debit(
        &self,
        id: AccountId,
        currency: Currency,
        amount: Decimal,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<LedgerEntry, LedgerError> {
        let account = self.fetch(id)?;
        let entry = account.apply_debit(EntryKind::Debit, currency, amount, description, clock.now())?;
        self.aggregates.lock().record_admin_debit(amount);
        self.audit(&entry, id, "admin_debit");
        Ok(entry)
    }

    /// Credit for an incoming transfer from outside the bank. No aggregate
    /// accrual.
    pub fn receive_external(
        &self,
        id: AccountId,
        currency: Currency,
        amount: Decimal,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<LedgerEntry, LedgerError> {
        let account = self.fetch(id)?;
        let entry = account.apply_credit(EntryKind::Credit, currency, amount, description, clock.now())?;
        self.audit(&entry, id, "receive_external");
        Ok(entry)
    }

    // === Transfers ===

    /// Within-bank transfer: one debit on the sender, one credit on the
    /// recipient, committed together or not at all.
    pub fn local_transfer(
        &self,
        sender: AccountId,
        recipient: AccountId,
        currency: Currency,
        amount: Decimal,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<(LedgerEntry, LedgerEntry), LedgerError> {
        if sender == recipient {
            return Err(LedgerError::SelfTransfer);
        }
        let from = self.fetch(sender)?;
        let to = self.fetch(recipient)?;
        let (debit, credit) = from.transfer_to(&to, currency, amount, description, clock.now())?;
        self.audit(&debit, sender, "local_transfer");
        Ok((debit, credit))
    }

    /// Outbound transfer to another institution. Charges the route fee on
    /// top of the amount and opens a lifecycle record in `Pending`. The
    /// external leg never touches any balance here.
    pub fn external_transfer(
        &self,
        sender: AccountId,
        route: TransferRoute,
        currency: Currency,
        amount: Decimal,
        beneficiary: &str,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<TransferId, LedgerError> {
        let account = self.fetch(sender)?;
        let fee = route.fee(amount);
        let now = clock.now();
        let (debit, _) = account.apply_debit_with_fee(currency, amount, fee, description, now)?;
        let id = self
            .transfers
            .open(sender, amount, fee, currency, route, beneficiary, now);
        self.audit(&debit, sender, "external_transfer");
        Ok(id)
    }

    /// Withdrawal from the main balance or one of the USD profit
    /// accumulators, with a flat 1% fee against the same source.
    pub fn withdraw(
        &self,
        id: AccountId,
        source: WithdrawSource,
        amount: Decimal,
        beneficiary: &str,
        clock: &dyn Clock,
    ) -> Result<TransferId, LedgerError> {
        let account = self.fetch(id)?;
        let route = TransferRoute::Withdrawal(source);
        let fee = route.fee(amount);
        let now = clock.now();
        let (debit, _) = account.apply_withdrawal(source, amount, fee, "withdrawal", now)?;
        let transfer_id = self
            .transfers
            .open(id, amount, fee, source.currency(), route, beneficiary, now);
        self.audit(&debit, id, "withdraw");
        Ok(transfer_id)
    }

    /// Applies every lifecycle transition due at the clock's current time.
    pub fn poll_transfers(&self, clock: &dyn Clock) -> Vec<TransferId> {
        self.transfers.poll(clock.now())
    }

    pub fn transfer(&self, id: TransferId) -> Option<TransferRecord> {
        self.transfers.get(id)
    }

    // === Coin mining ===

    pub fn set_mining_active(&self, id: AccountId, active: bool) -> Result<(), LedgerError> {
        let account = self.fetch(id)?;
        account.set_mining_active(active);
        Ok(())
    }

    /// One manual mining tick.
    pub fn mine(&self, id: AccountId, clock: &dyn Clock) -> Result<MiningOutcome, LedgerError> {
        let account = self.fetch(id)?;
        let outcome = account.mine(clock.now())?;
        self.audit(&outcome.entry, id, "mine");
        Ok(outcome)
    }

    /// One auto-miner tick at the current step-table value.
    pub fn auto_mine(&self, id: AccountId, clock: &dyn Clock) -> Result<MiningOutcome, LedgerError> {
        let account = self.fetch(id)?;
        let outcome = account.auto_mine(clock.now())?;
        self.audit(&outcome.entry, id, "auto_mine");
        Ok(outcome)
    }

    // === Trading ===

    /// One robot trade. Returns `Ok(None)` when the USD balance is zero;
    /// the skip leaves no ledger entry.
    pub fn robot_trade(
        &self,
        id: AccountId,
        clock: &dyn Clock,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        let account = self.fetch(id)?;
        match account.robot_trade(clock.now()) {
            Some(entry) => {
                self.aggregates.lock().record_trading_profit(entry.amount);
                self.audit(&entry, id, "robot_trade");
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// One forex tick: a bounded random profit credited to the USD balance
    /// and the robot accumulator.
    pub fn forex_trade_tick<R: Rng + ?Sized>(
        &self,
        id: AccountId,
        rng: &mut R,
        clock: &dyn Clock,
    ) -> Result<LedgerEntry, LedgerError> {
        let account = self.fetch(id)?;
        let profit = forex::tick_profit(rng);
        let entry = account.apply_forex_profit(profit, "forex tick", clock.now())?;
        self.aggregates.lock().record_trading_profit(profit);
        self.audit(&entry, id, "forex_trade_tick");
        Ok(entry)
    }

    /// One simulated trade on a currency pair. The profit is never zero and
    /// feeds the profit accumulator rather than the robot accumulator.
    pub fn pair_trade<R: Rng + ?Sized>(
        &self,
        id: AccountId,
        pair: &str,
        rng: &mut R,
        clock: &dyn Clock,
    ) -> Result<LedgerEntry, LedgerError> {
        let account = self.fetch(id)?;
        let profit = forex::pair_profit(rng);
        let description = format!("trade on {}", pair);
        let entry = account.apply_pair_profit(profit, &description, clock.now())?;
        self.aggregates.lock().record_trading_profit(profit);
        self.audit(&entry, id, "pair_trade");
        Ok(entry)
    }

    /// Moves an account's profit accumulator into its USD main balance.
    /// Returns `Ok(None)` when there is nothing to sweep.
    pub fn sweep_profit_to_main(
        &self,
        id: AccountId,
        clock: &dyn Clock,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        let account = self.fetch(id)?;
        match account.sweep_profit_to_main(clock.now()) {
            Some(entry) => {
                self.audit(&entry, id, "sweep_profit");
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Grants the daily sync bonus once per calendar day. Same-day repeats
    /// return `Ok(None)`.
    pub fn daily_sync(
        &self,
        id: AccountId,
        clock: &dyn Clock,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        let account = self.fetch(id)?;
        let now = clock.now();
        match account.daily_sync(now.date_naive(), now) {
            Some(entry) => {
                self.audit(&entry, id, "daily_sync");
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    // === Aggregates and audit ===

    pub fn aggregates(&self) -> Aggregates {
        *self.aggregates.lock()
    }

    /// Moves the whole bank profit pool into the bank main balance.
    /// Returns the swept amount, or `None` when the pool is empty.
    pub fn sweep_profit_pool(&self) -> Option<Decimal> {
        self.aggregates.lock().sweep_pool()
    }

    /// Drains the bank-wide audit feed, oldest first.
    pub fn drain_audit(&self) -> Vec<AuditEvent> {
        self.audit.drain()
    }

    fn audit(&self, entry: &LedgerEntry, account: AccountId, operation: &'static str) {
        self.audit.record(AuditEvent {
            at: entry.at,
            account,
            operation,
            amount: entry.amount,
            currency: entry.currency,
            detail: entry.description.clone(),
        });
    }
}
