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

//! Customer accounts.
//!
//! All balance state lives behind one mutex per account. Every mutation
//! validates first, then applies the balance change and appends the ledger
//! entry under the same lock, so an observer never sees one without the
//! other. Two-account transfers lock both accounts in ascending id order.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use pilgrim_ledger::{Account, AccountId, Currency};
//!
//! let account = Account::new(AccountId(1));
//! assert_eq!(account.balance(Currency::Ngn), dec!(0));
//! ```

use crate::base::{AccountId, Currency};
use crate::coin;
use crate::entry::{EntryKind, LedgerEntry};
use crate::error::LedgerError;
use crate::forex::ROBOT_RATE;
use crate::transfer::WithdrawSource;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashMap;

/// USD credited by the once-a-day sync bonus.
pub const SYNC_BONUS_USD: Decimal = dec!(5.00);

/// Keyed multi-currency balance map.
///
/// The single mutation primitive for main balances. `debit` enforces the
/// non-negativity invariant and reports the shortfall; no caller branches on
/// currency.
#[derive(Debug, Default, Clone)]
pub struct Balances {
    amounts: HashMap<Currency, Decimal>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, currency: Currency) -> Decimal {
        self.amounts.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn credit(&mut self, currency: Currency, amount: Decimal) {
        *self.amounts.entry(currency).or_insert(Decimal::ZERO) += amount;
    }

    pub fn debit(&mut self, currency: Currency, amount: Decimal) -> Result<(), LedgerError> {
        let balance = self.get(currency);
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                currency,
                shortfall: amount - balance,
            });
        }
        self.amounts.insert(currency, balance - amount);
        Ok(())
    }
}

/// Pilgrim Coin mining state.
#[derive(Debug, Clone)]
pub struct CoinWallet {
    pub coin_balance: Decimal,
    /// PGM accumulated toward the current cycle target.
    pub accumulated: Decimal,
    /// Auto-miner position in the step table.
    pub step: usize,
    pub mining_active: bool,
}

impl Default for CoinWallet {
    fn default() -> Self {
        Self {
            coin_balance: Decimal::ZERO,
            accumulated: Decimal::ZERO,
            step: 0,
            mining_active: false,
        }
    }
}

/// Result of one committed mining tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningOutcome {
    /// PGM minted by this tick, bonus excluded.
    pub minted: Decimal,
    /// USD credited to the main balance for the minted quantity.
    pub usd_credited: Decimal,
    pub cycle_completed: bool,
    pub entry: LedgerEntry,
}

#[derive(Debug)]
struct AccountData {
    balances: Balances,
    profit_balance: Decimal,
    robot_profit: Decimal,
    wallet: CoinWallet,
    last_sync: Option<NaiveDate>,
    /// Append-only, chronological.
    ledger: Vec<LedgerEntry>,
}

impl AccountData {
    fn new() -> Self {
        Self {
            balances: Balances::new(),
            profit_balance: Decimal::ZERO,
            robot_profit: Decimal::ZERO,
            wallet: CoinWallet::default(),
            last_sync: None,
            ledger: Vec::new(),
        }
    }

    fn assert_invariants(&self) {
        for currency in Currency::ALL {
            debug_assert!(
                self.balances.get(currency) >= Decimal::ZERO,
                "Invariant violated: {} balance went negative: {}",
                currency,
                self.balances.get(currency)
            );
        }
        debug_assert!(self.profit_balance >= Decimal::ZERO);
        debug_assert!(self.robot_profit >= Decimal::ZERO);
        debug_assert!(self.wallet.coin_balance >= Decimal::ZERO);
        debug_assert!(self.wallet.accumulated < coin::CYCLE_TARGET);
    }

    fn append(&mut self, entry: LedgerEntry) -> LedgerEntry {
        self.ledger.push(entry.clone());
        self.assert_invariants();
        entry
    }

    fn credit(
        &mut self,
        kind: EntryKind,
        currency: Currency,
        amount: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        validate_amount(amount)?;
        self.balances.credit(currency, amount);
        Ok(self.append(LedgerEntry::new(at, kind, amount, currency, description)))
    }

    fn debit(
        &mut self,
        kind: EntryKind,
        currency: Currency,
        amount: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        validate_amount(amount)?;
        self.balances.debit(currency, amount)?;
        Ok(self.append(LedgerEntry::new(at, kind, amount, currency, description)))
    }
}

fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(())
}

/// One customer account.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    inner: Mutex<AccountData>,
}

impl Account {
    const FIAT_PRECISION: u32 = 2;
    const COIN_PRECISION: u32 = 8;

    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            inner: Mutex::new(AccountData::new()),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn balance(&self, currency: Currency) -> Decimal {
        self.inner.lock().balances.get(currency)
    }

    pub fn profit_balance(&self) -> Decimal {
        self.inner.lock().profit_balance
    }

    pub fn robot_profit(&self) -> Decimal {
        self.inner.lock().robot_profit
    }

    pub fn wallet(&self) -> CoinWallet {
        self.inner.lock().wallet.clone()
    }

    pub fn coin_balance(&self) -> Decimal {
        self.inner.lock().wallet.coin_balance
    }

    /// Snapshot of the ledger, oldest first.
    pub fn ledger(&self) -> Vec<LedgerEntry> {
        self.inner.lock().ledger.clone()
    }

    pub fn ledger_len(&self) -> usize {
        self.inner.lock().ledger.len()
    }

    /// Credits the main balance with one ledger entry.
    pub fn apply_credit(
        &self,
        kind: EntryKind,
        currency: Currency,
        amount: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        self.inner.lock().credit(kind, currency, amount, description, at)
    }

    /// Debits the main balance with one ledger entry. Rejected with the
    /// shortfall if the balance is insufficient; nothing is mutated then.
    pub fn apply_debit(
        &self,
        kind: EntryKind,
        currency: Currency,
        amount: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        self.inner.lock().debit(kind, currency, amount, description, at)
    }

    /// Debits `amount` plus `fee` together, producing a debit entry and a
    /// fee entry. The precondition is `balance >= amount + fee`; on failure
    /// neither entry is written.
    pub fn apply_debit_with_fee(
        &self,
        currency: Currency,
        amount: Decimal,
        fee: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<(LedgerEntry, LedgerEntry), LedgerError> {
        validate_amount(amount)?;
        let mut data = self.inner.lock();
        data.balances.debit(currency, amount + fee)?;
        let debit = data.append(LedgerEntry::new(
            at,
            EntryKind::Debit,
            amount,
            currency,
            description,
        ));
        let fee_entry = data.append(LedgerEntry::new(
            at,
            EntryKind::TransferFee,
            fee,
            currency,
            format!("fee: {}", description),
        ));
        Ok((debit, fee_entry))
    }

    /// Withdraws `amount` plus `fee` from the selected source.
    ///
    /// The profit and robot accumulators are drawn down directly; the main
    /// source goes through the balance map. Either way both entries commit
    /// together or not at all.
    pub fn apply_withdrawal(
        &self,
        source: WithdrawSource,
        amount: Decimal,
        fee: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<(LedgerEntry, LedgerEntry), LedgerError> {
        validate_amount(amount)?;
        let currency = source.currency();
        let total = amount + fee;
        let mut data = self.inner.lock();
        match source {
            WithdrawSource::Main(currency) => data.balances.debit(currency, total)?,
            WithdrawSource::ProfitBalance => {
                if data.profit_balance < total {
                    return Err(LedgerError::InsufficientFunds {
                        currency,
                        shortfall: total - data.profit_balance,
                    });
                }
                data.profit_balance -= total;
            }
            WithdrawSource::RobotProfit => {
                if data.robot_profit < total {
                    return Err(LedgerError::InsufficientFunds {
                        currency,
                        shortfall: total - data.robot_profit,
                    });
                }
                data.robot_profit -= total;
            }
        }
        let debit = data.append(LedgerEntry::new(
            at,
            EntryKind::Debit,
            amount,
            currency,
            description,
        ));
        let fee_entry = data.append(LedgerEntry::new(
            at,
            EntryKind::TransferFee,
            fee,
            currency,
            format!("fee: {}", description),
        ));
        Ok((debit, fee_entry))
    }

    /// Moves `amount` to `recipient` atomically.
    ///
    /// Both account locks are taken in ascending id order before any check,
    /// so concurrent opposing transfers cannot deadlock. Produces the debit
    /// entry on `self` and the credit entry on `recipient`, each carrying
    /// the other account as counterparty.
    pub fn transfer_to(
        &self,
        recipient: &Account,
        currency: Currency,
        amount: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<(LedgerEntry, LedgerEntry), LedgerError> {
        if self.id == recipient.id {
            return Err(LedgerError::SelfTransfer);
        }
        validate_amount(amount)?;

        let (mut sender, mut receiver) = if self.id < recipient.id {
            let sender = self.inner.lock();
            let receiver = recipient.inner.lock();
            (sender, receiver)
        } else {
            let receiver = recipient.inner.lock();
            let sender = self.inner.lock();
            (sender, receiver)
        };

        sender.balances.debit(currency, amount)?;
        receiver.balances.credit(currency, amount);

        let debit = sender.append(
            LedgerEntry::new(at, EntryKind::Debit, amount, currency, description)
                .with_counterparty(recipient.id),
        );
        let credit = receiver.append(
            LedgerEntry::new(at, EntryKind::Credit, amount, currency, description)
                .with_counterparty(self.id),
        );
        Ok((debit, credit))
    }

    pub fn mining_active(&self) -> bool {
        self.inner.lock().wallet.mining_active
    }

    pub fn set_mining_active(&self, active: bool) {
        self.inner.lock().wallet.mining_active = active;
    }

    /// One manual mining tick at the fixed rate.
    pub fn mine(&self, at: DateTime<Utc>) -> Result<MiningOutcome, LedgerError> {
        self.mine_increment(coin::MINING_RATE, None, at)
    }

    /// One auto-miner tick at the current step-table value. The step index
    /// advances each tick and resets when a cycle completes.
    pub fn auto_mine(&self, at: DateTime<Utc>) -> Result<MiningOutcome, LedgerError> {
        let step = self.inner.lock().wallet.step;
        self.mine_increment(coin::step_value(step), Some(step), at)
    }

    fn mine_increment(
        &self,
        increment: Decimal,
        step: Option<usize>,
        at: DateTime<Utc>,
    ) -> Result<MiningOutcome, LedgerError> {
        let mut data = self.inner.lock();
        if !data.wallet.mining_active {
            return Err(LedgerError::MiningInactive);
        }

        let (accumulated, cycle_completed) = coin::advance_cycle(data.wallet.accumulated, increment);
        data.wallet.accumulated = accumulated;
        data.wallet.coin_balance += increment;
        if cycle_completed {
            data.wallet.coin_balance += coin::CYCLE_BONUS;
        }
        match step {
            Some(step) => {
                data.wallet.step = if cycle_completed { 0 } else { step + 1 };
            }
            None if cycle_completed => data.wallet.step = 0,
            None => {}
        }

        let usd_credited = coin::usd_value(increment);
        data.balances.credit(Currency::Usd, usd_credited);
        let description = match step {
            Some(step) => format!("mined {} PGM (auto step {})", increment, step),
            None => format!("mined {} PGM", increment),
        };
        let entry = data.append(LedgerEntry::new(
            at,
            EntryKind::Mining,
            usd_credited,
            Currency::Usd,
            description,
        ));

        Ok(MiningOutcome {
            minted: increment,
            usd_credited,
            cycle_completed,
            entry,
        })
    }

    /// One robot trade: 0.5% of the USD balance, credited to both the USD
    /// balance and the robot-profit accumulator. A zero balance is a skip,
    /// not an error.
    pub fn robot_trade(&self, at: DateTime<Utc>) -> Option<LedgerEntry> {
        let mut data = self.inner.lock();
        let balance = data.balances.get(Currency::Usd);
        if balance <= Decimal::ZERO {
            return None;
        }
        let profit = balance * ROBOT_RATE;
        data.balances.credit(Currency::Usd, profit);
        data.robot_profit += profit;
        Some(data.append(LedgerEntry::new(
            at,
            EntryKind::RobotTrade,
            profit,
            Currency::Usd,
            "automated robot trade",
        )))
    }

    /// Credits a forex-tick profit to the USD balance and robot accumulator.
    pub fn apply_forex_profit(
        &self,
        profit: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        validate_amount(profit)?;
        let mut data = self.inner.lock();
        data.balances.credit(Currency::Usd, profit);
        data.robot_profit += profit;
        Ok(data.append(LedgerEntry::new(
            at,
            EntryKind::ForexTrade,
            profit,
            Currency::Usd,
            description,
        )))
    }

    /// Credits a pair-trade profit to the USD balance and the profit
    /// accumulator.
    pub fn apply_pair_profit(
        &self,
        profit: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        validate_amount(profit)?;
        let mut data = self.inner.lock();
        data.balances.credit(Currency::Usd, profit);
        data.profit_balance += profit;
        Ok(data.append(LedgerEntry::new(
            at,
            EntryKind::ForexTrade,
            profit,
            Currency::Usd,
            description,
        )))
    }

    /// Moves the whole profit accumulator into the USD main balance.
    /// Returns `None` when there is nothing to move.
    pub fn sweep_profit_to_main(&self, at: DateTime<Utc>) -> Option<LedgerEntry> {
        let mut data = self.inner.lock();
        let swept = data.profit_balance;
        if swept <= Decimal::ZERO {
            return None;
        }
        data.profit_balance = Decimal::ZERO;
        data.balances.credit(Currency::Usd, swept);
        Some(data.append(LedgerEntry::new(
            at,
            EntryKind::Credit,
            swept,
            Currency::Usd,
            "profit balance swept to main",
        )))
    }

    /// Grants the daily sync bonus once per calendar day. A repeat call on
    /// the same day is a skip.
    pub fn daily_sync(&self, today: NaiveDate, at: DateTime<Utc>) -> Option<LedgerEntry> {
        let mut data = self.inner.lock();
        if data.last_sync == Some(today) {
            return None;
        }
        data.last_sync = Some(today);
        data.balances.credit(Currency::Usd, SYNC_BONUS_USD);
        Some(data.append(LedgerEntry::new(
            at,
            EntryKind::SyncBonus,
            SYNC_BONUS_USD,
            Currency::Usd,
            "daily sync bonus",
        )))
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 8)?;
        state.serialize_field("account", &self.id)?;
        state.serialize_field(
            "ngn",
            &data.balances.get(Currency::Ngn).round_dp(Account::FIAT_PRECISION),
        )?;
        state.serialize_field(
            "usd",
            &data.balances.get(Currency::Usd).round_dp(Account::FIAT_PRECISION),
        )?;
        state.serialize_field(
            "eur",
            &data.balances.get(Currency::Eur).round_dp(Account::FIAT_PRECISION),
        )?;
        state.serialize_field(
            "gbp",
            &data.balances.get(Currency::Gbp).round_dp(Account::FIAT_PRECISION),
        )?;
        state.serialize_field(
            "profit",
            &data.profit_balance.round_dp(Account::FIAT_PRECISION),
        )?;
        state.serialize_field(
            "robot",
            &data.robot_profit.round_dp(Account::FIAT_PRECISION),
        )?;
        state.serialize_field(
            "coin",
            &data.wallet.coin_balance.round_dp(Account::COIN_PRECISION),
        )?;
        state.end()
    }
}
