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

//! External transfer lifecycle tracking.
//!
//! An external transfer or withdrawal debits the sender immediately; the
//! outbound leg is assumed to settle outside this system and is tracked here
//! as a status-only shadow record. The lifecycle is strictly linear:
//!
//  pending ──1s──► acknowledged ──2s──► processing ──3s──► completed
//
//! Transitions are time-driven. [`TransferBook::poll`] applies every
//! transition whose due time has passed; applied transitions are never
//! rolled back, and `completed` is terminal.

use crate::base::{AccountId, Currency, TransferId};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which balance a withdrawal draws from.
///
/// The profit and robot accumulators are USD-denominated, so only `Main`
/// carries a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawSource {
    Main(Currency),
    ProfitBalance,
    RobotProfit,
}

impl WithdrawSource {
    pub fn currency(&self) -> Currency {
        match self {
            WithdrawSource::Main(currency) => *currency,
            WithdrawSource::ProfitBalance | WithdrawSource::RobotProfit => Currency::Usd,
        }
    }
}

/// How an outbound transfer leaves the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferRoute {
    LocalInterbank,
    International,
    Withdrawal(WithdrawSource),
}

impl TransferRoute {
    /// Fee rate charged on top of the transferred amount.
    pub fn fee_rate(&self) -> Decimal {
        match self {
            TransferRoute::LocalInterbank => Decimal::new(1, 2),
            TransferRoute::International => Decimal::new(2, 2),
            TransferRoute::Withdrawal(_) => Decimal::new(1, 2),
        }
    }

    pub fn fee(&self, amount: Decimal) -> Decimal {
        amount * self.fee_rate()
    }
}

/// Lifecycle states, strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Acknowledged,
    Processing,
    Completed,
}

impl TransferStatus {
    pub fn next(&self) -> Option<TransferStatus> {
        match self {
            TransferStatus::Pending => Some(TransferStatus::Acknowledged),
            TransferStatus::Acknowledged => Some(TransferStatus::Processing),
            TransferStatus::Processing => Some(TransferStatus::Completed),
            TransferStatus::Completed => None,
        }
    }

    /// Delay before leaving this state.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            TransferStatus::Pending => Some(Duration::seconds(1)),
            TransferStatus::Acknowledged => Some(Duration::seconds(2)),
            TransferStatus::Processing => Some(Duration::seconds(3)),
            TransferStatus::Completed => None,
        }
    }
}

/// Status-tracking record for one external transfer or withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRecord {
    pub id: TransferId,
    pub account: AccountId,
    pub amount: Decimal,
    pub fee: Decimal,
    pub currency: Currency,
    pub route: TransferRoute,
    pub beneficiary: String,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// All open and completed transfer records plus their transition schedule.
#[derive(Debug, Default)]
pub struct TransferBook {
    records: DashMap<TransferId, TransferRecord>,
    schedule: Mutex<BinaryHeap<Reverse<(DateTime<Utc>, TransferId)>>>,
    next_id: AtomicU64,
}

impl TransferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new record in `Pending` and schedules its first transition.
    pub fn open(
        &self,
        account: AccountId,
        amount: Decimal,
        fee: Decimal,
        currency: Currency,
        route: TransferRoute,
        beneficiary: impl Into<String>,
        now: DateTime<Utc>,
    ) -> TransferId {
        let id = TransferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let status = TransferStatus::Pending;
        self.records.insert(
            id,
            TransferRecord {
                id,
                account,
                amount,
                fee,
                currency,
                route,
                beneficiary: beneficiary.into(),
                status,
                created_at: now,
                completed_at: None,
            },
        );
        if let Some(delay) = status.delay() {
            self.schedule.lock().push(Reverse((now + delay, id)));
        }
        id
    }

    pub fn get(&self, id: TransferId) -> Option<TransferRecord> {
        self.records.get(&id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Applies every transition due at or before `now`.
    ///
    /// A transition both advances the record and schedules the next one, so
    /// a single poll after a long gap walks a record through every state it
    /// is due for. Returns the ids that changed state, in application order.
    pub fn poll(&self, now: DateTime<Utc>) -> Vec<TransferId> {
        let mut advanced = Vec::new();
        let mut schedule = self.schedule.lock();
        while let Some(Reverse((due, id))) = schedule.peek().copied() {
            if due > now {
                break;
            }
            schedule.pop();
            let Some(mut record) = self.records.get_mut(&id) else {
                continue;
            };
            let Some(next) = record.status.next() else {
                continue;
            };
            record.status = next;
            if next == TransferStatus::Completed {
                record.completed_at = Some(due);
            } else if let Some(delay) = next.delay() {
                schedule.push(Reverse((due + delay, id)));
            }
            advanced.push(id);
        }
        advanced
    }
}
