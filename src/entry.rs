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

//! Ledger entries.
//!
//! One entry is appended per committed balance mutation, atomically with the
//! mutation itself. The per-account ledger is append-only and chronological;
//! entries are never edited or removed once written.

use crate::base::{AccountId, Currency};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifies what produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Credit,
    Debit,
    TransferFee,
    Mining,
    RobotTrade,
    ForexTrade,
    SyncBonus,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Credit => "credit",
            EntryKind::Debit => "debit",
            EntryKind::TransferFee => "transfer_fee",
            EntryKind::Mining => "mining",
            EntryKind::RobotTrade => "robot_trade",
            EntryKind::ForexTrade => "forex_trade",
            EntryKind::SyncBonus => "sync_bonus",
        }
    }

    /// Whether entries of this kind decrease the balance they touch.
    pub fn is_outflow(&self) -> bool {
        matches!(self, EntryKind::Debit | EntryKind::TransferFee)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single committed balance mutation.
///
/// `amount` is always positive; direction comes from `kind`. The optional
/// `counterparty` links the two halves of an internal transfer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LedgerEntry {
    pub at: DateTime<Utc>,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub currency: Currency,
    pub description: String,
    pub counterparty: Option<AccountId>,
}

impl LedgerEntry {
    pub fn new(
        at: DateTime<Utc>,
        kind: EntryKind,
        amount: Decimal,
        currency: Currency,
        description: impl Into<String>,
    ) -> Self {
        Self {
            at,
            kind,
            amount,
            currency,
            description: description.into(),
            counterparty: None,
        }
    }

    pub fn with_counterparty(mut self, counterparty: AccountId) -> Self {
        self.counterparty = Some(counterparty);
        self
    }

    /// Signed amount: negative for outflows, positive otherwise.
    pub fn signed_amount(&self) -> Decimal {
        if self.kind.is_outflow() {
            -self.amount
        } else {
            self.amount
        }
    }
}
