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

//! Bank-wide audit feed.
//!
//! A lock-free, insertion-ordered queue of one event per committed engine
//! operation. Consumers drain it for terminal-style activity output; the
//! per-account ledgers remain the authoritative record.

use crate::base::{AccountId, Currency};
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// One line of bank-wide activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub at: DateTime<Utc>,
    pub account: AccountId,
    pub operation: &'static str,
    pub amount: Decimal,
    pub currency: Currency,
    pub detail: String,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] acct {} {} {} {} - {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.account,
            self.operation,
            self.amount,
            self.currency,
            self.detail
        )
    }
}

/// Append-only feed of audit events, FIFO order.
#[derive(Debug, Default)]
pub struct AuditLog {
    events: SegQueue<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: AuditEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes and returns every queued event, oldest first.
    pub fn drain(&self) -> Vec<AuditEvent> {
        let mut drained = Vec::with_capacity(self.events.len());
        while let Some(event) = self.events.pop() {
            drained.push(event);
        }
        drained
    }
}
