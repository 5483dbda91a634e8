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

//! Bank-wide aggregate figures.
//!
//! Two USD-denominated accumulators independent of any single account. The
//! accrual rates differ by operation kind and are part of the business rules
//! as given: admin credits feed the pool at 2% and the main balance in full,
//! admin debits feed the pool at 1%, trading profits feed the main balance
//! in full, and everything else leaves both untouched.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const CREDIT_POOL_RATE: Decimal = dec!(0.02);
const DEBIT_POOL_RATE: Decimal = dec!(0.01);

/// Snapshot of the bank-wide accumulators.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregates {
    pub profit_pool: Decimal,
    pub main_balance: Decimal,
}

impl Aggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accrual for an admin-initiated credit of `amount`.
    pub fn record_admin_credit(&mut self, amount: Decimal) {
        self.profit_pool += amount * CREDIT_POOL_RATE;
        self.main_balance += amount;
    }

    /// Accrual for an admin-initiated debit of `amount`.
    pub fn record_admin_debit(&mut self, amount: Decimal) {
        self.profit_pool += amount * DEBIT_POOL_RATE;
    }

    /// Accrual for a trading profit paid out to a customer.
    pub fn record_trading_profit(&mut self, profit: Decimal) {
        self.main_balance += profit;
    }

    /// Moves the whole profit pool into the main balance. Returns the swept
    /// amount, or `None` when the pool is empty.
    pub fn sweep_pool(&mut self) -> Option<Decimal> {
        if self.profit_pool <= Decimal::ZERO {
            return None;
        }
        let swept = self.profit_pool;
        self.profit_pool = Decimal::ZERO;
        self.main_balance += swept;
        Some(swept)
    }
}
