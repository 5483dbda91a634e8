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

//! Error types for ledger operations.

use crate::base::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger operation errors.
///
/// Every failed operation leaves all balances, ledgers, and aggregates
/// exactly as they were. There is no retry or queueing; the caller gets one
/// attempt and one answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Debit would push a balance below zero
    #[error("insufficient {currency} funds (short {shortfall})")]
    InsufficientFunds {
        currency: Currency,
        shortfall: Decimal,
    },

    /// Referenced account does not exist
    #[error("account not found")]
    AccountNotFound,

    /// Sender and recipient are the same account
    #[error("cannot transfer to the same account")]
    SelfTransfer,

    /// Account ID already in use
    #[error("duplicate account ID")]
    DuplicateAccount,

    /// Mining requested but the account's coin wallet is inactive
    #[error("coin mining is not active for this account")]
    MiningInactive,

    /// Profit and robot balances are denominated in USD only
    #[error("unsupported currency for this balance source")]
    UnsupportedCurrency,
}
