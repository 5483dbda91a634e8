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

//! # Pilgrim Ledger
//!
//! A ledger-consistent balance-mutation engine for a simulated retail bank:
//! multi-currency customer accounts with append-only ledgers, internal and
//! fee-charging external transfers, Pilgrim Coin mining, trading-robot
//! accruals, and bank-wide aggregate figures.
//!
//! ## Core Components
//!
//! - [`Engine`]: Owns the mutation rule set and the bank-wide accumulators
//! - [`Account`]: One customer's balances, coin wallet, and ledger
//! - [`TransferBook`]: Lifecycle shadow records for outbound transfers
//! - [`LedgerError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use pilgrim_ledger::{AccountId, Currency, Engine, SystemClock};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let clock = SystemClock;
//!
//! engine.create_account(AccountId(1)).unwrap();
//! engine
//!     .admin_credit(AccountId(1), Currency::Usd, dec!(100.00), "opening deposit", &clock)
//!     .unwrap();
//!
//! let account = engine.account(AccountId(1)).unwrap();
//! assert_eq!(account.balance(Currency::Usd), dec!(100.00));
//! assert_eq!(engine.aggregates().profit_pool, dec!(2.00));
//! ```
//!
//! ## Thread Safety
//!
//! Each account serializes its own mutations behind a mutex; two-account
//! transfers lock both sides in ascending id order, so opposing concurrent
//! transfers cannot deadlock.

pub mod account;
pub mod aggregates;
pub mod audit;
mod base;
mod clock;
pub mod coin;
mod engine;
pub mod entry;
pub mod error;
pub mod forex;
mod store;
pub mod transfer;

pub use account::{Account, Balances, CoinWallet, MiningOutcome, SYNC_BONUS_USD};
pub use aggregates::Aggregates;
pub use audit::{AuditEvent, AuditLog};
pub use base::{AccountId, Currency, TransferId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use entry::{EntryKind, LedgerEntry};
pub use error::LedgerError;
pub use store::{MemoryStore, Store};
pub use transfer::{
    TransferBook, TransferRecord, TransferRoute, TransferStatus, WithdrawSource,
};
