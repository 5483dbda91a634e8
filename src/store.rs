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

//! Account storage.
//!
//! The engine holds accounts through this trait rather than a concrete map,
//! so persistence can be swapped without touching the rule set.
//! [`MemoryStore`] is the shipped implementation.

use crate::account::Account;
use crate::base::AccountId;
use crate::error::LedgerError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

pub trait Store: Send + Sync {
    /// Inserts a fresh account, rejecting a duplicate id.
    fn insert(&self, account: Arc<Account>) -> Result<(), LedgerError>;

    /// Removes an account, returning it if present.
    fn remove(&self, id: AccountId) -> Option<Arc<Account>>;

    fn get(&self, id: AccountId) -> Option<Arc<Account>>;

    fn contains(&self, id: AccountId) -> bool {
        self.get(id).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits every account. Iteration order is unspecified.
    fn for_each(&self, f: &mut dyn FnMut(&Arc<Account>));
}

/// In-memory account map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn insert(&self, account: Arc<Account>) -> Result<(), LedgerError> {
        // Entry API makes check-and-insert atomic.
        match self.accounts.entry(account.id()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateAccount),
            Entry::Vacant(entry) => {
                entry.insert(account);
                Ok(())
            }
        }
    }

    fn remove(&self, id: AccountId) -> Option<Arc<Account>> {
        self.accounts.remove(&id).map(|(_, account)| account)
    }

    fn get(&self, id: AccountId) -> Option<Arc<Account>> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    fn len(&self) -> usize {
        self.accounts.len()
    }

    fn for_each(&self, f: &mut dyn FnMut(&Arc<Account>)) {
        for entry in self.accounts.iter() {
            f(entry.value());
        }
    }
}
