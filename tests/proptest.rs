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

//! Property-based tests for the ledger engine.
//!
//! These tests verify invariants that should hold for any sequence of
//! valid operations.

use pilgrim_ledger::{
    Account, AccountId, Currency, Engine, EntryKind, SystemClock, TransferRoute, coin, forex,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const CLOCK: SystemClock = SystemClock;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive amount (0.0001 to 1000 with 4 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|cents| Decimal::new(cents, 4))
}

fn arb_currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

// =============================================================================
// Account Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// A balance always equals the signed sum of that currency's ledger
    /// entries.
    #[test]
    fn balance_equals_signed_entry_sum(
        credits in prop::collection::vec((arb_currency(), arb_amount()), 1..10),
        debits in prop::collection::vec((arb_currency(), arb_amount()), 0..10),
    ) {
        let account = Account::new(AccountId(1));
        let at = chrono::Utc::now();

        for (currency, amount) in &credits {
            let _ = account.apply_credit(EntryKind::Credit, *currency, *amount, "c", at);
        }
        for (currency, amount) in &debits {
            // Some will be rejected for insufficient funds; that's the point.
            let _ = account.apply_debit(EntryKind::Debit, *currency, *amount, "d", at);
        }

        for currency in Currency::ALL {
            let expected: Decimal = account
                .ledger()
                .iter()
                .filter(|entry| entry.currency == currency)
                .map(|entry| entry.signed_amount())
                .sum();
            prop_assert_eq!(account.balance(currency), expected);
        }
    }

    /// No sequence of credits and debits drives any balance negative.
    #[test]
    fn balances_never_negative(
        ops in prop::collection::vec((any::<bool>(), arb_currency(), arb_amount()), 1..40),
    ) {
        let account = Account::new(AccountId(1));
        let at = chrono::Utc::now();

        for (is_credit, currency, amount) in &ops {
            if *is_credit {
                let _ = account.apply_credit(EntryKind::Credit, *currency, *amount, "c", at);
            } else {
                let _ = account.apply_debit(EntryKind::Debit, *currency, *amount, "d", at);
            }
        }

        for currency in Currency::ALL {
            prop_assert!(account.balance(currency) >= Decimal::ZERO);
        }
    }

    /// A rejected debit changes nothing at all.
    #[test]
    fn rejected_debit_has_no_effect(
        seed in arb_amount(),
        over in arb_amount(),
    ) {
        let account = Account::new(AccountId(1));
        let at = chrono::Utc::now();
        account.apply_credit(EntryKind::Credit, Currency::Ngn, seed, "seed", at).unwrap();

        let result = account.apply_debit(EntryKind::Debit, Currency::Ngn, seed + over, "d", at);
        prop_assert!(result.is_err());
        prop_assert_eq!(account.balance(Currency::Ngn), seed);
        prop_assert_eq!(account.ledger_len(), 1);
    }
}

// =============================================================================
// Transfer Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A local transfer conserves the combined balance, whether it commits
    /// or rejects.
    #[test]
    fn local_transfer_conserves_total(
        seed in arb_amount(),
        amount in arb_amount(),
        currency in arb_currency(),
    ) {
        let engine = Engine::new();
        engine.create_account(AccountId(1)).unwrap();
        engine.create_account(AccountId(2)).unwrap();
        engine.admin_credit(AccountId(1), currency, seed, "seed", &CLOCK).unwrap();

        let _ = engine.local_transfer(AccountId(1), AccountId(2), currency, amount, "t", &CLOCK);

        let total = engine.account(AccountId(1)).unwrap().balance(currency)
            + engine.account(AccountId(2)).unwrap().balance(currency);
        prop_assert_eq!(total, seed);
    }

    /// A committed transfer debits and credits exactly the same amount, and
    /// both entries reference each other's account.
    #[test]
    fn transfer_entries_mirror_each_other(
        amount in arb_amount(),
    ) {
        let engine = Engine::new();
        engine.create_account(AccountId(1)).unwrap();
        engine.create_account(AccountId(2)).unwrap();
        engine.admin_credit(AccountId(1), Currency::Usd, amount, "seed", &CLOCK).unwrap();

        let (debit, credit) = engine
            .local_transfer(AccountId(1), AccountId(2), Currency::Usd, amount, "t", &CLOCK)
            .unwrap();

        prop_assert_eq!(debit.amount, credit.amount);
        prop_assert_eq!(debit.counterparty, Some(AccountId(2)));
        prop_assert_eq!(credit.counterparty, Some(AccountId(1)));
    }

    /// External transfer fees follow the route rate exactly, and the debit
    /// total is amount plus fee.
    #[test]
    fn external_transfer_fee_math(
        amount in arb_amount(),
        international in any::<bool>(),
    ) {
        let engine = Engine::new();
        engine.create_account(AccountId(1)).unwrap();
        let route = if international {
            TransferRoute::International
        } else {
            TransferRoute::LocalInterbank
        };
        let rate = if international { dec!(0.02) } else { dec!(0.01) };
        let funding = amount + amount * rate;
        engine.admin_credit(AccountId(1), Currency::Usd, funding, "seed", &CLOCK).unwrap();

        let id = engine
            .external_transfer(AccountId(1), route, Currency::Usd, amount, "b", "t", &CLOCK)
            .unwrap();

        let record = engine.transfer(id).unwrap();
        prop_assert_eq!(record.fee, amount * rate);
        prop_assert_eq!(
            engine.account(AccountId(1)).unwrap().balance(Currency::Usd),
            Decimal::ZERO
        );
    }
}

// =============================================================================
// Coin and Trading Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// The cycle accumulator stays in [0, 1) and the bonus fires exactly
    /// when the target is reached.
    #[test]
    fn cycle_accumulator_stays_in_range(
        accumulated in (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 7)),
        step in 0usize..9,
    ) {
        let increment = coin::step_value(step);
        let (next, completed) = coin::advance_cycle(accumulated, increment);

        prop_assert!(next >= Decimal::ZERO);
        prop_assert!(next < coin::CYCLE_TARGET);
        prop_assert_eq!(completed, accumulated + increment >= coin::CYCLE_TARGET);
        // Carry-over: nothing mined is lost to the reset.
        if completed {
            prop_assert_eq!(next, accumulated + increment - coin::CYCLE_TARGET);
        } else {
            prop_assert_eq!(next, accumulated + increment);
        }
    }

    /// Robot trade profit is exactly 0.5% of the USD balance.
    #[test]
    fn robot_trade_rate_is_exact(
        balance in arb_amount(),
    ) {
        let engine = Engine::new();
        engine.create_account(AccountId(1)).unwrap();
        engine.admin_credit(AccountId(1), Currency::Usd, balance, "seed", &CLOCK).unwrap();

        let entry = engine.robot_trade(AccountId(1), &CLOCK).unwrap().unwrap();
        prop_assert_eq!(entry.amount, balance * dec!(0.005));
        prop_assert_eq!(
            engine.account(AccountId(1)).unwrap().balance(Currency::Usd),
            balance + entry.amount
        );
    }

    /// Forex draws honor their documented bounds for any seed.
    #[test]
    fn forex_draws_are_bounded(seed in any::<u64>()) {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

        let tick = forex::tick_profit(&mut rng);
        prop_assert!(tick >= dec!(0.10) && tick < dec!(0.60));

        let pair = forex::pair_profit(&mut rng);
        prop_assert!(pair > Decimal::ZERO);
    }
}
