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

//! Deadlock detection tests using parking_lot's built-in deadlock detector.
//!
//! Two-account transfers take both account mutexes; the engine locks them
//! in ascending id order so opposing concurrent transfers cannot form a
//! cycle. These tests hammer that path and let the detector thread catch
//! any cycle in the lock graph.

use parking_lot::deadlock;
use pilgrim_ledger::{AccountId, Currency, Engine, SystemClock};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const CLOCK: SystemClock = SystemClock;

// === Deadlock Detection Infrastructure ===

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150)); // Let detector thread exit
}

fn engine_with_funded_accounts(count: u32, usd: Decimal) -> Arc<Engine> {
    let engine = Arc::new(Engine::new());
    for id in 1..=count {
        engine.create_account(AccountId(id)).unwrap();
        engine
            .admin_credit(AccountId(id), Currency::Usd, usd, "seed", &CLOCK)
            .unwrap();
    }
    engine
}

// === Tests ===

/// Opposing transfers between the same two accounts from many threads.
/// This is the classic lock-ordering deadlock shape.
#[test]
fn no_deadlock_opposing_transfers() {
    let detector = start_deadlock_detector();
    let engine = engine_with_funded_accounts(2, dec!(10_000.00));

    const NUM_THREADS: usize = 32;
    const OPS_PER_THREAD: usize = 200;

    let mut handles = Vec::with_capacity(NUM_THREADS);
    for thread_id in 0..NUM_THREADS {
        let engine = engine.clone();
        let handle = thread::spawn(move || {
            // Half the threads send 1 -> 2, half send 2 -> 1.
            let (from, to) = if thread_id % 2 == 0 {
                (AccountId(1), AccountId(2))
            } else {
                (AccountId(2), AccountId(1))
            };
            for _ in 0..OPS_PER_THREAD {
                let _ = engine.local_transfer(from, to, Currency::Usd, dec!(1.00), "ping", &CLOCK);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    stop_deadlock_detector(detector);

    // Money only moved between the two accounts.
    let total = engine.account(AccountId(1)).unwrap().balance(Currency::Usd)
        + engine.account(AccountId(2)).unwrap().balance(Currency::Usd);
    assert_eq!(total, dec!(20_000.00));
}

/// Ring of transfers across many accounts: every account is simultaneously
/// a sender and a recipient.
#[test]
fn no_deadlock_transfer_ring() {
    let detector = start_deadlock_detector();

    const NUM_ACCOUNTS: u32 = 10;
    const OPS_PER_THREAD: usize = 100;

    let engine = engine_with_funded_accounts(NUM_ACCOUNTS, dec!(1_000.00));

    let mut handles = Vec::with_capacity(NUM_ACCOUNTS as usize);
    for id in 1..=NUM_ACCOUNTS {
        let engine = engine.clone();
        let handle = thread::spawn(move || {
            let from = AccountId(id);
            let to = AccountId(id % NUM_ACCOUNTS + 1);
            for _ in 0..OPS_PER_THREAD {
                let _ = engine.local_transfer(from, to, Currency::Usd, dec!(2.50), "ring", &CLOCK);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    stop_deadlock_detector(detector);

    let mut total = Decimal::ZERO;
    engine.for_each_account(|account| total += account.balance(Currency::Usd));
    assert_eq!(total, dec!(10_000.00));
}

/// Mixed operations under contention: transfers, trades, mining, and reads
/// hitting the same accounts and the shared aggregates lock.
#[test]
fn no_deadlock_mixed_operations() {
    let detector = start_deadlock_detector();
    let engine = engine_with_funded_accounts(4, dec!(5_000.00));
    for id in 1..=4 {
        engine.set_mining_active(AccountId(id), true).unwrap();
    }

    const NUM_THREADS: usize = 16;
    const OPS_PER_THREAD: usize = 100;

    let mut handles = Vec::with_capacity(NUM_THREADS);
    for thread_id in 0..NUM_THREADS {
        let engine = engine.clone();
        let handle = thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let id = AccountId(((thread_id + i) % 4) as u32 + 1);
                let other = AccountId(((thread_id + i + 1) % 4) as u32 + 1);
                match i % 5 {
                    0 => {
                        let _ =
                            engine.local_transfer(id, other, Currency::Usd, dec!(1.00), "x", &CLOCK);
                    }
                    1 => {
                        let _ = engine.robot_trade(id, &CLOCK);
                    }
                    2 => {
                        let _ = engine.mine(id, &CLOCK);
                    }
                    3 => {
                        let _ = engine.admin_credit(id, Currency::Usd, dec!(1.00), "x", &CLOCK);
                    }
                    _ => {
                        if let Some(account) = engine.account(other) {
                            let _ = account.balance(Currency::Usd);
                            let _ = account.ledger_len();
                        }
                        let _ = engine.aggregates();
                    }
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    stop_deadlock_detector(detector);

    engine.for_each_account(|account| {
        assert!(account.balance(Currency::Usd) >= Decimal::ZERO);
    });
}
