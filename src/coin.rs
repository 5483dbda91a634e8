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

//! Pilgrim Coin (PGM) mining rules.
//!
//! All mining math is pure and lives here; the account layer applies the
//! results under its own lock. Quantities are PGM amounts as `Decimal`,
//! valued at a fixed USD price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixed USD price of one PGM.
pub const COIN_PRICE_USD: Decimal = dec!(0.50);

/// PGM minted by one manual mining tick.
pub const MINING_RATE: Decimal = dec!(0.000002);

/// Accumulated PGM that completes a mining cycle.
pub const CYCLE_TARGET: Decimal = dec!(1.0);

/// PGM bonus credited when a cycle completes.
pub const CYCLE_BONUS: Decimal = dec!(0.1);

/// Per-step increments for the auto-miner. The step index wraps modulo the
/// table length and resets to zero when a cycle completes.
pub const MINING_STEPS: [Decimal; 9] = [
    dec!(0.0000001),
    dec!(0.000005),
    dec!(0.000010),
    dec!(0.000150),
    dec!(0.000200),
    dec!(0.002500),
    dec!(0.050000),
    dec!(0.100000),
    dec!(1.000000),
];

/// PGM minted by the auto-miner at the given step index.
pub fn step_value(step: usize) -> Decimal {
    MINING_STEPS[step % MINING_STEPS.len()]
}

/// USD value of a mined PGM quantity.
pub fn usd_value(quantum: Decimal) -> Decimal {
    quantum * COIN_PRICE_USD
}

/// Advances the cycle accumulator by one mined increment.
///
/// Returns the new accumulator value and whether the cycle completed. On
/// completion the excess over the target carries into the next cycle, so no
/// mined quantity is ever lost to the reset.
pub fn advance_cycle(accumulated: Decimal, increment: Decimal) -> (Decimal, bool) {
    let total = accumulated + increment;
    if total >= CYCLE_TARGET {
        (total - CYCLE_TARGET, true)
    } else {
        (total, false)
    }
}
