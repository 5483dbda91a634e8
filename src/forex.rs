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

//! Trading-robot profit simulation.
//!
//! Profits are sampled through an injected [`Rng`] so callers can seed the
//! generator in tests. Random draws are taken as scaled integers and
//! converted to `Decimal` fixed-point, keeping floats out of monetary math.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fraction of the USD balance a robot trade yields as profit.
pub const ROBOT_RATE: Decimal = dec!(0.005);

const SCALE: u32 = 4;

/// Uniform USD profit for one forex tick, in `[0.10, 0.60)`.
pub fn tick_profit<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    Decimal::new(rng.gen_range(1_000..6_000), SCALE)
}

/// Simulated profit for one trade on a currency pair, in USD.
///
/// Direction is a coin flip. Upward moves pay 10% of the sampled volatility,
/// downward moves 8%, plus a small jitter. The result is floored at a small
/// positive value so a pair trade never yields zero.
pub fn pair_profit<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    let up = rng.gen_bool(0.5);
    // volatility in [0.5, 2.5)
    let volatility = Decimal::new(rng.gen_range(5_000..25_000), SCALE);
    let base = if up {
        volatility * dec!(0.10)
    } else {
        volatility * dec!(0.08)
    };
    // jitter in [-0.25, 0.25)
    let jitter = Decimal::new(rng.gen_range(-2_500..2_500), SCALE);
    // floor in [0.001, 0.006)
    let floor = dec!(0.001) + Decimal::new(rng.gen_range(0..10_000), SCALE) * dec!(0.005);
    (base + jitter).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tick_profit_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let profit = tick_profit(&mut rng);
            assert!(profit >= dec!(0.10), "profit {} below range", profit);
            assert!(profit < dec!(0.60), "profit {} above range", profit);
        }
    }

    #[test]
    fn pair_profit_is_always_positive() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let profit = pair_profit(&mut rng);
            assert!(profit > Decimal::ZERO, "profit {} not positive", profit);
        }
    }

    #[test]
    fn pair_profit_is_bounded_above() {
        // Max volatility 2.5 at 10% plus max jitter 0.25 stays under 0.50.
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            assert!(pair_profit(&mut rng) < dec!(0.50));
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(tick_profit(&mut a), tick_profit(&mut b));
        }
    }
}
