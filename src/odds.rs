//! Conversion of win tallies into traditional fractional odds.
//!
//! A tally is first adjusted away from the extremes, so that no runner is ever quoted as
//! a certainty or as unbackable. The implied odds are then quantized to small integers,
//! doubling both sides until the fractional part of the long side rounds cleanly.

use crate::probs::Fraction;

/// Wins credited to a runner that never won.
pub const ZERO_WIN_TALLY: f64 = 0.75;

/// Wins deducted from a runner that won every trial.
pub const ALL_WIN_DEDUCTION: f64 = 0.25;

/// Decimal places the raw odds are rounded to before quantization.
pub const DECIMAL_PLACES: i32 = 5;

/// Once the short side reaches this, the long side is rounded as is.
const QUANTUM: f64 = 4.0;

pub fn adjusted_tally(wins: u64, trials: u64) -> f64 {
    debug_assert!(wins <= trials);
    if wins == 0 {
        ZERO_WIN_TALLY
    } else if wins == trials {
        trials as f64 - ALL_WIN_DEDUCTION
    } else {
        wins as f64
    }
}

/// Raw `(numerator, denominator)` odds against an outcome with `wins` of `trials`, one
/// side of which is exactly 1.
pub fn implied_odds(wins: f64, trials: u64) -> (f64, f64) {
    debug_assert!(wins > 0.0 && wins < trials as f64, "{wins} of {trials}");
    let prob = wins / trials as f64;
    let against = (1.0 - prob) / prob;
    if against < 1.0 {
        (1.0, round(1.0 / against))
    } else {
        (round(against), 1.0)
    }
}

fn round(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMAL_PLACES);
    (value * scale).round() / scale
}

/// Quantizes raw odds into a [Fraction] of positive integers. Odds against are floored
/// and odds on are ceiled, so that quoted odds are never more generous than the estimate.
/// Even money is always expressed as `1-1`, and every result is in lowest terms.
pub fn quantize(numerator: f64, denominator: f64) -> Fraction {
    let (mut numerator, mut denominator) = (numerator, denominator);
    let (numerator, denominator) = if numerator > denominator {
        loop {
            if numerator >= QUANTUM && denominator == 1.0 {
                break (numerator.floor(), denominator);
            }
            if denominator >= QUANTUM || numerator.fract() < 0.5 {
                break (numerator.floor(), denominator.floor());
            }
            numerator *= 2.0;
            denominator *= 2.0;
        }
    } else {
        loop {
            if denominator >= QUANTUM && numerator == 1.0 {
                break (numerator, denominator.ceil());
            }
            if numerator >= QUANTUM {
                break (numerator.ceil(), denominator.ceil());
            }
            if denominator.fract() >= 0.5 {
                break (numerator.round_ties_even(), denominator.round_ties_even());
            }
            numerator *= 2.0;
            denominator *= 2.0;
        }
    };
    if numerator == denominator {
        return Fraction::new(1, 1);
    }
    Fraction::new(f64::max(1.0, numerator) as u64, f64::max(1.0, denominator) as u64).reduced()
}

/// Fractional odds against a runner that won `wins` of `trials`.
pub fn odds(wins: u64, trials: u64) -> Fraction {
    let (numerator, denominator) = implied_odds(adjusted_tally(wins, trials), trials);
    quantize(numerator, denominator)
}
