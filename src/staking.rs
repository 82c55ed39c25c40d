//! Expected value and Kelly stake sizing
//!
//! Pure formulas over decimal odds `d` and win probability `p`, with
//! `b = d - 1` and `q = 1 - p`:
//!
//! - EV = p*b - q
//! - full Kelly = (b*p - q) / b, scaled by a configured fraction, floored at 0
//!
//! Invalid domains (p outside (0,1), d <= 1) return 0 instead of erroring so
//! a single bad odds feed never aborts a batch.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Expected net return per unit staked
pub fn expected_value(probability: f64, decimal_odds: f64) -> f64 {
    if !valid_inputs(probability, decimal_odds) {
        return 0.0;
    }
    let b = decimal_odds - 1.0;
    let q = 1.0 - probability;
    probability * b - q
}

/// Expected value expressed in percent
pub fn ev_percentage(probability: f64, decimal_odds: f64) -> f64 {
    expected_value(probability, decimal_odds) * 100.0
}

/// Fractional Kelly stake as a share of bankroll, floored at 0
pub fn kelly_fraction(probability: f64, decimal_odds: f64, fraction: f64) -> f64 {
    if !valid_inputs(probability, decimal_odds) {
        return 0.0;
    }
    let b = decimal_odds - 1.0;
    let q = 1.0 - probability;
    let full_kelly = (b * probability - q) / b;
    (full_kelly * fraction).max(0.0)
}

/// Stake in bankroll units for a given Kelly fraction
pub fn stake_units(kelly: f64, bankroll: Decimal) -> Decimal {
    if kelly <= 0.0 {
        return Decimal::ZERO;
    }
    let kelly = Decimal::from_f64(kelly).unwrap_or(Decimal::ZERO);
    (kelly * bankroll).round_dp(2)
}

fn valid_inputs(probability: f64, decimal_odds: f64) -> bool {
    probability > 0.0 && probability < 1.0 && decimal_odds > 1.0
}
