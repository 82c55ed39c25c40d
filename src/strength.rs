//! Team strength scoring
//!
//! Scores a team's offense, defense and momentum from its won-loss record and
//! recent form. Pure and deterministic: the same snapshot always yields the
//! same metrics, and missing inputs leave metrics at a neutral 50.

use crate::types::{StrengthMetrics, TeamSnapshot};

const OFF_DEF_MIN: f64 = 25.0;
const OFF_DEF_MAX: f64 = 95.0;
const MOMENTUM_MIN: f64 = 20.0;
const MOMENTUM_MAX: f64 = 95.0;

/// Compute strength metrics for one team
pub fn calculate(team: &TeamSnapshot) -> StrengthMetrics {
    let mut offense = 50.0;
    let mut defense = 50.0;
    let mut momentum = 50.0;

    // Season record shifts offense and defense identically
    if let Some(win_pct) = team.record_win_pct() {
        let shift = (win_pct - 0.5) * 40.0;
        offense += shift;
        defense += shift;
    }

    // Recent form is recency-weighted: the i-th most-recent result weighs (len - i)
    if let Some(weighted_pct) = weighted_form_pct(team) {
        momentum += (weighted_pct - 0.5) * 50.0;
    }

    StrengthMetrics {
        offense: offense.clamp(OFF_DEF_MIN, OFF_DEF_MAX),
        defense: defense.clamp(OFF_DEF_MIN, OFF_DEF_MAX),
        momentum: momentum.clamp(MOMENTUM_MIN, MOMENTUM_MAX),
    }
}

fn weighted_form_pct(team: &TeamSnapshot) -> Option<f64> {
    if team.recent_form.is_empty() {
        return None;
    }

    let len = team.recent_form.len();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (i, result) in team.recent_form.iter().enumerate() {
        let weight = (len - i) as f64;
        weighted_sum += weight * result.value();
        weight_total += weight;
    }

    Some(weighted_sum / weight_total)
}
