//! Sequential-pattern detection on recent form
//!
//! Results are encoded W=+1, L=-1, D=0, most recent first. Detectors run in
//! priority order (streak, alternating, regression, breakout) and the first
//! match wins; fewer than three results always yields None. Streaks are
//! signed toward regression: a hot run dampens confidence rather than
//! extrapolating it.

use serde::{Deserialize, Serialize};

use crate::types::FormResult;

const MIN_FORM_LENGTH: usize = 3;
const MIN_STREAK_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Streak,
    Alternating,
    Regression,
    Breakout,
    None,
}

/// A detected pattern and its signed confidence adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequentialPattern {
    pub kind: PatternKind,
    /// Pattern strength in [0, 1]
    pub strength: f64,
    /// Signed confidence adjustment contributed by this pattern
    pub adjustment: f64,
}

impl SequentialPattern {
    pub fn none() -> Self {
        Self {
            kind: PatternKind::None,
            strength: 0.0,
            adjustment: 0.0,
        }
    }
}

/// Detect the dominant sequential pattern in a recent-form sequence
pub fn detect(form: &[FormResult], decay_rate: f64) -> SequentialPattern {
    if form.len() < MIN_FORM_LENGTH {
        return SequentialPattern::none();
    }

    let signals: Vec<f64> = form.iter().map(|r| r.signal()).collect();

    detect_streak(form, &signals, decay_rate)
        .or_else(|| detect_alternating(&signals))
        .or_else(|| detect_regression(&signals))
        .or_else(|| detect_breakout(&signals))
        .unwrap_or_else(SequentialPattern::none)
}

fn detect_streak(
    form: &[FormResult],
    signals: &[f64],
    decay_rate: f64,
) -> Option<SequentialPattern> {
    let lead = form[0];
    let streak_len = form.iter().take_while(|&&r| r == lead).count();
    if streak_len < MIN_STREAK_LENGTH {
        return None;
    }

    let direction = signals[0];
    let strength = (streak_len as f64 / 6.0).min(1.0);
    Some(SequentialPattern {
        kind: PatternKind::Streak,
        strength,
        // Regression-signed: a winning streak pulls confidence down, not up
        adjustment: -direction * strength * 3.0 * decay_rate,
    })
}

fn detect_alternating(signals: &[f64]) -> Option<SequentialPattern> {
    let pairs = signals.len() - 1;
    let flips = signals
        .windows(2)
        .filter(|w| w[0] * w[1] < 0.0)
        .count();

    let flip_ratio = flips as f64 / pairs as f64;
    if flip_ratio <= 0.7 {
        return None;
    }

    Some(SequentialPattern {
        kind: PatternKind::Alternating,
        strength: flip_ratio,
        adjustment: -signals[0] * 2.0,
    })
}

fn detect_regression(signals: &[f64]) -> Option<SequentialPattern> {
    let mid = signals.len() / 2;
    let recent_mean = mean(&signals[..mid]);
    let older_mean = mean(&signals[mid..]);

    if (recent_mean - older_mean).abs() <= 0.6 || recent_mean * older_mean >= 0.0 {
        return None;
    }

    Some(SequentialPattern {
        kind: PatternKind::Regression,
        strength: ((recent_mean - older_mean).abs() / 2.0).min(1.0),
        adjustment: -older_mean * 3.0,
    })
}

fn detect_breakout(signals: &[f64]) -> Option<SequentialPattern> {
    if signals.len() < 4 {
        return None;
    }

    let recent_mean = mean(&signals[..3]);
    let rest_mean = mean(&signals[3..]);
    let divergence = recent_mean - rest_mean;
    if divergence.abs() <= 0.5 {
        return None;
    }

    Some(SequentialPattern {
        kind: PatternKind::Breakout,
        strength: (divergence.abs() / 2.0).min(1.0),
        adjustment: divergence * 4.0,
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
