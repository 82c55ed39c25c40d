//! Self-calibration
//!
//! Periodically compares each algorithm's realized win rate with the win rate
//! its own confidence implied, then adjusts trust weights, confidence
//! multipliers and minimum-confidence thresholds. Runs as a separate batch
//! stage over settled results; the live pipeline picks the new table up on
//! its next cycle.
//!
//! The base weight table is owned by the caller and passed in at
//! construction, so concurrent controllers with different baselines can
//! coexist.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::types::{AlgorithmId, FormResult};

const MIN_WEIGHT: f64 = 0.05;
const MAX_WEIGHT: f64 = 0.6;
const PAUSED_WEIGHT: f64 = 0.05;
const BASELINE_THRESHOLD: f64 = 55.0;
const MIN_MULTIPLIER: f64 = 0.7;
const MAX_MULTIPLIER: f64 = 1.15;

/// Settled-bet performance for one algorithm over a lookback window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmPerformanceWindow {
    pub algorithm: AlgorithmId,
    pub total_bets: u32,
    pub wins: u32,
    pub losses: u32,
    /// Realized win rate over the window, 0-100
    pub win_rate: f64,
    /// Win rate the algorithm's average confidence implied, 0-100
    pub expected_win_rate: f64,
    /// Signed run of consecutive wins (positive) or losses (negative)
    pub current_streak: i32,
    /// Settled results, most recent first
    #[serde(default)]
    pub recent_results: Vec<FormResult>,
}

impl AlgorithmPerformanceWindow {
    /// Realized minus expected win rate, in percentage points
    pub fn performance_vs_expectation(&self) -> f64 {
        self.win_rate - self.expected_win_rate
    }
}

/// Calibrated trust parameters for one algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelWeight {
    pub algorithm: AlgorithmId,
    /// Weight before this calibration pass
    pub base_weight: f64,
    /// Normalized trust weight, the full table sums to 1
    pub weight: f64,
    /// Applied to raw confidences before thresholding, in [0.7, 1.15]
    pub confidence_multiplier: f64,
    /// Minimum adjusted confidence required to act on a prediction
    pub min_confidence_threshold: f64,
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationAction {
    PauseAlgorithm,
    DecreaseConfidence,
    BoostAlgorithm,
    NoChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One per-algorithm calibration decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationDecision {
    pub algorithm: AlgorithmId,
    pub action: CalibrationAction,
    pub severity: Severity,
    pub detail: String,
}

/// Full output of one calibration pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub weights: Vec<ModelWeight>,
    pub actions: Vec<CalibrationDecision>,
    /// Human-readable summaries, one per non-trivial action
    pub recommendations: Vec<String>,
}

/// Confidence after the calibrated weight table has been applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightAdjustedConfidence {
    pub adjusted_confidence: f64,
    pub meets_threshold: bool,
    pub weight: f64,
}

pub type PausePredicate = Box<dyn Fn(&AlgorithmPerformanceWindow) -> bool + Send + Sync>;

pub struct CalibrationController {
    config: CalibrationConfig,
    base_weights: HashMap<AlgorithmId, f64>,
    pause_predicate: PausePredicate,
}

impl CalibrationController {
    pub fn new(config: CalibrationConfig, base_weights: HashMap<AlgorithmId, f64>) -> Self {
        Self {
            config,
            base_weights,
            pause_predicate: Box::new(default_pause_predicate),
        }
    }

    /// Equal base weights across the algorithm cohort
    pub fn with_defaults(config: CalibrationConfig) -> Self {
        let equal = 1.0 / AlgorithmId::ALL.len() as f64;
        let base = AlgorithmId::ALL.iter().map(|&a| (a, equal)).collect();
        Self::new(config, base)
    }

    pub fn with_pause_predicate(mut self, predicate: PausePredicate) -> Self {
        self.pause_predicate = predicate;
        self
    }

    /// Recompute the trust table from per-algorithm performance windows.
    ///
    /// Algorithms without a window, or with fewer than `min_bets` settled
    /// bets, keep their base weight untouched. Weights are renormalized to
    /// sum to 1 at the end.
    pub fn calculate_model_weights(
        &self,
        windows: &[AlgorithmPerformanceWindow],
    ) -> CalibrationReport {
        let mut weights = Vec::with_capacity(AlgorithmId::ALL.len());
        let mut actions = Vec::with_capacity(AlgorithmId::ALL.len());
        let mut recommendations = Vec::new();

        for algorithm in AlgorithmId::ALL {
            let base = self
                .base_weights
                .get(&algorithm)
                .copied()
                .unwrap_or(1.0 / AlgorithmId::ALL.len() as f64);
            let window = windows.iter().find(|w| w.algorithm == algorithm);

            let (weight, action) = match window {
                Some(w) if w.total_bets >= self.config.min_bets => self.calibrate(algorithm, base, w),
                _ => (
                    ModelWeight {
                        algorithm,
                        base_weight: base,
                        weight: base,
                        confidence_multiplier: 1.0,
                        min_confidence_threshold: BASELINE_THRESHOLD,
                        reason: None,
                        updated_at: Utc::now(),
                    },
                    CalibrationDecision {
                        algorithm,
                        action: CalibrationAction::NoChange,
                        severity: Severity::Low,
                        detail: "insufficient sample".to_string(),
                    },
                ),
            };

            if action.action != CalibrationAction::NoChange {
                recommendations.push(format!("{}: {}", algorithm, action.detail));
            }
            weights.push(weight);
            actions.push(action);
        }

        normalize(&mut weights);

        tracing::info!(
            adjusted = recommendations.len(),
            "calibration pass complete"
        );

        CalibrationReport {
            weights,
            actions,
            recommendations,
        }
    }

    fn calibrate(
        &self,
        algorithm: AlgorithmId,
        base: f64,
        window: &AlgorithmPerformanceWindow,
    ) -> (ModelWeight, CalibrationDecision) {
        let pve = window.performance_vs_expectation();
        let severity = if pve.abs() >= 20.0 {
            Severity::High
        } else if pve.abs() >= self.config.underperformance_threshold {
            Severity::Medium
        } else {
            Severity::Low
        };

        if (self.pause_predicate)(window) {
            let detail = format!(
                "paused: win rate {:.1} vs expected {:.1} on a {} streak",
                window.win_rate, window.expected_win_rate, window.current_streak
            );
            tracing::warn!(algorithm = %algorithm, detail, "pausing algorithm");
            return (
                ModelWeight {
                    algorithm,
                    base_weight: base,
                    weight: PAUSED_WEIGHT,
                    confidence_multiplier: MIN_MULTIPLIER,
                    min_confidence_threshold: BASELINE_THRESHOLD
                        + self.config.max_confidence_reduction.min(15.0),
                    reason: Some("paused".to_string()),
                    updated_at: Utc::now(),
                },
                CalibrationDecision {
                    algorithm,
                    action: CalibrationAction::PauseAlgorithm,
                    severity: Severity::High,
                    detail,
                },
            );
        }

        let mut delta = if pve < -self.config.underperformance_threshold {
            -(pve.abs() / 100.0 * 0.3).min(self.config.max_weight_change)
        } else if pve > self.config.overperformance_threshold {
            (pve / 100.0 * 0.2).min(self.config.max_weight_change)
        } else {
            0.0
        };
        if window.current_streak <= -5 {
            delta -= 0.05;
        } else if window.current_streak >= 5 {
            delta += 0.03;
        }
        let weight = (base + delta).clamp(MIN_WEIGHT, MAX_WEIGHT);

        let mut multiplier = if pve < -self.config.underperformance_threshold {
            1.0 - (pve.abs() / 100.0 * 0.5).min(self.config.max_confidence_reduction / 100.0)
        } else if pve > self.config.overperformance_threshold {
            1.0 + (pve / 100.0 * 0.3).min(self.config.max_confidence_boost / 100.0)
        } else {
            1.0
        };
        if window.current_streak <= -5 {
            multiplier -= 0.03;
        } else if window.current_streak >= 5 {
            multiplier += 0.02;
        }
        let multiplier = multiplier.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER);

        let threshold = if pve < -self.config.underperformance_threshold {
            BASELINE_THRESHOLD + (pve.abs() * 0.5).min(15.0)
        } else if pve > self.config.overperformance_threshold {
            (BASELINE_THRESHOLD - (pve * 0.4).min(10.0)).max(self.config.min_confidence_floor)
        } else {
            BASELINE_THRESHOLD
        };

        let (action, detail) = if pve < -self.config.underperformance_threshold {
            (
                CalibrationAction::DecreaseConfidence,
                format!(
                    "underperforming by {:.1} points, confidence scaled to {:.2}",
                    pve.abs(),
                    multiplier
                ),
            )
        } else if pve > self.config.overperformance_threshold {
            (
                CalibrationAction::BoostAlgorithm,
                format!(
                    "outperforming by {:.1} points, confidence scaled to {:.2}",
                    pve, multiplier
                ),
            )
        } else {
            (CalibrationAction::NoChange, "within tolerance".to_string())
        };

        (
            ModelWeight {
                algorithm,
                base_weight: base,
                weight,
                confidence_multiplier: multiplier,
                min_confidence_threshold: threshold,
                reason: (action != CalibrationAction::NoChange).then(|| detail.clone()),
                updated_at: Utc::now(),
            },
            CalibrationDecision {
                algorithm,
                action,
                severity,
                detail,
            },
        )
    }

    /// Apply a calibrated weight table to a single raw confidence.
    ///
    /// An algorithm missing from the table passes through unchanged against
    /// the baseline threshold.
    pub fn apply_weight_adjustment(
        &self,
        confidence: f64,
        algorithm: AlgorithmId,
        weights: &[ModelWeight],
    ) -> WeightAdjustedConfidence {
        let Some(model) = weights.iter().find(|w| w.algorithm == algorithm) else {
            return WeightAdjustedConfidence {
                adjusted_confidence: confidence,
                meets_threshold: confidence >= BASELINE_THRESHOLD,
                weight: 1.0 / AlgorithmId::ALL.len() as f64,
            };
        };

        let adjusted = (confidence * model.confidence_multiplier).clamp(0.0, 100.0);
        WeightAdjustedConfidence {
            adjusted_confidence: adjusted,
            meets_threshold: adjusted >= model.min_confidence_threshold,
            weight: model.weight,
        }
    }
}

/// Default pause rule: deeply under expectation, losing outright, and cold
fn default_pause_predicate(window: &AlgorithmPerformanceWindow) -> bool {
    window.performance_vs_expectation() <= -15.0
        && window.win_rate < 45.0
        && window.current_streak <= -3
}

fn normalize(weights: &mut [ModelWeight]) {
    let total: f64 = weights.iter().map(|w| w.weight).sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            w.weight /= total;
        }
    }
}
