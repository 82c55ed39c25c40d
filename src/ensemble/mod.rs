//! Ensemble stacking
//!
//! Refines a consensus with four sequential correction layers:
//! 1. Gradient-style residual correction across the component predictors
//! 2. Sequential-pattern detection on each team's recent form
//! 3. Diversity scoring - independent predictors that disagree for different
//!    reasons make the ensemble more trustworthy, not less
//! 4. Calibration shrink toward the historical base rate of 55
//!
//! Every layer's contribution is retained for transparency.

pub mod pattern;

#[cfg(test)]
mod tests;

pub use pattern::{PatternKind, SequentialPattern};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EnsembleConfig;
use crate::consensus::ConsensusResult;
use crate::types::{AlgorithmId, MatchInput, PredictionResult};

const MIN_STACKED_CONFIDENCE: f64 = 40.0;
const MAX_STACKED_CONFIDENCE: f64 = 95.0;
const CALIBRATION_CENTER: f64 = 55.0;

/// Residual correction accumulated for one predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostAdjustment {
    pub algorithm: AlgorithmId,
    pub adjustment: f64,
}

/// Signed confidence contribution of each layer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LayerBreakdown {
    pub boosting: f64,
    pub pattern: f64,
    pub diversity: f64,
    pub calibration: f64,
}

/// A consensus refined by the four stacking layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub consensus: ConsensusResult,
    pub boost_adjustments: Vec<BoostAdjustment>,
    pub home_pattern: SequentialPattern,
    pub away_pattern: SequentialPattern,
    /// The stronger of the two detected patterns
    pub dominant_pattern: SequentialPattern,
    pub diversity_score: f64,
    pub calibration_delta: f64,
    pub layers: LayerBreakdown,
    /// Final stacked confidence in [40, 95]
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

pub struct EnsembleStacker {
    config: EnsembleConfig,
}

impl EnsembleStacker {
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(EnsembleConfig::default())
    }

    pub fn run(&self, consensus: &ConsensusResult, input: &MatchInput) -> EnsembleResult {
        let boost_adjustments = self.boosting_layer(consensus);
        let boosting = if boost_adjustments.is_empty() {
            0.0
        } else {
            let mean = boost_adjustments.iter().map(|b| b.adjustment).sum::<f64>()
                / boost_adjustments.len() as f64;
            mean * 0.5
        };

        let home_pattern = pattern::detect(&input.home.recent_form, self.config.decay_rate);
        let away_pattern = pattern::detect(&input.away.recent_form, self.config.decay_rate);
        let pattern_impact = (home_pattern.adjustment - away_pattern.adjustment) * 0.4;

        let diversity_score = diversity(&consensus.components);
        let diversity_impact = diversity_score * self.config.diversity_weight * 10.0;

        let running =
            consensus.confidence + boosting + pattern_impact + diversity_impact;
        let calibration_delta =
            (CALIBRATION_CENTER - running) * self.config.calibration_strength * 0.1;

        let confidence = (running + calibration_delta)
            .round()
            .clamp(MIN_STACKED_CONFIDENCE, MAX_STACKED_CONFIDENCE);

        let dominant_pattern = if home_pattern.strength >= away_pattern.strength {
            home_pattern.clone()
        } else {
            away_pattern.clone()
        };

        tracing::debug!(
            match_id = %consensus.match_id,
            consensus_confidence = consensus.confidence,
            stacked_confidence = confidence,
            pattern = ?dominant_pattern.kind,
            diversity = diversity_score,
            "stacked ensemble"
        );

        EnsembleResult {
            consensus: consensus.clone(),
            boost_adjustments,
            home_pattern,
            away_pattern,
            dominant_pattern,
            diversity_score,
            calibration_delta,
            layers: LayerBreakdown {
                boosting,
                pattern: pattern_impact,
                diversity: diversity_impact,
                calibration: calibration_delta,
            },
            confidence,
            generated_at: Utc::now(),
        }
    }

    /// Each predictor chases the weighted-mean confidence over a fixed number
    /// of rounds; residuals shrink by (1 - learning_rate) per round.
    fn boosting_layer(&self, consensus: &ConsensusResult) -> Vec<BoostAdjustment> {
        let target = consensus.raw_weighted_confidence;
        consensus
            .components
            .iter()
            .map(|p| {
                let mut residual = target - p.confidence;
                let mut adjustment = 0.0;
                for _ in 0..self.config.boosting_rounds {
                    adjustment += residual * self.config.learning_rate;
                    residual *= 1.0 - self.config.learning_rate;
                }
                BoostAdjustment {
                    algorithm: p.algorithm,
                    adjustment,
                }
            })
            .collect()
    }
}

/// Diversity across the component predictions: confidence spread,
/// recommendation spread and EV spread. Zero for a lone predictor.
pub fn diversity(components: &[PredictionResult]) -> f64 {
    let n = components.len();
    if n < 2 {
        return 0.0;
    }

    let conf_std = population_std(components.iter().map(|p| p.confidence));
    let ev_std = population_std(components.iter().map(|p| p.ev_percentage));

    let unique_recs = {
        let mut recs: Vec<_> = components.iter().map(|p| p.recommendation).collect();
        recs.sort_by_key(|r| *r as u8);
        recs.dedup();
        recs.len()
    };

    0.4 * (conf_std / 15.0).min(1.0)
        + 0.35 * (unique_recs as f64 - 1.0) / (n as f64 - 1.0)
        + 0.25 * (ev_std / 10.0).min(1.0)
}

fn population_std(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
