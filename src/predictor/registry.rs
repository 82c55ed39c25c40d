//! Algorithm registry
//!
//! Maps each algorithm id to an immutable profile: factor weights, thresholds
//! and up to three pure override hooks. Variants are configuration records,
//! not subclasses.

use crate::config::StakingConfig;
use crate::types::{AlgorithmId, MatchInput, PredictionContext, PredictionFactors, PredictionResult};

use super::{rederive_value_fields, Predictor, MAX_CONFIDENCE};

/// Post-process factors before confidence is computed
pub type FactorHook = fn(&PredictionContext, PredictionFactors) -> PredictionFactors;

/// Post-process the raw confidence before clamping
pub type ConfidenceHook = fn(&PredictionFactors, f64) -> f64;

/// Post-process the finished result
pub type ResultHook = fn(&StakingConfig, &MatchInput, PredictionResult) -> PredictionResult;

/// Immutable per-variant configuration
#[derive(Debug, Clone)]
pub struct AlgorithmProfile {
    pub strength_weight: f64,
    pub home_weight: f64,
    pub momentum_weight: f64,
    pub historical_weight: f64,
    pub min_confidence: f64,
    pub skip_threshold: f64,
    pub factor_hook: Option<FactorHook>,
    pub confidence_hook: Option<ConfidenceHook>,
    pub result_hook: Option<ResultHook>,
}

/// Profile for a given algorithm id
pub fn profile(id: AlgorithmId) -> AlgorithmProfile {
    match id {
        // Leans on momentum; rewards extreme momentum gaps
        AlgorithmId::MlPowerIndex => AlgorithmProfile {
            strength_weight: 0.45,
            home_weight: 1.0,
            momentum_weight: 0.6,
            historical_weight: 1.0,
            min_confidence: 45.0,
            skip_threshold: 52.0,
            factor_hook: None,
            confidence_hook: Some(momentum_extremity_bonus),
            result_hook: None,
        },
        // Hunts positive expected value; boosts confidence when EV% > 5
        AlgorithmId::ValuePickFinder => AlgorithmProfile {
            strength_weight: 0.55,
            home_weight: 0.9,
            momentum_weight: 0.3,
            historical_weight: 0.8,
            min_confidence: 42.0,
            skip_threshold: 51.0,
            factor_hook: None,
            confidence_hook: None,
            result_hook: Some(value_boost),
        },
        // Trusts the head-to-head book when the sample is deep enough
        AlgorithmId::StatisticalEdge => AlgorithmProfile {
            strength_weight: 0.5,
            home_weight: 1.0,
            momentum_weight: 0.25,
            historical_weight: 1.2,
            min_confidence: 45.0,
            skip_threshold: 53.0,
            factor_hook: Some(deep_history_emphasis),
            confidence_hook: None,
            result_hook: None,
        },
    }
}

/// Build the full predictor cohort
pub fn registry(staking: &StakingConfig) -> Vec<Predictor> {
    AlgorithmId::ALL
        .iter()
        .map(|&id| Predictor::new(id, profile(id), staking.clone()))
        .collect()
}

fn momentum_extremity_bonus(factors: &PredictionFactors, confidence: f64) -> f64 {
    let gap = factors.momentum_differential.abs();
    if gap > 25.0 {
        confidence + (gap * 0.1).min(5.0)
    } else {
        confidence
    }
}

fn value_boost(
    staking_cfg: &StakingConfig,
    input: &MatchInput,
    result: PredictionResult,
) -> PredictionResult {
    if result.ev_percentage <= 5.0 {
        return result;
    }
    let boosted =
        (result.confidence + (result.ev_percentage * 0.4).min(8.0)).min(MAX_CONFIDENCE);
    rederive_value_fields(staking_cfg, input, result, boosted)
}

fn deep_history_emphasis(
    ctx: &PredictionContext,
    mut factors: PredictionFactors,
) -> PredictionFactors {
    let sample = ctx
        .head_to_head
        .as_ref()
        .map(|h| h.total_games)
        .unwrap_or(0);
    if sample >= 5 {
        factors.historical_impact = factors.historical_impact.map(|i| i * 1.5);
    }
    factors
}
