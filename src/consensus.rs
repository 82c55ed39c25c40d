//! Consensus synthesis
//!
//! Fuses the independent predictor outputs into one weighted vote. The key
//! design choice: confidence is penalized when predictors disagree, never
//! just averaged - the agreement multiplier scales the weighted mean down to
//! 85% of itself at full disagreement.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AlgorithmWeight, PredictionResult, Recommendation};

const MIN_CONSENSUS_CONFIDENCE: f64 = 40.0;
const MAX_CONSENSUS_CONFIDENCE: f64 = 95.0;

/// Weighted fusion of the component predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub match_id: String,
    pub recommendation: Recommendation,
    /// Final agreement-adjusted confidence in [40, 95]
    pub confidence: f64,
    pub true_probability: f64,
    pub projected_home_score: f64,
    pub projected_away_score: f64,
    pub expected_value: f64,
    pub ev_percentage: f64,
    pub kelly_fraction: f64,
    pub kelly_stake_units: Decimal,
    /// The component predictions that were fused
    pub components: Vec<PredictionResult>,
    /// The weights in effect during fusion
    pub weights: Vec<AlgorithmWeight>,
    /// Fraction of predictors backing the winning recommendation
    pub agreement: f64,
    pub unanimous: bool,
    /// Weighted mean confidence before the agreement adjustment
    pub raw_weighted_confidence: f64,
    pub generated_at: DateTime<Utc>,
}

pub struct ConsensusSynthesizer;

impl ConsensusSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(
        &self,
        predictions: &[PredictionResult],
        weights: &[AlgorithmWeight],
        match_id: &str,
    ) -> ConsensusResult {
        if predictions.is_empty() {
            return Self::empty(match_id, weights);
        }

        let default_weight = 1.0 / predictions.len() as f64;
        let weight_for = |p: &PredictionResult| -> f64 {
            weights
                .iter()
                .find(|w| w.algorithm == p.algorithm)
                .map(|w| w.weight)
                .unwrap_or(default_weight)
        };

        let mut home_mass = 0.0;
        let mut away_mass = 0.0;
        let mut draw_mass = 0.0;
        let mut weight_total = 0.0;
        let mut conf_sum = 0.0;
        let mut home_score_sum = 0.0;
        let mut away_score_sum = 0.0;
        let mut ev_sum = 0.0;
        let mut ev_pct_sum = 0.0;
        let mut kelly_sum = 0.0;
        let mut stake_sum = Decimal::ZERO;

        for p in predictions {
            let w = weight_for(p);
            match p.recommendation {
                Recommendation::Home => home_mass += w,
                Recommendation::Away => away_mass += w,
                Recommendation::Draw => draw_mass += w,
                Recommendation::Skip => {}
            }
            weight_total += w;
            conf_sum += p.confidence * w;
            home_score_sum += p.projected_home_score * w;
            away_score_sum += p.projected_away_score * w;
            ev_sum += p.expected_value * w;
            ev_pct_sum += p.ev_percentage * w;
            kelly_sum += p.kelly_fraction * w;
            stake_sum += p.kelly_stake_units
                * Decimal::from_f64(w).unwrap_or(Decimal::ZERO);
        }

        // weight_total > 0: every prediction contributes at least the default
        let raw_weighted_confidence = conf_sum / weight_total;
        let recommendation = winning_recommendation(home_mass, away_mass, draw_mass);

        let matching = predictions
            .iter()
            .filter(|p| p.recommendation == recommendation)
            .count();
        let agreement = matching as f64 / predictions.len() as f64;
        let unanimous = matching == predictions.len();

        let confidence = (raw_weighted_confidence * (0.85 + 0.15 * agreement))
            .round()
            .clamp(MIN_CONSENSUS_CONFIDENCE, MAX_CONSENSUS_CONFIDENCE);

        let weight_total_dec = Decimal::from_f64(weight_total).unwrap_or(Decimal::ONE);

        ConsensusResult {
            match_id: match_id.to_string(),
            recommendation,
            confidence,
            true_probability: confidence / 100.0,
            projected_home_score: home_score_sum / weight_total,
            projected_away_score: away_score_sum / weight_total,
            expected_value: ev_sum / weight_total,
            ev_percentage: ev_pct_sum / weight_total,
            kelly_fraction: kelly_sum / weight_total,
            kelly_stake_units: (stake_sum / weight_total_dec).round_dp(2),
            components: predictions.to_vec(),
            weights: weights.to_vec(),
            agreement,
            unanimous,
            raw_weighted_confidence,
            generated_at: Utc::now(),
        }
    }

    fn empty(match_id: &str, weights: &[AlgorithmWeight]) -> ConsensusResult {
        ConsensusResult {
            match_id: match_id.to_string(),
            recommendation: Recommendation::Skip,
            confidence: MIN_CONSENSUS_CONFIDENCE,
            true_probability: MIN_CONSENSUS_CONFIDENCE / 100.0,
            projected_home_score: 0.0,
            projected_away_score: 0.0,
            expected_value: 0.0,
            ev_percentage: 0.0,
            kelly_fraction: 0.0,
            kelly_stake_units: Decimal::ZERO,
            components: Vec::new(),
            weights: weights.to_vec(),
            agreement: 0.0,
            unanimous: false,
            raw_weighted_confidence: 0.0,
            generated_at: Utc::now(),
        }
    }
}

impl Default for ConsensusSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// The category with strictly the largest vote mass wins; an exact tie or
/// all-zero mass yields Skip
fn winning_recommendation(home: f64, away: f64, draw: f64) -> Recommendation {
    let max = home.max(away).max(draw);
    if max <= 0.0 {
        return Recommendation::Skip;
    }
    let at_max = [home, away, draw].iter().filter(|&&m| m == max).count();
    if at_max > 1 {
        return Recommendation::Skip;
    }
    if home == max {
        Recommendation::Home
    } else if away == max {
        Recommendation::Away
    } else {
        Recommendation::Draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlgorithmId, PredictionFactors, StrengthMetrics};
    use uuid::Uuid;

    fn prediction(
        algorithm: AlgorithmId,
        recommendation: Recommendation,
        confidence: f64,
    ) -> PredictionResult {
        PredictionResult {
            id: Uuid::new_v4(),
            match_id: "m1".to_string(),
            algorithm,
            recommendation,
            confidence,
            true_probability: confidence / 100.0,
            projected_home_score: 105.0,
            projected_away_score: 100.0,
            implied_odds: 100.0 / confidence,
            expected_value: 0.1,
            ev_percentage: 10.0,
            kelly_fraction: 0.02,
            kelly_stake_units: rust_decimal_macros::dec!(2),
            factors: PredictionFactors {
                home_strength: StrengthMetrics::NEUTRAL,
                away_strength: StrengthMetrics::NEUTRAL,
                differential: 0.0,
                home_advantage: 2.5,
                momentum_differential: 0.0,
                historical_impact: None,
                injury_impact: None,
                weather_impact: None,
            },
            generated_at: Utc::now(),
        }
    }

    fn weight(algorithm: AlgorithmId, w: f64) -> AlgorithmWeight {
        AlgorithmWeight {
            algorithm,
            weight: w,
            win_rate: 55.0,
            sample_count: 30,
            avg_confidence: 60.0,
            reliability: 1.0,
        }
    }

    #[test]
    fn test_unanimous_no_penalty() {
        let predictions = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0),
            prediction(AlgorithmId::StatisticalEdge, Recommendation::Home, 70.0),
        ];
        let result = ConsensusSynthesizer::new().synthesize(&predictions, &[], "m1");

        assert_eq!(result.recommendation, Recommendation::Home);
        assert_eq!(result.agreement, 1.0);
        assert!(result.unanimous);
        // Multiplier is exactly 1.0 at full agreement
        assert!(result.confidence >= result.raw_weighted_confidence * 0.9999);
        assert_eq!(result.confidence, 70.0);
    }

    #[test]
    fn test_disagreement_penalizes_confidence() {
        let agreed = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0),
            prediction(AlgorithmId::StatisticalEdge, Recommendation::Home, 70.0),
        ];
        let split = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0),
            prediction(AlgorithmId::StatisticalEdge, Recommendation::Away, 70.0),
        ];
        let synth = ConsensusSynthesizer::new();

        let unanimous = synth.synthesize(&agreed, &[], "m1");
        let contested = synth.synthesize(&split, &[], "m1");

        assert!(contested.confidence < unanimous.confidence);
        assert!(!contested.unanimous);
        assert!((contested.agreement - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_vote_overrides_headcount() {
        // Two light votes for Away vs one heavy vote for Home
        let predictions = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 75.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Away, 60.0),
            prediction(AlgorithmId::StatisticalEdge, Recommendation::Away, 60.0),
        ];
        let weights = vec![
            weight(AlgorithmId::MlPowerIndex, 0.7),
            weight(AlgorithmId::ValuePickFinder, 0.15),
            weight(AlgorithmId::StatisticalEdge, 0.15),
        ];
        let result = ConsensusSynthesizer::new().synthesize(&predictions, &weights, "m1");

        assert_eq!(result.recommendation, Recommendation::Home);
        assert!((result.agreement - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_skip_yields_skip() {
        let predictions = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Skip, 45.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Skip, 45.0),
        ];
        let result = ConsensusSynthesizer::new().synthesize(&predictions, &[], "m1");

        assert_eq!(result.recommendation, Recommendation::Skip);
        assert_eq!(result.agreement, 1.0);
    }

    #[test]
    fn test_exact_tie_yields_skip() {
        let predictions = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 60.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Away, 60.0),
        ];
        let result = ConsensusSynthesizer::new().synthesize(&predictions, &[], "m1");

        assert_eq!(result.recommendation, Recommendation::Skip);
    }

    #[test]
    fn test_confidence_clamped_to_band() {
        let low = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 42.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Away, 42.0),
            prediction(AlgorithmId::StatisticalEdge, Recommendation::Draw, 42.0),
        ];
        let result = ConsensusSynthesizer::new().synthesize(&low, &[], "m1");
        assert!(result.confidence >= 40.0);
        assert!(result.confidence <= 95.0);
    }

    #[test]
    fn test_missing_weights_default_to_equal() {
        let predictions = vec![
            prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 60.0),
            prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 80.0),
        ];
        let result = ConsensusSynthesizer::new().synthesize(&predictions, &[], "m1");

        assert!((result.raw_weighted_confidence - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_predictions_degrade() {
        let result = ConsensusSynthesizer::new().synthesize(&[], &[], "m1");
        assert_eq!(result.recommendation, Recommendation::Skip);
        assert_eq!(result.confidence, 40.0);
        assert!(result.components.is_empty());
    }
}
