//! Tests for the ensemble stacker

use super::*;
use crate::config::EnsembleConfig;
use crate::consensus::ConsensusSynthesizer;
use crate::types::{
    FormResult, MatchStatus, PredictionFactors, Recommendation, StrengthMetrics, TeamSnapshot,
};
use chrono::Utc;
use uuid::Uuid;

fn prediction(
    algorithm: AlgorithmId,
    recommendation: Recommendation,
    confidence: f64,
    ev_percentage: f64,
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
        expected_value: ev_percentage / 100.0,
        ev_percentage,
        kelly_fraction: 0.0,
        kelly_stake_units: rust_decimal::Decimal::ZERO,
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

fn team(form: &str) -> TeamSnapshot {
    TeamSnapshot {
        id: "t".to_string(),
        name: "t".to_string(),
        record: "10-10".to_string(),
        recent_form: form.chars().filter_map(FormResult::from_char).collect(),
        logo_url: None,
    }
}

fn match_with_forms(home_form: &str, away_form: &str) -> MatchInput {
    MatchInput {
        id: "m1".to_string(),
        home: team(home_form),
        away: team(away_form),
        league: "NBA".to_string(),
        kickoff: Utc::now(),
        status: MatchStatus::Scheduled,
        current_score: None,
        odds: None,
    }
}

fn consensus_of(predictions: Vec<PredictionResult>) -> crate::consensus::ConsensusResult {
    ConsensusSynthesizer::new().synthesize(&predictions, &[], "m1")
}

#[test]
fn test_boosting_adjustments_chase_the_mean() {
    let consensus = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 60.0, 0.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 80.0, 0.0),
    ]);
    let result = EnsembleStacker::with_defaults().run(&consensus, &match_with_forms("", ""));

    assert_eq!(result.boost_adjustments.len(), 2);
    let low = &result.boost_adjustments[0];
    let high = &result.boost_adjustments[1];
    // The under-confident predictor is pulled up, the over-confident one down
    assert!(low.adjustment > 0.0);
    assert!(high.adjustment < 0.0);
    // Symmetric residuals cancel in the mean
    assert!(result.layers.boosting.abs() < 1e-9);
}

#[test]
fn test_diversity_zero_for_identical_predictions() {
    let identical = vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0, 10.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0, 10.0),
    ];
    assert!(diversity(&identical).abs() < 1e-12);
}

#[test]
fn test_diversity_rises_with_disagreement() {
    let agreeing = vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0, 10.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0, 10.0),
    ];
    let disagreeing = vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 60.0, 10.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Away, 90.0, 10.0),
    ];
    assert!(diversity(&disagreeing) > diversity(&agreeing));
}

#[test]
fn test_diversity_zero_for_single_predictor() {
    let lone = vec![prediction(
        AlgorithmId::MlPowerIndex,
        Recommendation::Home,
        70.0,
        10.0,
    )];
    assert_eq!(diversity(&lone), 0.0);
}

#[test]
fn test_diversity_raises_stacked_confidence() {
    let agreeing = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0, 10.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0, 10.0),
        prediction(AlgorithmId::StatisticalEdge, Recommendation::Home, 70.0, 10.0),
    ]);
    let varied = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 60.0, 2.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 75.0, 18.0),
        prediction(AlgorithmId::StatisticalEdge, Recommendation::Home, 72.0, 9.0),
    ]);
    let stacker = EnsembleStacker::with_defaults();
    let input = match_with_forms("", "");

    let flat = stacker.run(&agreeing, &input);
    let spread = stacker.run(&varied, &input);

    assert_eq!(flat.diversity_score, 0.0);
    assert!(spread.diversity_score > 0.0);
    assert!(spread.layers.diversity > 0.0);
}

#[test]
fn test_home_win_streak_dampens_confidence() {
    let consensus = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0, 10.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0, 10.0),
    ]);
    let stacker = EnsembleStacker::with_defaults();

    let no_patterns = stacker.run(&consensus, &match_with_forms("", ""));
    let home_streak = stacker.run(&consensus, &match_with_forms("WWWWW", ""));

    assert_eq!(home_streak.home_pattern.kind, PatternKind::Streak);
    assert_eq!(home_streak.dominant_pattern.kind, PatternKind::Streak);
    assert!(home_streak.layers.pattern < 0.0);
    assert!(home_streak.confidence <= no_patterns.confidence);
}

#[test]
fn test_away_loss_streak_mirrors_home_streak() {
    let consensus = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 70.0, 10.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 70.0, 10.0),
    ]);
    let stacker = EnsembleStacker::with_defaults();

    // An away losing streak lifts the away side, so the home-away spread
    // narrows and the pattern impact is negative for home
    let result = stacker.run(&consensus, &match_with_forms("", "LLLLL"));
    assert_eq!(result.away_pattern.kind, PatternKind::Streak);
    assert!(result.away_pattern.adjustment > 0.0);
    assert!(result.layers.pattern < 0.0);
}

#[test]
fn test_calibration_shrinks_toward_center() {
    let high = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 84.0, 0.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 84.0, 0.0),
    ]);
    let low = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Skip, 42.0, 0.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Skip, 42.0, 0.0),
    ]);
    let stacker = EnsembleStacker::with_defaults();
    let input = match_with_forms("", "");

    assert!(stacker.run(&high, &input).calibration_delta < 0.0);
    assert!(stacker.run(&low, &input).calibration_delta > 0.0);
}

#[test]
fn test_final_confidence_stays_in_band() {
    let consensus = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 85.0, 40.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Away, 85.0, 40.0),
        prediction(AlgorithmId::StatisticalEdge, Recommendation::Draw, 85.0, 40.0),
    ]);
    let result =
        EnsembleStacker::with_defaults().run(&consensus, &match_with_forms("LLLLLL", "WWWWWW"));

    assert!(result.confidence >= 40.0);
    assert!(result.confidence <= 95.0);
    assert_eq!(result.confidence, result.confidence.round());
}

#[test]
fn test_layer_breakdown_reconciles() {
    let consensus = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 65.0, 8.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 75.0, 12.0),
    ]);
    let result =
        EnsembleStacker::with_defaults().run(&consensus, &match_with_forms("WLWLWL", ""));

    let reconstructed = consensus.confidence
        + result.layers.boosting
        + result.layers.pattern
        + result.layers.diversity
        + result.layers.calibration;
    assert_eq!(result.confidence, reconstructed.round().clamp(40.0, 95.0));
}

#[test]
fn test_custom_config_rounds_and_rate() {
    let config = EnsembleConfig {
        boosting_rounds: 1,
        learning_rate: 0.5,
        ..Default::default()
    };
    let consensus = consensus_of(vec![
        prediction(AlgorithmId::MlPowerIndex, Recommendation::Home, 60.0, 0.0),
        prediction(AlgorithmId::ValuePickFinder, Recommendation::Home, 80.0, 0.0),
    ]);
    let result = EnsembleStacker::new(config).run(&consensus, &match_with_forms("", ""));

    // One round at lr=0.5: adjustment is exactly half the residual
    let target = consensus.raw_weighted_confidence;
    assert!((result.boost_adjustments[0].adjustment - (target - 60.0) * 0.5).abs() < 1e-9);
    assert!((result.boost_adjustments[1].adjustment - (target - 80.0) * 0.5).abs() < 1e-9);
}
