//! Per-algorithm prediction pipeline
//!
//! Each algorithm variant runs the same pipeline: factors → confidence →
//! recommendation → score projection → expected value / Kelly sizing.
//! Variants differ only through their registry profile (weights, thresholds)
//! and up to three pure hooks - there is no inheritance and no shared mutable
//! state, so batch prediction is trivially parallel-safe.

pub mod registry;


pub use registry::{registry, AlgorithmProfile};

use chrono::Utc;
use uuid::Uuid;

use crate::config::StakingConfig;
use crate::staking;
use crate::strength;
use crate::types::{
    AlgorithmId, MatchInput, PredictionContext, PredictionFactors, PredictionResult,
    Recommendation,
};

/// Confidence cap applied before consensus
pub const MAX_CONFIDENCE: f64 = 85.0;

/// League-keyed home advantage, in confidence points
pub fn home_advantage(league: &str) -> f64 {
    match league {
        "NBA" => 3.0,
        "NFL" => 2.5,
        "MLB" => 2.0,
        "NHL" => 2.2,
        "EPL" => 3.5,
        "LALIGA" => 3.5,
        "SERIEA" => 3.2,
        "BUNDESLIGA" => 3.0,
        _ => 2.5,
    }
}

/// League-keyed baseline score per side
pub fn league_base_score(league: &str) -> f64 {
    match league {
        "NBA" => 110.0,
        "NFL" => 22.0,
        "MLB" => 4.5,
        "NHL" => 3.0,
        "EPL" => 1.4,
        "LALIGA" => 1.4,
        "SERIEA" => 1.3,
        "BUNDESLIGA" => 1.5,
        _ => 2.5,
    }
}

/// One algorithm variant, fully described by its profile
pub struct Predictor {
    algorithm: AlgorithmId,
    profile: AlgorithmProfile,
    staking: StakingConfig,
}

impl Predictor {
    pub fn new(algorithm: AlgorithmId, profile: AlgorithmProfile, staking: StakingConfig) -> Self {
        Self {
            algorithm,
            profile,
            staking,
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    /// Forecast one match. Deterministic: identical inputs yield identical
    /// output apart from the generation timestamp and id.
    pub fn predict(&self, input: &MatchInput, ctx: &PredictionContext) -> PredictionResult {
        let mut factors = self.compute_factors(input, ctx);
        if let Some(hook) = self.profile.factor_hook {
            factors = hook(ctx, factors);
        }

        let edge = self.signed_edge(&factors);
        let mut confidence = 50.0 + edge.abs();
        if let Some(hook) = self.profile.confidence_hook {
            confidence = hook(&factors, confidence);
        }
        let confidence = confidence.clamp(self.profile.min_confidence, MAX_CONFIDENCE);

        let recommendation = if confidence < self.profile.skip_threshold {
            Recommendation::Skip
        } else if edge >= 0.0 {
            Recommendation::Home
        } else {
            Recommendation::Away
        };

        let (home_score, away_score) = self.project_scores(input, &factors);

        let true_probability = confidence / 100.0;
        let decimal_odds = match recommendation {
            Recommendation::Skip => None,
            rec => input.odds.as_ref().and_then(|o| o.for_recommendation(rec)),
        };

        let (expected_value, ev_pct, kelly) = match decimal_odds {
            Some(d) => (
                staking::expected_value(true_probability, d),
                staking::ev_percentage(true_probability, d),
                staking::kelly_fraction(true_probability, d, self.staking.kelly_fraction),
            ),
            None => (0.0, 0.0, 0.0),
        };

        let mut result = PredictionResult {
            id: Uuid::new_v4(),
            match_id: input.id.clone(),
            algorithm: self.algorithm,
            recommendation,
            confidence,
            true_probability,
            projected_home_score: home_score,
            projected_away_score: away_score,
            implied_odds: 1.0 / true_probability,
            expected_value,
            ev_percentage: ev_pct,
            kelly_fraction: kelly,
            kelly_stake_units: staking::stake_units(kelly, self.staking.bankroll_units),
            factors,
            generated_at: Utc::now(),
        };

        if let Some(hook) = self.profile.result_hook {
            result = hook(&self.staking, input, result);
        }

        tracing::debug!(
            algorithm = %self.algorithm,
            match_id = %input.id,
            recommendation = %result.recommendation,
            confidence = result.confidence,
            "generated prediction"
        );

        result
    }

    /// Forecast a list of matches; elements are independent
    pub fn predict_batch(
        &self,
        matches: &[MatchInput],
        ctx: &PredictionContext,
    ) -> Vec<PredictionResult> {
        matches.iter().map(|m| self.predict(m, ctx)).collect()
    }

    fn compute_factors(&self, input: &MatchInput, ctx: &PredictionContext) -> PredictionFactors {
        let home_strength = strength::calculate(&input.home);
        let away_strength = strength::calculate(&input.away);

        let historical_impact = ctx
            .head_to_head
            .as_ref()
            .and_then(|h2h| h2h.home_win_pct())
            .map(|pct| (pct - 0.5) * 20.0);

        PredictionFactors {
            home_strength,
            away_strength,
            differential: home_strength.overall() - away_strength.overall(),
            home_advantage: home_advantage(&input.league),
            momentum_differential: home_strength.momentum - away_strength.momentum,
            historical_impact,
            injury_impact: ctx.injury_impact,
            weather_impact: ctx.weather_impact,
        }
    }

    /// Home-signed edge in confidence points. The magnitude sets confidence,
    /// the sign picks the side.
    fn signed_edge(&self, factors: &PredictionFactors) -> f64 {
        factors.differential * self.profile.strength_weight
            + factors.home_advantage * self.profile.home_weight
            + factors.momentum_differential * self.profile.momentum_weight * 0.1
            + factors.historical_impact.unwrap_or(0.0) * self.profile.historical_weight
            + factors.injury_impact.unwrap_or(0.0)
            + factors.weather_impact.unwrap_or(0.0)
    }

    fn project_scores(&self, input: &MatchInput, factors: &PredictionFactors) -> (f64, f64) {
        let base = league_base_score(&input.league);
        let home = projected_score(
            base,
            factors.home_strength.offense,
            factors.away_strength.defense,
            factors.home_strength.momentum,
        ) * 1.02;
        let away = projected_score(
            base,
            factors.away_strength.offense,
            factors.home_strength.defense,
            factors.away_strength.momentum,
        );
        (round1(home), round1(away))
    }
}

fn projected_score(base: f64, offense: f64, opp_defense: f64, momentum: f64) -> f64 {
    let offense_impact = (offense - 50.0) / 100.0 * 0.5;
    let defense_impact = (opp_defense - 50.0) / 100.0 * 0.4;
    let momentum_impact = (momentum - 50.0) / 100.0 * 0.1;
    (base * (1.0 + offense_impact - defense_impact + momentum_impact)).max(0.0)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Re-derive the probability, odds and value fields after a confidence change
pub(crate) fn rederive_value_fields(
    staking_cfg: &StakingConfig,
    input: &MatchInput,
    mut result: PredictionResult,
    confidence: f64,
) -> PredictionResult {
    result.confidence = confidence;
    result.true_probability = confidence / 100.0;
    result.implied_odds = 1.0 / result.true_probability;

    let decimal_odds = match result.recommendation {
        Recommendation::Skip => None,
        rec => input.odds.as_ref().and_then(|o| o.for_recommendation(rec)),
    };
    if let Some(d) = decimal_odds {
        result.expected_value = staking::expected_value(result.true_probability, d);
        result.ev_percentage = staking::ev_percentage(result.true_probability, d);
        result.kelly_fraction =
            staking::kelly_fraction(result.true_probability, d, staking_cfg.kelly_fraction);
        result.kelly_stake_units =
            staking::stake_units(result.kelly_fraction, staking_cfg.bankroll_units);
    }
    result
}
