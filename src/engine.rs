//! Forecast engine
//!
//! Wires the full pipeline behind one facade:
//!
//! ```text
//! predictors (x3) -> weights -> consensus -> ensemble -> monte carlo
//!                                   |
//!                              prediction store
//! ```
//!
//! All math stages are synchronous and pure; the only await points are the
//! stats provider and the prediction store.

use std::sync::Arc;

use crate::calibration::{
    AlgorithmPerformanceWindow, CalibrationController, CalibrationReport, ModelWeight,
    WeightAdjustedConfidence,
};
use crate::config::Config;
use crate::consensus::{ConsensusResult, ConsensusSynthesizer};
use crate::data::{AlgorithmStatsProvider, PredictionStore};
use crate::ensemble::{EnsembleResult, EnsembleStacker};
use crate::error::{Error, Result};
use crate::montecarlo::{MonteCarloResult, MonteCarloSimulator};
use crate::predictor::{registry, Predictor};
use crate::types::{
    AlgorithmId, AlgorithmWeight, MatchInput, PredictionContext, PredictionResult,
};
use crate::weights::WeightEngine;

/// Everything one pipeline run produced for a match
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub predictions: Vec<PredictionResult>,
    pub weights: Vec<AlgorithmWeight>,
    pub consensus: ConsensusResult,
    pub ensemble: EnsembleResult,
    pub monte_carlo: Option<MonteCarloResult>,
}

pub struct ForecastEngine {
    config: Config,
    predictors: Vec<Predictor>,
    weight_engine: WeightEngine,
    synthesizer: ConsensusSynthesizer,
    stacker: EnsembleStacker,
    simulator: MonteCarloSimulator,
    calibration: CalibrationController,
    store: Arc<dyn PredictionStore>,
}

impl ForecastEngine {
    pub fn new(
        config: Config,
        stats: Arc<dyn AlgorithmStatsProvider>,
        store: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            predictors: registry(&config.staking),
            weight_engine: WeightEngine::new(stats),
            synthesizer: ConsensusSynthesizer::new(),
            stacker: EnsembleStacker::new(config.ensemble.clone()),
            simulator: MonteCarloSimulator::new(config.monte_carlo.clone()),
            calibration: CalibrationController::with_defaults(config.calibration.clone()),
            config,
            store,
        }
    }

    /// Run one algorithm variant against a match
    pub fn predict(
        &self,
        algorithm: AlgorithmId,
        input: &MatchInput,
        ctx: &PredictionContext,
    ) -> Result<PredictionResult> {
        let predictor = self
            .predictors
            .iter()
            .find(|p| p.algorithm() == algorithm)
            .ok_or_else(|| Error::NotFound(format!("algorithm {}", algorithm)))?;
        Ok(predictor.predict(input, ctx))
    }

    /// Run the full algorithm cohort against a match
    pub fn predict_all(&self, input: &MatchInput, ctx: &PredictionContext) -> Vec<PredictionResult> {
        self.predictors
            .iter()
            .map(|p| p.predict(input, ctx))
            .collect()
    }

    /// Run the full cohort against a list of matches
    pub fn predict_batch(
        &self,
        matches: &[MatchInput],
        ctx: &PredictionContext,
    ) -> Vec<Vec<PredictionResult>> {
        matches.iter().map(|m| self.predict_all(m, ctx)).collect()
    }

    /// Current trust weights from recorded algorithm statistics
    pub async fn fetch_weights(&self) -> Vec<AlgorithmWeight> {
        self.weight_engine.fetch_weights().await
    }

    pub fn synthesize_consensus(
        &self,
        predictions: &[PredictionResult],
        weights: &[AlgorithmWeight],
        match_id: &str,
    ) -> ConsensusResult {
        self.synthesizer.synthesize(predictions, weights, match_id)
    }

    pub fn run_advanced_ensemble(
        &self,
        consensus: &ConsensusResult,
        input: &MatchInput,
    ) -> EnsembleResult {
        self.stacker.run(consensus, input)
    }

    pub fn run_monte_carlo(&self, consensus: &ConsensusResult) -> MonteCarloResult {
        self.simulator.simulate(consensus)
    }

    /// Monte Carlo over the components of an already-stacked ensemble
    pub fn run_monte_carlo_on_ensemble(&self, ensemble: &EnsembleResult) -> MonteCarloResult {
        self.simulator.simulate(&ensemble.consensus)
    }

    /// Monte Carlo with an explicit seed, overriding the configured one
    pub fn run_monte_carlo_seeded(
        &self,
        consensus: &ConsensusResult,
        seed: u64,
    ) -> MonteCarloResult {
        let mut mc = self.config.monte_carlo.clone();
        mc.seed = Some(seed);
        MonteCarloSimulator::new(mc).simulate(consensus)
    }

    pub fn calculate_model_weights(
        &self,
        windows: &[AlgorithmPerformanceWindow],
    ) -> CalibrationReport {
        self.calibration.calculate_model_weights(windows)
    }

    pub fn apply_weight_adjustment(
        &self,
        confidence: f64,
        algorithm: AlgorithmId,
        weights: &[ModelWeight],
    ) -> WeightAdjustedConfidence {
        self.calibration
            .apply_weight_adjustment(confidence, algorithm, weights)
    }

    /// End-to-end pipeline for one match. Component predictions are persisted
    /// for later settlement; persistence failures abort the run.
    pub async fn forecast(
        &self,
        input: &MatchInput,
        ctx: &PredictionContext,
        with_monte_carlo: bool,
    ) -> Result<ForecastReport> {
        let predictions = self.predict_all(input, ctx);
        self.store.save_predictions(&predictions).await?;

        let weights = self.fetch_weights().await;
        let consensus = self.synthesize_consensus(&predictions, &weights, &input.id);
        let ensemble = self.run_advanced_ensemble(&consensus, input);
        let monte_carlo = with_monte_carlo.then(|| self.run_monte_carlo(&consensus));

        tracing::info!(
            match_id = %input.id,
            recommendation = %consensus.recommendation,
            confidence = ensemble.confidence,
            "forecast complete"
        );

        Ok(ForecastReport {
            predictions,
            weights,
            consensus,
            ensemble,
            monte_carlo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AlgorithmStats, InMemoryStore};
    use crate::types::{FormResult, MatchStatus, OddsSnapshot, TeamSnapshot};
    use chrono::Utc;

    fn team(id: &str, record: &str, form: &str) -> TeamSnapshot {
        TeamSnapshot {
            id: id.to_string(),
            name: id.to_string(),
            record: record.to_string(),
            recent_form: form.chars().filter_map(FormResult::from_char).collect(),
            logo_url: None,
        }
    }

    fn sample_match() -> MatchInput {
        MatchInput {
            id: "m1".to_string(),
            home: team("h", "15-5", "WWLWW"),
            away: team("a", "8-12", "LLWLL"),
            league: "NBA".to_string(),
            kickoff: Utc::now(),
            status: MatchStatus::Scheduled,
            current_score: None,
            odds: Some(OddsSnapshot {
                home: 1.8,
                away: 2.2,
                draw: None,
                spread: None,
                total: None,
            }),
        }
    }

    fn seeded_engine(store: Arc<InMemoryStore>) -> ForecastEngine {
        let mut config = Config::default();
        config.monte_carlo.seed = Some(99);
        ForecastEngine::new(config, store.clone(), store)
    }

    #[tokio::test]
    async fn test_forecast_persists_component_predictions() {
        let store = Arc::new(InMemoryStore::new());
        let engine = seeded_engine(store.clone());

        let report = engine
            .forecast(&sample_match(), &PredictionContext::default(), false)
            .await
            .unwrap();

        assert_eq!(report.predictions.len(), AlgorithmId::ALL.len());
        assert!(report.monte_carlo.is_none());

        let stored = store.predictions_for_match("m1").await.unwrap();
        assert_eq!(stored.len(), AlgorithmId::ALL.len());
    }

    #[tokio::test]
    async fn test_forecast_with_monte_carlo() {
        let store = Arc::new(InMemoryStore::new());
        let engine = seeded_engine(store);

        let report = engine
            .forecast(&sample_match(), &PredictionContext::default(), true)
            .await
            .unwrap();

        let mc = report.monte_carlo.unwrap();
        assert_eq!(mc.num_samples, 200);
        assert!(mc.confidence.lower <= mc.confidence.upper);
        assert!(report.ensemble.confidence >= 40.0);
        assert!(report.ensemble.confidence <= 95.0);
    }

    #[tokio::test]
    async fn test_weights_flow_from_recorded_stats() {
        let store = Arc::new(InMemoryStore::new());
        store.set_stats(vec![
            AlgorithmStats {
                algorithm: AlgorithmId::MlPowerIndex,
                win_rate: 65.0,
                total_predictions: 50,
                correct_predictions: 33,
                avg_confidence: 63.0,
            },
            AlgorithmStats {
                algorithm: AlgorithmId::ValuePickFinder,
                win_rate: 45.0,
                total_predictions: 50,
                correct_predictions: 22,
                avg_confidence: 60.0,
            },
        ]);
        let engine = seeded_engine(store);

        let weights = engine.fetch_weights().await;
        let total: f64 = weights.iter().map(|w| w.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_seeded_monte_carlo_is_reproducible() {
        let store = Arc::new(InMemoryStore::new());
        let engine = seeded_engine(store);
        let input = sample_match();
        let ctx = PredictionContext::default();

        let predictions = engine.predict_all(&input, &ctx);
        let consensus = engine.synthesize_consensus(&predictions, &[], &input.id);

        let a = engine.run_monte_carlo_seeded(&consensus, 7);
        let b = engine.run_monte_carlo_seeded(&consensus, 7);
        assert_eq!(a.confidence.point, b.confidence.point);
        assert_eq!(a.pick_distribution, b.pick_distribution);
    }

    #[tokio::test]
    async fn test_single_algorithm_predict() {
        let store = Arc::new(InMemoryStore::new());
        let engine = seeded_engine(store);

        let result = engine
            .predict(
                AlgorithmId::MlPowerIndex,
                &sample_match(),
                &PredictionContext::default(),
            )
            .unwrap();
        assert_eq!(result.algorithm, AlgorithmId::MlPowerIndex);
    }
}
