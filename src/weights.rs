//! Weight engine
//!
//! Converts historical per-algorithm accuracy and calibration statistics into
//! normalized trust weights. Read failures and empty stats degrade to equal
//! weights - a missing stats table must never abort a prediction cycle.

use std::sync::Arc;

use crate::data::AlgorithmStatsProvider;
use crate::types::{AlgorithmId, AlgorithmWeight};

/// Predictions needed before a win rate is fully trusted
const FULL_RELIABILITY_SAMPLES: f64 = 30.0;

pub struct WeightEngine {
    provider: Arc<dyn AlgorithmStatsProvider>,
}

impl WeightEngine {
    pub fn new(provider: Arc<dyn AlgorithmStatsProvider>) -> Self {
        Self { provider }
    }

    /// Fetch trust weights for the full algorithm cohort.
    ///
    /// Never fails: any provider error or an empty result falls back to an
    /// equal split with zero reliability.
    pub async fn fetch_weights(&self) -> Vec<AlgorithmWeight> {
        let stats = match self.provider.algorithm_stats().await {
            Ok(stats) if !stats.is_empty() => stats,
            Ok(_) => {
                tracing::debug!("no algorithm stats recorded yet, using equal weights");
                return AlgorithmWeight::equal_split();
            }
            Err(e) => {
                tracing::warn!("failed to load algorithm stats, using equal weights: {}", e);
                return AlgorithmWeight::equal_split();
            }
        };

        let mut raw: Vec<(AlgorithmId, f64, f64, u32, f64, f64)> = Vec::new();
        for stat in &stats {
            let reliability = (stat.total_predictions as f64 / FULL_RELIABILITY_SAMPLES).min(1.0);
            // Bayesian shrinkage toward the break-even baseline
            let shrunk_win_rate = reliability * stat.win_rate + (1.0 - reliability) * 50.0;
            let calibration_bonus =
                (1.0 - (stat.win_rate - stat.avg_confidence).abs() / 50.0).max(0.0);
            let raw_weight = (shrunk_win_rate / 100.0) * (0.7 + 0.3 * calibration_bonus);

            raw.push((
                stat.algorithm,
                raw_weight,
                stat.win_rate,
                stat.total_predictions,
                stat.avg_confidence,
                reliability,
            ));
        }

        let total: f64 = raw.iter().map(|r| r.1).sum();
        if total <= 0.0 {
            return AlgorithmWeight::equal_split();
        }

        raw.into_iter()
            .map(
                |(algorithm, raw_weight, win_rate, sample_count, avg_confidence, reliability)| {
                    AlgorithmWeight {
                        algorithm,
                        weight: raw_weight / total,
                        win_rate,
                        sample_count,
                        avg_confidence,
                        reliability,
                    }
                },
            )
            .collect()
    }
}
