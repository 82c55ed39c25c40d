//! Data-access contracts
//!
//! The persistence and ingestion layers live outside this crate; the engine
//! only sees these async traits. An in-memory implementation backs the demo
//! binary and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AlgorithmId, HeadToHeadRecord, MatchInput, MatchStatus, PredictionResult};

/// Per-algorithm accuracy statistics aggregated from settled predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStats {
    pub algorithm: AlgorithmId,
    /// Realized win rate, 0-100
    pub win_rate: f64,
    pub total_predictions: u32,
    pub correct_predictions: u32,
    /// Average stated confidence, 0-100
    pub avg_confidence: f64,
}

/// Read access to matches
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchReader: Send + Sync {
    async fn match_by_id(&self, id: &str) -> Result<Option<MatchInput>>;
    async fn matches_by_league(&self, league: &str) -> Result<Vec<MatchInput>>;
    async fn matches_by_status(&self, status: MatchStatus) -> Result<Vec<MatchInput>>;
}

/// Read access to historical head-to-head aggregates
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoricalReader: Send + Sync {
    async fn head_to_head(&self, home_id: &str, away_id: &str)
        -> Result<Option<HeadToHeadRecord>>;
}

/// Read access to per-algorithm performance statistics
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlgorithmStatsProvider: Send + Sync {
    async fn algorithm_stats(&self) -> Result<Vec<AlgorithmStats>>;
}

/// Write access for predictions, keyed by match id for later settlement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn save_prediction(&self, prediction: &PredictionResult) -> Result<()>;
    async fn save_predictions(&self, predictions: &[PredictionResult]) -> Result<()>;
    async fn predictions_for_match(&self, match_id: &str) -> Result<Vec<PredictionResult>>;
}

/// In-memory store for tests and the demo binary
#[derive(Default)]
pub struct InMemoryStore {
    matches: RwLock<HashMap<String, MatchInput>>,
    head_to_head: RwLock<HashMap<(String, String), HeadToHeadRecord>>,
    stats: RwLock<Vec<AlgorithmStats>>,
    predictions: RwLock<HashMap<String, Vec<PredictionResult>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_match(&self, input: MatchInput) {
        self.matches.write().insert(input.id.clone(), input);
    }

    pub fn insert_head_to_head(&self, home_id: &str, away_id: &str, record: HeadToHeadRecord) {
        self.head_to_head
            .write()
            .insert((home_id.to_string(), away_id.to_string()), record);
    }

    pub fn set_stats(&self, stats: Vec<AlgorithmStats>) {
        *self.stats.write() = stats;
    }

    pub fn record_stat(&self, stat: AlgorithmStats) {
        self.stats.write().push(stat);
    }
}

#[async_trait]
impl MatchReader for InMemoryStore {
    async fn match_by_id(&self, id: &str) -> Result<Option<MatchInput>> {
        Ok(self.matches.read().get(id).cloned())
    }

    async fn matches_by_league(&self, league: &str) -> Result<Vec<MatchInput>> {
        Ok(self
            .matches
            .read()
            .values()
            .filter(|m| m.league == league)
            .cloned()
            .collect())
    }

    async fn matches_by_status(&self, status: MatchStatus) -> Result<Vec<MatchInput>> {
        Ok(self
            .matches
            .read()
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HistoricalReader for InMemoryStore {
    async fn head_to_head(
        &self,
        home_id: &str,
        away_id: &str,
    ) -> Result<Option<HeadToHeadRecord>> {
        Ok(self
            .head_to_head
            .read()
            .get(&(home_id.to_string(), away_id.to_string()))
            .cloned())
    }
}

#[async_trait]
impl AlgorithmStatsProvider for InMemoryStore {
    async fn algorithm_stats(&self) -> Result<Vec<AlgorithmStats>> {
        Ok(self.stats.read().clone())
    }
}

#[async_trait]
impl PredictionStore for InMemoryStore {
    async fn save_prediction(&self, prediction: &PredictionResult) -> Result<()> {
        self.predictions
            .write()
            .entry(prediction.match_id.clone())
            .or_default()
            .push(prediction.clone());
        Ok(())
    }

    async fn save_predictions(&self, predictions: &[PredictionResult]) -> Result<()> {
        let mut guard = self.predictions.write();
        for p in predictions {
            guard.entry(p.match_id.clone()).or_default().push(p.clone());
        }
        Ok(())
    }

    async fn predictions_for_match(&self, match_id: &str) -> Result<Vec<PredictionResult>> {
        Ok(self
            .predictions
            .read()
            .get(match_id)
            .cloned()
            .unwrap_or_default())
    }
}
