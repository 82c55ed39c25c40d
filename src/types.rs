//! Core domain types shared across the forecasting pipeline
//!
//! All types here are value objects: produced by pure functions from
//! caller-supplied inputs and never mutated after construction. Adjustments
//! always build a new value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single result in a team's recent form, most-recent-first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    W,
    L,
    D,
}

impl FormResult {
    /// Win-percentage value (draw counts as half a win)
    pub fn value(&self) -> f64 {
        match self {
            FormResult::W => 1.0,
            FormResult::L => 0.0,
            FormResult::D => 0.5,
        }
    }

    /// Signed encoding used by sequential-pattern detection
    pub fn signal(&self) -> f64 {
        match self {
            FormResult::W => 1.0,
            FormResult::L => -1.0,
            FormResult::D => 0.0,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(FormResult::W),
            'L' => Some(FormResult::L),
            'D' => Some(FormResult::D),
            _ => None,
        }
    }
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

/// Immutable snapshot of a team going into a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub id: String,
    pub name: String,
    /// Won-loss record, e.g. "12-8"
    pub record: String,
    /// Recent results, most recent first
    #[serde(default)]
    pub recent_form: Vec<FormResult>,
    pub logo_url: Option<String>,
}

impl TeamSnapshot {
    /// Win percentage parsed from the "W-L" record string, if well-formed
    pub fn record_win_pct(&self) -> Option<f64> {
        let (w, l) = self.record.split_once('-')?;
        let wins: f64 = w.trim().parse().ok()?;
        let losses: f64 = l.trim().parse().ok()?;
        let total = wins + losses;
        if total > 0.0 {
            Some(wins / total)
        } else {
            None
        }
    }
}

/// Bookmaker odds for a match (decimal odds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsSnapshot {
    pub home: f64,
    pub away: f64,
    pub draw: Option<f64>,
    pub spread: Option<f64>,
    pub total: Option<f64>,
}

impl OddsSnapshot {
    /// Decimal odds for the recommended side, if it is a backable outcome
    pub fn for_recommendation(&self, rec: Recommendation) -> Option<f64> {
        match rec {
            Recommendation::Home => Some(self.home),
            Recommendation::Away => Some(self.away),
            Recommendation::Draw => self.draw,
            Recommendation::Skip => None,
        }
    }
}

/// A match to forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInput {
    pub id: String,
    pub home: TeamSnapshot,
    pub away: TeamSnapshot,
    /// League code, e.g. "EPL", "NBA"
    pub league: String,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    pub current_score: Option<(u32, u32)>,
    pub odds: Option<OddsSnapshot>,
}

/// Historical head-to-head aggregate between the two teams
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub home_wins: u32,
    pub away_wins: u32,
    pub draws: u32,
    pub total_games: u32,
    pub avg_home_score: f64,
    pub avg_away_score: f64,
}

impl HeadToHeadRecord {
    pub fn home_win_pct(&self) -> Option<f64> {
        if self.total_games == 0 {
            return None;
        }
        Some(self.home_wins as f64 / self.total_games as f64)
    }
}

/// Optional context supplied alongside a match
#[derive(Debug, Clone, Default)]
pub struct PredictionContext {
    pub head_to_head: Option<HeadToHeadRecord>,
    /// Signed confidence impact from injury reports
    pub injury_impact: Option<f64>,
    /// Signed confidence impact from weather conditions
    pub weather_impact: Option<f64>,
}

/// Offense/defense/momentum scores for one team, roughly in [20, 95]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthMetrics {
    pub offense: f64,
    pub defense: f64,
    pub momentum: f64,
}

impl StrengthMetrics {
    pub const NEUTRAL: StrengthMetrics = StrengthMetrics {
        offense: 50.0,
        defense: 50.0,
        momentum: 50.0,
    };

    pub fn overall(&self) -> f64 {
        (self.offense + self.defense + self.momentum) / 3.0
    }
}

/// Inputs that fed a prediction, kept for transparency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionFactors {
    pub home_strength: StrengthMetrics,
    pub away_strength: StrengthMetrics,
    /// home.overall - away.overall
    pub differential: f64,
    /// League-keyed home advantage constant
    pub home_advantage: f64,
    pub momentum_differential: f64,
    pub historical_impact: Option<f64>,
    pub injury_impact: Option<f64>,
    pub weather_impact: Option<f64>,
}

/// Which side a predictor backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Home,
    Away,
    Draw,
    Skip,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recommendation::Home => "home",
            Recommendation::Away => "away",
            Recommendation::Draw => "draw",
            Recommendation::Skip => "skip",
        };
        write!(f, "{}", s)
    }
}

/// Identity of a forecasting algorithm variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmId {
    MlPowerIndex,
    ValuePickFinder,
    StatisticalEdge,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 3] = [
        AlgorithmId::MlPowerIndex,
        AlgorithmId::ValuePickFinder,
        AlgorithmId::StatisticalEdge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmId::MlPowerIndex => "ml_power_index",
            AlgorithmId::ValuePickFinder => "value_pick_finder",
            AlgorithmId::StatisticalEdge => "statistical_edge",
        }
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One algorithm's forecast for one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub id: Uuid,
    pub match_id: String,
    pub algorithm: AlgorithmId,
    pub recommendation: Recommendation,
    /// Confidence in [min_confidence, 85] pre-consensus
    pub confidence: f64,
    /// confidence / 100
    pub true_probability: f64,
    pub projected_home_score: f64,
    pub projected_away_score: f64,
    /// 1 / true_probability
    pub implied_odds: f64,
    pub expected_value: f64,
    pub ev_percentage: f64,
    /// Fractional Kelly, floored at 0
    pub kelly_fraction: f64,
    /// Kelly fraction applied to the configured bankroll
    pub kelly_stake_units: Decimal,
    pub factors: PredictionFactors,
    pub generated_at: DateTime<Utc>,
}

/// Trust weight for one algorithm, derived from its historical accuracy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmWeight {
    pub algorithm: AlgorithmId,
    /// Normalized weight in [0, 1]; a cohort sums to 1
    pub weight: f64,
    /// Historical win rate, 0-100
    pub win_rate: f64,
    pub sample_count: u32,
    /// Average stated confidence, 0-100
    pub avg_confidence: f64,
    /// Sample-size-derived trust in the weight itself, [0, 1]
    pub reliability: f64,
}

impl AlgorithmWeight {
    /// Equal-weight fallback used when no performance data is available
    pub fn equal_split() -> Vec<AlgorithmWeight> {
        let n = AlgorithmId::ALL.len() as f64;
        AlgorithmId::ALL
            .iter()
            .map(|&algorithm| AlgorithmWeight {
                algorithm,
                weight: 1.0 / n,
                win_rate: 0.0,
                sample_count: 0,
                avg_confidence: 0.0,
                reliability: 0.0,
            })
            .collect()
    }
}
