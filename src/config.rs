//! Engine configuration
//!
//! Every tunable of the pipeline lives here so callers own the lifecycle of
//! the numbers; nothing in the engine reads process-wide state. All fields
//! have serde defaults, so an empty TOML file yields the reference behavior.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration, loadable from a TOML file with env overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub staking: StakingConfig,
    #[serde(default)]
    pub ensemble: EnsembleConfig,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

impl Config {
    /// Load from a TOML file (missing file is fine - defaults apply),
    /// with `MATCHCAST_*` environment variables taking precedence.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MATCHCAST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::config(e.to_string()))
    }
}

/// Stake sizing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Fraction of full Kelly to apply ("quarter Kelly" by default)
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: f64,
    /// Bankroll in units; stake = kelly fraction x bankroll
    #[serde(default = "default_bankroll_units")]
    pub bankroll_units: Decimal,
}

fn default_kelly_fraction() -> f64 {
    0.25
}

fn default_bankroll_units() -> Decimal {
    dec!(100)
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: default_kelly_fraction(),
            bankroll_units: default_bankroll_units(),
        }
    }
}

/// Ensemble stacker parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    #[serde(default = "default_boosting_rounds")]
    pub boosting_rounds: u32,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Decay applied to streak-pattern adjustments
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    #[serde(default = "default_diversity_weight")]
    pub diversity_weight: f64,
    /// Strength of the shrink-toward-55 calibration layer
    #[serde(default = "default_calibration_strength")]
    pub calibration_strength: f64,
}

fn default_boosting_rounds() -> u32 {
    5
}

fn default_learning_rate() -> f64 {
    0.15
}

fn default_decay_rate() -> f64 {
    0.9
}

fn default_diversity_weight() -> f64 {
    0.12
}

fn default_calibration_strength() -> f64 {
    0.3
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            boosting_rounds: default_boosting_rounds(),
            learning_rate: default_learning_rate(),
            decay_rate: default_decay_rate(),
            diversity_weight: default_diversity_weight(),
            calibration_strength: default_calibration_strength(),
        }
    }
}

/// Monte Carlo simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_num_samples")]
    pub num_samples: u32,
    /// Gaussian noise std-dev applied to confidence
    #[serde(default = "default_confidence_std")]
    pub confidence_std: f64,
    /// Gaussian noise std-dev applied to each projected score
    #[serde(default = "default_score_std")]
    pub score_std: f64,
    /// Gaussian noise std-dev applied to true probability
    #[serde(default = "default_probability_std")]
    pub probability_std: f64,
    /// Lower percentile of the reported band
    #[serde(default = "default_percentile_low")]
    pub percentile_low: f64,
    /// Upper percentile of the reported band
    #[serde(default = "default_percentile_high")]
    pub percentile_high: f64,
    /// RNG seed for reproducible runs; None draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_samples() -> u32 {
    200
}

fn default_confidence_std() -> f64 {
    6.0
}

fn default_score_std() -> f64 {
    4.0
}

fn default_probability_std() -> f64 {
    0.08
}

fn default_percentile_low() -> f64 {
    10.0
}

fn default_percentile_high() -> f64 {
    90.0
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_samples: default_num_samples(),
            confidence_std: default_confidence_std(),
            score_std: default_score_std(),
            probability_std: default_probability_std(),
            percentile_low: default_percentile_low(),
            percentile_high: default_percentile_high(),
            seed: None,
        }
    }
}

/// Calibration controller parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Minimum settled bets before any adjustment is made
    #[serde(default = "default_min_bets")]
    pub min_bets: u32,
    /// Cap on a single weight adjustment step
    #[serde(default = "default_max_weight_change")]
    pub max_weight_change: f64,
    /// Points of actual-vs-expected shortfall that trigger a demotion
    #[serde(default = "default_underperformance_threshold")]
    pub underperformance_threshold: f64,
    /// Points of outperformance that trigger a boost
    #[serde(default = "default_overperformance_threshold")]
    pub overperformance_threshold: f64,
    /// Max confidence reduction, in percent
    #[serde(default = "default_max_confidence_reduction")]
    pub max_confidence_reduction: f64,
    /// Max confidence boost, in percent
    #[serde(default = "default_max_confidence_boost")]
    pub max_confidence_boost: f64,
    /// Floor for the adjusted minimum-confidence threshold
    #[serde(default = "default_min_confidence_floor")]
    pub min_confidence_floor: f64,
}

fn default_min_bets() -> u32 {
    10
}

fn default_max_weight_change() -> f64 {
    0.15
}

fn default_underperformance_threshold() -> f64 {
    10.0
}

fn default_overperformance_threshold() -> f64 {
    5.0
}

fn default_max_confidence_reduction() -> f64 {
    20.0
}

fn default_max_confidence_boost() -> f64 {
    10.0
}

fn default_min_confidence_floor() -> f64 {
    45.0
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_bets: default_min_bets(),
            max_weight_change: default_max_weight_change(),
            underperformance_threshold: default_underperformance_threshold(),
            overperformance_threshold: default_overperformance_threshold(),
            max_confidence_reduction: default_max_confidence_reduction(),
            max_confidence_boost: default_max_confidence_boost(),
            min_confidence_floor: default_min_confidence_floor(),
        }
    }
}
