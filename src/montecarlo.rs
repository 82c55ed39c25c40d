//! Monte Carlo uncertainty quantification
//!
//! Resamples the component predictions under Gaussian noise to turn the
//! single-point consensus into uncertainty bands. Every sample perturbs each
//! predictor's confidence, probability, projected scores and EV, recombines them
//! with the deterministic weights and re-votes. The full sample count always
//! runs; the simulation is synchronous and, given a seed, deterministic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::MonteCarloConfig;
use crate::consensus::ConsensusResult;
use crate::types::Recommendation;

const SKIP_THRESHOLD: f64 = 45.0;
const UNCERTAIN_BAND_WIDTH: f64 = 20.0;
const EDGE_PROXIMITY: f64 = 3.0;

/// How the deterministic point estimate sits inside its sampled band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationSignal {
    WellCalibrated,
    Overconfident,
    Underconfident,
    Uncertain,
}

/// Sampled distribution summary for one metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UncertaintyBand {
    /// Mean of the sampled values
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub std_dev: f64,
    /// Band width as a percentage of the point estimate
    pub width_pct: f64,
}

impl UncertaintyBand {
    fn zero() -> Self {
        Self {
            point: 0.0,
            lower: 0.0,
            upper: 0.0,
            std_dev: 0.0,
            width_pct: 0.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub match_id: String,
    pub num_samples: u32,
    pub confidence: UncertaintyBand,
    pub probability: UncertaintyBand,
    pub home_score: UncertaintyBand,
    pub away_score: UncertaintyBand,
    pub ev_percentage: UncertaintyBand,
    /// Fraction of samples that voted for the modal pick
    pub pick_stability: f64,
    /// Vote share per recommendation, summing to 1 when any samples ran
    pub pick_distribution: BTreeMap<Recommendation, f64>,
    pub signal: CalibrationSignal,
    pub generated_at: DateTime<Utc>,
}

pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(MonteCarloConfig::default())
    }

    pub fn simulate(&self, consensus: &ConsensusResult) -> MonteCarloResult {
        if consensus.components.is_empty() {
            return Self::empty(consensus);
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let n = consensus.components.len();
        let default_weight = 1.0 / n as f64;
        let weights: Vec<f64> = consensus
            .components
            .iter()
            .map(|p| {
                consensus
                    .weights
                    .iter()
                    .find(|w| w.algorithm == p.algorithm)
                    .map(|w| w.weight)
                    .unwrap_or(default_weight)
            })
            .collect();
        let weight_total: f64 = weights.iter().sum();

        let samples = self.config.num_samples as usize;
        let mut confidences = Vec::with_capacity(samples);
        let mut probabilities = Vec::with_capacity(samples);
        let mut home_scores = Vec::with_capacity(samples);
        let mut away_scores = Vec::with_capacity(samples);
        let mut ev_pcts = Vec::with_capacity(samples);
        let mut votes: BTreeMap<Recommendation, u32> = BTreeMap::new();

        for _ in 0..samples {
            let mut conf_sum = 0.0;
            let mut prob_sum = 0.0;
            let mut home_sum = 0.0;
            let mut away_sum = 0.0;
            let mut ev_sum = 0.0;

            for (p, &w) in consensus.components.iter().zip(&weights) {
                let conf = (p.confidence + gaussian(&mut rng) * self.config.confidence_std)
                    .clamp(0.0, 100.0);
                let prob = (p.true_probability + gaussian(&mut rng) * self.config.probability_std)
                    .clamp(0.01, 0.99);
                let home = (p.projected_home_score
                    + gaussian(&mut rng) * self.config.score_std)
                    .max(0.0);
                let away = (p.projected_away_score
                    + gaussian(&mut rng) * self.config.score_std)
                    .max(0.0);
                // EV noise rides the probability scale, converted to percent
                let ev = p.ev_percentage
                    + gaussian(&mut rng) * self.config.probability_std * 100.0;

                conf_sum += conf * w;
                prob_sum += prob * w;
                home_sum += home * w;
                away_sum += away * w;
                ev_sum += ev * w;
            }

            let conf = conf_sum / weight_total;
            let home = home_sum / weight_total;
            let away = away_sum / weight_total;

            let vote = if conf < SKIP_THRESHOLD {
                Recommendation::Skip
            } else if home > away {
                Recommendation::Home
            } else if away > home {
                Recommendation::Away
            } else {
                Recommendation::Draw
            };
            *votes.entry(vote).or_insert(0) += 1;

            confidences.push(conf);
            probabilities.push(prob_sum / weight_total);
            home_scores.push(home);
            away_scores.push(away);
            ev_pcts.push(ev_sum / weight_total);
        }

        let confidence = self.band(&mut confidences);
        let pick_distribution: BTreeMap<Recommendation, f64> = votes
            .iter()
            .map(|(&rec, &count)| (rec, count as f64 / samples as f64))
            .collect();
        let pick_stability = pick_distribution
            .values()
            .cloned()
            .fold(0.0, f64::max);

        let signal = classify(consensus.confidence, &confidence);

        tracing::debug!(
            match_id = %consensus.match_id,
            samples,
            confidence_lower = confidence.lower,
            confidence_upper = confidence.upper,
            stability = pick_stability,
            signal = ?signal,
            "monte carlo simulation complete"
        );

        MonteCarloResult {
            match_id: consensus.match_id.clone(),
            num_samples: self.config.num_samples,
            confidence,
            probability: self.band(&mut probabilities),
            home_score: self.band(&mut home_scores),
            away_score: self.band(&mut away_scores),
            ev_percentage: self.band(&mut ev_pcts),
            pick_stability,
            pick_distribution,
            signal,
            generated_at: Utc::now(),
        }
    }

    fn band(&self, samples: &mut [f64]) -> UncertaintyBand {
        samples.sort_by(|a, b| a.total_cmp(b));
        let n = samples.len() as f64;
        let point = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|v| (v - point).powi(2)).sum::<f64>() / n;
        let lower = percentile(samples, self.config.percentile_low);
        let upper = percentile(samples, self.config.percentile_high);
        let width_pct = if point.abs() > f64::EPSILON {
            (upper - lower) / point.abs() * 100.0
        } else {
            0.0
        };

        UncertaintyBand {
            point,
            lower,
            upper,
            std_dev: variance.sqrt(),
            width_pct,
        }
    }

    fn empty(consensus: &ConsensusResult) -> MonteCarloResult {
        MonteCarloResult {
            match_id: consensus.match_id.clone(),
            num_samples: 0,
            confidence: UncertaintyBand::zero(),
            probability: UncertaintyBand::zero(),
            home_score: UncertaintyBand::zero(),
            away_score: UncertaintyBand::zero(),
            ev_percentage: UncertaintyBand::zero(),
            pick_stability: 0.0,
            pick_distribution: BTreeMap::new(),
            signal: CalibrationSignal::Uncertain,
            generated_at: Utc::now(),
        }
    }
}

/// Compare the deterministic confidence with its sampled band
fn classify(point: f64, band: &UncertaintyBand) -> CalibrationSignal {
    if band.width() > UNCERTAIN_BAND_WIDTH {
        CalibrationSignal::Uncertain
    } else if point >= band.upper - EDGE_PROXIMITY {
        CalibrationSignal::Overconfident
    } else if point <= band.lower + EDGE_PROXIMITY {
        CalibrationSignal::Underconfident
    } else {
        CalibrationSignal::WellCalibrated
    }
}

/// Box-Muller transform on two uniform draws
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Linear-interpolated percentile over a pre-sorted slice
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}
