//! Matchcast - Multi-Algorithm Match Forecasting Engine
//!
//! A forecasting and self-calibration pipeline for sporting-event outcomes.
//!
//! ## Architecture
//!
//! ```text
//! Match + Context → Predictors (×3) → Consensus → Ensemble Stacker → Monte Carlo
//!                        ↑                ↑
//!                   Weight Engine (per-algorithm accuracy → trust weights)
//!                        ↑
//!                   Calibration Controller (settled bets → weights/thresholds)
//! ```

pub mod calibration;
pub mod config;
pub mod consensus;
pub mod data;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod montecarlo;
pub mod predictor;
pub mod staking;
pub mod strength;
pub mod types;
pub mod weights;

#[cfg(test)]
mod types_tests;
