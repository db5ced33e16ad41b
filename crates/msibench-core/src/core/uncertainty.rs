// crates/msibench-core/src/core/uncertainty.rs
// ============================================================================
// Module: Uncertainty Tracker
// Description: Sample-size stopping rule for repeated MSI observations.
// Purpose: Decide when the observed mean is known to a target uncertainty.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The tracker keeps every observation and recomputes mean, standard deviation,
//! and the required observation count from the full history on each call. The
//! requirement follows the standard error of the mean at roughly 95%
//! confidence, `n = ceil((2 * stdev / uncertainty)^2)`, floored at [`MIN_N`].
//!
//! ## Invariants
//! - `n >= MIN_N` for every state, including the empty tracker.
//! - Sufficiency is re-evaluated per call; it is not monotonic.

#![allow(clippy::cast_precision_loss, reason = "Observation counts are small.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum observation count; spread estimates below this are unreliable.
pub const MIN_N: usize = 6;

/// Stand-in for the 95% two-sided z-score (1.96).
const Z_FACTOR: f64 = 2.0;

/// Ceiling applied to the computed requirement.
const MAX_REQUIRED_N: usize = u32::MAX as usize;

/// Absorbs rounding error in `ratio²` so exact integers are not bumped by `ceil`.
const CEIL_SLACK: f64 = 1e-9;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Uncertainty tracker errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UncertaintyError {
    /// Desired uncertainty must be a positive finite number.
    #[error("desired uncertainty must be positive and finite, got {0}")]
    InvalidUncertainty(f64),
}

/// Snapshot of the stopping-rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyState {
    /// Mean of all observations; `None` without observations.
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` below two observations.
    pub stdev: Option<f64>,
    /// Observations seen so far.
    pub count: usize,
    /// Observations currently required.
    pub n: usize,
    /// Whether `count >= n`.
    pub is_sufficient: bool,
}

/// Tracks scalar observations and evaluates the sample-size stopping rule.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyTracker {
    /// Target absolute uncertainty of the mean.
    desired_uncertainty: f64,
    /// Observation history.
    observations: Vec<f64>,
}

impl UncertaintyTracker {
    /// Creates an empty tracker for the given absolute uncertainty.
    ///
    /// # Errors
    ///
    /// Returns [`UncertaintyError::InvalidUncertainty`] unless the value is
    /// positive and finite.
    pub fn new(desired_uncertainty: f64) -> Result<Self, UncertaintyError> {
        if !desired_uncertainty.is_finite() || desired_uncertainty <= 0.0 {
            return Err(UncertaintyError::InvalidUncertainty(desired_uncertainty));
        }
        Ok(Self {
            desired_uncertainty,
            observations: Vec::new(),
        })
    }

    /// Appends an observation.
    pub fn add_observation(&mut self, value: f64) {
        self.observations.push(value);
    }

    /// Returns the observation history.
    #[must_use]
    pub fn observations(&self) -> &[f64] {
        &self.observations
    }

    /// Returns the target absolute uncertainty.
    #[must_use]
    pub const fn desired_uncertainty(&self) -> f64 {
        self.desired_uncertainty
    }

    /// Returns the mean of the history, or `None` when empty.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.observations.is_empty() {
            return None;
        }
        Some(self.observations.iter().sum::<f64>() / self.observations.len() as f64)
    }

    /// Evaluates the stopping rule over the full history.
    #[must_use]
    pub fn state(&self) -> UncertaintyState {
        let count = self.observations.len();
        let mean = self.mean();
        let stdev = mean.and_then(|mean| sample_stdev(&self.observations, mean));
        let n = stdev.map_or(MIN_N, |stdev| required_count(stdev, self.desired_uncertainty));
        UncertaintyState {
            mean,
            stdev,
            count,
            n,
            is_sufficient: count >= n,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Two-pass sample standard deviation; `None` below two values.
fn sample_stdev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|value| (value - mean) * (value - mean)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Required observation count for `stdev` at the target uncertainty.
fn required_count(stdev: f64, desired_uncertainty: f64) -> usize {
    let ratio = Z_FACTOR * stdev / desired_uncertainty;
    let raw = (ratio * ratio - CEIL_SLACK).ceil();
    if !raw.is_finite() || raw >= MAX_REQUIRED_N as f64 {
        return MAX_REQUIRED_N;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Value is a finite non-negative integer below MAX_REQUIRED_N."
    )]
    let required = raw as usize;
    required.max(MIN_N)
}
