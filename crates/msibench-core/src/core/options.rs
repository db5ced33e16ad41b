// crates/msibench-core/src/core/options.rs
// ============================================================================
// Module: Search and Benchmark Options
// Description: Immutable per-run parameters for MSI search and the outer loop.
// Purpose: Describe the candidate interval grid and trial timing policy.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`SearchOptions`] defines the discrete candidate grid
//! `interval_min, interval_min + step, ..., <= interval_max` (nanoseconds) and
//! the per-trial timing and scoring policy. [`BenchmarkOptions`] wraps it with
//! the outer-loop stopping target and hint radius.
//!
//! ## Invariants
//! - `interval_min > interval_max` is not an option error; the search reports
//!   it as a degenerate result instead.
//! - Intervals are positive: `interval_min == 0` is rejected.
//! - All other fields are checked by [`SearchOptions::validate`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Option validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// A field failed validation.
    #[error("invalid option {field}: {reason}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

impl OptionsError {
    /// Builds an [`OptionsError::Invalid`].
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SECTION: Search Options
// ============================================================================

/// Parameters for one bisection search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Smallest candidate interval in nanoseconds.
    pub interval_min: u64,
    /// Largest candidate interval in nanoseconds.
    pub interval_max: u64,
    /// Candidate grid step in nanoseconds.
    pub interval_step: u64,
    /// Expected packets per trial; sizes the trial duration.
    pub tx_count: u64,
    /// Lower clamp on trial duration.
    pub tx_duration_min: Duration,
    /// Upper clamp on trial duration.
    pub tx_duration_max: Duration,
    /// Ramp-up time during which counters are not evaluated.
    pub warmup_time: Duration,
    /// Drain delay passed to `stop` before the final counter read.
    pub cooldown_time: Duration,
    /// Counter polling period.
    pub read_counters_freq: Duration,
    /// Minimum final satisfy ratio for a trial to pass.
    pub satisfy_threshold: f64,
    /// Satisfy ratio below which a degrading trial is aborted early.
    pub early_fail_threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            interval_min: 500,
            interval_max: 3500,
            interval_step: 1,
            tx_count: 10_000_000,
            tx_duration_min: Duration::from_secs(10),
            tx_duration_max: Duration::from_secs(60),
            warmup_time: Duration::from_secs(5),
            cooldown_time: Duration::from_secs(2),
            read_counters_freq: Duration::from_secs(1),
            satisfy_threshold: 0.999,
            early_fail_threshold: 0.5,
        }
    }
}

impl SearchOptions {
    /// Returns a copy with a different candidate range.
    #[must_use]
    pub fn with_range(&self, interval_min: u64, interval_max: u64) -> Self {
        Self {
            interval_min,
            interval_max,
            ..self.clone()
        }
    }

    /// Returns true when the range is empty (`interval_min > interval_max`).
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.interval_min > self.interval_max
    }

    /// Validates every field except the range ordering.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.interval_min == 0 {
            return Err(OptionsError::invalid("interval_min", "must be greater than zero"));
        }
        if self.interval_step == 0 {
            return Err(OptionsError::invalid("interval_step", "must be greater than zero"));
        }
        if self.tx_count == 0 {
            return Err(OptionsError::invalid("tx_count", "must be greater than zero"));
        }
        if self.tx_duration_min > self.tx_duration_max {
            return Err(OptionsError::invalid(
                "tx_duration_min",
                "must not exceed tx_duration_max",
            ));
        }
        if self.read_counters_freq.is_zero() {
            return Err(OptionsError::invalid("read_counters_freq", "must be greater than zero"));
        }
        validate_ratio("satisfy_threshold", self.satisfy_threshold)?;
        validate_ratio("early_fail_threshold", self.early_fail_threshold)?;
        if self.satisfy_threshold <= self.early_fail_threshold {
            return Err(OptionsError::invalid(
                "satisfy_threshold",
                "must be greater than early_fail_threshold",
            ));
        }
        Ok(())
    }

    /// Returns the number of candidates in the grid (zero when degenerate).
    #[must_use]
    pub const fn candidate_count(&self) -> u64 {
        if self.is_degenerate() || self.interval_step == 0 {
            return 0;
        }
        ((self.interval_max - self.interval_min) / self.interval_step).saturating_add(1)
    }

    /// Returns the candidate at `index`, counting up from `interval_min`.
    #[must_use]
    pub const fn candidate(&self, index: u64) -> u64 {
        self.interval_min + index * self.interval_step
    }

    /// Trial length: time to send `tx_count` packets at `interval`, clamped to
    /// `[tx_duration_min, tx_duration_max]`.
    #[must_use]
    pub fn trial_duration(&self, interval: u64) -> Duration {
        let nanos = interval.saturating_mul(self.tx_count);
        Duration::from_nanos(nanos).max(self.tx_duration_min).min(self.tx_duration_max)
    }
}

// ============================================================================
// SECTION: Benchmark Options
// ============================================================================

/// Parameters for the repeated-search benchmark loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOptions {
    /// Full-range search options.
    pub search: SearchOptions,
    /// Target absolute uncertainty of the mean MSI, in nanoseconds.
    pub desired_uncertainty: f64,
    /// Half-width of the hinted range around the running mean; zero disables.
    pub hint_radius: u64,
    /// Optional bound on searches without reaching sufficiency.
    pub max_iterations: Option<usize>,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            desired_uncertainty: 10.0,
            hint_radius: 0,
            max_iterations: None,
        }
    }
}

impl BenchmarkOptions {
    /// Validates the loop options and the embedded search options.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), OptionsError> {
        self.search.validate()?;
        if !self.desired_uncertainty.is_finite() || self.desired_uncertainty <= 0.0 {
            return Err(OptionsError::invalid(
                "desired_uncertainty",
                "must be positive and finite",
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(OptionsError::invalid("max_iterations", "must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks that a ratio lies in `[0, 1]`.
fn validate_ratio(field: &'static str, value: f64) -> Result<(), OptionsError> {
    if !(0.0 ..= 1.0).contains(&value) {
        return Err(OptionsError::invalid(field, format!("must be within [0, 1], got {value}")));
    }
    Ok(())
}
