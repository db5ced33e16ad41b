// crates/msibench-core/src/core/measure.rs
// ============================================================================
// Module: Measurement Results
// Description: Outcomes of single trials and full MSI searches.
// Purpose: Carry range-bracketing flags as data rather than errors.
// Dependencies: crate::core::counters, serde
// ============================================================================

//! ## Overview
//! A [`MeasureResult`] is produced once per search. Range exhaustion is
//! reported through `is_underflow`/`is_overflow`; callers must check the flags
//! rather than assume an MSI is present.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::counters::TrafficGenCounters;

// ============================================================================
// SECTION: Trial Outcome
// ============================================================================

/// Outcome of one timed trial at a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialOutcome {
    /// Interval tried, in nanoseconds.
    pub interval: u64,
    /// Whether the final satisfy ratio met the threshold.
    pub pass: bool,
    /// Whether the trial was aborted by the early-fail rule.
    pub early_fail: bool,
    /// Final counters read after the cooldown.
    pub counters: TrafficGenCounters,
}

// ============================================================================
// SECTION: Measure Result
// ============================================================================

/// Result of one full MSI search.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureResult {
    /// Every candidate failed; the true MSI lies above the range.
    pub is_underflow: bool,
    /// The fastest candidate passed; the true MSI lies below the range.
    pub is_overflow: bool,
    /// Smallest passing interval found, in nanoseconds.
    pub msi: Option<u64>,
    /// Final counters of the trial that produced `msi`.
    pub counters: Option<TrafficGenCounters>,
    /// Number of trials run.
    pub trials: usize,
}

impl MeasureResult {
    /// Result for an empty candidate range: both flags set, nothing tried.
    #[must_use]
    pub const fn degenerate() -> Self {
        Self {
            is_underflow: true,
            is_overflow: true,
            msi: None,
            counters: None,
            trials: 0,
        }
    }

    /// Returns true when the range bracketed the MSI and a value was found.
    #[must_use]
    pub const fn is_bracketed(&self) -> bool {
        !self.is_underflow && !self.is_overflow && self.msi.is_some()
    }
}
