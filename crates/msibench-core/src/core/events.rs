// crates/msibench-core/src/core/events.rs
// ============================================================================
// Module: Benchmark Events
// Description: Structured progress events emitted by search and loop runtimes.
// Purpose: Give sinks a stable, serializable record of every decision taken.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Events are emitted synchronously as the runtime progresses. Each variant is
//! tagged by an `event` field when serialized so JSON-line consumers can
//! filter without knowing the full schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::core::counters::TrafficGenCounters;
use crate::core::measure::MeasureResult;
use crate::core::stat::RunningStat;
use crate::core::uncertainty::UncertaintyState;

// ============================================================================
// SECTION: Event
// ============================================================================

/// Runtime event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BenchmarkEvent {
    /// A trial began transmitting.
    TrialStarted {
        /// Interval under test, in nanoseconds.
        interval: u64,
        /// Measured window length after warmup, in milliseconds.
        duration_ms: u64,
    },
    /// Counters were read during a trial.
    CountersPolled {
        /// Interval under test.
        interval: u64,
        /// Cumulative counters.
        counters: TrafficGenCounters,
        /// RTT statistic for the window since the previous poll.
        window_rtt: Option<RunningStat>,
    },
    /// A trial was aborted by the early-fail rule.
    EarlyFail {
        /// Interval under test.
        interval: u64,
        /// Ratio that fell below the floor.
        satisfy_ratio: f64,
        /// Floor in effect at the time of the poll.
        floor: f64,
    },
    /// A trial completed.
    TrialFinished {
        /// Interval under test.
        interval: u64,
        /// Pass or fail.
        pass: bool,
        /// Final counters after cooldown.
        counters: TrafficGenCounters,
    },
    /// A full search completed.
    SearchFinished {
        /// Search outcome.
        result: MeasureResult,
    },
    /// The hinted range missed the MSI; hinting is now off.
    HintDisabled {
        /// Hint center, in nanoseconds.
        hint: u64,
        /// Radius that was in effect.
        radius: u64,
    },
    /// An MSI was added to the tracker.
    Observation {
        /// Tracker state after the addition.
        state: UncertaintyState,
    },
    /// The benchmark reached sufficiency.
    BenchmarkFinished {
        /// Final tracker state.
        state: UncertaintyState,
    },
    /// The benchmark ended without a result.
    BenchmarkFailed {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl BenchmarkEvent {
    /// Returns the serialized `event` tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TrialStarted {
                ..
            } => "trial_started",
            Self::CountersPolled {
                ..
            } => "counters_polled",
            Self::EarlyFail {
                ..
            } => "early_fail",
            Self::TrialFinished {
                ..
            } => "trial_finished",
            Self::SearchFinished {
                ..
            } => "search_finished",
            Self::HintDisabled {
                ..
            } => "hint_disabled",
            Self::Observation {
                ..
            } => "observation",
            Self::BenchmarkFinished {
                ..
            } => "benchmark_finished",
            Self::BenchmarkFailed {
                ..
            } => "benchmark_failed",
        }
    }
}

// ============================================================================
// SECTION: Event Line
// ============================================================================

/// Timestamped wrapper written by JSON-line sinks.
#[derive(Debug, Clone, Serialize)]
pub struct EventLine<'a> {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u128,
    /// Event payload, flattened beside the timestamp.
    #[serde(flatten)]
    pub event: &'a BenchmarkEvent,
}

impl<'a> EventLine<'a> {
    /// Stamps an event with the current wall-clock time.
    #[must_use]
    pub fn now(event: &'a BenchmarkEvent) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            event,
        }
    }
}
