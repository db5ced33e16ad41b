// crates/msibench-core/src/runtime/benchmark.rs
// ============================================================================
// Module: Benchmark Loop
// Description: Repeated MSI searches until the mean is known well enough.
// Purpose: Fold search results into the uncertainty tracker and report progress.
// Dependencies: crate::core, crate::runtime::bisect, thiserror
// ============================================================================

//! ## Overview
//! [`BenchmarkLoop`] is a lazy iterator. Each `next` runs one search (optionally
//! narrowed around the running mean), records the MSI, and yields a
//! [`BenchmarkStep::Progress`]. Once the tracker is sufficient the loop yields
//! one [`BenchmarkStep::Done`] and ends. Any error is yielded once and ends the
//! iterator.
//!
//! ## Invariants
//! - Once a hinted search sets a range flag, hinting stays off for the rest
//!   of the run.
//! - A flagged full-range search, or one without an MSI, is terminal.

#![allow(clippy::cast_precision_loss, reason = "MSI values are far below 2^52 ns.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::iter::FusedIterator;

use thiserror::Error;

use crate::core::events::BenchmarkEvent;
use crate::core::measure::MeasureResult;
use crate::core::options::BenchmarkOptions;
use crate::core::uncertainty::UncertaintyState;
use crate::core::uncertainty::UncertaintyTracker;
use crate::interfaces::Clock;
use crate::interfaces::TrafficGen;
use crate::runtime::bisect::BisectionSearch;
use crate::runtime::bisect::MeasureError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Benchmark loop failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchmarkError {
    /// A search failed.
    #[error(transparent)]
    Measure(#[from] MeasureError),
    /// A full-range search did not bracket the MSI.
    #[error("search range exhausted (underflow: {is_underflow}, overflow: {is_overflow})")]
    RangeExhausted {
        /// Every candidate failed.
        is_underflow: bool,
        /// The fastest candidate passed.
        is_overflow: bool,
    },
    /// Benchmark options were rejected.
    #[error("invalid benchmark options: {0}")]
    InvalidOptions(String),
    /// `max_iterations` searches ran without reaching sufficiency.
    #[error("no sufficient result after {iterations} searches")]
    IterationLimit {
        /// Searches run.
        iterations: usize,
    },
}

// ============================================================================
// SECTION: Steps
// ============================================================================

/// Item yielded by [`BenchmarkLoop`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BenchmarkStep {
    /// One search completed and its MSI was recorded.
    Progress {
        /// Search outcome.
        result: MeasureResult,
        /// Tracker state after recording the MSI.
        state: UncertaintyState,
    },
    /// The tracker became sufficient.
    Done {
        /// Final tracker state.
        state: UncertaintyState,
    },
}

impl BenchmarkStep {
    /// Returns the tracker state carried by either variant.
    #[must_use]
    pub const fn state(&self) -> &UncertaintyState {
        match self {
            Self::Progress {
                state, ..
            }
            | Self::Done {
                state,
            } => state,
        }
    }
}

/// Iterator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Next call runs a search.
    Searching,
    /// Next call yields [`BenchmarkStep::Done`].
    Sufficient,
    /// Exhausted.
    Finished,
}

// ============================================================================
// SECTION: Loop
// ============================================================================

/// Repeated-search driver yielding progress lazily.
pub struct BenchmarkLoop<G, C> {
    /// Underlying search.
    search: BisectionSearch<G, C>,
    /// Loop options, including the full search range.
    options: BenchmarkOptions,
    /// Observed MSI values.
    tracker: UncertaintyTracker,
    /// Current hint radius; zero once disabled.
    hint_radius: u64,
    /// Searches started.
    iterations: usize,
    /// Iterator lifecycle.
    phase: Phase,
}

impl<G: TrafficGen, C: Clock> BenchmarkLoop<G, C> {
    /// Creates a loop over `search`.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::InvalidOptions`] when `options` fail
    /// validation.
    pub fn new(
        search: BisectionSearch<G, C>,
        options: BenchmarkOptions,
    ) -> Result<Self, BenchmarkError> {
        options.validate().map_err(|err| BenchmarkError::InvalidOptions(err.to_string()))?;
        let tracker = UncertaintyTracker::new(options.desired_uncertainty)
            .map_err(|err| BenchmarkError::InvalidOptions(err.to_string()))?;
        let hint_radius = options.hint_radius;
        Ok(Self {
            search,
            options,
            tracker,
            hint_radius,
            iterations: 0,
            phase: Phase::Searching,
        })
    }

    /// Returns the tracker.
    pub const fn tracker(&self) -> &UncertaintyTracker {
        &self.tracker
    }

    /// Returns the current hint radius (zero when hinting is off).
    pub const fn hint_radius(&self) -> u64 {
        self.hint_radius
    }

    /// Returns the underlying search.
    pub const fn search(&self) -> &BisectionSearch<G, C> {
        &self.search
    }

    /// Releases the underlying search.
    pub fn into_search(self) -> BisectionSearch<G, C> {
        self.search
    }

    /// Drives the loop to completion and returns the final tracker state.
    ///
    /// # Errors
    ///
    /// Returns the first [`BenchmarkError`] yielded.
    pub fn run(mut self) -> Result<UncertaintyState, BenchmarkError> {
        for step in self.by_ref() {
            if let BenchmarkStep::Done {
                state,
            } = step?
            {
                return Ok(state);
            }
        }
        Ok(self.tracker.state())
    }

    /// Runs one search and records its MSI.
    fn advance(&mut self) -> Result<BenchmarkStep, BenchmarkError> {
        if let Some(limit) = self.options.max_iterations
            && self.iterations >= limit
        {
            return Err(BenchmarkError::IterationLimit {
                iterations: self.iterations,
            });
        }
        self.iterations += 1;

        let result = self.search_with_hint()?;
        let msi = match result.msi {
            Some(msi) if !result.is_underflow && !result.is_overflow => msi,
            _ => {
                return Err(BenchmarkError::RangeExhausted {
                    is_underflow: result.is_underflow,
                    is_overflow: result.is_overflow,
                });
            }
        };
        self.tracker.add_observation(msi as f64);
        let state = self.tracker.state();
        self.search.emit(&BenchmarkEvent::Observation {
            state,
        });
        Ok(BenchmarkStep::Progress {
            result,
            state,
        })
    }

    /// Searches the hinted window when enabled, falling back to the full range.
    fn search_with_hint(&mut self) -> Result<MeasureResult, MeasureError> {
        if self.hint_radius > 0
            && let Some(mean) = self.tracker.mean()
        {
            let hint = round_hint(mean);
            let radius = self.hint_radius;
            let narrowed = self
                .options
                .search
                .with_range(hint.saturating_sub(radius).max(1), hint.saturating_add(radius));
            let result = self.search.measure(&narrowed)?;
            if !result.is_underflow && !result.is_overflow {
                return Ok(result);
            }
            self.search.emit(&BenchmarkEvent::HintDisabled {
                hint,
                radius,
            });
            self.hint_radius = 0;
        }
        self.search.measure(&self.options.search)
    }
}

impl<G: TrafficGen, C: Clock> Iterator for BenchmarkLoop<G, C> {
    type Item = Result<BenchmarkStep, BenchmarkError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            Phase::Finished => None,
            Phase::Sufficient => {
                self.phase = Phase::Finished;
                let state = self.tracker.state();
                self.search.emit(&BenchmarkEvent::BenchmarkFinished {
                    state,
                });
                Some(Ok(BenchmarkStep::Done {
                    state,
                }))
            }
            Phase::Searching => {
                let step = self.advance();
                match &step {
                    Ok(step) if step.state().is_sufficient => self.phase = Phase::Sufficient,
                    Ok(_) => {}
                    Err(err) => {
                        self.phase = Phase::Finished;
                        self.search.emit(&BenchmarkEvent::BenchmarkFailed {
                            reason: err.to_string(),
                        });
                    }
                }
                Some(step)
            }
        }
    }
}

impl<G: TrafficGen, C: Clock> FusedIterator for BenchmarkLoop<G, C> {}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rounds the running mean to a candidate-space interval.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Value is checked finite, positive, and below u64::MAX before the cast."
)]
fn round_hint(mean: f64) -> u64 {
    if !mean.is_finite() || mean <= 0.0 {
        return 0;
    }
    if mean >= u64::MAX as f64 {
        return u64::MAX;
    }
    mean.round() as u64
}
