// crates/msibench-core/src/runtime/bisect.rs
// ============================================================================
// Module: Bisection Search
// Description: Binary search for the maximum sustainable interval.
// Purpose: Drive a traffic generator through timed trials and bracket the MSI.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! A search walks the ascending candidate grid of [`SearchOptions`] with a
//! binary search. Each probe is one trial: start the generator, wait out the
//! warmup, poll counters until the deadline (aborting early on a degrading
//! ratio), stop with a drain delay, and score the final counters.
//!
//! ## Invariants
//! - A degenerate range never contacts the generator.
//! - Transport errors propagate immediately; there are no retries.
//! - The early-fail floor is `min(early_fail_threshold, previous ratio)`, with
//!   the previous ratio starting at zero, so the first poll never aborts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::counters::TrafficGenCounters;
use crate::core::events::BenchmarkEvent;
use crate::core::measure::MeasureResult;
use crate::core::measure::TrialOutcome;
use crate::core::options::OptionsError;
use crate::core::options::SearchOptions;
use crate::interfaces::Clock;
use crate::interfaces::EventSink;
use crate::interfaces::TrafficGen;
use crate::interfaces::TrafficGenError;
use crate::runtime::cancel::CancelToken;
use crate::runtime::events::NoopEventSink;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Search failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// The generator failed.
    #[error(transparent)]
    TrafficGen(#[from] TrafficGenError),
    /// Search options were rejected.
    #[error("invalid search options: {0}")]
    InvalidOptions(String),
    /// The cancel token fired.
    #[error("search cancelled")]
    Cancelled,
}

impl From<OptionsError> for MeasureError {
    fn from(error: OptionsError) -> Self {
        Self::InvalidOptions(error.to_string())
    }
}

// ============================================================================
// SECTION: Search
// ============================================================================

/// MSI finder bound to one generator and one clock.
pub struct BisectionSearch<G, C> {
    /// Generator under control.
    generator: G,
    /// Time source for warmup, polling, and deadlines.
    clock: C,
    /// Event destination.
    sink: Arc<dyn EventSink>,
    /// Cooperative cancellation flag.
    cancel: CancelToken,
}

impl<G: TrafficGen, C: Clock> BisectionSearch<G, C> {
    /// Creates a search with a no-op event sink and a fresh cancel token.
    pub fn new(generator: G, clock: C) -> Self {
        Self {
            generator,
            clock,
            sink: Arc::new(NoopEventSink),
            cancel: CancelToken::new(),
        }
    }

    /// Routes events to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Uses `cancel` as the cancellation flag.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the generator.
    pub const fn generator(&self) -> &G {
        &self.generator
    }

    /// Returns the clock.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the cancellation flag.
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Releases the generator.
    pub fn into_generator(self) -> G {
        self.generator
    }

    /// Emits an event to the configured sink.
    pub(crate) fn emit(&self, event: &BenchmarkEvent) {
        self.sink.record(event);
    }

    /// Runs one full search over the candidate grid.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError`] on invalid options, generator failure, or
    /// cancellation. Range exhaustion is reported through the result flags.
    pub fn measure(&mut self, options: &SearchOptions) -> Result<MeasureResult, MeasureError> {
        if options.is_degenerate() {
            let result = MeasureResult::degenerate();
            self.emit(&BenchmarkEvent::SearchFinished {
                result,
            });
            return Ok(result);
        }
        options.validate()?;

        let len = options.candidate_count();
        let mut left = 0_u64;
        let mut right_excl = len;
        let mut best: Option<(u64, TrafficGenCounters)> = None;
        let mut trials = 0_usize;
        while left < right_excl {
            let mid = left + (right_excl - 1 - left) / 2;
            let interval = options.candidate(mid);
            let outcome = self.trial(interval, options)?;
            trials += 1;
            if outcome.pass {
                best = Some((interval, outcome.counters));
                right_excl = mid;
            } else {
                left = mid + 1;
            }
        }

        let result = MeasureResult {
            is_underflow: left >= len,
            is_overflow: right_excl == 0,
            msi: best.map(|(interval, _)| interval),
            counters: best.map(|(_, counters)| counters),
            trials,
        };
        self.emit(&BenchmarkEvent::SearchFinished {
            result,
        });
        Ok(result)
    }

    /// Runs a single trial at `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError`] on invalid options, generator failure, or
    /// cancellation.
    pub fn run_once(
        &mut self,
        interval: u64,
        options: &SearchOptions,
    ) -> Result<TrialOutcome, MeasureError> {
        options.validate()?;
        self.trial(interval, options)
    }

    /// Trial body; `options` must already be valid.
    fn trial(&mut self, interval: u64, options: &SearchOptions) -> Result<TrialOutcome, MeasureError> {
        self.ensure_not_cancelled(false)?;
        self.generator.start(interval)?;
        let duration = options.trial_duration(interval);
        self.emit(&BenchmarkEvent::TrialStarted {
            interval,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        });

        self.clock.sleep(options.warmup_time);
        let deadline = self.clock.now().saturating_add(duration);
        let mut last_ratio = 0.0_f64;
        let mut previous = TrafficGenCounters::default();
        loop {
            self.ensure_not_cancelled(true)?;
            let now = self.clock.now();
            if now >= deadline {
                break;
            }
            self.clock.sleep(options.read_counters_freq.min(deadline - now));

            let counters = self.generator.read_counters()?;
            self.emit(&BenchmarkEvent::CountersPolled {
                interval,
                counters,
                window_rtt: counters.rtt_since(&previous),
            });
            let ratio = counters.satisfy_ratio();
            let floor = options.early_fail_threshold.min(last_ratio);
            if ratio < floor {
                self.emit(&BenchmarkEvent::EarlyFail {
                    interval,
                    satisfy_ratio: ratio,
                    floor,
                });
                return self.finish_trial(interval, options, true);
            }
            last_ratio = ratio;
            previous = counters;
        }
        self.finish_trial(interval, options, false)
    }

    /// Stops the generator, reads final counters, and scores the trial.
    fn finish_trial(
        &mut self,
        interval: u64,
        options: &SearchOptions,
        early_fail: bool,
    ) -> Result<TrialOutcome, MeasureError> {
        self.generator.stop(options.cooldown_time)?;
        let counters = self.generator.read_counters()?;
        let pass = !early_fail && counters.satisfy_ratio() >= options.satisfy_threshold;
        self.emit(&BenchmarkEvent::TrialFinished {
            interval,
            pass,
            counters,
        });
        Ok(TrialOutcome {
            interval,
            pass,
            early_fail,
            counters,
        })
    }

    /// Fails with [`MeasureError::Cancelled`] once the token fires, stopping
    /// a running generator first.
    fn ensure_not_cancelled(&mut self, running: bool) -> Result<(), MeasureError> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }
        if running {
            let _ = self.generator.stop(Duration::ZERO);
        }
        Err(MeasureError::Cancelled)
    }
}
