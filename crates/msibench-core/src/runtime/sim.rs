// crates/msibench-core/src/runtime/sim.rs
// ============================================================================
// Module: Simulated Traffic Generator
// Description: In-process generator with a fixed forwarding capacity.
// Purpose: Exercise searches and benchmark loops without a network.
// Dependencies: crate::interfaces, rand
// ============================================================================

//! ## Overview
//! The simulated receiver forwards one packet every `capacity` nanoseconds.
//! Sending slower than that satisfies everything; sending faster satisfies the
//! fraction `interval / capacity`. Packet counts derive from clock time, so a
//! [`crate::ManualClock`] shared with the search makes runs instant and
//! reproducible. Optional jitter redraws the capacity on every `start`.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Simulated packet counts are non-negative and well inside f64 precision."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::counters::TrafficGenCounters;
use crate::core::stat::RunningStat;
use crate::interfaces::Clock;
use crate::interfaces::TrafficGen;
use crate::interfaces::TrafficGenError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest accepted jitter fraction.
const MAX_JITTER: f64 = 0.9;

/// Default unloaded round-trip time, in milliseconds.
const DEFAULT_BASE_RTT_MS: f64 = 1.0;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One running or stopped transmission.
#[derive(Debug, Clone, Copy)]
struct SimTrial {
    /// Transmission interval, in nanoseconds.
    interval: u64,
    /// Capacity drawn for this trial, in nanoseconds.
    capacity: f64,
    /// Clock time at start.
    started_at: Duration,
    /// Clock time at stop, if stopped.
    stopped_at: Option<Duration>,
}

/// Deterministic traffic generator for tests and dry runs.
#[derive(Debug, Clone)]
pub struct SimulatedTrafficGen<C> {
    /// Clock shared with the search.
    clock: C,
    /// Nominal capacity interval, in nanoseconds.
    capacity: u64,
    /// Relative capacity jitter applied per start.
    jitter: f64,
    /// Unloaded RTT reported in counters, in milliseconds.
    base_rtt_ms: f64,
    /// Jitter source.
    rng: StdRng,
    /// Current trial.
    trial: Option<SimTrial>,
    /// Number of `start` calls.
    starts: usize,
}

impl<C: Clock> SimulatedTrafficGen<C> {
    /// Creates a generator whose receiver sustains one packet per `capacity`
    /// nanoseconds.
    pub fn new(clock: C, capacity: u64) -> Self {
        Self {
            clock,
            capacity,
            jitter: 0.0,
            base_rtt_ms: DEFAULT_BASE_RTT_MS,
            rng: StdRng::seed_from_u64(0),
            trial: None,
            starts: 0,
        }
    }

    /// Redraws the capacity within `capacity * (1 ± fraction)` on every start.
    #[must_use]
    pub fn with_jitter(mut self, fraction: f64, seed: u64) -> Self {
        self.jitter = if fraction.is_finite() { fraction.clamp(0.0, MAX_JITTER) } else { 0.0 };
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sets the unloaded RTT reported in counters.
    #[must_use]
    pub const fn with_base_rtt_ms(mut self, base_rtt_ms: f64) -> Self {
        self.base_rtt_ms = base_rtt_ms;
        self
    }

    /// Returns the nominal capacity interval.
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns how many trials were started.
    pub const fn starts(&self) -> usize {
        self.starts
    }

    /// Returns true while transmitting.
    pub fn is_running(&self) -> bool {
        self.trial.is_some_and(|trial| trial.stopped_at.is_none())
    }

    /// Draws this trial's capacity.
    fn draw_capacity(&mut self) -> f64 {
        let nominal = self.capacity as f64;
        if self.jitter <= 0.0 {
            return nominal;
        }
        let factor = 1.0 + self.rng.gen_range(-self.jitter ..= self.jitter);
        nominal * factor
    }
}

impl<C: Clock> TrafficGen for SimulatedTrafficGen<C> {
    fn start(&mut self, interval: u64) -> Result<(), TrafficGenError> {
        if interval == 0 {
            return Err(TrafficGenError::Generator("interval must be positive".to_string()));
        }
        let capacity = self.draw_capacity();
        self.trial = Some(SimTrial {
            interval,
            capacity,
            started_at: self.clock.now(),
            stopped_at: None,
        });
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self, drain_delay: Duration) -> Result<(), TrafficGenError> {
        let now = self.clock.now();
        if let Some(trial) = self.trial.as_mut()
            && trial.stopped_at.is_none()
        {
            trial.stopped_at = Some(now);
        }
        self.clock.sleep(drain_delay);
        Ok(())
    }

    fn read_counters(&mut self) -> Result<TrafficGenCounters, TrafficGenError> {
        let Some(trial) = self.trial else {
            return Ok(TrafficGenCounters::default());
        };
        let end = trial.stopped_at.unwrap_or_else(|| self.clock.now());
        let elapsed = end.saturating_sub(trial.started_at);
        let sent = u64::try_from(elapsed.as_nanos() / u128::from(trial.interval)).unwrap_or(u64::MAX);
        let interval = trial.interval as f64;
        let ratio = if interval >= trial.capacity { 1.0 } else { interval / trial.capacity };
        let received = ((sent as f64) * ratio).floor() as u64;
        let mut counters = TrafficGenCounters::new(sent, received.min(sent));
        if received > 0 {
            let load = (trial.capacity / interval).max(1.0);
            let mean = self.base_rtt_ms * load;
            let stdev = mean * 0.1;
            let m2 = stdev * stdev * (received - 1) as f64;
            counters = counters.with_rtt(RunningStat::from_parts(received, received, mean, m2));
        }
        Ok(counters)
    }
}
