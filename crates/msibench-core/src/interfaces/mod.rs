// crates/msibench-core/src/interfaces/mod.rs
// ============================================================================
// Module: msibench Interfaces
// Description: Backend-agnostic seams for traffic generation, time, and events.
// Purpose: Define the contract surfaces used by the msibench runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The runtime never talks to a network or a wall clock directly. It drives a
//! [`TrafficGen`], waits through a [`Clock`], and reports through an
//! [`EventSink`]. Production code plugs in a JSON-RPC generator and the system
//! clock; tests plug in scripted generators and a manual clock.
//!
//! ## Invariants
//! - A generator is driven by one search at a time (`&mut self`).
//! - Counters are cumulative since the most recent `start`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::counters::TrafficGenCounters;
use crate::core::events::BenchmarkEvent;

// ============================================================================
// SECTION: Traffic Generator
// ============================================================================

/// Traffic generator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrafficGenError {
    /// The generator could not be reached.
    #[error("traffic generator transport error: {0}")]
    Transport(String),
    /// The generator replied with something unexpected.
    #[error("traffic generator protocol error: {0}")]
    Protocol(String),
    /// The generator reported a failure of its own.
    #[error("traffic generator error: {0}")]
    Generator(String),
}

/// Controllable packet source driven by the search.
pub trait TrafficGen {
    /// Begins transmitting one packet every `interval` nanoseconds and resets
    /// the counters.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficGenError`] when the generator cannot start.
    fn start(&mut self, interval: u64) -> Result<(), TrafficGenError>;

    /// Stops transmitting and waits `drain_delay` for in-flight replies.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficGenError`] when the generator cannot stop.
    fn stop(&mut self, drain_delay: Duration) -> Result<(), TrafficGenError>;

    /// Reads cumulative counters since the last start.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficGenError`] when the counters cannot be read.
    fn read_counters(&mut self) -> Result<TrafficGenCounters, TrafficGenError>;
}

impl<T: TrafficGen + ?Sized> TrafficGen for Box<T> {
    fn start(&mut self, interval: u64) -> Result<(), TrafficGenError> {
        (**self).start(interval)
    }

    fn stop(&mut self, drain_delay: Duration) -> Result<(), TrafficGenError> {
        (**self).stop(drain_delay)
    }

    fn read_counters(&mut self) -> Result<TrafficGenCounters, TrafficGenError> {
        (**self).read_counters()
    }
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Monotonic time source with blocking waits.
pub trait Clock {
    /// Returns elapsed time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Destination for runtime events.
pub trait EventSink: Send + Sync {
    /// Records one event. Sinks must not fail the run.
    fn record(&self, event: &BenchmarkEvent);
}
