// crates/msibench-core/src/lib.rs
// ============================================================================
// Module: msibench Core
// Description: Maximum sustainable interval search and benchmark engine.
// Purpose: Find the fastest interval a forwarder sustains, to a target uncertainty.
// Dependencies: serde, serde_json, thiserror, rand
// ============================================================================

//! ## Overview
//! `msibench-core` discovers the Maximum Sustainable Interval (MSI): the
//! smallest inter-packet interval at which a receiver still satisfies a target
//! fraction of requests. A [`BisectionSearch`] brackets the MSI over a grid of
//! candidate intervals; a [`BenchmarkLoop`] repeats searches and stops once an
//! [`UncertaintyTracker`] says the mean is known well enough. [`RunningStat`]
//! summarizes streaming samples such as RTTs and supports exact window
//! subtraction.
//!
//! Invariants:
//! - Range exhaustion is data on [`MeasureResult`], never an error.
//! - The generator is reached only through [`TrafficGen`]; time only through
//!   [`Clock`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::BenchmarkEvent;
pub use crate::core::BenchmarkOptions;
pub use crate::core::EventLine;
pub use crate::core::MIN_N;
pub use crate::core::MeasureResult;
pub use crate::core::OptionsError;
pub use crate::core::RunningStat;
pub use crate::core::SearchOptions;
pub use crate::core::StatError;
pub use crate::core::TrafficGenCounters;
pub use crate::core::TrialOutcome;
pub use crate::core::UncertaintyError;
pub use crate::core::UncertaintyState;
pub use crate::core::UncertaintyTracker;
pub use crate::interfaces::Clock;
pub use crate::interfaces::EventSink;
pub use crate::interfaces::TrafficGen;
pub use crate::interfaces::TrafficGenError;
pub use crate::runtime::BenchmarkError;
pub use crate::runtime::BenchmarkLoop;
pub use crate::runtime::BenchmarkStep;
pub use crate::runtime::BisectionSearch;
pub use crate::runtime::CancelToken;
pub use crate::runtime::FileEventSink;
pub use crate::runtime::ManualClock;
pub use crate::runtime::MeasureError;
pub use crate::runtime::MemoryEventSink;
pub use crate::runtime::NoopEventSink;
pub use crate::runtime::SimulatedTrafficGen;
pub use crate::runtime::StderrEventSink;
pub use crate::runtime::SystemClock;
