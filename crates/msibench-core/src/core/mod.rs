// crates/msibench-core/src/core/mod.rs
// ============================================================================
// Module: msibench Core Types
// Description: Statistics, options, counters, events, and result types.
// Purpose: Provide stable, serializable value types for the benchmark engine.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types are pure values: they hold no resources and perform no I/O. The
//! runtime drives the traffic generator and folds outcomes into these types.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod counters;
pub mod events;
pub mod measure;
pub mod options;
pub mod stat;
pub mod uncertainty;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use counters::TrafficGenCounters;
pub use events::BenchmarkEvent;
pub use events::EventLine;
pub use measure::MeasureResult;
pub use measure::TrialOutcome;
pub use options::BenchmarkOptions;
pub use options::OptionsError;
pub use options::SearchOptions;
pub use stat::RunningStat;
pub use stat::StatError;
pub use uncertainty::MIN_N;
pub use uncertainty::UncertaintyError;
pub use uncertainty::UncertaintyState;
pub use uncertainty::UncertaintyTracker;
