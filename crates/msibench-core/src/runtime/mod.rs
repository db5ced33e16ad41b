// crates/msibench-core/src/runtime/mod.rs
// ============================================================================
// Module: msibench Runtime
// Description: Search, benchmark loop, clocks, cancellation, and event sinks.
// Purpose: Drive traffic generators and fold results into core types.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime is synchronous: every wait goes through the injected
//! [`crate::interfaces::Clock`] on the calling thread.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod benchmark;
pub mod bisect;
pub mod cancel;
pub mod clock;
pub mod events;
pub mod sim;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use benchmark::BenchmarkError;
pub use benchmark::BenchmarkLoop;
pub use benchmark::BenchmarkStep;
pub use bisect::BisectionSearch;
pub use bisect::MeasureError;
pub use cancel::CancelToken;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use events::FileEventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use sim::SimulatedTrafficGen;
