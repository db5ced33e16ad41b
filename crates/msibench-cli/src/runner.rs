// crates/msibench-cli/src/runner.rs
// ============================================================================
// Module: CLI Run Orchestration
// Description: Drives searches and benchmark loops and renders their records.
// Purpose: Map runtime outcomes onto stdout JSON lines and process exit codes.
// Dependencies: msibench-core, msibench-config, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every progress item becomes one JSON line on the output stream, followed by
//! a final tracker-state line once the benchmark is sufficient. Failures are
//! classified so the binary can exit with a distinct status for range
//! exhaustion and cancellation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use msibench_config::LogConfig;
use msibench_config::LogSinkKind;
use msibench_core::BenchmarkError;
use msibench_core::BenchmarkLoop;
use msibench_core::BenchmarkStep;
use msibench_core::BisectionSearch;
use msibench_core::Clock;
use msibench_core::EventSink;
use msibench_core::FileEventSink;
use msibench_core::ManualClock;
use msibench_core::MeasureError;
use msibench_core::MeasureResult;
use msibench_core::NoopEventSink;
use msibench_core::SearchOptions;
use msibench_core::SimulatedTrafficGen;
use msibench_core::StderrEventSink;
use msibench_core::TrafficGen;
use msibench_core::TrafficGenCounters;
use msibench_core::UncertaintyState;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit status for any failure without a dedicated code.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when the candidate range did not bracket the MSI.
pub const EXIT_RANGE_EXHAUSTED: u8 = 2;
/// Exit status when the run was cancelled.
pub const EXIT_CANCELLED: u8 = 3;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures surfaced by a CLI run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The benchmark loop failed.
    #[error(transparent)]
    Benchmark(#[from] BenchmarkError),
    /// A single search failed.
    #[error(transparent)]
    Measure(#[from] MeasureError),
    /// A single search finished without bracketing the MSI.
    #[error("search did not bracket the MSI (underflow={is_underflow}, overflow={is_overflow})")]
    NotBracketed {
        /// Every candidate failed.
        is_underflow: bool,
        /// The fastest candidate passed.
        is_overflow: bool,
    },
    /// The loop ended without a final state.
    #[error("benchmark ended without reaching sufficiency")]
    Incomplete,
    /// Run setup failed before any trial.
    #[error("{0}")]
    Setup(String),
    /// Writing output failed.
    #[error("output error: {0}")]
    Output(#[from] io::Error),
    /// Encoding a record failed.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RunError {
    /// Returns the process exit status for this failure.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Benchmark(BenchmarkError::RangeExhausted {
                ..
            })
            | Self::NotBracketed {
                ..
            } => EXIT_RANGE_EXHAUSTED,
            Self::Benchmark(BenchmarkError::Measure(MeasureError::Cancelled))
            | Self::Measure(MeasureError::Cancelled) => EXIT_CANCELLED,
            _ => EXIT_FAILURE,
        }
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Stdout record for one completed search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// MSI found by the search, in nanoseconds.
    pub interval: Option<u64>,
    /// Every candidate failed.
    pub is_underflow: bool,
    /// The fastest candidate passed.
    pub is_overflow: bool,
    /// Counters of the trial that produced the MSI.
    pub counters: Option<TrafficGenCounters>,
    /// Tracker state after the observation.
    pub state: UncertaintyState,
}

impl ProgressRecord {
    /// Builds a record from a search result and the tracker state.
    #[must_use]
    pub const fn new(result: &MeasureResult, state: &UncertaintyState) -> Self {
        Self {
            interval: result.msi,
            is_underflow: result.is_underflow,
            is_overflow: result.is_overflow,
            counters: result.counters,
            state: *state,
        }
    }
}

/// Writes one JSON value followed by a newline and flushes.
fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), RunError> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

// ============================================================================
// SECTION: Drivers
// ============================================================================

/// Runs `bench` to completion, writing a record per step.
///
/// # Errors
///
/// Returns [`RunError`] when the loop fails or output cannot be written.
pub fn drive_benchmark<G, C, W>(
    bench: BenchmarkLoop<G, C>,
    out: &mut W,
) -> Result<UncertaintyState, RunError>
where
    G: TrafficGen,
    C: Clock,
    W: Write,
{
    for step in bench {
        match step? {
            BenchmarkStep::Progress {
                result,
                state,
            } => write_json_line(out, &ProgressRecord::new(&result, &state))?,
            BenchmarkStep::Done {
                state,
            } => {
                write_json_line(out, &state)?;
                return Ok(state);
            }
        }
    }
    Err(RunError::Incomplete)
}

/// Runs one search and writes its result.
///
/// # Errors
///
/// Returns [`RunError::NotBracketed`] after writing a flagged result, or the
/// underlying search or output failure.
pub fn drive_measure<G, C, W>(
    search: &mut BisectionSearch<G, C>,
    options: &SearchOptions,
    out: &mut W,
) -> Result<MeasureResult, RunError>
where
    G: TrafficGen,
    C: Clock,
    W: Write,
{
    let result = search.measure(options)?;
    write_json_line(out, &result)?;
    if !result.is_bracketed() {
        return Err(RunError::NotBracketed {
            is_underflow: result.is_underflow,
            is_overflow: result.is_overflow,
        });
    }
    Ok(result)
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Builds the event sink selected by the `[log]` section.
///
/// # Errors
///
/// Returns an error when the log file cannot be opened.
pub fn event_sink(config: &LogConfig) -> io::Result<Arc<dyn EventSink>> {
    match config.sink {
        LogSinkKind::Stderr => Ok(Arc::new(StderrEventSink)),
        LogSinkKind::None => Ok(Arc::new(NoopEventSink)),
        LogSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "log.path is required for file sink")
            })?;
            Ok(Arc::new(FileEventSink::new(Path::new(path))?))
        }
    }
}

/// Builds a search over a simulated generator sharing one manual clock.
#[must_use]
pub fn simulated_search(
    capacity: u64,
    jitter: f64,
    seed: u64,
) -> BisectionSearch<SimulatedTrafficGen<ManualClock>, ManualClock> {
    let clock = ManualClock::new();
    let generator = SimulatedTrafficGen::new(clock.clone(), capacity).with_jitter(jitter, seed);
    BisectionSearch::new(generator, clock)
}
