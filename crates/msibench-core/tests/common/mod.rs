// crates/msibench-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Scripted traffic generators and fast search options.
// Purpose: Drive searches deterministically under a manual clock.
// ============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]
#![allow(
    clippy::unwrap_used,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "Test-only fixtures."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use msibench_core::BisectionSearch;
use msibench_core::CancelToken;
use msibench_core::ManualClock;
use msibench_core::SearchOptions;
use msibench_core::TrafficGen;
use msibench_core::TrafficGenCounters;
use msibench_core::TrafficGenError;

// ============================================================================
// SECTION: Threshold Generator
// ============================================================================

#[derive(Debug, Default)]
pub struct ThresholdState {
    /// Intervals at or above this pass; below it nothing is satisfied.
    pub threshold: u64,
    pub current: Option<u64>,
    pub reads_since_start: u64,
    pub started: Vec<u64>,
    pub stops: Vec<Duration>,
    pub reads: usize,
    pub fail_start: bool,
    /// Cancels this token on the next counter read.
    pub cancel_on_read: Option<CancelToken>,
}

/// Generator whose receiver satisfies everything at or above a threshold
/// interval and nothing below it.
#[derive(Debug, Clone)]
pub struct ThresholdGen {
    pub state: Arc<Mutex<ThresholdState>>,
}

impl ThresholdGen {
    pub fn new(threshold: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ThresholdState {
                threshold,
                ..ThresholdState::default()
            })),
        }
    }

    pub fn always_fail() -> Self {
        Self::new(u64::MAX)
    }

    pub fn always_pass() -> Self {
        Self::new(0)
    }

    pub fn set_threshold(&self, threshold: u64) {
        self.state.lock().unwrap().threshold = threshold;
    }

    pub fn started(&self) -> Vec<u64> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn stops(&self) -> Vec<Duration> {
        self.state.lock().unwrap().stops.clone()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }
}

impl TrafficGen for ThresholdGen {
    fn start(&mut self, interval: u64) -> Result<(), TrafficGenError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(TrafficGenError::Transport("connection refused".to_string()));
        }
        state.current = Some(interval);
        state.reads_since_start = 0;
        state.started.push(interval);
        Ok(())
    }

    fn stop(&mut self, drain_delay: Duration) -> Result<(), TrafficGenError> {
        self.state.lock().unwrap().stops.push(drain_delay);
        Ok(())
    }

    fn read_counters(&mut self) -> Result<TrafficGenCounters, TrafficGenError> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        state.reads_since_start += 1;
        if let Some(token) = state.cancel_on_read.take() {
            token.cancel();
        }
        let sent = 1000 * state.reads_since_start;
        let received = match state.current {
            Some(interval) if interval >= state.threshold => sent,
            _ => 0,
        };
        Ok(TrafficGenCounters::new(sent, received))
    }
}

// ============================================================================
// SECTION: Scripted Generator
// ============================================================================

/// Generator that reports a fixed sequence of satisfy ratios, one per read.
/// Reads past the end repeat the last ratio.
#[derive(Debug, Clone)]
pub struct ScriptedGen {
    pub ratios: Vec<f64>,
    pub reads: Arc<Mutex<usize>>,
}

impl ScriptedGen {
    pub fn new(ratios: &[f64]) -> Self {
        Self {
            ratios: ratios.to_vec(),
            reads: Arc::new(Mutex::new(0)),
        }
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

impl TrafficGen for ScriptedGen {
    fn start(&mut self, _interval: u64) -> Result<(), TrafficGenError> {
        *self.reads.lock().unwrap() = 0;
        Ok(())
    }

    fn stop(&mut self, _drain_delay: Duration) -> Result<(), TrafficGenError> {
        Ok(())
    }

    fn read_counters(&mut self) -> Result<TrafficGenCounters, TrafficGenError> {
        let mut reads = self.reads.lock().unwrap();
        let index = (*reads).min(self.ratios.len().saturating_sub(1));
        *reads += 1;
        let ratio = self.ratios.get(index).copied().unwrap_or(0.0);
        let sent = 1000 * *reads as u64;
        let received = (sent as f64 * ratio).round() as u64;
        Ok(TrafficGenCounters::new(sent, received))
    }
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Options with a one-second measured window and quarter-second polls.
pub fn fast_options(interval_min: u64, interval_max: u64, interval_step: u64) -> SearchOptions {
    SearchOptions {
        interval_min,
        interval_max,
        interval_step,
        tx_count: 1,
        tx_duration_min: Duration::from_secs(1),
        tx_duration_max: Duration::from_secs(1),
        warmup_time: Duration::from_millis(500),
        cooldown_time: Duration::from_millis(100),
        read_counters_freq: Duration::from_millis(250),
        satisfy_threshold: 0.999,
        early_fail_threshold: 0.5,
    }
}

pub fn manual_search<G: TrafficGen>(generator: G) -> BisectionSearch<G, ManualClock> {
    BisectionSearch::new(generator, ManualClock::new())
}
