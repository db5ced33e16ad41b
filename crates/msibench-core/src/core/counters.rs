// crates/msibench-core/src/core/counters.rs
// ============================================================================
// Module: Traffic Generator Counters
// Description: Counter snapshot read from a traffic generator.
// Purpose: Score trials by satisfaction ratio and carry RTT summaries.
// Dependencies: crate::core::stat, serde
// ============================================================================

//! ## Overview
//! Counters are cumulative since the last `start` and are read fresh on every
//! poll; nothing here is persisted between trials.

#![allow(clippy::cast_precision_loss, reason = "Packet counts are scored as f64 ratios.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::stat::RunningStat;

// ============================================================================
// SECTION: Counters
// ============================================================================

/// Cumulative counters reported by a traffic generator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "CountersRepr", from = "CountersRepr")]
pub struct TrafficGenCounters {
    /// Interests transmitted since the last start.
    pub n_interests_sent: u64,
    /// Data packets received since the last start.
    pub n_data_received: u64,
    /// Round-trip time summary, when the generator reports one.
    pub rtt: Option<RunningStat>,
}

impl TrafficGenCounters {
    /// Creates a counter snapshot without RTT data.
    #[must_use]
    pub const fn new(n_interests_sent: u64, n_data_received: u64) -> Self {
        Self {
            n_interests_sent,
            n_data_received,
            rtt: None,
        }
    }

    /// Attaches an RTT summary.
    #[must_use]
    pub const fn with_rtt(mut self, rtt: RunningStat) -> Self {
        self.rtt = Some(rtt);
        self
    }

    /// Returns `n_data_received / n_interests_sent`, or zero before anything
    /// was sent.
    #[must_use]
    pub fn satisfy_ratio(&self) -> f64 {
        if self.n_interests_sent == 0 {
            return 0.0;
        }
        self.n_data_received as f64 / self.n_interests_sent as f64
    }

    /// Returns the RTT statistic accumulated since `earlier`, if both
    /// snapshots carry one and `earlier` is a prefix of `self`.
    #[must_use]
    pub fn rtt_since(&self, earlier: &Self) -> Option<RunningStat> {
        let current = self.rtt?;
        match earlier.rtt {
            Some(previous) => current.subtract(&previous).ok(),
            None => Some(current),
        }
    }
}

// ============================================================================
// SECTION: Serialization
// ============================================================================

/// Wire form; `satisfyRatio` is derived on output and ignored on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountersRepr {
    /// Interests transmitted.
    n_interests_sent: u64,
    /// Data packets received.
    n_data_received: u64,
    /// Derived satisfaction ratio (output only).
    #[serde(default, skip_deserializing)]
    satisfy_ratio: f64,
    /// RTT summary when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rtt: Option<RunningStat>,
}

impl From<TrafficGenCounters> for CountersRepr {
    fn from(counters: TrafficGenCounters) -> Self {
        Self {
            n_interests_sent: counters.n_interests_sent,
            n_data_received: counters.n_data_received,
            satisfy_ratio: counters.satisfy_ratio(),
            rtt: counters.rtt,
        }
    }
}

impl From<CountersRepr> for TrafficGenCounters {
    fn from(repr: CountersRepr) -> Self {
        Self {
            n_interests_sent: repr.n_interests_sent,
            n_data_received: repr.n_data_received,
            rtt: repr.rtt,
        }
    }
}
