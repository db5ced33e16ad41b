// crates/msibench-core/src/core/stat.rs
// ============================================================================
// Module: Running Statistics
// Description: Online, mergeable mean/variance accumulator.
// Purpose: Summarize sample streams without retaining raw samples.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`RunningStat`] keeps a sample count, a weight, the running mean, and the
//! running sum of squared deviations. Snapshots combine with the parallel
//! (Chan et al.) formula and split with its exact inverse, so a windowed
//! statistic can be recovered from two cumulative snapshots.
//!
//! ## Invariants
//! - `m2 >= 0`.
//! - A snapshot with `len == 0` is the identity element; its `m1`/`m2` carry
//!   no information.
//! - `variance` and `stdev` are `None` unless `len > 1`.

#![allow(clippy::cast_precision_loss, reason = "Sample weights are folded in as f64.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ops::Add;
use std::ops::AddAssign;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Running statistic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatError {
    /// Subtrahend represents more samples than the total.
    #[error("cannot subtract {part} samples from a total of {total}")]
    LengthUnderflow {
        /// Weight of the total snapshot.
        total: u64,
        /// Weight of the snapshot being removed.
        part: u64,
    },
    /// Subtrahend folded in more raw inputs than the total.
    #[error("cannot subtract {part} inputs from a total of {total}")]
    CountUnderflow {
        /// Raw input count of the total snapshot.
        total: u64,
        /// Raw input count of the snapshot being removed.
        part: u64,
    },
}

// ============================================================================
// SECTION: Running Statistic
// ============================================================================

/// Streaming summary of a numeric sample set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "RunningStatRepr", from = "RunningStatRepr")]
pub struct RunningStat {
    /// Raw inputs ever folded in.
    count: u64,
    /// Samples represented.
    len: u64,
    /// Running mean.
    m1: f64,
    /// Running sum of squared deviations from the mean.
    m2: f64,
}

impl RunningStat {
    /// Returns the empty statistic.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            len: 0,
            m1: 0.0,
            m2: 0.0,
        }
    }

    /// Rebuilds a statistic from its raw accumulators.
    ///
    /// A zero `len` yields the identity regardless of the other fields, and a
    /// negative `m2` is clamped to zero.
    #[must_use]
    pub const fn from_parts(count: u64, len: u64, m1: f64, m2: f64) -> Self {
        if len == 0 {
            return Self {
                count,
                len: 0,
                m1: 0.0,
                m2: 0.0,
            };
        }
        Self {
            count,
            len,
            m1,
            m2: if m2 > 0.0 { m2 } else { 0.0 },
        }
    }

    /// Folds every sample of `samples` into a new statistic.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut stat = Self::new();
        for &sample in samples {
            stat.push(sample);
        }
        stat
    }

    /// Folds a single raw sample in with Welford's update.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.len += 1;
        let delta = value - self.m1;
        self.m1 += delta / self.len as f64;
        self.m2 += delta * (value - self.m1);
    }

    /// Combines two independently accumulated snapshots.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        if self.len == 0 {
            return Self {
                count: self.count + other.count,
                ..*other
            };
        }
        if other.len == 0 {
            return Self {
                count: self.count + other.count,
                ..*self
            };
        }
        let len = self.len + other.len;
        let (a_len, b_len, c_len) = (self.len as f64, other.len as f64, len as f64);
        let delta = other.m1 - self.m1;
        let m1 = (a_len * self.m1 + b_len * other.m1) / c_len;
        let m2 = self.m2 + other.m2 + delta * delta * a_len * b_len / c_len;
        Self::from_parts(self.count + other.count, len, m1, m2)
    }

    /// Removes `part` from this snapshot, returning the complement.
    ///
    /// `self` must equal `part.merge(&rest)` for some `rest`; the result is
    /// that `rest`. A complement with zero weight is the identity element.
    ///
    /// # Errors
    ///
    /// Returns [`StatError`] when `part` represents more samples or inputs
    /// than `self`.
    pub fn subtract(&self, part: &Self) -> Result<Self, StatError> {
        let len = self.len.checked_sub(part.len).ok_or(StatError::LengthUnderflow {
            total: self.len,
            part: part.len,
        })?;
        let count = self.count.checked_sub(part.count).ok_or(StatError::CountUnderflow {
            total: self.count,
            part: part.count,
        })?;
        if len == 0 {
            return Ok(Self::from_parts(count, 0, 0.0, 0.0));
        }
        if part.len == 0 {
            return Ok(Self::from_parts(count, len, self.m1, self.m2));
        }
        let (a_len, b_len, c_len) = (part.len as f64, len as f64, self.len as f64);
        let m1 = (c_len * self.m1 - a_len * part.m1) / b_len;
        let delta = part.m1 - m1;
        let m2 = self.m2 - part.m2 - delta * delta * a_len * b_len / c_len;
        Ok(Self::from_parts(count, len, m1, m2))
    }

    /// Returns the number of raw inputs folded in.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Returns the number of samples represented.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Returns true when no samples are represented.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the raw mean accumulator.
    #[must_use]
    pub const fn m1(&self) -> f64 {
        self.m1
    }

    /// Returns the raw sum of squared deviations.
    #[must_use]
    pub const fn m2(&self) -> f64 {
        self.m2
    }

    /// Returns the mean, or `None` without samples.
    #[must_use]
    pub const fn mean(&self) -> Option<f64> {
        if self.len == 0 { None } else { Some(self.m1) }
    }

    /// Returns the sample variance, or `None` below two samples.
    #[must_use]
    pub fn variance(&self) -> Option<f64> {
        if self.len < 2 { None } else { Some(self.m2 / (self.len - 1) as f64) }
    }

    /// Returns the sample standard deviation, or `None` below two samples.
    #[must_use]
    pub fn stdev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

impl Add for RunningStat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.merge(&rhs)
    }
}

impl AddAssign for RunningStat {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.merge(&rhs);
    }
}

impl FromIterator<f64> for RunningStat {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stat = Self::new();
        for value in iter {
            stat.push(value);
        }
        stat
    }
}

// ============================================================================
// SECTION: Serialization
// ============================================================================

/// Wire form: raw accumulators in, raw accumulators plus derived values out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RunningStatRepr {
    /// Raw inputs folded in.
    #[serde(default)]
    count: u64,
    /// Samples represented.
    #[serde(default)]
    len: u64,
    /// Running mean.
    #[serde(default)]
    m1: f64,
    /// Running sum of squared deviations.
    #[serde(default)]
    m2: f64,
    /// Derived mean (output only).
    #[serde(default, skip_deserializing)]
    mean: Option<f64>,
    /// Derived variance (output only).
    #[serde(default, skip_deserializing)]
    variance: Option<f64>,
    /// Derived standard deviation (output only).
    #[serde(default, skip_deserializing)]
    stdev: Option<f64>,
}

impl From<RunningStat> for RunningStatRepr {
    fn from(stat: RunningStat) -> Self {
        Self {
            count: stat.count,
            len: stat.len,
            m1: stat.m1,
            m2: stat.m2,
            mean: stat.mean(),
            variance: stat.variance(),
            stdev: stat.stdev(),
        }
    }
}

impl From<RunningStatRepr> for RunningStat {
    fn from(repr: RunningStatRepr) -> Self {
        Self::from_parts(repr.count, repr.len, repr.m1, repr.m2)
    }
}
