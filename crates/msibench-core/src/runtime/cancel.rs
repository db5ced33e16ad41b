// crates/msibench-core/src/runtime/cancel.rs
// ============================================================================
// Module: Cancellation
// Description: Cooperative cancellation flag shared with the caller.
// Purpose: Allow a signal handler to unwind a running search.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The search checks the token before each trial and before each counter
//! poll. Cancellation is sticky; there is no reset.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Token
// ============================================================================

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Set once cancellation is requested.
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
