// crates/msibench-trafficgen/src/lib.rs
// ============================================================================
// Module: msibench Traffic Generator Client
// Description: JSON-RPC implementation of the traffic generator seam.
// Purpose: Drive a remote packet generator from the benchmark runtime.
// Dependencies: msibench-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`JsonRpcTrafficGen`] implements [`msibench_core::TrafficGen`] over JSON-RPC
//! 2.0 on HTTP POST. Calls are blocking; async callers should run the
//! benchmark on a blocking thread.
//! Invariants:
//! - Responses are size-limited before parsing.
//! - Redirects are never followed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod jsonrpc;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use jsonrpc::ClientError;
pub use jsonrpc::JsonRpcTrafficGen;
pub use jsonrpc::JsonRpcTrafficGenConfig;
