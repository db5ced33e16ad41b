// crates/msibench-cli/src/lib.rs
// ============================================================================
// Module: msibench CLI Library
// Description: Shared helpers for the msibench command-line binary.
// Purpose: Keep message formatting and run orchestration testable outside main.
// Dependencies: msibench-core, msibench-config, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The binary in `main.rs` parses arguments and wires signals; everything it
//! prints or decides lives here so integration tests can drive it against the
//! simulated generator.

pub mod i18n;
pub mod runner;
