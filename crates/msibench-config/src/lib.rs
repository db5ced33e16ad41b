// crates/msibench-config/src/lib.rs
// ============================================================================
// Module: msibench Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for msibench.toml semantics.
// Dependencies: msibench-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `msibench-config` loads `msibench.toml`, applies defaults, validates every
//! section, and converts the result into the core option types.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BenchmarkConfig;
pub use config::ConfigError;
pub use config::GeneratorConfig;
pub use config::LogConfig;
pub use config::LogSinkKind;
pub use config::MsibenchConfig;
pub use config::SearchConfig;
