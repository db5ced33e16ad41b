// crates/msibench-config/src/config.rs
// ============================================================================
// Module: msibench Configuration
// Description: Configuration loading and validation for msibench.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: msibench-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration resolves from an explicit path, then the `MSIBENCH_CONFIG`
//! environment variable, then `msibench.toml` in the working directory. Every
//! section has defaults, so an empty file is valid. Durations are written in
//! seconds as floating point numbers.
//!
//! Security posture: config inputs are untrusted; sizes and path lengths are
//! bounded before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use msibench_core::BenchmarkOptions;
use msibench_core::SearchOptions;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "msibench.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "MSIBENCH_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a generator identifier.
pub(crate) const MAX_GENERATOR_ID_LENGTH: usize = 128;
/// Largest accepted generator response, in bytes.
pub(crate) const MAX_RESPONSE_BYTES_LIMIT: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for msibench.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MsibenchConfig {
    /// Traffic generator connection.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Per-search options.
    #[serde(default)]
    pub search: SearchConfig,
    /// Benchmark loop options.
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    /// Event logging.
    #[serde(default)]
    pub log: LogConfig,
}

impl MsibenchConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator.validate()?;
        self.search.validate()?;
        self.benchmark.validate()?;
        self.log.validate()?;
        Ok(())
    }

    /// Converts the search section into core search options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a duration is not representable.
    pub fn search_options(&self) -> Result<SearchOptions, ConfigError> {
        self.search.to_options()
    }

    /// Converts the search and benchmark sections into loop options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a duration is not representable.
    pub fn benchmark_options(&self) -> Result<BenchmarkOptions, ConfigError> {
        Ok(BenchmarkOptions {
            search: self.search.to_options()?,
            desired_uncertainty: self.benchmark.desired_uncertainty,
            hint_radius: self.benchmark.hint_radius,
            max_iterations: (self.benchmark.max_iterations > 0)
                .then_some(self.benchmark.max_iterations),
        })
    }
}

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Traffic generator connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// JSON-RPC endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Generator identifier passed with every call.
    #[serde(default = "default_generator_id")]
    pub id: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum accepted response size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            id: default_generator_id(),
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl GeneratorConfig {
    /// Parses the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the endpoint is not an http(s) URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.endpoint.trim()).map_err(|err| {
            ConfigError::Invalid(format!("generator.endpoint is not a valid url: {err}"))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid(format!(
                "generator.endpoint must use http or https, got {scheme}"
            ))),
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates generator settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ConfigError::Invalid("generator.id must be non-empty".to_string()));
        }
        if id != self.id {
            return Err(ConfigError::Invalid("generator.id must be trimmed".to_string()));
        }
        if id.len() > MAX_GENERATOR_ID_LENGTH {
            return Err(ConfigError::Invalid("generator.id exceeds max length".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "generator.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "generator.max_response_bytes must be within 1..={MAX_RESPONSE_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Search
// ============================================================================

/// Search options as written in the config file (durations in seconds).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Smallest candidate interval in nanoseconds.
    pub interval_min: u64,
    /// Largest candidate interval in nanoseconds.
    pub interval_max: u64,
    /// Candidate grid step in nanoseconds.
    pub interval_step: u64,
    /// Expected packets per trial.
    pub tx_count: u64,
    /// Lower clamp on trial duration, in seconds.
    pub tx_duration_min: f64,
    /// Upper clamp on trial duration, in seconds.
    pub tx_duration_max: f64,
    /// Warmup before counters are evaluated, in seconds.
    pub warmup_time: f64,
    /// Drain delay passed to stop, in seconds.
    pub cooldown_time: f64,
    /// Counter polling period, in seconds.
    pub read_counters_freq: f64,
    /// Minimum final satisfy ratio for a pass.
    pub satisfy_threshold: f64,
    /// Early-fail ratio threshold.
    pub early_fail_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            interval_min: options.interval_min,
            interval_max: options.interval_max,
            interval_step: options.interval_step,
            tx_count: options.tx_count,
            tx_duration_min: options.tx_duration_min.as_secs_f64(),
            tx_duration_max: options.tx_duration_max.as_secs_f64(),
            warmup_time: options.warmup_time.as_secs_f64(),
            cooldown_time: options.cooldown_time.as_secs_f64(),
            read_counters_freq: options.read_counters_freq.as_secs_f64(),
            satisfy_threshold: options.satisfy_threshold,
            early_fail_threshold: options.early_fail_threshold,
        }
    }
}

impl SearchConfig {
    /// Converts to core search options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a duration is negative or not finite.
    pub fn to_options(&self) -> Result<SearchOptions, ConfigError> {
        Ok(SearchOptions {
            interval_min: self.interval_min,
            interval_max: self.interval_max,
            interval_step: self.interval_step,
            tx_count: self.tx_count,
            tx_duration_min: seconds("search.tx_duration_min", self.tx_duration_min)?,
            tx_duration_max: seconds("search.tx_duration_max", self.tx_duration_max)?,
            warmup_time: seconds("search.warmup_time", self.warmup_time)?,
            cooldown_time: seconds("search.cooldown_time", self.cooldown_time)?,
            read_counters_freq: seconds("search.read_counters_freq", self.read_counters_freq)?,
            satisfy_threshold: self.satisfy_threshold,
            early_fail_threshold: self.early_fail_threshold,
        })
    }

    /// Validates search settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let options = self.to_options()?;
        options.validate().map_err(|err| ConfigError::Invalid(format!("search: {err}")))
    }
}

// ============================================================================
// SECTION: Benchmark
// ============================================================================

/// Benchmark loop settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchmarkConfig {
    /// Target absolute uncertainty of the mean MSI, in nanoseconds.
    pub desired_uncertainty: f64,
    /// Hint radius in nanoseconds; zero disables hinting.
    pub hint_radius: u64,
    /// Search bound without sufficiency; zero means unbounded.
    pub max_iterations: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        let options = BenchmarkOptions::default();
        Self {
            desired_uncertainty: options.desired_uncertainty,
            hint_radius: options.hint_radius,
            max_iterations: 0,
        }
    }
}

impl BenchmarkConfig {
    /// Validates benchmark settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.desired_uncertainty.is_finite() || self.desired_uncertainty <= 0.0 {
            return Err(ConfigError::Invalid(
                "benchmark.desired_uncertainty must be positive and finite".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `log.path`.
    File,
    /// Discard events.
    None,
}

/// Event logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Sink kind.
    pub sink: LogSinkKind,
    /// Log file path (required for the file sink).
    pub path: Option<String>,
}

impl LogConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("log.path is required when log.sink = \"file\"".to_string()))
            }
            (_, Some(path)) => validate_path_string("log.path", path),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Converts a seconds value into a [`Duration`].
fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::Invalid(format!("{field} must be a finite, non-negative number of seconds"))
    })
}

/// Default generator endpoint.
fn default_endpoint() -> String {
    "http://127.0.0.1:3030/rpc".to_string()
}

/// Default generator identifier.
fn default_generator_id() -> String {
    "tg0".to_string()
}

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    5_000
}

/// Default response size limit.
const fn default_max_response_bytes() -> usize {
    1024 * 1024
}
