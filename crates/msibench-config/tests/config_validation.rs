// crates/msibench-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Defaults, parsing, validation, and conversion to core options.
// Purpose: Ensure msibench.toml fails closed on invalid input.
// =============================================================================

//! Config loading and validation tests for msibench-config.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::time::Duration;

use msibench_config::ConfigError;
use msibench_config::LogSinkKind;
use msibench_config::MsibenchConfig;

type TestResult = Result<(), String>;

fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

// ============================================================================
// SECTION: Defaults and Parsing
// ============================================================================

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let config = MsibenchConfig::from_toml_str("").map_err(|err| err.to_string())?;
    assert_eq!(config.generator.endpoint, "http://127.0.0.1:3030/rpc");
    assert_eq!(config.generator.id, "tg0");
    assert_eq!(config.search.interval_min, 500);
    assert_eq!(config.search.interval_max, 3500);
    assert_eq!(config.log.sink, LogSinkKind::Stderr);
    let options = config.benchmark_options().map_err(|err| err.to_string())?;
    assert_eq!(options.max_iterations, None);
    assert_eq!(options.search.warmup_time, Duration::from_secs(5));
    Ok(())
}

#[test]
fn full_file_converts_to_core_options() -> TestResult {
    let content = r#"
[generator]
endpoint = "https://tg.example:8443/rpc"
id = "gen-a"
timeout_ms = 2500

[search]
interval_min = 800
interval_max = 1600
interval_step = 10
tx_count = 5000000
tx_duration_min = 2.5
tx_duration_max = 30.0
warmup_time = 1.0
cooldown_time = 0.5
read_counters_freq = 0.25
satisfy_threshold = 0.99
early_fail_threshold = 0.4

[benchmark]
desired_uncertainty = 5.0
hint_radius = 100
max_iterations = 40

[log]
sink = "file"
path = "out/events.log"
"#;
    let config = MsibenchConfig::from_toml_str(content).map_err(|err| err.to_string())?;
    let options = config.benchmark_options().map_err(|err| err.to_string())?;
    assert_eq!(options.search.interval_step, 10);
    assert_eq!(options.search.tx_duration_min, Duration::from_millis(2500));
    assert_eq!(options.search.read_counters_freq, Duration::from_millis(250));
    assert_eq!(options.search.satisfy_threshold, 0.99);
    assert_eq!(options.hint_radius, 100);
    assert_eq!(options.max_iterations, Some(40));
    assert_eq!(config.generator.timeout(), Duration::from_millis(2500));
    assert_eq!(config.log.sink, LogSinkKind::File);
    let url = config.generator.endpoint_url().map_err(|err| err.to_string())?;
    assert_eq!(url.port(), Some(8443));
    Ok(())
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    assert_invalid(MsibenchConfig::from_toml_str("[search]\nintervl_min = 1\n"), "parse")
}

#[test]
fn inverted_range_is_not_a_config_error() -> TestResult {
    let config = MsibenchConfig::from_toml_str("[search]\ninterval_min = 2000\ninterval_max = 1000\n")
        .map_err(|err| err.to_string())?;
    let options = config.search_options().map_err(|err| err.to_string())?;
    assert!(options.is_degenerate());
    Ok(())
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn zero_step_is_invalid() -> TestResult {
    assert_invalid(MsibenchConfig::from_toml_str("[search]\ninterval_step = 0\n"), "interval_step")
}

#[test]
fn zero_interval_min_is_invalid() -> TestResult {
    assert_invalid(MsibenchConfig::from_toml_str("[search]\ninterval_min = 0\n"), "interval_min")
}

#[test]
fn thresholds_must_be_ordered() -> TestResult {
    assert_invalid(
        MsibenchConfig::from_toml_str(
            "[search]\nsatisfy_threshold = 0.4\nearly_fail_threshold = 0.5\n",
        ),
        "early_fail_threshold",
    )
}

#[test]
fn thresholds_must_be_ratios() -> TestResult {
    assert_invalid(
        MsibenchConfig::from_toml_str("[search]\nsatisfy_threshold = 1.5\n"),
        "satisfy_threshold",
    )
}

#[test]
fn negative_durations_are_invalid() -> TestResult {
    assert_invalid(
        MsibenchConfig::from_toml_str("[search]\nwarmup_time = -1.0\n"),
        "search.warmup_time",
    )
}

#[test]
fn duration_bounds_must_be_ordered() -> TestResult {
    assert_invalid(
        MsibenchConfig::from_toml_str("[search]\ntx_duration_min = 90.0\ntx_duration_max = 60.0\n"),
        "tx_duration_min",
    )
}

#[test]
fn zero_poll_period_is_invalid() -> TestResult {
    assert_invalid(
        MsibenchConfig::from_toml_str("[search]\nread_counters_freq = 0.0\n"),
        "read_counters_freq",
    )
}

#[test]
fn uncertainty_must_be_positive() -> TestResult {
    assert_invalid(
        MsibenchConfig::from_toml_str("[benchmark]\ndesired_uncertainty = 0.0\n"),
        "desired_uncertainty",
    )
}

#[test]
fn endpoint_must_be_http() -> TestResult {
    assert_invalid(
        MsibenchConfig::from_toml_str("[generator]\nendpoint = \"ftp://tg/rpc\"\n"),
        "http or https",
    )?;
    assert_invalid(
        MsibenchConfig::from_toml_str("[generator]\nendpoint = \"not a url\"\n"),
        "generator.endpoint",
    )
}

#[test]
fn generator_id_must_be_trimmed() -> TestResult {
    assert_invalid(MsibenchConfig::from_toml_str("[generator]\nid = \" tg0\"\n"), "trimmed")?;
    assert_invalid(MsibenchConfig::from_toml_str("[generator]\nid = \"  \"\n"), "non-empty")
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(MsibenchConfig::from_toml_str("[log]\nsink = \"file\"\n"), "log.path")
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn load_reads_explicit_path() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("msibench.toml");
    std::fs::write(&path, "[benchmark]\nhint_radius = 25\n").map_err(|err| err.to_string())?;
    let config = MsibenchConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    assert_eq!(config.benchmark.hint_radius, 25);
    Ok(())
}

#[test]
fn load_reports_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(MsibenchConfig::load(Some(&path)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(2 * 1024 * 1024));
    std::fs::write(&path, padding).map_err(|err| err.to_string())?;
    assert_invalid(MsibenchConfig::load(Some(&path)), "size limit")
}

#[test]
fn load_rejects_long_path_component() -> TestResult {
    let path = std::path::PathBuf::from("x".repeat(300));
    assert_invalid(MsibenchConfig::load(Some(&path)), "component too long")
}
