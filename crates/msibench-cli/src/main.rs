// crates/msibench-cli/src/main.rs
// ============================================================================
// Module: msibench CLI Entry Point
// Description: Command dispatcher for MSI searches and benchmark runs.
// Purpose: Run benchmarks against a JSON-RPC or simulated traffic generator.
// Dependencies: clap, msibench-core, msibench-config, msibench-trafficgen, tokio.
// ============================================================================

//! ## Overview
//! The msibench CLI loads `msibench.toml`, builds a traffic generator, and runs
//! either a single MSI search or the repeated-search benchmark loop. Progress
//! records go to stdout as JSON lines; events go to the configured sink.
//! Trials block, so runs execute on the blocking pool while the async runtime
//! watches for Ctrl-C.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use msibench_cli::runner::EXIT_CANCELLED;
use msibench_cli::runner::EXIT_RANGE_EXHAUSTED;
use msibench_cli::runner::RunError;
use msibench_cli::runner::drive_benchmark;
use msibench_cli::runner::drive_measure;
use msibench_cli::runner::event_sink;
use msibench_cli::runner::simulated_search;
use msibench_cli::t;
use msibench_config::LogConfig;
use msibench_config::MsibenchConfig;
use msibench_core::BenchmarkLoop;
use msibench_core::BisectionSearch;
use msibench_core::CancelToken;
use msibench_core::EventSink;
use msibench_core::SystemClock;
use msibench_trafficgen::JsonRpcTrafficGen;
use msibench_trafficgen::JsonRpcTrafficGenConfig;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "msibench", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the benchmark loop against the JSON-RPC traffic generator.
    Run(RunCommand),
    /// Run the benchmark loop against a simulated generator.
    Simulate(SimulateCommand),
    /// Run a single MSI search against the JSON-RPC traffic generator.
    Measure(MeasureCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an msibench configuration file.
    Validate(ConfigArgs),
}

/// Shared config file selection.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Path to `msibench.toml` (overrides `MSIBENCH_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for `measure`.
#[derive(Args, Debug)]
struct MeasureCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for `simulate`.
#[derive(Args, Debug)]
struct SimulateCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Simulated capacity interval in nanoseconds.
    #[arg(long, value_name = "NS")]
    capacity: u64,
    /// Seed for capacity jitter.
    #[arg(long, value_name = "N", default_value_t = 0)]
    seed: u64,
    /// Relative capacity jitter per trial, in `[0, 0.9]`.
    #[arg(long, value_name = "FRACTION", default_value_t = 0.0)]
    jitter: f64,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(command).await,
        Commands::Simulate(command) => command_simulate(command).await,
        Commands::Measure(command) => command_measure(command).await,
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `run`.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let options = config
        .benchmark_options()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let sink = open_sink(&config.log)?;
    let cancel = install_cancel_handler();
    run_blocking(move || {
        let generator = json_rpc_generator(&config)?;
        let search =
            BisectionSearch::new(generator, SystemClock::new()).with_sink(sink).with_cancel(cancel);
        let bench = BenchmarkLoop::new(search, options)?;
        drive_benchmark(bench, &mut std::io::stdout().lock()).map(drop)
    })
    .await
}

/// Executes `simulate`.
async fn command_simulate(command: SimulateCommand) -> CliResult<ExitCode> {
    if command.capacity == 0 {
        return Err(CliError::new(t!("simulate.capacity_invalid")));
    }
    let config = load_config(command.config.config.as_deref())?;
    let options = config
        .benchmark_options()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let sink = open_sink(&config.log)?;
    let cancel = install_cancel_handler();
    run_blocking(move || {
        let search = simulated_search(command.capacity, command.jitter, command.seed)
            .with_sink(sink)
            .with_cancel(cancel);
        let bench = BenchmarkLoop::new(search, options)?;
        drive_benchmark(bench, &mut std::io::stdout().lock()).map(drop)
    })
    .await
}

/// Executes `measure`.
async fn command_measure(command: MeasureCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let options = config
        .search_options()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let sink = open_sink(&config.log)?;
    let cancel = install_cancel_handler();
    run_blocking(move || {
        let generator = json_rpc_generator(&config)?;
        let mut search =
            BisectionSearch::new(generator, SystemClock::new()).with_sink(sink).with_cancel(cancel);
        drive_measure(&mut search, &options, &mut std::io::stdout().lock()).map(drop)
    })
    .await
}

/// Executes `config validate`.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => {
            load_config(args.config.as_deref())?;
            write_stdout_line(&t!("config.validate.ok"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Run Helpers
// ============================================================================

/// Loads and validates the configuration file.
fn load_config(path: Option<&Path>) -> CliResult<MsibenchConfig> {
    MsibenchConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Opens the configured event sink.
fn open_sink(config: &LogConfig) -> CliResult<Arc<dyn EventSink>> {
    event_sink(config).map_err(|err| {
        let path = config.path.as_deref().unwrap_or_default();
        CliError::new(t!("log.open_failed", path = path, error = err))
    })
}

/// Builds the JSON-RPC generator client. Must run off the async runtime.
fn json_rpc_generator(config: &MsibenchConfig) -> Result<JsonRpcTrafficGen, RunError> {
    JsonRpcTrafficGen::new(JsonRpcTrafficGenConfig {
        endpoint: config.generator.endpoint.clone(),
        generator_id: config.generator.id.clone(),
        timeout: config.generator.timeout(),
        max_response_bytes: config.generator.max_response_bytes,
    })
    .map_err(|err| RunError::Setup(t!("generator.init_failed", error = err)))
}

/// Returns a token cancelled on Ctrl-C.
fn install_cancel_handler() -> CancelToken {
    let cancel = CancelToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => handle.cancel(),
            Err(err) => {
                let _ = write_stderr_line(&t!("signal.install_failed", error = err));
            }
        }
    });
    cancel
}

/// Runs a blocking task on the blocking pool and maps its outcome to an exit code.
async fn run_blocking<F>(task: F) -> CliResult<ExitCode>
where
    F: FnOnce() -> Result<(), RunError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CliError::new(t!("run.join_failed", error = err)))?;
    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&err),
    })
}

/// Writes a failure message and returns the matching exit code.
fn report_failure(err: &RunError) -> ExitCode {
    let _ = write_stderr_line(&failure_message(err));
    ExitCode::from(err.exit_status())
}

/// Formats the stderr message for a run failure.
fn failure_message(err: &RunError) -> String {
    match err.exit_status() {
        EXIT_CANCELLED => t!("run.cancelled"),
        EXIT_RANGE_EXHAUSTED => t!("run.range_exhausted", error = err),
        _ => match err {
            RunError::Output(_) | RunError::Encode(_) => t!("run.output_failed", error = err),
            _ => t!("run.failed", error = err),
        },
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
