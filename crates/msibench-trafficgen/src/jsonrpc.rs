// crates/msibench-trafficgen/src/jsonrpc.rs
// ============================================================================
// Module: JSON-RPC Traffic Generator
// Description: Blocking JSON-RPC 2.0 client for start/stop/counters.
// Purpose: Translate the traffic generator seam into remote calls.
// Dependencies: msibench-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! Wire methods:
//! - `trafficgen.start {id, interval_ns, clear_counters}` returns `null`.
//! - `trafficgen.stop {id, drain_delay_ms}` returns `null` once drained.
//! - `trafficgen.counters {id}` returns `{n_interests_sent, n_data_received,
//!   rtt?}`.
//!
//! The `stop` request timeout is extended by the drain delay because the
//! server replies only after draining.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use msibench_core::RunningStat;
use msibench_core::TrafficGen;
use msibench_core::TrafficGenCounters;
use msibench_core::TrafficGenError;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Method that starts transmission.
const METHOD_START: &str = "trafficgen.start";
/// Method that stops transmission and drains.
const METHOD_STOP: &str = "trafficgen.stop";
/// Method that reads counters.
const METHOD_COUNTERS: &str = "trafficgen.counters";
/// User agent sent with every request.
const USER_AGENT: &str = concat!("msibench/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Errors
// ============================================================================

/// JSON-RPC client errors.
///
/// # Invariants
/// - String payloads may include untrusted server text.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("traffic generator client config error: {0}")]
    Config(String),
    /// Transport error.
    #[error("traffic generator transport error: {0}")]
    Transport(String),
    /// Protocol parsing error.
    #[error("traffic generator protocol error: {0}")]
    Protocol(String),
    /// Response size exceeds limits.
    #[error("traffic generator response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
    /// JSON serialization error.
    #[error("traffic generator json error: {0}")]
    Json(String),
    /// The generator answered with a JSON-RPC error object.
    #[error("traffic generator rejected {method}: {message} (code {code})")]
    Rpc {
        /// Method that failed.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// Server-provided message.
        message: String,
    },
}

impl From<ClientError> for TrafficGenError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Transport(_) => Self::Transport(error.to_string()),
            ClientError::Rpc {
                ..
            } => Self::Generator(error.to_string()),
            ClientError::Config(_)
            | ClientError::Protocol(_)
            | ClientError::ResponseTooLarge {
                ..
            }
            | ClientError::Json(_) => Self::Protocol(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings for [`JsonRpcTrafficGen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRpcTrafficGenConfig {
    /// JSON-RPC endpoint.
    pub endpoint: String,
    /// Generator identifier sent with every call.
    pub generator_id: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum accepted response body size in bytes.
    pub max_response_bytes: usize,
}

// ============================================================================
// SECTION: JSON-RPC Structures
// ============================================================================

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    /// JSON-RPC version tag.
    jsonrpc: &'static str,
    /// Request identifier.
    id: u64,
    /// Method name to invoke.
    method: &'a str,
    /// Parameters payload.
    params: Value,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    /// Result payload.
    #[serde(default)]
    result: Option<Value>,
    /// Error payload.
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    /// Error code.
    #[serde(default)]
    code: i64,
    /// Error message provided by the server.
    message: String,
}

/// `trafficgen.counters` result payload.
#[derive(Debug, Deserialize)]
struct CountersResult {
    /// Interests transmitted since the last start.
    #[serde(alias = "nInterestsSent")]
    n_interests_sent: u64,
    /// Data packets received since the last start.
    #[serde(alias = "nDataReceived")]
    n_data_received: u64,
    /// Cumulative RTT statistic, when measured.
    #[serde(default)]
    rtt: Option<RunningStat>,
}

impl From<CountersResult> for TrafficGenCounters {
    fn from(result: CountersResult) -> Self {
        let counters = Self::new(result.n_interests_sent, result.n_data_received);
        match result.rtt {
            Some(rtt) => counters.with_rtt(rtt),
            None => counters,
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Traffic generator driven over JSON-RPC.
#[derive(Debug)]
pub struct JsonRpcTrafficGen {
    /// HTTP client.
    client: Client,
    /// Endpoint URL.
    endpoint: Url,
    /// Generator identifier.
    generator_id: String,
    /// Base request timeout.
    timeout: Duration,
    /// Response size limit.
    max_response_bytes: usize,
    /// Next request identifier.
    next_id: u64,
}

impl JsonRpcTrafficGen {
    /// Builds a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the endpoint or limits are invalid.
    pub fn new(config: JsonRpcTrafficGenConfig) -> Result<Self, ClientError> {
        let endpoint = Url::parse(config.endpoint.trim())
            .map_err(|err| ClientError::Config(format!("invalid endpoint: {err}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ClientError::Config("endpoint must use http or https".to_string()));
        }
        if config.generator_id.trim().is_empty() {
            return Err(ClientError::Config("generator id must be non-empty".to_string()));
        }
        if config.max_response_bytes == 0 {
            return Err(ClientError::Config("max_response_bytes must be positive".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|_| ClientError::Config("http client build failed".to_string()))?;
        Ok(Self {
            client,
            endpoint,
            generator_id: config.generator_id,
            timeout: config.timeout,
            max_response_bytes: config.max_response_bytes,
            next_id: 1,
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Starts transmission at `interval` nanoseconds with cleared counters.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the call fails.
    pub fn start_transmission(&mut self, interval: u64) -> Result<(), ClientError> {
        let params = json!({
            "id": self.generator_id,
            "interval_ns": interval,
            "clear_counters": true,
        });
        self.call(METHOD_START, params, self.timeout).map(drop)
    }

    /// Stops transmission; the server replies after `drain_delay`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the call fails.
    pub fn stop_transmission(&mut self, drain_delay: Duration) -> Result<(), ClientError> {
        let drain_delay_ms = u64::try_from(drain_delay.as_millis()).unwrap_or(u64::MAX);
        let params = json!({
            "id": self.generator_id,
            "drain_delay_ms": drain_delay_ms,
        });
        let timeout = self.timeout.saturating_add(drain_delay);
        self.call(METHOD_STOP, params, timeout).map(drop)
    }

    /// Reads cumulative counters.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the call fails or the result is malformed.
    pub fn counters(&mut self) -> Result<TrafficGenCounters, ClientError> {
        let params = json!({ "id": self.generator_id });
        let result = self.call(METHOD_COUNTERS, params, self.timeout)?;
        let counters: CountersResult = serde_json::from_value(result)
            .map_err(|err| ClientError::Protocol(format!("invalid counters result: {err}")))?;
        Ok(counters.into())
    }

    /// Sends one JSON-RPC request and returns its result.
    fn call(&mut self, method: &str, params: Value, timeout: Duration) -> Result<Value, ClientError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|err| ClientError::Json(format!("jsonrpc serialization failed: {err}")))?;
        let mut response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .body(payload)
            .send()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let status = response.status();
        let body = read_response_limited(&mut response, self.max_response_bytes)?;
        if !status.is_success() {
            let preview = String::from_utf8_lossy(&body);
            return Err(ClientError::Transport(format!(
                "http status {}: {}",
                status.as_u16(),
                preview.trim()
            )));
        }
        let response: JsonRpcResponse = serde_json::from_slice(&body)
            .map_err(|err| ClientError::Protocol(format!("invalid json-rpc response: {err}")))?;
        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

impl TrafficGen for JsonRpcTrafficGen {
    fn start(&mut self, interval: u64) -> Result<(), TrafficGenError> {
        Ok(self.start_transmission(interval)?)
    }

    fn stop(&mut self, drain_delay: Duration) -> Result<(), TrafficGenError> {
        Ok(self.stop_transmission(drain_delay)?)
    }

    fn read_counters(&mut self) -> Result<TrafficGenCounters, TrafficGenError> {
        Ok(self.counters()?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, ClientError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ClientError::Config("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(ClientError::ResponseTooLarge {
            actual: usize::try_from(expected).unwrap_or(usize::MAX),
            limit: max_bytes,
        });
    }
    let mut buf = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| ClientError::Transport(format!("failed to read response: {err}")))?;
    if buf.len() > max_bytes {
        return Err(ClientError::ResponseTooLarge {
            actual: buf.len(),
            limit: max_bytes,
        });
    }
    Ok(buf)
}
