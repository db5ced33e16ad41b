// crates/msibench-trafficgen/tests/jsonrpc_client.rs
// ============================================================================
// Module: JSON-RPC Traffic Generator Tests
// Description: Wire format, error mapping, and limits against a local server.
// Purpose: Ensure the client speaks the generator protocol and fails closed.
// ============================================================================

//! ## Overview
//! Each test runs a `tiny_http` server on an ephemeral port that records the
//! JSON-RPC requests it receives and replies with canned payloads.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use msibench_core::BisectionSearch;
use msibench_core::SearchOptions;
use msibench_core::SystemClock;
use msibench_core::TrafficGen;
use msibench_core::TrafficGenError;
use msibench_trafficgen::ClientError;
use msibench_trafficgen::JsonRpcTrafficGen;
use msibench_trafficgen::JsonRpcTrafficGenConfig;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Creates a client for `endpoint` with the given response limit.
fn client_for(endpoint: &str, max_response_bytes: usize) -> JsonRpcTrafficGen {
    JsonRpcTrafficGen::new(JsonRpcTrafficGenConfig {
        endpoint: endpoint.to_string(),
        generator_id: "tg0".to_string(),
        timeout: Duration::from_secs(5),
        max_response_bytes,
    })
    .unwrap()
}

/// Builds a successful JSON-RPC reply echoing the request id.
fn ok_reply(request: &Value, result: Value) -> (u16, String) {
    (200, json!({"jsonrpc": "2.0", "id": request["id"], "result": result}).to_string())
}

/// Reads and parses a request body, yielding `Null` on malformed input.
fn read_request(request: &mut tiny_http::Request) -> Value {
    let mut body = String::new();
    let _ = request.as_reader().read_to_string(&mut body);
    serde_json::from_str(&body).unwrap_or(Value::Null)
}

/// Sends `body` with `status` and a JSON content type.
fn respond(request: tiny_http::Request, status: u16, body: String) {
    let header = Header::from_bytes("Content-Type", "application/json").unwrap();
    let response = Response::from_string(body).with_status_code(status).with_header(header);
    let _ = request.respond(response);
}

/// Serves `count` requests, returning every request body seen.
fn serve<F>(count: usize, handler: F) -> (String, thread::JoinHandle<Vec<Value>>)
where
    F: Fn(&Value) -> (u16, String) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/rpc");
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0 .. count {
            let Ok(mut request) = server.recv() else {
                break;
            };
            let value = read_request(&mut request);
            let (status, body) = handler(&value);
            respond(request, status, body);
            seen.push(value);
        }
        seen
    });
    (url, handle)
}

// ============================================================================
// SECTION: Wire Format
// ============================================================================

/// Confirms `start` sends the interval and asks for a counter reset.
#[test]
fn start_sends_interval_and_clears_counters() {
    let (url, handle) = serve(1, |request| ok_reply(request, Value::Null));
    let mut client = client_for(&url, 4096);
    client.start(1200).unwrap();
    let seen = handle.join().unwrap();
    assert_eq!(seen[0]["jsonrpc"], "2.0");
    assert_eq!(seen[0]["method"], "trafficgen.start");
    assert_eq!(seen[0]["params"]["id"], "tg0");
    assert_eq!(seen[0]["params"]["interval_ns"], 1200);
    assert_eq!(seen[0]["params"]["clear_counters"], true);
}

#[test]
fn stop_sends_drain_delay_in_milliseconds() {
    let (url, handle) = serve(1, |request| ok_reply(request, Value::Null));
    let mut client = client_for(&url, 4096);
    client.stop(Duration::from_millis(1500)).unwrap();
    let seen = handle.join().unwrap();
    assert_eq!(seen[0]["method"], "trafficgen.stop");
    assert_eq!(seen[0]["params"]["drain_delay_ms"], 1500);
}

#[test]
fn request_ids_increase() {
    let (url, handle) = serve(3, |request| ok_reply(request, Value::Null));
    let mut client = client_for(&url, 4096);
    client.start(1000).unwrap();
    client.stop(Duration::ZERO).unwrap();
    client.start(1000).unwrap();
    let seen = handle.join().unwrap();
    let ids: Vec<u64> = seen.iter().filter_map(|request| request["id"].as_u64()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

/// Confirms counters parse including the cumulative RTT statistic.
#[test]
fn counters_parse_with_rtt() {
    let (url, handle) = serve(1, |request| {
        ok_reply(
            request,
            json!({
                "n_interests_sent": 1000,
                "n_data_received": 990,
                "rtt": {"count": 990, "len": 990, "m1": 1.5, "m2": 10.0},
            }),
        )
    });
    let mut client = client_for(&url, 4096);
    let counters = client.read_counters().unwrap();
    handle.join().unwrap();
    assert_eq!(counters.n_interests_sent, 1000);
    assert_eq!(counters.n_data_received, 990);
    assert_eq!(counters.satisfy_ratio(), 0.99);
    let rtt = counters.rtt.unwrap();
    assert_eq!(rtt.len(), 990);
    assert_eq!(rtt.mean(), Some(1.5));
}

#[test]
fn counters_accept_camel_case_fields() {
    let (url, handle) = serve(1, |request| {
        ok_reply(request, json!({"nInterestsSent": 10, "nDataReceived": 5}))
    });
    let mut client = client_for(&url, 4096);
    let counters = client.read_counters().unwrap();
    handle.join().unwrap();
    assert_eq!(counters.satisfy_ratio(), 0.5);
    assert_eq!(counters.rtt, None);
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// Confirms a JSON-RPC error object surfaces as a generator error.
#[test]
fn rpc_error_maps_to_generator_error() {
    let (url, handle) = serve(1, |request| {
        (
            200,
            json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": {"code": -32000, "message": "generator busy"},
            })
            .to_string(),
        )
    });
    let mut client = client_for(&url, 4096);
    let err = client.start(1000).unwrap_err();
    handle.join().unwrap();
    match err {
        TrafficGenError::Generator(message) => assert!(message.contains("generator busy")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn http_failure_maps_to_transport_error() {
    let (url, handle) = serve(1, |_| (500, "internal".to_string()));
    let mut client = client_for(&url, 4096);
    let err = client.read_counters().unwrap_err();
    handle.join().unwrap();
    match err {
        TrafficGenError::Transport(message) => assert!(message.contains("500")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_response_maps_to_protocol_error() {
    let (url, handle) = serve(1, |_| (200, "not json".to_string()));
    let mut client = client_for(&url, 4096);
    let err = client.read_counters().unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, TrafficGenError::Protocol(_)));
}

#[test]
fn malformed_counters_map_to_protocol_error() {
    let (url, handle) = serve(1, |request| ok_reply(request, json!({"n_interests_sent": 1})));
    let mut client = client_for(&url, 4096);
    let err = client.counters().unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, ClientError::Protocol(_)));
}

/// Confirms responses above the limit are rejected before parsing.
#[test]
fn oversized_response_is_rejected() {
    let (url, handle) = serve(1, |request| ok_reply(request, json!({"padding": "x".repeat(1024)})));
    let mut client = client_for(&url, 64);
    let err = client.counters().unwrap_err();
    handle.join().unwrap();
    match err {
        ClientError::ResponseTooLarge {
            actual,
            limit,
        } => {
            assert_eq!(limit, 64);
            assert!(actual > 64);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unreachable_endpoint_maps_to_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let mut client = client_for(&format!("http://{addr}/rpc"), 4096);
    assert!(matches!(client.start(1000), Err(TrafficGenError::Transport(_))));
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = JsonRpcTrafficGenConfig {
        endpoint: "ftp://127.0.0.1/rpc".to_string(),
        generator_id: "tg0".to_string(),
        timeout: Duration::from_secs(1),
        max_response_bytes: 1024,
    };
    assert!(matches!(JsonRpcTrafficGen::new(config), Err(ClientError::Config(_))));
}

// ============================================================================
// SECTION: End-to-End Search
// ============================================================================

/// Generator state held by the fixture server.
#[derive(Default)]
struct RemoteState {
    /// Interval from the last start.
    interval: u64,
    /// Packets reported sent since the last start.
    sent: u64,
}

/// Runs a full bisection against a server that passes at 1000 ns and above.
#[test]
fn search_runs_against_remote_generator() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let done = Arc::new(AtomicBool::new(false));
    let state = Arc::new(Mutex::new(RemoteState::default()));
    let server_done = Arc::clone(&done);
    let handle = thread::spawn(move || {
        while !server_done.load(Ordering::SeqCst) {
            let Ok(Some(mut request)) = server.recv_timeout(Duration::from_millis(20)) else {
                continue;
            };
            let value = read_request(&mut request);
            let mut remote = state.lock().unwrap();
            let result = match value["method"].as_str() {
                Some("trafficgen.start") => {
                    remote.interval = value["params"]["interval_ns"].as_u64().unwrap_or(0);
                    remote.sent = 0;
                    Value::Null
                }
                Some("trafficgen.counters") => {
                    remote.sent += 100;
                    let received = if remote.interval >= 1000 { remote.sent } else { 0 };
                    json!({"n_interests_sent": remote.sent, "n_data_received": received})
                }
                _ => Value::Null,
            };
            drop(remote);
            let (status, body) = ok_reply(&value, result);
            respond(request, status, body);
        }
    });

    let options = SearchOptions {
        interval_min: 900,
        interval_max: 1100,
        interval_step: 100,
        tx_count: 1,
        tx_duration_min: Duration::from_millis(30),
        tx_duration_max: Duration::from_millis(30),
        warmup_time: Duration::ZERO,
        cooldown_time: Duration::ZERO,
        read_counters_freq: Duration::from_millis(10),
        satisfy_threshold: 0.999,
        early_fail_threshold: 0.5,
    };
    let client = client_for(&format!("http://{addr}/rpc"), 4096);
    let mut search = BisectionSearch::new(client, SystemClock::new());
    let result = search.measure(&options);
    done.store(true, Ordering::SeqCst);
    handle.join().unwrap();

    let result = result.unwrap();
    assert_eq!(result.msi, Some(1000));
    assert!(!result.is_underflow && !result.is_overflow);
    assert_eq!(result.trials, 2);
}
