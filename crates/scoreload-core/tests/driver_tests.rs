use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use scoreload_common::config::LoadConfig;
use scoreload_core::checks::{HAS_DECISION, STATUS_IS_200};
use scoreload_core::{run, CheckTally, Driver};
use serde_json::{json, Value};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap(); });
    addr
}

fn config_for(addr: SocketAddr) -> LoadConfig {
    LoadConfig { url: format!("http://{}/v1/score", addr), ..LoadConfig::default() }
}

fn fixed(status: StatusCode, body: Value) -> Router {
    Router::new().route("/v1/score", post(move || async move { (status, Json(body)) }))
}

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<(Option<String>, Value)>>>);

async fn capture(State(seen): State<Seen>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok()).map(String::from);
    let parsed: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    seen.0.lock().unwrap().push((content_type, parsed));
    Json(json!({"decision": "TRADE", "conf": 0.9}))
}

#[tokio::test]
async fn sends_sample_payload_as_json() {
    let seen = Seen::default();
    let app = Router::new().route("/v1/score", post(capture)).with_state(seen.clone());
    let addr = serve(app).await;

    let driver = Driver::new(&config_for(addr), Arc::new(CheckTally::new())).unwrap();
    let report = driver.run_iteration().await;
    assert_eq!(report.status, Some(200));
    assert!(report.passed(STATUS_IS_200));
    assert!(report.passed(HAS_DECISION));
    assert!(report.transport_error.is_none());

    let seen = seen.0.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (content_type, body) = &seen[0];
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["symbol"], "BTC");
    assert_eq!(body["ts_ns"], 1);
    assert_eq!(body["freshness_ms"], 10);
    assert_eq!(body["features"], json!([0.1, 0.2, 0.0, 0.3, 0.1, 0.0, 0.2, 0.1]));
}

#[tokio::test]
async fn missing_decision_fails_only_that_check() {
    let addr = serve(fixed(StatusCode::OK, json!({"conf": 0.3}))).await;
    let tally = Arc::new(CheckTally::new());
    let driver = Driver::new(&config_for(addr), tally.clone()).unwrap();
    let report = driver.run_iteration().await;
    assert!(report.passed(STATUS_IS_200));
    assert!(!report.passed(HAS_DECISION));

    let summary = tally.summary(Duration::ZERO);
    assert_eq!(summary.check(STATUS_IS_200).unwrap().passes, 1);
    assert_eq!(summary.check(HAS_DECISION).unwrap().fails, 1);
}

#[tokio::test]
async fn server_error_with_decision_fails_only_status() {
    let addr = serve(fixed(StatusCode::INTERNAL_SERVER_ERROR, json!({"decision": "ABSTAIN"}))).await;
    let driver = Driver::new(&config_for(addr), Arc::new(CheckTally::new())).unwrap();
    let report = driver.run_iteration().await;
    assert_eq!(report.status, Some(500));
    assert!(!report.passed(STATUS_IS_200));
    assert!(report.passed(HAS_DECISION));
}

#[tokio::test]
async fn unreachable_endpoint_completes_iteration_and_sleeps() {
    let addr = {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        listener.local_addr().unwrap()
    };
    let tally = Arc::new(CheckTally::new());
    let driver = Driver::new(&config_for(addr), tally.clone()).unwrap();

    let start = Instant::now();
    let report = driver.run_iteration().await;
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert!(report.status.is_none());
    assert!(report.transport_error.is_some());
    assert!(report.checks.iter().all(|c| !c.passed));

    let summary = tally.summary(start.elapsed());
    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.transport_errors, 1);
    assert_eq!(summary.pass_rate(), 0.0);
}

#[tokio::test]
async fn latency_adds_to_think_time() {
    let app = Router::new().route(
        "/v1/score",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Json(json!({"decision": "TRADE"}))
        }),
    );
    let addr = serve(app).await;
    let driver = Driver::new(&config_for(addr), Arc::new(CheckTally::new())).unwrap();
    let start = Instant::now();
    let report = driver.run_iteration().await;
    assert!(report.latency >= Duration::from_millis(100));
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn run_spreads_iterations_over_virtual_users() {
    let addr = serve(fixed(StatusCode::OK, json!({"decision": "TRADE"}))).await;
    let cfg = LoadConfig { vus: 2, duration: Duration::from_secs(1), ..config_for(addr) };
    let summary = run(&cfg, Arc::new(AtomicBool::new(false))).await.unwrap();

    // ~ vus * duration / (latency + 200ms)
    assert!((6..=14).contains(&summary.iterations), "got {} iterations", summary.iterations);
    assert!(summary.elapsed >= Duration::from_secs(1));
    assert_eq!(summary.transport_errors, 0);
    assert_eq!(summary.pass_rate(), 1.0);
    assert_eq!(summary.check(HAS_DECISION).unwrap().passes, summary.iterations);
}

#[tokio::test]
async fn iteration_budget_is_per_virtual_user() {
    let addr = serve(fixed(StatusCode::OK, json!({"decision": "TRADE"}))).await;
    let cfg = LoadConfig {
        vus: 3,
        duration: Duration::from_secs(30),
        sleep: Duration::from_millis(5),
        iterations: Some(4),
        ..config_for(addr)
    };
    let summary = run(&cfg, Arc::new(AtomicBool::new(false))).await.unwrap();
    assert_eq!(summary.iterations, 12);
}

#[tokio::test]
async fn raised_stop_flag_schedules_nothing() {
    let addr = serve(fixed(StatusCode::OK, json!({"decision": "TRADE"}))).await;
    let summary = run(&config_for(addr), Arc::new(AtomicBool::new(true))).await.unwrap();
    assert_eq!(summary.iterations, 0);
    assert_eq!(summary.pass_rate(), 0.0);
}

#[tokio::test]
async fn rejects_zero_virtual_users() {
    let cfg = LoadConfig { vus: 0, ..LoadConfig::default() };
    assert!(run(&cfg, Arc::new(AtomicBool::new(false))).await.is_err());
}

#[tokio::test]
async fn unreachable_deadline_is_rejected() {
    let cfg = LoadConfig { duration: Duration::MAX, ..LoadConfig::default() };
    assert!(run(&cfg, Arc::new(AtomicBool::new(false))).await.is_err());
}
