//! Stand-in scoring endpoint (`POST /v1/score`) for driving load locally

pub mod guardrails;

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use scoreload_common::ScoreRequest;

use guardrails::{decide, event_age_ms, Decision};

const SCORE_ROUTE: &str = "/v1/score";

/// Fixed model output the stub pretends to have inferred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StubConfig {
    pub prob_trade: f64,
    pub spread_bps: f64,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self { prob_trade: 0.7, spread_bps: 2.0 }
    }
}

#[derive(Clone)]
pub struct AppState {
    cfg: StubConfig,
    registry: Registry,
    requests_total: IntCounterVec,
    fallback_total: IntCounterVec,
    e2e_latency_ms: Histogram,
}

impl AppState {
    fn new(cfg: StubConfig) -> Self {
        let registry = Registry::new();
        let requests_total = IntCounterVec::new(Opts::new("requests_total", "Total requests"), &["route", "status"]).expect("counter");
        let fallback_total = IntCounterVec::new(Opts::new("fallback_total", "Fallback/abstain reasons"), &["reason"]).expect("counter");
        let e2e_latency_ms = Histogram::with_opts(
            HistogramOpts::new("e2e_latency_ms", "End-to-end latency (ms)")
                .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0, 89.0]),
        )
        .expect("histogram");
        registry.register(Box::new(requests_total.clone())).expect("register");
        registry.register(Box::new(fallback_total.clone())).expect("register");
        registry.register(Box::new(e2e_latency_ms.clone())).expect("register");
        Self { cfg, registry, requests_total, fallback_total, e2e_latency_ms }
    }
}

fn request_corr_id(headers: &HeaderMap) -> String {
    headers
        .get("x-corr-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub fn app(cfg: StubConfig) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route(SCORE_ROUTE, post(score))
        .with_state(AppState::new(cfg))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn metrics(State(state): State<AppState>) -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.registry.gather(), &mut buffer) {
        tracing::error!(target: "stub", "metrics encoding failed: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    ([("content-type", encoder.format_type().to_string())], buffer).into_response()
}

#[derive(serde::Serialize)]
struct ScoreResponse {
    decision: Decision,
    conf: f64,
    corr_id: String,
    reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    spread_bps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

async fn score(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let req = match payload.map_err(|e| e.body_text()).and_then(|Json(req)| req.validate().map(|_| req).map_err(|e| e.to_string())) {
        Ok(req) => req,
        Err(detail) => {
            tracing::debug!(target: "stub", "rejected score request: {}", detail);
            state.requests_total.with_label_values(&[SCORE_ROUTE, "invalid"]).inc();
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({"detail": detail}))).into_response();
        }
    };
    let corr_id = request_corr_id(&headers);

    let now_ns = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as i128).unwrap_or(0);
    let age_ms = event_age_ms(now_ns, req.ts_ns);
    tracing::debug!(target: "stub", symbol = %req.symbol, age_ms, freshness_ms = req.freshness_ms, "score request");
    if age_ms > req.freshness_ms {
        state.fallback_total.with_label_values(&["stale_features"]).inc();
        state.requests_total.with_label_values(&[SCORE_ROUTE, Decision::Abstain.as_label()]).inc();
        state.e2e_latency_ms.observe(start.elapsed().as_secs_f64() * 1000.0);
        let body = ScoreResponse {
            decision: Decision::Abstain,
            conf: 0.0,
            corr_id,
            reason: "stale_event",
            spread_bps: None,
            latency_ms: None,
        };
        return Json(body).into_response();
    }

    let (decision, conf, reason) = decide(state.cfg.spread_bps, state.cfg.prob_trade);
    state.requests_total.with_label_values(&[SCORE_ROUTE, decision.as_label()]).inc();
    let e2e_ms = start.elapsed().as_secs_f64() * 1000.0;
    state.e2e_latency_ms.observe(e2e_ms);
    let body = ScoreResponse {
        decision,
        conf,
        corr_id,
        reason,
        spread_bps: Some(state.cfg.spread_bps),
        latency_ms: Some(e2e_ms as u64),
    };
    Json(body).into_response()
}
