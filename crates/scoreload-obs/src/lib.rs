//! Observability utilities: process-wide load driver metrics

use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static ITERATIONS: Lazy<IntCounter> = Lazy::new(|| {
    register(IntCounter::new("scoreload_iterations_total", "Completed iterations").unwrap())
});
static CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    register(IntCounterVec::new(Opts::new("scoreload_checks_total", "Check outcomes"), &["check", "outcome"]).unwrap())
});
static TRANSPORT_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    register(IntCounter::new("scoreload_transport_errors_total", "Requests that failed before a response").unwrap())
});
static REQUEST_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new("scoreload_request_duration_seconds", "Request latency as seen by a virtual user")
        .buckets(vec![0.001, 0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]);
    register(Histogram::with_opts(opts).unwrap())
});

fn register<C: prometheus::core::Collector + Clone + 'static>(collector: C) -> C {
    if let Err(e) = REGISTRY.register(Box::new(collector.clone())) {
        tracing::warn!(target: "obs", "metric registration failed: {}", e);
    }
    collector
}

pub fn init() {
    let _ = &*ITERATIONS;
    let _ = &*CHECKS;
    let _ = &*TRANSPORT_ERRORS;
    let _ = &*REQUEST_SECONDS;
}

pub fn record_iteration() { ITERATIONS.inc(); }

pub fn record_check(check: &str, passed: bool) {
    CHECKS.with_label_values(&[check, if passed { "pass" } else { "fail" }]).inc();
}

pub fn record_transport_error() { TRANSPORT_ERRORS.inc(); }

pub fn observe_request(seconds: f64) { REQUEST_SECONDS.observe(seconds); }

/// Prometheus text exposition of everything recorded so far.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(target: "obs", "metric encoding failed: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn write_to(path: impl AsRef<Path>) -> std::io::Result<()> {
    std::fs::write(path, render())
}
