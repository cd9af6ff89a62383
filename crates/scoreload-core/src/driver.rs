use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use scoreload_common::config::LoadConfig;
use scoreload_common::duration::format_duration;
use scoreload_common::{Result, ScoreLoadError, ScoreRequest};

use crate::checks::{evaluate, CheckResult, Observed};
use crate::tally::{CheckTally, RunSummary};

/// Outcome of a single request/check/sleep cycle.
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub status: Option<u16>,
    pub checks: [CheckResult; 2],
    pub latency: Duration,
    pub transport_error: Option<String>,
}

impl IterationReport {
    pub fn passed(&self, check: &str) -> bool {
        self.checks.iter().any(|c| c.name == check && c.passed)
    }
}

/// Sends the fixed score request and records check results. Cheap to clone;
/// every virtual user of a run holds one.
#[derive(Clone)]
pub struct Driver {
    client: reqwest::Client,
    url: String,
    body: Vec<u8>,
    sleep: Duration,
    tally: Arc<CheckTally>,
}

impl Driver {
    pub fn new(cfg: &LoadConfig, tally: Arc<CheckTally>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ScoreLoadError::Client(e.to_string()))?;
        Ok(Self {
            client,
            url: cfg.url.clone(),
            body: ScoreRequest::sample().to_json()?,
            sleep: cfg.sleep,
            tally,
        })
    }

    pub async fn run_iteration(&self) -> IterationReport {
        let start = Instant::now();
        let (observed, transport_error) = match self.send().await {
            Ok(observed) => (observed, None),
            Err(e) => {
                tracing::warn!(target: "driver", url = %self.url, "request failed: {}", e);
                (Observed::default(), Some(e.to_string()))
            }
        };
        let latency = start.elapsed();
        scoreload_obs::observe_request(latency.as_secs_f64());

        let checks = evaluate(&observed);
        self.tally.record(&checks, transport_error.is_some());
        tracing::debug!(
            target: "driver",
            status = ?observed.status,
            latency_ms = latency.as_millis() as u64,
            status_ok = checks[0].passed,
            has_decision = checks[1].passed,
            "iteration"
        );

        tokio::time::sleep(self.sleep).await;
        IterationReport { status: observed.status, checks, latency, transport_error }
    }

    async fn send(&self) -> reqwest::Result<Observed> {
        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(self.body.clone())
            .send()
            .await?;
        let status = resp.status().as_u16();
        match resp.bytes().await {
            Ok(bytes) => Ok(Observed::from_parts(status, &bytes)),
            Err(e) => {
                tracing::warn!(target: "driver", status, "reading body failed: {}", e);
                Ok(Observed { status: Some(status), body: None })
            }
        }
    }

    /// Loops iterations until `deadline`, `stop`, or the iteration budget.
    /// The condition is checked before each iteration, so one in flight always completes.
    pub async fn run_vu(&self, vu: usize, deadline: Instant, budget: Option<u64>, stop: &AtomicBool) -> u64 {
        let mut done = 0;
        while Instant::now() < deadline && !stop.load(Ordering::Relaxed) && budget.map_or(true, |b| done < b) {
            self.run_iteration().await;
            done += 1;
        }
        tracing::debug!(target: "driver", vu, iterations = done, "virtual user finished");
        done
    }
}

/// Runs `cfg.vus` virtual users concurrently for `cfg.duration` and returns the tally.
pub async fn run(cfg: &LoadConfig, stop: Arc<AtomicBool>) -> Result<RunSummary> {
    cfg.validate()?;
    scoreload_obs::init();
    let tally = Arc::new(CheckTally::new());
    let driver = Driver::new(cfg, tally.clone())?;
    let start = Instant::now();
    let deadline = start.checked_add(cfg.duration).ok_or_else(|| ScoreLoadError::InvalidValue {
        key: "duration".into(),
        value: format_duration(cfg.duration),
    })?;
    tracing::info!(
        target: "driver",
        url = %cfg.url,
        vus = cfg.vus,
        duration = %format_duration(cfg.duration),
        "starting run"
    );

    let mut tasks = Vec::with_capacity(cfg.vus);
    for vu in 0..cfg.vus {
        let d = driver.clone();
        let s = stop.clone();
        let budget = cfg.iterations;
        tasks.push(tokio::spawn(async move { d.run_vu(vu, deadline, budget, &s).await }));
    }
    for t in tasks {
        if let Err(e) = t.await {
            tracing::error!(target: "driver", "virtual user aborted: {}", e);
        }
    }

    let summary = tally.summary(start.elapsed());
    tracing::info!(
        target: "driver",
        iterations = summary.iterations,
        transport_errors = summary.transport_errors,
        pass_rate = summary.pass_rate(),
        "run finished"
    );
    Ok(summary)
}
