use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::checks::{CheckResult, CHECKS};

/// Check outcomes shared by every virtual user of a run.
#[derive(Debug, Default)]
pub struct CheckTally {
    iterations: AtomicU64,
    transport_errors: AtomicU64,
    passes: [AtomicU64; 2],
    fails: [AtomicU64; 2],
}

impl CheckTally {
    pub fn new() -> Self { Self::default() }

    pub fn record(&self, results: &[CheckResult], transport_error: bool) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        scoreload_obs::record_iteration();
        if transport_error {
            self.transport_errors.fetch_add(1, Ordering::Relaxed);
            scoreload_obs::record_transport_error();
        }
        for result in results {
            let Some(idx) = CHECKS.iter().position(|n| *n == result.name) else { continue };
            let slot = if result.passed { &self.passes[idx] } else { &self.fails[idx] };
            slot.fetch_add(1, Ordering::Relaxed);
            scoreload_obs::record_check(result.name, result.passed);
        }
    }

    pub fn iterations(&self) -> u64 { self.iterations.load(Ordering::Relaxed) }

    pub fn summary(&self, elapsed: Duration) -> RunSummary {
        let checks = CHECKS
            .iter()
            .enumerate()
            .map(|(i, &name)| CheckSummary {
                name,
                passes: self.passes[i].load(Ordering::Relaxed),
                fails: self.fails[i].load(Ordering::Relaxed),
            })
            .collect();
        RunSummary {
            iterations: self.iterations(),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            checks,
            elapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub name: &'static str,
    pub passes: u64,
    pub fails: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub iterations: u64,
    pub transport_errors: u64,
    pub checks: Vec<CheckSummary>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn check(&self, name: &str) -> Option<&CheckSummary> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Fraction of all recorded checks that passed; 0 when nothing ran.
    pub fn pass_rate(&self) -> f64 {
        let (passes, total) = self.checks.iter().fold((0, 0), |(p, t), c| (p + c.passes, t + c.passes + c.fails));
        if total == 0 { 0.0 } else { passes as f64 / total as f64 }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.checks {
            let mark = if c.fails == 0 { "✓" } else { "✗" };
            writeln!(f, "  {} {:<14} {} passed / {} failed", mark, c.name, c.passes, c.fails)?;
        }
        writeln!(f, "  checks.........: {:.2}%", self.pass_rate() * 100.0)?;
        writeln!(f, "  iterations.....: {}", self.iterations)?;
        writeln!(f, "  transport errs.: {}", self.transport_errors)?;
        write!(f, "  elapsed........: {:.2}s", self.elapsed.as_secs_f64())
    }
}
