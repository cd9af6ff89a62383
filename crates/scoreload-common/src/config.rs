use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::duration::{format_duration, parse_duration};
use crate::{Result, ScoreLoadError};

pub const CONFIG_ENV: &str = "SCORELOAD_CONFIG";
pub const DEFAULT_URL: &str = "http://localhost:8080/v1/score";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub url: String,
    pub vus: usize,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub duration: Duration,
    /// Think time after every iteration.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub sleep: Duration,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
    /// Per-VU iteration budget; `None` runs until the duration expires.
    pub iterations: Option<u64>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            vus: 2,
            duration: Duration::from_secs(20),
            sleep: Duration::from_millis(200),
            timeout: Duration::from_secs(60),
            iterations: None,
        }
    }
}

impl LoadConfig {
    /// Reads the YAML file named by `SCORELOAD_CONFIG` if set, otherwise
    /// overlays `SCORELOAD_*` environment variables on the defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_yaml_file(path);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: LoadConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(url) = lookup("SCORELOAD_URL") { cfg.url = url; }
        if let Some(v) = lookup("SCORELOAD_VUS") { cfg.vus = parse_number("SCORELOAD_VUS", &v)?; }
        if let Some(v) = lookup("SCORELOAD_DURATION") { cfg.duration = parse_duration(&v)?; }
        if let Some(v) = lookup("SCORELOAD_SLEEP") { cfg.sleep = parse_duration(&v)?; }
        if let Some(v) = lookup("SCORELOAD_TIMEOUT") { cfg.timeout = parse_duration(&v)?; }
        if let Some(v) = lookup("SCORELOAD_ITERATIONS") { cfg.iterations = Some(parse_number("SCORELOAD_ITERATIONS", &v)?); }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(invalid("url", &self.url));
        }
        if self.vus == 0 {
            return Err(invalid("vus", "0"));
        }
        if Instant::now().checked_add(self.duration).is_none() {
            return Err(invalid("duration", &format_duration(self.duration)));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout", "0s"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ScoreLoadError {
    ScoreLoadError::InvalidValue { key: key.into(), value: value.into() }
}
