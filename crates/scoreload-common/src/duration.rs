//! k6-style duration strings: `200ms`, `20s`, `1m30s`, `1.5h`.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::{Result, ScoreLoadError};

pub fn parse_duration(text: &str) -> Result<Duration> {
    let invalid = || ScoreLoadError::InvalidDuration(text.to_string());
    let mut rest = text.trim();
    if rest.is_empty() { return Err(invalid()); }
    let mut total = 0.0_f64;
    while !rest.is_empty() {
        let split = rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).ok_or_else(invalid)?;
        if split == 0 { return Err(invalid()); }
        let value: f64 = rest[..split].parse().map_err(|_| invalid())?;
        rest = &rest[split..];
        let (unit_secs, unit_len) = if rest.starts_with("ms") {
            (0.001, 2)
        } else if rest.starts_with('s') {
            (1.0, 1)
        } else if rest.starts_with('m') {
            (60.0, 1)
        } else if rest.starts_with('h') {
            (3600.0, 1)
        } else {
            return Err(invalid());
        };
        total += value * unit_secs;
        rest = &rest[unit_len..];
    }
    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}

/// Formats the way k6 prints run options, e.g. `20s` or `200ms`.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms % 1000 == 0 { format!("{}s", ms / 1000) } else { format!("{}ms", ms) }
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_duration(&text).map_err(serde::de::Error::custom)
}
