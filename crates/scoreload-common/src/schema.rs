use serde::{Deserialize, Serialize};

use crate::{Result, ScoreLoadError};

pub const MIN_FEATURES: usize = 8;
pub const MAX_FEATURES: usize = 64;

/// Body of `POST /v1/score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub symbol: String,
    pub ts_ns: i64,
    pub features: Vec<f64>,
    #[serde(default)]
    pub freshness_ms: i64,
}

impl ScoreRequest {
    /// The fixed request every virtual user sends.
    pub fn sample() -> Self {
        Self {
            symbol: "BTC".into(),
            ts_ns: 1,
            features: vec![0.1, 0.2, 0.0, 0.3, 0.1, 0.0, 0.2, 0.1],
            freshness_ms: 10,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Input rules enforced by the scoring service.
    pub fn validate(&self) -> Result<()> {
        let symbol_ok = (1..=15).contains(&self.symbol.len())
            && self.symbol.chars().all(|c| c.is_ascii_uppercase() || c == '.');
        if !symbol_ok {
            return Err(ScoreLoadError::InvalidRequest(format!("symbol `{}` must match ^[A-Z.]{{1,15}}$", self.symbol)));
        }
        if !(MIN_FEATURES..=MAX_FEATURES).contains(&self.features.len()) {
            return Err(ScoreLoadError::InvalidRequest(format!(
                "features must have {}..={} values, got {}",
                MIN_FEATURES, MAX_FEATURES, self.features.len()
            )));
        }
        Ok(())
    }
}
