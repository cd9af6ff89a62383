use serde::Serialize;

pub const CONF_THRESH: f64 = 0.62;
pub const MAX_SPREAD_BPS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Trade,
    NoTrade,
    Abstain,
}

impl Decision {
    pub fn as_label(&self) -> &'static str {
        match self {
            Decision::Trade => "trade",
            Decision::NoTrade => "no_trade",
            Decision::Abstain => "abstain",
        }
    }
}

/// Policy applied after inference: low confidence abstains, wide spreads are refused.
pub fn decide(spread_bps: f64, prob_trade: f64) -> (Decision, f64, &'static str) {
    if prob_trade < CONF_THRESH {
        return (Decision::Abstain, prob_trade, "low_conf");
    }
    if spread_bps > MAX_SPREAD_BPS {
        return (Decision::NoTrade, prob_trade, "wide_spread");
    }
    (Decision::Trade, prob_trade, "ok")
}

/// Age of an event in whole milliseconds, clamped at zero for future timestamps.
pub fn event_age_ms(now_ns: i128, ts_ns: i64) -> i64 {
    let age = (now_ns - ts_ns as i128) / 1_000_000;
    age.clamp(0, i64::MAX as i128) as i64
}
