use serde_json::Value;

pub const STATUS_IS_200: &str = "status is 200";
pub const HAS_DECISION: &str = "has decision";

/// Names of every check, in evaluation order.
pub const CHECKS: [&str; 2] = [STATUS_IS_200, HAS_DECISION];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
}

/// What a virtual user saw for one request. Both fields are `None` when the
/// request never produced a response; `body` is `None` for non-JSON bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observed {
    pub status: Option<u16>,
    pub body: Option<Value>,
}

impl Observed {
    pub fn from_parts(status: u16, bytes: &[u8]) -> Self {
        Self { status: Some(status), body: serde_json::from_slice(bytes).ok() }
    }
}

/// Evaluates every check independently; a failing check never short-circuits another.
pub fn evaluate(observed: &Observed) -> [CheckResult; 2] {
    [
        CheckResult { name: STATUS_IS_200, passed: observed.status == Some(200) },
        CheckResult { name: HAS_DECISION, passed: has_decision(observed.body.as_ref()) },
    ]
}

fn has_decision(body: Option<&Value>) -> bool {
    body.and_then(|b| b.get("decision")).map(is_truthy).unwrap_or(false)
}

/// JavaScript truthiness over JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
