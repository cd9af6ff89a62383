use scoreload_core::checks::{evaluate, is_truthy, Observed, HAS_DECISION, STATUS_IS_200};
use serde_json::json;

fn observed(status: u16, body: &str) -> Observed {
    Observed::from_parts(status, body.as_bytes())
}

#[test]
fn healthy_response_passes_both() {
    let [status, decision] = evaluate(&observed(200, r#"{"decision":"TRADE","conf":0.8}"#));
    assert_eq!(status.name, STATUS_IS_200);
    assert!(status.passed);
    assert_eq!(decision.name, HAS_DECISION);
    assert!(decision.passed);
}

#[test]
fn checks_are_independent() {
    let [status, decision] = evaluate(&observed(200, r#"{"conf":0.8}"#));
    assert!(status.passed);
    assert!(!decision.passed);

    let [status, decision] = evaluate(&observed(503, r#"{"decision":"ABSTAIN"}"#));
    assert!(!status.passed);
    assert!(decision.passed);
}

#[test]
fn non_json_body_fails_decision_only() {
    let [status, decision] = evaluate(&observed(200, "<html>oops</html>"));
    assert!(status.passed);
    assert!(!decision.passed);
}

#[test]
fn missing_response_fails_everything() {
    let results = evaluate(&Observed::default());
    assert!(results.iter().all(|r| !r.passed));
}

#[test]
fn status_must_be_exactly_200() {
    let [status, _] = evaluate(&observed(201, r#"{"decision":"TRADE"}"#));
    assert!(!status.passed);
}

#[test]
fn truthiness_follows_javascript() {
    for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
        assert!(!is_truthy(&falsy), "{falsy} should be falsy");
    }
    for truthy in [json!(true), json!(1), json!(-0.5), json!("NO_TRADE"), json!([]), json!({})] {
        assert!(is_truthy(&truthy), "{truthy} should be truthy");
    }
    let [_, decision] = evaluate(&observed(200, r#"{"decision":""}"#));
    assert!(!decision.passed);
    let [_, decision] = evaluate(&observed(200, r#"["decision"]"#));
    assert!(!decision.passed);
}
