// src/ledger/envelope.rs
//
// Normalizes every invocation outcome into one response shape. Each tool
// call terminates in exactly one of these, including every failure path.

use serde_json::{json, Value};

use crate::ledger::models::{BridgeError, NativeValue, SubmitOutcome};

// Attach a text content block for MCP clients while keeping the structured
// fields intact for JSON-consuming callers.
fn with_content(text: String, mut payload: Value) -> Value {
    if let Value::Object(map) = &mut payload {
        map.insert("content".into(), json!([{ "type": "text", "text": text }]));
    }
    payload
}

/// Read path: the decoded projected result is the final answer.
pub fn read_success(result: Option<&NativeValue>) -> Value {
    let rendered = result.map(NativeValue::to_display_json).unwrap_or(Value::Null);
    let text = match &rendered {
        Value::Null => "Call completed (no return value)".to_string(),
        other => format!("Result: {}", other),
    };
    with_content(
        text,
        json!({
            "status": "success",
            "classification": "read",
            "result": rendered
        }),
    )
}

/// Mutation path: decoded result plus the relay's submission outcome.
pub fn mutation_success(result: Option<&NativeValue>, outcome: &SubmitOutcome) -> Value {
    let rendered = result.map(NativeValue::to_display_json).unwrap_or(Value::Null);
    let text = format!("Submitted: {} ({})", outcome.hash, outcome.status);
    with_content(
        text,
        json!({
            "status": "success",
            "classification": "mutation",
            "result": rendered,
            "submission": outcome
        }),
    )
}

/// Any failure below the tool-handler boundary ends up here.
pub fn failure(err: &BridgeError) -> Value {
    let mut error = json!({
        "kind": err.kind(),
        "message": err.to_string()
    });
    if let BridgeError::Simulation {
        diagnostic: Some(diag),
        ..
    } = err
    {
        error["detail"] = diag.clone();
    }
    with_content(
        format!("Error: {}", err),
        json!({
            "status": "error",
            "isError": true,
            "error": error
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_envelope_carries_the_decoded_result() {
        let env = read_success(Some(&NativeValue::I128("500".into())));
        assert_eq!(env["status"], "success");
        assert_eq!(env["classification"], "read");
        assert_eq!(env["result"], "500");
        assert!(env.get("submission").is_none());
        assert!(env["content"][0]["text"].as_str().unwrap().contains("500"));
    }

    #[test]
    fn mutation_envelope_includes_submission_outcome() {
        let outcome = SubmitOutcome {
            hash: "abc123".into(),
            status: "applied".into(),
            contract_id: None,
            detail: None,
        };
        let env = mutation_success(None, &outcome);
        assert_eq!(env["classification"], "mutation");
        assert_eq!(env["submission"]["hash"], "abc123");
        assert_eq!(env["result"], Value::Null);
    }

    #[test]
    fn failure_envelope_is_uniform_and_tagged() {
        let env = failure(&BridgeError::NoWallet);
        assert_eq!(env["status"], "error");
        assert_eq!(env["isError"], true);
        assert_eq!(env["error"]["kind"], "no_wallet");

        let sim = BridgeError::Simulation {
            message: "trap".into(),
            diagnostic: Some(json!({"events": ["boom"]})),
        };
        let env = failure(&sim);
        assert_eq!(env["error"]["detail"]["events"][0], "boom");
    }
}
