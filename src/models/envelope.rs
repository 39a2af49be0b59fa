//! The IR-Flow response envelope.
//!
//! Every JSON endpoint answers with the same shape:
//!
//! ```json
//! { "success": true, "data": { ... }, "message": "...", "errorCode": null, "exception": null }
//! ```
//!
//! The client never interprets it. [`Envelope`] keeps the decoded body
//! verbatim and adds typed accessors on top.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded IR-Flow response body, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(Value);

/// Typed view of an envelope's success flag.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The server reported `"success": true`.
    Success {
        /// The `data` member, `Null` when absent.
        data: Value,
    },
    /// The server reported failure, or the body has no `success` flag.
    Failure {
        /// The `message` member, empty when absent.
        message: String,
        /// The `errorCode` member, `Null` when absent.
        error_code: Value,
    },
}

impl Envelope {
    /// Wraps a decoded JSON body.
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Returns the raw decoded body.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the envelope and returns the raw decoded body.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns the `success` flag; a missing or non-boolean flag counts as false.
    pub fn success(&self) -> bool {
        self.0
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns the `data` member.
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data").filter(|d| !d.is_null())
    }

    /// Returns the `message` member.
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// Returns the `errorCode` member.
    pub fn error_code(&self) -> Option<&Value> {
        self.0.get("errorCode").filter(|c| !c.is_null())
    }

    /// Returns the `exception` member.
    pub fn exception(&self) -> Option<&Value> {
        self.0.get("exception").filter(|e| !e.is_null())
    }

    /// Looks up a nested value by JSON pointer, e.g. `/data/alert/id`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    /// Returns a typed view of the envelope.
    pub fn outcome(&self) -> Outcome {
        if self.success() {
            Outcome::Success {
                data: self.data().cloned().unwrap_or(Value::Null),
            }
        } else {
            Outcome::Failure {
                message: self.message().unwrap_or_default().to_string(),
                error_code: self.error_code().cloned().unwrap_or(Value::Null),
            }
        }
    }
}

impl From<Value> for Envelope {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

impl From<Envelope> for Value {
    fn from(envelope: Envelope) -> Self {
        envelope.0
    }
}

impl AsRef<Value> for Envelope {
    fn as_ref(&self) -> &Value {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let envelope = Envelope::new(json!({
            "success": true,
            "data": {"alert": {"id": 42}},
            "message": "Alert found.",
            "errorCode": null,
            "exception": null,
        }));
        assert!(envelope.success());
        assert_eq!(envelope.message(), Some("Alert found."));
        assert_eq!(envelope.pointer("/data/alert/id"), Some(&json!(42)));
        assert!(envelope.error_code().is_none());
        assert!(envelope.exception().is_none());
        assert_eq!(
            envelope.outcome(),
            Outcome::Success {
                data: json!({"alert": {"id": 42}})
            }
        );
    }

    #[test]
    fn test_failure_envelope() {
        let envelope = Envelope::new(json!({
            "success": false,
            "data": null,
            "message": "Close reason not found.",
            "errorCode": 404,
            "exception": "ModelNotFoundException",
        }));
        assert!(!envelope.success());
        assert!(envelope.data().is_none());
        assert_eq!(
            envelope.outcome(),
            Outcome::Failure {
                message: "Close reason not found.".to_string(),
                error_code: json!(404),
            }
        );
    }

    #[test]
    fn test_envelope_without_success_is_failure() {
        let envelope = Envelope::new(json!({"unexpected": true}));
        assert!(!envelope.success());
        assert!(matches!(envelope.outcome(), Outcome::Failure { .. }));
    }

    #[test]
    fn test_raw_round_trip_is_verbatim() {
        let raw = json!({"success": true, "extra": [1, 2, 3]});
        let envelope: Envelope = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(envelope.as_value(), &raw);
        assert_eq!(serde_json::to_value(&envelope).unwrap(), raw);
        assert_eq!(Value::from(envelope), raw);
    }
}
