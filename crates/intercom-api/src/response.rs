// Validated view of a single device HTTP response.
//
// Every device endpoint answers with `{"success": bool, "result": {...}}`.
// This module turns the raw (status, body) pair into a `DeviceResponse`
// that callers can inspect without ever handling a decode error.

use serde_json::{Map, Value};
use thiserror::Error;

/// HTTP 200.
pub const STATUS_OK: u16 = 200;
/// Forced status for bodies that are not valid JSON.
pub const STATUS_INTERNAL_ERROR: u16 = 500;
/// Status recorded when no HTTP exchange completed at all.
pub const STATUS_TRANSPORT_FAILURE: u16 = 0;

/// Why a [`DeviceResponse`] carries no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseFailure {
    #[error("no response from device")]
    Transport,

    #[error("device answered HTTP {0}")]
    Http(u16),

    #[error("response body is not valid JSON")]
    Decode,

    #[error("device reported failure")]
    Rejected,

    #[error("response has no result payload")]
    MissingResult,
}

/// One validated device response.
///
/// `has_result()` holds only when the exchange returned HTTP 200, the body
/// decoded as JSON, the envelope's `success` flag was `true`, and a `result`
/// object was present.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceResponse {
    status: u16,
    result: Option<Map<String, Value>>,
    failure: Option<ResponseFailure>,
}

impl DeviceResponse {
    /// Validate a completed HTTP exchange.
    pub fn from_parts(status: u16, body: &[u8]) -> Self {
        if status != STATUS_OK {
            return Self::failed(status, ResponseFailure::Http(status));
        }

        let Ok(decoded) = serde_json::from_slice::<Value>(body) else {
            return Self::failed(STATUS_INTERNAL_ERROR, ResponseFailure::Decode);
        };

        // Only an object can carry the envelope; anything else has no success flag.
        let Value::Object(mut envelope) = decoded else {
            return Self::failed(status, ResponseFailure::Rejected);
        };

        if envelope.get("success").and_then(Value::as_bool) != Some(true) {
            return Self::failed(status, ResponseFailure::Rejected);
        }

        match envelope.remove("result") {
            Some(Value::Object(result)) => Self {
                status,
                result: Some(result),
                failure: None,
            },
            _ => Self::failed(status, ResponseFailure::MissingResult),
        }
    }

    /// A response for a request that never completed.
    pub fn transport_failure() -> Self {
        Self::failed(STATUS_TRANSPORT_FAILURE, ResponseFailure::Transport)
    }

    fn failed(status: u16, failure: ResponseFailure) -> Self {
        Self {
            status,
            result: None,
            failure: Some(failure),
        }
    }

    /// HTTP status, forced to 500 on decode failure and 0 on transport failure.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn has_result(&self) -> bool {
        self.status == STATUS_OK && self.result.is_some()
    }

    /// Whether the call should be treated as successful by callers.
    pub fn is_success(&self) -> bool {
        self.has_result()
    }

    /// The reason this response failed, if it did.
    pub fn failure(&self) -> Option<&ResponseFailure> {
        self.failure.as_ref()
    }

    pub fn result(&self) -> Option<&Map<String, Value>> {
        if self.has_result() {
            self.result.as_ref()
        } else {
            None
        }
    }

    /// Look up `key` in the result payload.
    ///
    /// Returns `None` both for a failed response and for a missing key.
    pub fn result_value(&self, key: &str) -> Option<&Value> {
        self.result()?.get(key)
    }

    pub fn into_result(self) -> Option<Map<String, Value>> {
        if self.has_result() { self.result } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: &Value) -> DeviceResponse {
        DeviceResponse::from_parts(STATUS_OK, body.to_string().as_bytes())
    }

    #[test]
    fn non_ok_status_has_no_result() {
        let body = json!({"success": true, "result": {"a": 1}}).to_string();
        for status in [201, 401, 404, 500, 503] {
            let resp = DeviceResponse::from_parts(status, body.as_bytes());
            assert!(!resp.has_result(), "status {status}");
            assert_eq!(resp.status_code(), status);
            assert_eq!(resp.failure(), Some(&ResponseFailure::Http(status)));
        }
    }

    #[test]
    fn malformed_json_forces_internal_error() {
        let resp = DeviceResponse::from_parts(STATUS_OK, b"<html>oops</html>");
        assert!(!resp.has_result());
        assert_eq!(resp.status_code(), STATUS_INTERNAL_ERROR);
        assert_eq!(resp.failure(), Some(&ResponseFailure::Decode));
    }

    #[test]
    fn explicit_failure_flag_wins_over_http_ok() {
        let resp = ok(&json!({"success": false, "result": {"a": 1}}));
        assert!(!resp.has_result());
        assert_eq!(resp.status_code(), STATUS_OK);
        assert_eq!(resp.failure(), Some(&ResponseFailure::Rejected));
    }

    #[test]
    fn missing_success_flag_is_failure() {
        let resp = ok(&json!({"result": {"a": 1}}));
        assert!(!resp.has_result());
        assert_eq!(resp.failure(), Some(&ResponseFailure::Rejected));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let resp = DeviceResponse::from_parts(STATUS_OK, br#"[true, {"ports": []}]"#);
        assert!(!resp.has_result());
        assert_eq!(resp.status_code(), STATUS_OK);
        assert_eq!(resp.failure(), Some(&ResponseFailure::Rejected));

        let resp = DeviceResponse::from_parts(STATUS_OK, b"true");
        assert_eq!(resp.failure(), Some(&ResponseFailure::Rejected));
    }

    #[test]
    fn non_boolean_success_flag_is_rejected() {
        for flag in [json!("true"), json!("false"), json!(1), json!(null)] {
            let resp = ok(&json!({"success": flag, "result": {}}));
            assert!(!resp.has_result(), "success = {flag}");
            assert_eq!(resp.status_code(), STATUS_OK);
            assert_eq!(resp.failure(), Some(&ResponseFailure::Rejected));
        }
    }

    #[test]
    fn null_result_is_missing() {
        let resp = ok(&json!({"success": true, "result": null}));
        assert!(!resp.has_result());
        assert_eq!(resp.failure(), Some(&ResponseFailure::MissingResult));
        assert!(ok(&json!({"success": true})).failure().is_some());
    }

    #[test]
    fn result_value_lookup() {
        let resp = ok(&json!({"success": true, "result": {"id": 42}}));
        assert!(resp.is_success());
        assert_eq!(resp.result_value("id"), Some(&json!(42)));
        assert_eq!(resp.result_value("missing"), None);
    }

    #[test]
    fn result_value_on_failed_response_is_none() {
        assert_eq!(DeviceResponse::transport_failure().result_value("id"), None);
        assert_eq!(
            DeviceResponse::transport_failure().status_code(),
            STATUS_TRANSPORT_FAILURE
        );
    }

    #[test]
    fn empty_result_object_counts() {
        let resp = ok(&json!({"success": true, "result": {}}));
        assert!(resp.has_result());
        assert!(resp.into_result().is_some_and(|r| r.is_empty()));
    }
}
