use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Upper bound, in bytes, on the serialized `details` payload of a single result.
pub const MAX_DETAILS_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Error,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Error => "error",
        }
    }

    /// `fail`/`error` count toward an alert streak; `pass`/`warn` reset it.
    pub fn counts_as_failure(self) -> bool {
        matches!(self, CheckStatus::Fail | CheckStatus::Error)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(CheckStatus::Pass),
            "warn" => Ok(CheckStatus::Warn),
            "fail" => Ok(CheckStatus::Fail),
            "error" => Ok(CheckStatus::Error),
            other => Err(format!("unknown check status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeprecationInfo {
    pub deprecated_since: String,
    pub removal_planned: String,
    pub consolidated_into: String,
}

/// Immutable outcome of a single check execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: CheckStatus,
    pub latency_ms: u64,
    pub message: String,
    #[serde(default)]
    pub details: Value,
    pub trace_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_info: Option<DeprecationInfo>,
}

impl CheckResult {
    /// Builds a result and enforces the `details` size bound by truncating
    /// the serialized payload into a single explanatory field when it would
    /// otherwise exceed [`MAX_DETAILS_BYTES`].
    pub fn new(
        check_id: impl Into<String>,
        status: CheckStatus,
        latency_ms: u64,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        let message = message.into();
        let details = bound_details(details);
        Self {
            check_id: check_id.into(),
            timestamp: Utc::now(),
            status,
            latency_ms,
            message,
            details,
            trace_id: Uuid::new_v4(),
            deprecated: None,
            deprecation_info: None,
        }
    }

    pub fn pass(check_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self::new(check_id, CheckStatus::Pass, latency_ms, message, Value::Null)
    }

    pub fn error(check_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(check_id, CheckStatus::Error, 0, message, Value::Null)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = bound_details(details);
        self
    }

    /// A synthetic error result produced by the runner rather than a check
    /// body, e.g. a check timeout or a cycle budget overrun.
    pub fn synthetic_error(check_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::error(check_id, message)
    }
}

fn bound_details(details: Value) -> Value {
    match serde_json::to_vec(&details) {
        Ok(bytes) if bytes.len() <= MAX_DETAILS_BYTES => details,
        _ => {
            let mut truncated = BTreeMap::new();
            truncated.insert(
                "truncated".to_string(),
                Value::String(format!("details exceeded {MAX_DETAILS_BYTES} bytes")),
            );
            serde_json::to_value(truncated).unwrap_or(Value::Null)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            CheckStatus::Pass,
            CheckStatus::Warn,
            CheckStatus::Fail,
            CheckStatus::Error,
        ] {
            let parsed: CheckStatus = s.as_str().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn oversized_details_are_truncated() {
        let big = Value::String("x".repeat(MAX_DETAILS_BYTES + 10));
        let result = CheckResult::new("S1", CheckStatus::Pass, 1, "ok", big);
        let bytes = serde_json::to_vec(&result.details).unwrap();
        assert!(bytes.len() < MAX_DETAILS_BYTES);
    }

    #[test]
    fn error_result_has_non_empty_message() {
        let result = CheckResult::error("S1", "boom");
        assert_eq!(result.status, CheckStatus::Error);
        assert!(!result.message.is_empty());
    }
}
