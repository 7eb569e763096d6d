use sentinel_probe::TransportError;
use sentinel_types::CheckResult;
use serde_json::json;

/// Namespace prefix for any fixture data a check stores in the target, so
/// it is idempotent and clearly distinguishable from production data.
/// Checks must never delete data outside this namespace.
pub const FIXTURE_NAMESPACE: &str = "sentinel-fixture-";

pub fn fixture_id(check_id: &str, suffix: &str) -> String {
    format!("{FIXTURE_NAMESPACE}{check_id}-{suffix}")
}

/// Maps a transport failure to an `error` result: a check that intends a
/// network probe but hits a transport error reports `error`, never `fail`.
pub fn transport_error_result(check_id: &str, err: TransportError) -> CheckResult {
    CheckResult::new(
        check_id,
        sentinel_types::CheckStatus::Error,
        0,
        format!("transport error: {}", err.kind.as_str()),
        json!({ "transport_error": err.kind.as_str(), "detail": err.message }),
    )
}

/// Maps an unexpected internal failure (serialization, panic-adjacent
/// logic bug) to an `error` result carrying the failure's type name in
/// `details`, rather than letting it propagate out of the check.
pub fn internal_error_result(check_id: &str, kind: &str, message: impl Into<String>) -> CheckResult {
    let message = message.into();
    CheckResult::new(
        check_id,
        sentinel_types::CheckStatus::Error,
        0,
        message.clone(),
        json!({ "exception_class": kind, "detail": message }),
    )
}

pub fn credential_missing_result(check_id: &str) -> CheckResult {
    CheckResult::new(
        check_id,
        sentinel_types::CheckStatus::Error,
        0,
        "credential missing",
        json!({ "reason": "credential missing" }),
    )
}
