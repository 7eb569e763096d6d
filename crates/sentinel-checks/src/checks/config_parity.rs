use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus};
use serde_json::{json, Value};

const ID: &str = "S7-config";

/// The expected envelope is intentionally minimal: presence checks for the
/// keys operators rely on dashboards agreeing with, not a full value diff.
const EXPECTED_KEYS: &[&str] = &["version", "feature_flags", "storage_backend"];

/// S7: compares a snapshot of the target's self-reported configuration
/// against an expected envelope.
pub struct ConfigParityCheck;

#[async_trait]
impl Check for ConfigParityCheck {
    fn id(&self) -> &'static str {
        ID
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = std::time::Instant::now();
        let Ok(api_key) = ctx.credentials.require_api_key() else {
            return crate::common::credential_missing_result(ID);
        };
        let header = (ctx.credentials.header_name.as_str(), api_key);

        let resp = match ctx
            .client
            .timed_get_with_header(&ctx.url("/admin/config"), ctx.timeout, Some(header))
            .await
        {
            Ok(resp) => resp,
            Err(err) => return crate::common::transport_error_result(ID, err),
        };

        if !resp.is_success() {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                start.elapsed().as_millis() as u64,
                format!("/admin/config returned {}", resp.status),
                json!({ "status": resp.status.as_u16() }),
            );
        }

        let body: Value = match resp.parse_json() {
            Ok(v) => v,
            Err(e) => {
                return crate::common::internal_error_result(ID, "JsonParseError", e.to_string())
            }
        };

        let missing: Vec<&str> = EXPECTED_KEYS
            .iter()
            .filter(|k| body.get(**k).is_none())
            .copied()
            .collect();

        let latency_ms = start.elapsed().as_millis() as u64;
        if missing.is_empty() {
            CheckResult::new(
                ID,
                CheckStatus::Pass,
                latency_ms,
                "configuration envelope matches expectations",
                json!({ "body": body }),
            )
        } else {
            CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("configuration missing expected keys: {}", missing.join(", ")),
                json!({ "body": body, "missing_keys": missing }),
            )
        }
    }
}
