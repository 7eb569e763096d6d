use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus};
use serde_json::{json, Value};

const ID: &str = "S4-metrics";
const REQUIRED_FIELDS: &[&str] = &["services", "generated_at"];

/// S4: dashboard/analytics endpoint exposes the required top-level fields
/// and enumerates services.
pub struct MetricsWiringCheck;

#[async_trait]
impl Check for MetricsWiringCheck {
    fn id(&self) -> &'static str {
        ID
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = std::time::Instant::now();
        let resp = match ctx
            .client
            .timed_get(&ctx.url("/dashboard/analytics"), ctx.timeout)
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
                format!("/dashboard/analytics returned {}", resp.status),
                json!({ "status": resp.status.as_u16() }),
            );
        }
        let body: Value = match resp.parse_json() {
            Ok(v) => v,
            Err(e) => {
                return crate::common::internal_error_result(ID, "JsonParseError", e.to_string())
            }
        };

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .filter(|f| body.get(**f).is_none())
            .copied()
            .collect();

        let services_empty = body
            .get("services")
            .and_then(Value::as_array)
            .map(|arr| arr.is_empty())
            .unwrap_or(true);

        let latency_ms = start.elapsed().as_millis() as u64;
        if !missing.is_empty() {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("missing required fields: {}", missing.join(", ")),
                json!({ "missing_fields": missing, "body": body }),
            );
        }
        if services_empty {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                "no services enumerated in analytics payload",
                json!({ "body": body }),
            );
        }

        CheckResult::new(
            ID,
            CheckStatus::Pass,
            latency_ms,
            "metrics wiring healthy",
            json!({ "body": body }),
        )
    }
}
