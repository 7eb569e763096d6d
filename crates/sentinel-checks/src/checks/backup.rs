use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus};
use serde_json::{json, Value};

const ID: &str = "S6-backup";
const REQUIRED_SCHEMA_FIELDS: &[&str] = &["backup_id", "created_at", "schema_version", "size_bytes"];
const MAX_BACKUP_AGE_HOURS: i64 = 48;

/// S6: a recent backup artifact exists and matches the expected schema.
/// Severity-critical.
pub struct BackupParityCheck;

#[async_trait]
impl Check for BackupParityCheck {
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
            .timed_get_with_header(&ctx.url("/admin/backups/latest"), ctx.timeout, Some(header))
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
                format!("/admin/backups/latest returned {}", resp.status),
                json!({ "status": resp.status.as_u16() }),
            );
        }

        let body: Value = match resp.parse_json() {
            Ok(v) => v,
            Err(e) => {
                return crate::common::internal_error_result(ID, "JsonParseError", e.to_string())
            }
        };

        let missing: Vec<&str> = REQUIRED_SCHEMA_FIELDS
            .iter()
            .filter(|f| body.get(**f).is_none())
            .copied()
            .collect();

        let latency_ms = start.elapsed().as_millis() as u64;
        if !missing.is_empty() {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("backup artifact missing fields: {}", missing.join(", ")),
                json!({ "body": body }),
            );
        }

        let created_at = body
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok());

        match created_at {
            Some(created_at) => {
                let age_hours = chrono::Utc::now()
                    .signed_duration_since(created_at.with_timezone(&chrono::Utc))
                    .num_hours();
                if age_hours > MAX_BACKUP_AGE_HOURS {
                    CheckResult::new(
                        ID,
                        CheckStatus::Fail,
                        latency_ms,
                        format!("latest backup is {age_hours}h old, exceeds {MAX_BACKUP_AGE_HOURS}h"),
                        json!({ "body": body, "age_hours": age_hours }),
                    )
                } else {
                    CheckResult::new(
                        ID,
                        CheckStatus::Pass,
                        latency_ms,
                        "recent backup artifact matches expected schema",
                        json!({ "body": body, "age_hours": age_hours }),
                    )
                }
            }
            None => CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                "backup artifact has unparseable created_at",
                json!({ "body": body }),
            ),
        }
    }
}
