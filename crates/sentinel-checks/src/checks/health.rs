use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus};
use serde_json::{json, Value};

/// S1: liveness and readiness probes. Pass iff both endpoints return the
/// target's OK status and readiness declares every sub-component healthy.
pub struct HealthProbesCheck;

const ID: &str = "S1-probes";

#[async_trait]
impl Check for HealthProbesCheck {
    fn id(&self) -> &'static str {
        ID
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = std::time::Instant::now();

        let live = match ctx
            .client
            .timed_get(&ctx.url("/health/live"), ctx.timeout)
            .await
        {
            Ok(resp) => resp,
            Err(err) => return crate::common::transport_error_result(ID, err),
        };
        if !live.is_success() {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                start.elapsed().as_millis() as u64,
                format!("/health/live returned {}", live.status),
                json!({ "live_status": live.status.as_u16() }),
            );
        }
        let live_body: Value = match live.parse_json() {
            Ok(v) => v,
            Err(e) => {
                return crate::common::internal_error_result(ID, "JsonParseError", e.to_string())
            }
        };
        if live_body.get("status").and_then(Value::as_str) != Some("alive") {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                start.elapsed().as_millis() as u64,
                "/health/live did not report alive",
                json!({ "live_body": live_body }),
            );
        }

        let ready = match ctx
            .client
            .timed_get(&ctx.url("/health/ready"), ctx.timeout)
            .await
        {
            Ok(resp) => resp,
            Err(err) => return crate::common::transport_error_result(ID, err),
        };
        if !ready.is_success() {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                start.elapsed().as_millis() as u64,
                format!("/health/ready returned {}", ready.status),
                json!({ "ready_status": ready.status.as_u16() }),
            );
        }
        let ready_body: Value = match ready.parse_json() {
            Ok(v) => v,
            Err(e) => {
                return crate::common::internal_error_result(ID, "JsonParseError", e.to_string())
            }
        };

        let components = ready_body
            .get("components")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let unhealthy: Vec<&String> = components
            .iter()
            .filter(|(_, v)| v.as_str() != Some("ok"))
            .map(|(k, _)| k)
            .collect();

        let latency_ms = start.elapsed().as_millis() as u64;
        if !unhealthy.is_empty() {
            let names = unhealthy
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("unhealthy sub-components: {names}"),
                json!({ "components": components }),
            );
        }

        CheckResult::new(
            ID,
            CheckStatus::Pass,
            latency_ms,
            "live and ready",
            json!({ "components": components }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::routing::get;
    use axum::{Json, Router};
    use sentinel_config::Credentials;
    use sentinel_probe::ProbeClient;

    #[test]
    fn id_is_stable() {
        assert_eq!(HealthProbesCheck.id(), "S1-probes");
    }

    async fn spawn_target(ready_body: Value) -> String {
        let app = Router::new()
            .route("/health/live", get(|| async { Json(json!({"status": "alive"})) }))
            .route("/health/ready", get(move || {
                let body = ready_body.clone();
                async move { Json(body) }
            }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn context_for(base_url: String) -> CheckContext {
        CheckContext {
            target_base_url: base_url,
            timeout: Duration::from_secs(2),
            client: ProbeClient::new(Duration::from_secs(2)).unwrap(),
            credentials: Credentials {
                mcp_api_key: None,
                header_name: "x-mcp-api-key".to_string(),
                role_tokens: Default::default(),
            },
        }
    }

    #[tokio::test]
    async fn all_components_healthy_passes() {
        let base_url = spawn_target(json!({
            "status": "ready",
            "components": {"q": "ok", "g": "ok", "r": "ok"},
        }))
        .await;
        let ctx = context_for(base_url);

        let result = HealthProbesCheck.run(&ctx).await;

        assert_eq!(result.status, CheckStatus::Pass);
        assert!(result.latency_ms > 0);
        let components = result.details.get("components").unwrap().as_object().unwrap();
        assert_eq!(components.len(), 3);
    }

    #[tokio::test]
    async fn degraded_component_fails_and_names_it() {
        let base_url = spawn_target(json!({
            "status": "ready",
            "components": {"q": "ok", "g": "down", "r": "ok"},
        }))
        .await;
        let ctx = context_for(base_url);

        let result = HealthProbesCheck.run(&ctx).await;

        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains('g'));
        let components = result.details.get("components").unwrap().as_object().unwrap();
        assert_eq!(components.len(), 3);
    }
}
