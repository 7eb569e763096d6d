use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus};
use serde_json::{json, Value};

const ID: &str = "S5-security";

struct NegativeCase {
    name: &'static str,
    path: &'static str,
    header: Option<(&'static str, &'static str)>,
    body: Option<Value>,
}

/// S5: requests that must be rejected by the target. Each case's `header`
/// overrides the configured credential for that single request so the
/// negative path is exercised without mutating shared state.
fn negative_cases() -> Vec<NegativeCase> {
    vec![
        NegativeCase {
            name: "bad_auth_header",
            path: "/tools/retrieve_context",
            header: Some(("x-mcp-api-key", "not-a-real-key")),
            body: Some(json!({ "query": "probe" })),
        },
        NegativeCase {
            name: "missing_auth_header",
            path: "/tools/retrieve_context",
            header: None,
            body: Some(json!({ "query": "probe" })),
        },
        NegativeCase {
            name: "admin_endpoint_non_admin",
            path: "/admin/users",
            header: None,
            body: None,
        },
        NegativeCase {
            name: "sql_injection_shaped_query",
            path: "/tools/retrieve_context",
            header: None,
            body: Some(json!({ "query": "'; DROP TABLE contexts; --" })),
        },
    ]
}

pub struct SecurityNegativesCheck;

#[async_trait]
impl Check for SecurityNegativesCheck {
    fn id(&self) -> &'static str {
        ID
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = std::time::Instant::now();
        let mut failures = Vec::new();
        let mut reports = Vec::new();

        for case in negative_cases() {
            let url = ctx.url(case.path);
            let header = case.header;
            let outcome = match &case.body {
                Some(body) => ctx.client.timed_post_with_header(&url, body, ctx.timeout, header).await,
                None => ctx.client.timed_get_with_header(&url, ctx.timeout, header).await,
            };

            let resp = match outcome {
                Ok(resp) => resp,
                Err(err) => return crate::common::transport_error_result(ID, err),
            };

            let rejected = matches!(resp.status.as_u16(), 400 | 401 | 403 | 422);
            if !rejected {
                failures.push(case.name);
            }
            reports.push(json!({
                "case": case.name,
                "status": resp.status.as_u16(),
                "rejected": rejected,
            }));
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        if failures.is_empty() {
            CheckResult::new(
                ID,
                CheckStatus::Pass,
                latency_ms,
                "all security negative cases rejected",
                json!({ "cases": reports }),
            )
        } else {
            CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("target accepted requests that should be rejected: {}", failures.join(", ")),
                json!({ "cases": reports }),
            )
        }
    }
}
