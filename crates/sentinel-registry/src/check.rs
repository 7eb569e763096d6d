use std::time::Duration;

use async_trait::async_trait;
use sentinel_config::Credentials;
use sentinel_probe::ProbeClient;
use sentinel_types::CheckResult;

/// Shared context every check body receives, composed rather than reached
/// for from module-level state: the target base URL, this
/// check's resolved timeout, the shared HTTP client, and credentials.
#[derive(Clone)]
pub struct CheckContext {
    pub target_base_url: String,
    pub timeout: Duration,
    pub client: ProbeClient,
    pub credentials: Credentials,
}

impl CheckContext {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.target_base_url.trim_end_matches('/'), path)
    }
}

/// One named probe with a typed result. Narrow,
/// single-method interface composed with a shared context rather than a
/// deep inheritance hierarchy.
#[async_trait]
pub trait Check: Send + Sync {
    fn id(&self) -> &'static str;

    /// Must never panic or propagate; unexpected failures are mapped to a
    /// `status=error` result inside the implementation.
    async fn run(&self, ctx: &CheckContext) -> CheckResult;
}
