use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus, DeprecationInfo};
use serde_json::json;

/// C10: a historical check retained in the registry for dashboard
/// stability. Always passes and carries deprecation metadata rather than
/// silently dropping the id or generating false failures.
pub struct DeprecatedCheck {
    id: &'static str,
    successor_id: &'static str,
    deprecated_since: &'static str,
    removal_planned: &'static str,
}

impl DeprecatedCheck {
    pub const fn new(
        id: &'static str,
        successor_id: &'static str,
        deprecated_since: &'static str,
        removal_planned: &'static str,
    ) -> Self {
        Self {
            id,
            successor_id,
            deprecated_since,
            removal_planned,
        }
    }
}

#[async_trait]
impl Check for DeprecatedCheck {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn run(&self, _ctx: &CheckContext) -> CheckResult {
        let info = DeprecationInfo {
            deprecated_since: self.deprecated_since.to_string(),
            removal_planned: self.removal_planned.to_string(),
            consolidated_into: self.successor_id.to_string(),
        };
        let mut result = CheckResult::new(
            self.id,
            CheckStatus::Pass,
            0,
            format!("deprecated, consolidated into {}", self.successor_id),
            json!({
                "deprecated": true,
                "deprecated_since": info.deprecated_since,
                "removal_planned": info.removal_planned,
                "consolidated_into": info.consolidated_into,
            }),
        );
        result.deprecated = Some(true);
        result.deprecation_info = Some(info);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deprecated_check_always_passes_with_metadata() {
        let check = DeprecatedCheck::new("S9-graph-intent", "S2-recall", "2025-01-01", "2026-06-01");
        let ctx = crate::test_support::noop_context();
        let result = check.run(&ctx).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.deprecated, Some(true));
        assert_eq!(
            result.deprecation_info.unwrap().consolidated_into,
            "S2-recall"
        );
    }
}
