use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::{CheckResult, CheckStatus};

pub const CYCLE_BUDGET_MESSAGE: &str = "cycle budget exceeded";
pub const CHECK_TIMEOUT_MESSAGE: &str = "check timeout";

/// Aggregated outcome of one scheduler tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
    pub total_checks: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub truncated: bool,
}

impl CycleReport {
    /// Builds a report from accumulated results, deriving the per-status
    /// counts and `duration_ms` directly from `started_at`/`finished_at` so
    /// they always agree with `results` by construction.
    pub fn build(
        cycle_id: Uuid,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        results: Vec<CheckResult>,
        truncated: bool,
    ) -> Self {
        let mut passed = 0;
        let mut warned = 0;
        let mut failed = 0;
        let mut errored = 0;
        for r in &results {
            match r.status {
                CheckStatus::Pass => passed += 1,
                CheckStatus::Warn => warned += 1,
                CheckStatus::Fail => failed += 1,
                CheckStatus::Error => errored += 1,
            }
        }
        let duration_ms = finished_at
            .signed_duration_since(started_at)
            .num_milliseconds()
            .max(0) as u64;
        Self {
            cycle_id,
            started_at,
            finished_at,
            total_checks: results.len(),
            passed,
            warned,
            failed,
            errored,
            results,
            duration_ms,
            truncated,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.passed + self.warned + self.failed + self.errored == self.total_checks
            && self.total_checks == self.results.len()
            && self.finished_at >= self.started_at
            && (!self.truncated
                || self
                    .results
                    .iter()
                    .any(|r| r.status == CheckStatus::Error && r.message.starts_with("cycle budget")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::CheckResult;

    #[test]
    fn counts_match_results() {
        let now = Utc::now();
        let results = vec![
            CheckResult::pass("S1", 5, "ok"),
            CheckResult::error("S2", CHECK_TIMEOUT_MESSAGE),
        ];
        let report = CycleReport::build(Uuid::new_v4(), now, now, results, false);
        assert_eq!(report.total_checks, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.errored, 1);
        assert!(report.is_consistent());
    }

    #[test]
    fn truncated_requires_budget_message() {
        let now = Utc::now();
        let results = vec![CheckResult::synthetic_error("S3", CYCLE_BUDGET_MESSAGE)];
        let report = CycleReport::build(Uuid::new_v4(), now, now, results, true);
        assert!(report.is_consistent());

        let results_missing = vec![CheckResult::pass("S3", 1, "ok")];
        let bad = CycleReport::build(Uuid::new_v4(), now, now, results_missing, true);
        assert!(!bad.is_consistent());
    }
}
