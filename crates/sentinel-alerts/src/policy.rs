//! Failure-streak alert policy (C7): tracks a `FailureStreak` per check id
//! and decides when to emit a failure or recovery `Alert`.

use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use sentinel_types::{Alert, AlertKind, CheckResult, CheckStatus, FailureStreak, Severity};
use sha2::{Digest, Sha256};

/// Checks whose failure is always treated as critical regardless of the
/// general fail→warning mapping.
const CRITICAL_CHECK_IDS: &[&str] = &["S1-probes", "S6-backup"];

pub struct AlertPolicy {
    streaks: HashMap<String, FailureStreak>,
    threshold: u32,
    cooldown: ChronoDuration,
}

impl AlertPolicy {
    pub fn new(threshold: u32, cooldown_minutes: i64) -> Self {
        Self {
            streaks: HashMap::new(),
            threshold: threshold.max(1),
            cooldown: ChronoDuration::minutes(cooldown_minutes.max(0)),
        }
    }

    /// Feeds one check result through the policy, returning an `Alert` if
    /// this result should notify.
    pub fn record(&mut self, result: &CheckResult) -> Option<Alert> {
        let streak = self
            .streaks
            .entry(result.check_id.clone())
            .or_insert_with(|| FailureStreak::new(result.check_id.clone()));

        if result.status.counts_as_failure() {
            if streak.consecutive_fails == 0 {
                streak.first_failed_at = Some(result.timestamp);
            }
            streak.consecutive_fails += 1;

            if streak.consecutive_fails < self.threshold {
                return None;
            }

            let fingerprint = fingerprint(&result.check_id, result.status, result.timestamp);
            let is_initial = streak.consecutive_fails == self.threshold;
            let cooldown_elapsed = streak
                .last_alerted_at
                .map(|last| result.timestamp.signed_duration_since(last) >= self.cooldown)
                .unwrap_or(true);
            let same_fingerprint = streak.last_alert_fingerprint.as_deref() == Some(fingerprint.as_str());

            if !is_initial && (!cooldown_elapsed || same_fingerprint) {
                return None;
            }

            streak.last_alerted_at = Some(result.timestamp);
            streak.last_alert_fingerprint = Some(fingerprint.clone());

            Some(Alert {
                kind: AlertKind::Failure,
                check_id: result.check_id.clone(),
                severity: severity_for(&result.check_id, result.status),
                status: result.status.as_str().to_string(),
                consecutive_fails: streak.consecutive_fails,
                first_failed_at: streak.first_failed_at,
                last_ts: result.timestamp,
                message: result.message.clone(),
                details: result.details.clone(),
                fingerprint,
            })
        } else {
            let was_alerting = streak.consecutive_fails >= self.threshold;
            let prior_fails = streak.consecutive_fails;
            let first_failed_at = streak.first_failed_at;
            streak.consecutive_fails = 0;
            streak.first_failed_at = None;
            streak.last_alert_fingerprint = None;

            if !was_alerting {
                return None;
            }

            let fingerprint = fingerprint(&result.check_id, result.status, result.timestamp);
            streak.last_alerted_at = Some(result.timestamp);
            Some(Alert {
                kind: AlertKind::Recovery,
                check_id: result.check_id.clone(),
                severity: Severity::Info,
                status: result.status.as_str().to_string(),
                consecutive_fails: prior_fails,
                first_failed_at,
                last_ts: result.timestamp,
                message: result.message.clone(),
                details: result.details.clone(),
                fingerprint,
            })
        }
    }

    pub fn streak_for(&self, check_id: &str) -> Option<&FailureStreak> {
        self.streaks.get(check_id)
    }
}

fn severity_for(check_id: &str, status: CheckStatus) -> Severity {
    match status {
        CheckStatus::Error => Severity::Critical,
        CheckStatus::Fail if CRITICAL_CHECK_IDS.contains(&check_id) => Severity::Critical,
        CheckStatus::Fail => Severity::Warning,
        CheckStatus::Warn => Severity::Info,
        CheckStatus::Pass => Severity::Info,
    }
}

/// Hash of `(check_id, status, bucketed_hour)` so repeated alerts within the
/// same hour for the same status collapse to one fingerprint.
fn fingerprint(check_id: &str, status: CheckStatus, ts: DateTime<Utc>) -> String {
    let bucket = ts
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts);
    let mut hasher = Sha256::new();
    hasher.update(check_id.as_bytes());
    hasher.update(status.as_str().as_bytes());
    hasher.update(bucket.to_rfc3339().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_at(check_id: &str, status: CheckStatus, ts: DateTime<Utc>) -> CheckResult {
        let mut r = CheckResult::new(check_id, status, 1, "x", serde_json::Value::Null);
        r.timestamp = ts;
        r
    }

    #[test]
    fn alert_fires_exactly_at_threshold() {
        let mut policy = AlertPolicy::new(3, 15);
        let now = Utc::now();
        assert!(policy.record(&result_at("S2-recall", CheckStatus::Fail, now)).is_none());
        assert!(policy.record(&result_at("S2-recall", CheckStatus::Fail, now)).is_none());
        let alert = policy.record(&result_at("S2-recall", CheckStatus::Fail, now));
        assert!(alert.is_some());
        assert_eq!(alert.unwrap().consecutive_fails, 3);
    }

    #[test]
    fn cooldown_suppresses_repeat_alerts() {
        let mut policy = AlertPolicy::new(1, 15);
        let t0 = Utc::now();
        assert!(policy.record(&result_at("S2-recall", CheckStatus::Fail, t0)).is_some());
        let t1 = t0 + ChronoDuration::minutes(5);
        assert!(policy.record(&result_at("S2-recall", CheckStatus::Fail, t1)).is_none());
        let t2 = t0 + ChronoDuration::minutes(20);
        assert!(policy.record(&result_at("S2-recall", CheckStatus::Fail, t2)).is_some());
    }

    #[test]
    fn recovery_fires_once_after_alerting_streak() {
        let mut policy = AlertPolicy::new(1, 15);
        let t0 = Utc::now();
        policy.record(&result_at("S2-recall", CheckStatus::Fail, t0));
        let recovery = policy.record(&result_at("S2-recall", CheckStatus::Pass, t0));
        assert!(recovery.is_some());
        assert_eq!(recovery.unwrap().kind, AlertKind::Recovery);

        let none = policy.record(&result_at("S2-recall", CheckStatus::Pass, t0));
        assert!(none.is_none());
    }

    #[test]
    fn no_recovery_notification_below_threshold() {
        let mut policy = AlertPolicy::new(3, 15);
        let t0 = Utc::now();
        policy.record(&result_at("S2-recall", CheckStatus::Fail, t0));
        let recovery = policy.record(&result_at("S2-recall", CheckStatus::Pass, t0));
        assert!(recovery.is_none());
    }

    #[test]
    fn critical_checks_escalate_fail_severity() {
        let mut policy = AlertPolicy::new(1, 15);
        let t0 = Utc::now();
        let alert = policy.record(&result_at("S1-probes", CheckStatus::Fail, t0)).unwrap();
        assert_eq!(alert.severity, Severity::Critical);
    }
}
