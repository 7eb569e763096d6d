use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-lifetime per-check alert-debouncing state (C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureStreak {
    pub check_id: String,
    pub consecutive_fails: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_alerted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_alert_fingerprint: Option<String>,
}

impl FailureStreak {
    pub fn new(check_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            consecutive_fails: 0,
            first_failed_at: None,
            last_alerted_at: None,
            last_alert_fingerprint: None,
        }
    }
}
