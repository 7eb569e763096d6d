//! Alert delivery transports: a small async trait, one implementation per
//! external service, each building its own JSON body and swallowing
//! delivery failures into a log line rather than propagating them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sentinel_types::{Alert, Severity};
use tracing::{error, warn};

use crate::escape::render_value;

#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transports decide their own minimum severity; returning `false` here
    /// means `send` is not attempted for this alert.
    fn accepts(&self, severity: Severity) -> bool;

    async fn send(&self, alert: &Alert) -> anyhow::Result<()>;
}

/// Delivers a plain JSON POST to a generic webhook endpoint. Only
/// warning-and-above alerts are sent.
pub struct WebhookTransport {
    url: String,
    client: Client,
}

impl WebhookTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("failed to build webhook client"),
        }
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn accepts(&self, severity: Severity) -> bool {
        matches!(severity, Severity::Warning | Severity::Critical)
    }

    async fn send(&self, alert: &Alert) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "kind": alert.kind,
            "check_id": alert.check_id,
            "severity": alert.severity,
            "status": alert.status,
            "consecutive_fails": alert.consecutive_fails,
            "first_failed_at": alert.first_failed_at,
            "last_ts": alert.last_ts,
            "message": alert.message,
            "details": alert.details,
            "fingerprint": alert.fingerprint,
        });
        let resp = self.client.post(&self.url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!("webhook delivery failed ({status}): {text}");
        }
        Ok(())
    }
}

/// Delivers a Markdown-formatted chat message via a generic bot-style API
/// (bot token + channel id): build body, POST, log and swallow on
/// failure. Chat accepts every severity.
pub struct ChatTransport {
    post_url: String,
    channel_id: String,
    client: Client,
}

impl ChatTransport {
    pub fn new(api_base: impl Into<String>, token: &str, channel_id: impl Into<String>) -> Self {
        Self {
            post_url: format!("{}{}/sendMessage", api_base.into(), token),
            channel_id: channel_id.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("failed to build chat client"),
        }
    }

    fn render(alert: &Alert) -> String {
        let header = match alert.kind {
            sentinel_types::AlertKind::Failure => "ALERT",
            sentinel_types::AlertKind::Recovery => "RECOVERED",
        };
        format!(
            "*{header}* `{}`\nseverity: {}\nstatus: {}\nfails: {}\nmessage: {}\ndetails: {}",
            crate::escape::escape_markdown(&alert.check_id),
            alert.severity.as_str(),
            alert.status,
            alert.consecutive_fails,
            crate::escape::escape_markdown(&alert.message),
            render_value(&alert.details),
        )
    }
}

#[async_trait]
impl Transport for ChatTransport {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn accepts(&self, _severity: Severity) -> bool {
        true
    }

    async fn send(&self, alert: &Alert) -> anyhow::Result<()> {
        let text = Self::render(alert);
        let body = serde_json::json!({
            "chat_id": self.channel_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        let resp = self.client.post(&self.post_url).json(&body).send().await?;
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!("chat delivery failed: {text}");
        }
        Ok(())
    }
}

/// Fans an alert out to every configured transport; a failing transport is
/// logged and never blocks the others.
pub async fn dispatch(transports: &[Box<dyn Transport>], alert: &Alert) {
    for transport in transports {
        if !transport.accepts(alert.severity) {
            continue;
        }
        if let Err(err) = transport.send(alert).await {
            error!("transport {} failed to deliver alert: {err}", transport.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingTransport {
        min_severity: Severity,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn accepts(&self, severity: Severity) -> bool {
            severity >= self.min_severity
        }

        async fn send(&self, _alert: &Alert) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn webhook_rejects_info_severity() {
        let transport = WebhookTransport::new("http://example.invalid/hook");
        assert!(!transport.accepts(Severity::Info));
        assert!(transport.accepts(Severity::Warning));
    }

    #[test]
    fn chat_accepts_every_severity() {
        let transport = ChatTransport::new("https://api.example.invalid/bot", "token", "chan");
        assert!(transport.accepts(Severity::Info));
        assert!(transport.accepts(Severity::Critical));
    }

    #[test]
    fn severity_ordering_drives_accepts() {
        let transport = RecordingTransport { min_severity: Severity::Warning };
        assert!(!transport.accepts(Severity::Info));
        assert!(transport.accepts(Severity::Critical));
    }
}
