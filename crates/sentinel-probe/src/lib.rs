//! Shared HTTP probe helpers: one [`reqwest::Client`] per process, timed
//! GET/POST wrappers, JSON parsing, and transport error classification.

use std::time::{Duration, Instant};

use reqwest::{header::HeaderMap, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

pub const USER_AGENT: &str = concat!("veris-sentinel/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Tls,
    Timeout,
    Reset,
    Protocol,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Reset => "reset",
            TransportErrorKind::Protocol => "protocol",
            TransportErrorKind::Other => "other",
        }
    }
}

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

/// Classifies a `reqwest::Error` the way every channel adapter in the
/// teacher codebase does ad hoc per call site, generalized into one helper.
pub fn classify_error(err: &reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        let message = err.to_string().to_lowercase();
        if message.contains("dns") || message.contains("lookup") {
            TransportErrorKind::Dns
        } else if message.contains("tls") || message.contains("certificate") {
            TransportErrorKind::Tls
        } else {
            TransportErrorKind::Connect
        }
    } else if err.is_request() || err.is_body() || err.is_decode() {
        TransportErrorKind::Protocol
    } else {
        let message = err.to_string().to_lowercase();
        if message.contains("reset") {
            TransportErrorKind::Reset
        } else {
            TransportErrorKind::Other
        }
    };
    TransportError {
        kind,
        message: err.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub elapsed_ms: u64,
}

impl ProbeResponse {
    pub fn parse_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Shared probe client, constructed once per process with a default
/// connect+read timeout, no automatic redirects, and a fixed user agent.
#[derive(Clone)]
pub struct ProbeClient {
    client: reqwest::Client,
}

impl ProbeClient {
    pub fn new(default_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(default_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub async fn timed_get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<ProbeResponse, TransportError> {
        self.timed_request(Method::GET, url, timeout, None, &[]).await
    }

    pub async fn timed_get_with_header(
        &self,
        url: &str,
        timeout: Duration,
        header: Option<(&str, &str)>,
    ) -> Result<ProbeResponse, TransportError> {
        let headers: Vec<(&str, &str)> = header.into_iter().collect();
        self.timed_request(Method::GET, url, timeout, None, &headers)
            .await
    }

    pub async fn timed_post(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<ProbeResponse, TransportError> {
        self.timed_request(Method::POST, url, timeout, Some(body), &[])
            .await
    }

    pub async fn timed_post_with_header(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
        header: Option<(&str, &str)>,
    ) -> Result<ProbeResponse, TransportError> {
        let headers: Vec<(&str, &str)> = header.into_iter().collect();
        self.timed_request(Method::POST, url, timeout, Some(body), &headers)
            .await
    }

    async fn timed_request(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
        body: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> Result<ProbeResponse, TransportError> {
        let mut req = self.client.request(method, url).timeout(timeout);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let start = Instant::now();
        let resp = req.send().await.map_err(|e| classify_error(&e))?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|e| classify_error(&e))?;
        Ok(ProbeResponse {
            status,
            headers: resp_headers,
            body: bytes.to_vec(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_client_builds_with_fixed_user_agent() {
        let client = ProbeClient::new(Duration::from_secs(1));
        assert!(client.is_ok());
    }
}
