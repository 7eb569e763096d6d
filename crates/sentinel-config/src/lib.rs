//! Process-wide configuration, resolved once at startup into an immutable
//! value and passed explicitly to the scheduler, checks, and API rather than
//! reached for from module-level state.

use std::collections::HashSet;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use thiserror::Error;

const DEFAULT_PERIOD_SECONDS: u64 = 60;
const DEFAULT_JITTER_FRACTION: f64 = 0.2;
const DEFAULT_PER_CHECK_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CYCLE_BUDGET_MS: u64 = 45_000;
const DEFAULT_MAX_PARALLEL: usize = 4;
const DEFAULT_ALERT_THRESHOLD: u32 = 3;
const DEFAULT_ALERT_COOLDOWN_MINUTES: i64 = 15;
const DEFAULT_DB_RETENTION_DAYS: i64 = 7;
const DEFAULT_API_BIND: &str = "127.0.0.1";
const DEFAULT_API_PORT: u16 = 8787;
const DEFAULT_DB_PATH: &str = "sentinel.db";
const DEFAULT_HEADER_NAME: &str = "x-mcp-api-key";

/// A hard-coded placeholder that operators must not use for the host-check
/// shared secret; ingestion rejects it outright.
pub const PLACEHOLDER_SHARED_SECRET: &str = "changeme-shared-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address {bind}:{port}: {source}")]
    InvalidBindAddress {
        bind: String,
        port: u16,
        #[source]
        source: AddrParseError,
    },
    #[error("invalid numeric value for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Credentials used for authenticated calls to the target. `Debug` never
/// prints the raw secret values.
#[derive(Clone)]
pub struct Credentials {
    pub mcp_api_key: Option<String>,
    pub header_name: String,
    pub role_tokens: std::collections::HashMap<String, String>,
}

impl Credentials {
    pub fn require_api_key(&self) -> Result<&str, &'static str> {
        self.mcp_api_key.as_deref().ok_or("credential missing")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("mcp_api_key", &self.mcp_api_key.as_ref().map(|_| "<redacted>"))
            .field("header_name", &self.header_name)
            .field(
                "role_tokens",
                &self
                    .role_tokens
                    .keys()
                    .map(|k| (k.clone(), "<redacted>"))
                    .collect::<std::collections::HashMap<_, _>>(),
            )
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target_base_url: String,
    pub credentials: Credentials,

    pub period: Duration,
    pub jitter_fraction: f64,
    pub per_check_timeout: Duration,
    pub cycle_budget: Duration,
    pub max_parallel: usize,

    pub alert_threshold: u32,
    pub alert_cooldown_minutes: i64,
    pub webhook_url: Option<String>,
    pub chat_token: Option<String>,
    pub chat_channel_id: Option<String>,

    pub host_check_shared_secret: Option<String>,

    pub db_path: String,
    pub db_retention_days: i64,

    pub api_bind: String,
    pub api_port: u16,

    /// Empty means "all non-disabled checks are enabled".
    pub enabled_checks: HashSet<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut role_tokens = std::collections::HashMap::new();
        for role in ["reader", "admin", "agent"] {
            let key = format!("mcp_api_key_{role}").to_uppercase();
            if let Ok(value) = std::env::var(&key) {
                if !value.is_empty() {
                    role_tokens.insert(role.to_string(), value);
                }
            }
        }

        let credentials = Credentials {
            mcp_api_key: env_opt("mcp_api_key"),
            header_name: env_string("mcp_api_key_header", DEFAULT_HEADER_NAME),
            role_tokens,
        };

        let period = Duration::from_secs(env_u64("period_seconds", DEFAULT_PERIOD_SECONDS)?);
        let jitter_fraction = env_f64("jitter_fraction", DEFAULT_JITTER_FRACTION)?.clamp(0.0, 0.99);
        let per_check_timeout =
            Duration::from_millis(env_u64("per_check_timeout_ms", DEFAULT_PER_CHECK_TIMEOUT_MS)?);
        let cycle_budget = Duration::from_millis(env_u64("cycle_budget_ms", DEFAULT_CYCLE_BUDGET_MS)?);
        let max_parallel = env_u64("max_parallel", DEFAULT_MAX_PARALLEL as u64)? as usize;

        let alert_threshold = env_u64("alert_threshold", DEFAULT_ALERT_THRESHOLD as u64)? as u32;
        let alert_cooldown_minutes =
            env_u64("alert_cooldown_minutes", DEFAULT_ALERT_COOLDOWN_MINUTES as u64)? as i64;

        let db_retention_days =
            env_u64("db_retention_days", DEFAULT_DB_RETENTION_DAYS as u64)? as i64;

        let api_bind = env_string("api_bind", DEFAULT_API_BIND);
        let api_port = env_u64("api_port", DEFAULT_API_PORT as u64)? as u16;

        let enabled_checks = env_opt("enabled_checks")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            target_base_url: env_string("target_base_url", "http://127.0.0.1:8000"),
            credentials,
            period,
            jitter_fraction,
            per_check_timeout,
            cycle_budget,
            max_parallel: max_parallel.max(1),
            alert_threshold: alert_threshold.max(1),
            alert_cooldown_minutes,
            webhook_url: env_opt("webhook_url"),
            chat_token: env_opt("chat_token"),
            chat_channel_id: env_opt("chat_channel_id"),
            host_check_shared_secret: env_opt("host_check_shared_secret"),
            db_path: env_string("db_path", DEFAULT_DB_PATH),
            db_retention_days,
            api_bind,
            api_port,
            enabled_checks,
        })
    }

    /// Validated bind address; a fatal misconfiguration (exit code 1) if
    /// it does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.api_bind, self.api_port)
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddress {
                bind: self.api_bind.clone(),
                port: self.api_port,
                source,
            })
    }

    pub fn is_check_enabled(&self, id: &str) -> bool {
        self.enabled_checks.is_empty() || self.enabled_checks.contains(id)
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key.to_uppercase())
        .ok()
        .filter(|v| !v.is_empty())
}

fn env_string(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env_opt(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

fn env_f64(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env_opt(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_checks_empty_means_all_enabled() {
        let mut cfg = Config::from_env().unwrap();
        cfg.enabled_checks.clear();
        assert!(cfg.is_check_enabled("S1-probes"));
    }

    #[test]
    fn enabled_checks_allow_list_restricts() {
        let mut cfg = Config::from_env().unwrap();
        cfg.enabled_checks = ["S1-probes".to_string()].into_iter().collect();
        assert!(cfg.is_check_enabled("S1-probes"));
        assert!(!cfg.is_check_enabled("S2-recall"));
    }

    #[test]
    fn credentials_debug_never_prints_secret() {
        let creds = Credentials {
            mcp_api_key: Some("super-secret".to_string()),
            header_name: "x-mcp-api-key".to_string(),
            role_tokens: std::collections::HashMap::new(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
    }
}
