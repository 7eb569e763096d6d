#![cfg(test)]

use std::time::Duration;

use sentinel_config::Credentials;
use sentinel_probe::ProbeClient;
use sentinel_registry::CheckContext;

pub fn noop_context() -> CheckContext {
    CheckContext {
        target_base_url: "http://127.0.0.1:0".to_string(),
        timeout: Duration::from_millis(50),
        client: ProbeClient::new(Duration::from_millis(50)).unwrap(),
        credentials: Credentials {
            mcp_api_key: None,
            header_name: "x-mcp-api-key".to_string(),
            role_tokens: Default::default(),
        },
    }
}
