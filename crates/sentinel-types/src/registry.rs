use serde::{Deserialize, Serialize};

/// Static metadata about a registered check, independent of any run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDescriptor {
    pub id: String,
    pub human_description: String,
    pub default_timeout_ms: u64,
    pub enabled: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successor_id: Option<String>,
    /// True for checks that never execute inside the core (e.g. S11); their
    /// results only ever arrive via host-check ingestion (C9).
    #[serde(default)]
    pub host_ingested: bool,
}

impl CheckDescriptor {
    pub fn new(id: impl Into<String>, human_description: impl Into<String>, default_timeout_ms: u64) -> Self {
        Self {
            id: id.into(),
            human_description: human_description.into(),
            default_timeout_ms,
            enabled: true,
            deprecated: false,
            successor_id: None,
            host_ingested: false,
        }
    }

    pub fn deprecated(mut self, successor_id: impl Into<String>) -> Self {
        self.deprecated = true;
        self.successor_id = Some(successor_id.into());
        self
    }

    pub fn host_ingested(mut self) -> Self {
        self.host_ingested = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
