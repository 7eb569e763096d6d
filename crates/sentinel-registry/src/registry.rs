use std::collections::BTreeMap;

use sentinel_config::Config;
use sentinel_types::CheckDescriptor;

use crate::catalog::default_catalog;

/// Read-only after construction; lock-free reads.
#[derive(Clone)]
pub struct Registry {
    descriptors: BTreeMap<String, CheckDescriptor>,
    order: Vec<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

impl Registry {
    pub fn new(catalog: Vec<CheckDescriptor>) -> Self {
        let order = catalog.iter().map(|d| d.id.clone()).collect();
        let descriptors = catalog.into_iter().map(|d| (d.id.clone(), d)).collect();
        Self { descriptors, order }
    }

    /// Applies the `enabled_checks` allow-list from config, producing the
    /// enabled/disabled flag seen by callers. The registry's own stored
    /// `enabled` flag layers underneath: an explicitly disabled descriptor
    /// stays disabled even if named in an allow-list.
    pub fn list(&self, config: &Config) -> Vec<CheckDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.descriptors.get(id))
            .cloned()
            .map(|mut d| {
                d.enabled = d.enabled && config.is_check_enabled(&d.id);
                d
            })
            .collect()
    }

    pub fn get(&self, id: &str, config: &Config) -> Option<CheckDescriptor> {
        self.descriptors.get(id).cloned().map(|mut d| {
            d.enabled = d.enabled && config.is_check_enabled(&d.id);
            d
        })
    }

    /// Checks eligible for execution this cycle: enabled (after allow-list)
    /// OR deprecated (deprecated checks still execute, via the shim).
    pub fn enabled_ids(&self, config: &Config) -> Vec<String> {
        self.list(config)
            .into_iter()
            .filter(|d| d.enabled || d.deprecated)
            .map(|d| d.id)
            .collect()
    }

    pub fn host_ingested_ids(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.descriptors.get(*id).map(|d| d.host_ingested).unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn is_host_ingested(&self, id: &str) -> bool {
        self.descriptors.get(id).map(|d| d.host_ingested).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::from_env().unwrap()
    }

    #[test]
    fn unknown_id_returns_none_not_panic() {
        let registry = Registry::default();
        assert!(registry.get("nope", &test_config()).is_none());
    }

    #[test]
    fn deprecated_checks_remain_in_enabled_ids() {
        let registry = Registry::default();
        let ids = registry.enabled_ids(&test_config());
        assert!(ids.contains(&"S9-graph-intent".to_string()));
    }

    #[test]
    fn allow_list_filters_enabled_ids() {
        let registry = Registry::default();
        let mut config = test_config();
        config.enabled_checks = ["S1-probes".to_string()].into_iter().collect();
        let ids = registry.enabled_ids(&config);
        assert!(ids.contains(&"S1-probes".to_string()));
        assert!(!ids.contains(&"S4-metrics".to_string()));
    }
}
