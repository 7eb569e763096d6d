use sentinel_types::CheckDescriptor;

/// The fixed set of check descriptors registered at startup. Order here is
/// the registry's stable presentation order.
pub fn default_catalog() -> Vec<CheckDescriptor> {
    vec![
        CheckDescriptor::new("S1-probes", "Liveness and readiness health probes", 10_000),
        CheckDescriptor::new("S2-recall", "Golden-fact recall and graph relationship checks", 10_000),
        CheckDescriptor::new("S3-paraphrase", "Paraphrase robustness over a small topic sample", 10_000),
        CheckDescriptor::new("S4-metrics", "Dashboard/analytics metrics wiring", 10_000),
        CheckDescriptor::new("S5-security", "Security negative tests (auth, injection)", 10_000),
        CheckDescriptor::new("S6-backup", "Backup/restore artifact parity", 10_000),
        CheckDescriptor::new("S7-config", "Configuration parity snapshot", 10_000),
        CheckDescriptor::new("S8-capacity", "Capacity smoke: burst latency and error rate", 10_000),
        CheckDescriptor::new("S9-graph-intent", "Graph intent classification", 10_000)
            .deprecated("S2-recall"),
        CheckDescriptor::new("S10-content-pipeline", "Content ingestion pipeline", 10_000)
            .deprecated("S2-recall"),
        CheckDescriptor::new("S11-firewall-status", "Host firewall status", 10_000).host_ingested(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_stable_and_unique() {
        let catalog = default_catalog();
        let mut ids: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).collect();
        let before = ids.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before.len());
    }

    #[test]
    fn deprecated_checks_name_a_successor() {
        for d in default_catalog() {
            if d.deprecated {
                assert!(d.successor_id.is_some());
            }
        }
    }
}
