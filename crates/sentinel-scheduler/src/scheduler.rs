//! Cycle driver: a single background task ticks on a jittered period, and
//! all cross-request state is held behind short critical sections so API
//! reads never block the scheduler thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sentinel_alerts::{dispatch, AlertPolicy, Transport};
use sentinel_config::{Config, Credentials};
use sentinel_probe::ProbeClient;
use sentinel_registry::{Check, CheckContext, Registry};
use sentinel_store::{RingBuffers, Store};
use sentinel_types::cycle::{CHECK_TIMEOUT_MESSAGE, CYCLE_BUDGET_MESSAGE};
use sentinel_types::{ApiError, CheckResult, CycleReport};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::time::Instant;
use uuid::Uuid;

use crate::jitter::next_wait;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Everything one cycle needs that is not itself part of cycle state:
/// registry, executable check table, client, and credentials.
pub struct Scheduler {
    config: Config,
    registry: Registry,
    checks: HashMap<&'static str, Arc<dyn Check>>,
    client: ProbeClient,
    store: Arc<Store>,
    rings: Mutex<RingBuffers>,
    alert_policy: Mutex<AlertPolicy>,
    transports: Vec<Box<dyn Transport>>,
    last_cycle: RwLock<Option<CycleReport>>,
    latest_results: RwLock<HashMap<String, CheckResult>>,
    running: AtomicBool,
    run_lock: Mutex<()>,
    cycles_total: AtomicU64,
    alerts_total: AtomicU64,
}

impl Scheduler {
    pub fn new(
        config: Config,
        registry: Registry,
        checks: HashMap<&'static str, Arc<dyn Check>>,
        store: Arc<Store>,
        transports: Vec<Box<dyn Transport>>,
    ) -> Self {
        let alert_policy = AlertPolicy::new(config.alert_threshold, config.alert_cooldown_minutes);
        let client = ProbeClient::new(config.per_check_timeout).expect("failed to build probe client");
        Self {
            config,
            registry,
            checks,
            client,
            store,
            rings: Mutex::new(RingBuffers::new()),
            alert_policy: Mutex::new(alert_policy),
            transports,
            last_cycle: RwLock::new(None),
            latest_results: RwLock::new(HashMap::new()),
            running: AtomicBool::new(true),
            run_lock: Mutex::new(()),
            cycles_total: AtomicU64::new(0),
            alerts_total: AtomicU64::new(0),
        }
    }

    pub fn cycles_total(&self) -> u64 {
        self.cycles_total.load(Ordering::Relaxed)
    }

    pub fn alerts_total(&self) -> u64 {
        self.alerts_total.load(Ordering::Relaxed)
    }

    pub fn checks_len(&self) -> usize {
        self.checks.len()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Stops scheduling new ticks; an in-flight cycle still runs to
    /// completion.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub async fn last_cycle(&self) -> Option<CycleReport> {
        self.last_cycle.read().await.clone()
    }

    pub async fn latest_result(&self, id: &str) -> Option<CheckResult> {
        self.latest_results.read().await.get(id).cloned()
    }

    pub async fn all_latest_results(&self) -> Vec<CheckResult> {
        self.latest_results.read().await.values().cloned().collect()
    }

    pub async fn recent_failures_count(&self) -> usize {
        self.rings.lock().await.recent_failures_count()
    }

    pub async fn recent_failures(&self) -> Vec<CheckResult> {
        self.rings.lock().await.recent_failures()
    }

    pub async fn recent_reports(&self, n: usize) -> Vec<sentinel_store::ReportSummary> {
        self.rings.lock().await.recent_reports(n)
    }

    pub async fn history_for_check(&self, id: &str, limit: usize) -> Vec<CheckResult> {
        self.store
            .history_for_check(id, limit)
            .await
            .unwrap_or_default()
    }

    /// Runs the background tick loop until the process exits. `stop()`
    /// only suppresses the cycle body, not the sleep, so resuming with
    /// `start()` picks back up on the next natural tick.
    pub async fn run_periodic(self: Arc<Self>) {
        loop {
            let wait = next_wait(self.config.period, self.config.jitter_fraction);
            tokio::time::sleep(wait).await;
            if self.is_running() {
                let _ = self.try_run_cycle().await;
            }
        }
    }

    /// Background sweep: once an hour, deletes rows older than
    /// `config.db_retention_days`. Runs independently of the check cycle
    /// loop so a long retention window never delays a tick.
    pub async fn run_retention_sweep(self: Arc<Self>) {
        loop {
            tokio::time::sleep(RETENTION_SWEEP_INTERVAL).await;
            match self.store.sweep_retention(self.config.db_retention_days).await {
                Ok(deleted) => {
                    if deleted > 0 {
                        tracing::info!(deleted, "retention sweep removed expired rows");
                    }
                }
                Err(err) => tracing::error!("retention sweep failed: {err}"),
            }
        }
    }

    /// Entry point for both the periodic loop and `POST /run`. Returns
    /// `CycleInProgress` if another cycle is already in flight — on-demand
    /// runs are serialized against the periodic loop.
    pub async fn try_run_cycle(&self) -> Result<CycleReport, ApiError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| ApiError::CycleInProgress)?;
        Ok(self.run_cycle().await)
    }

    async fn run_cycle(&self) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();

        let ids: Vec<String> = self
            .registry
            .enabled_ids(&self.config)
            .into_iter()
            .filter(|id| !self.registry.is_host_ingested(id))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let mut handles = Vec::with_capacity(ids.len());
        for id in &ids {
            let ctx = self.context_for(id);
            let check = self.checks.get(id.as_str()).cloned();
            let permits = semaphore.clone();
            let timeout = self.config.per_check_timeout;
            let id_owned = id.clone();
            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.expect("semaphore never closed");
                match check {
                    Some(check) => match tokio::time::timeout(timeout, check.run(&ctx)).await {
                        Ok(result) => result,
                        Err(_) => CheckResult::synthetic_error(id_owned, CHECK_TIMEOUT_MESSAGE),
                    },
                    None => CheckResult::synthetic_error(id_owned, "no implementation registered for check id"),
                }
            });
            handles.push((id.clone(), handle));
        }

        let deadline = Instant::now() + self.config.cycle_budget;
        let mut results = Vec::with_capacity(handles.len());
        let mut truncated = false;
        for (id, handle) in handles {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                handle.abort();
                results.push(CheckResult::synthetic_error(id, CYCLE_BUDGET_MESSAGE));
                truncated = true;
                continue;
            }
            match tokio::time::timeout(remaining, handle).await {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(join_err)) => {
                    tracing::error!("check {id} task failed: {join_err}");
                    results.push(CheckResult::synthetic_error(id, "check task failed unexpectedly"));
                }
                Err(_) => {
                    truncated = true;
                    results.push(CheckResult::synthetic_error(id, CYCLE_BUDGET_MESSAGE));
                }
            }
        }

        let finished_at = Utc::now();
        let report = CycleReport::build(cycle_id, started_at, finished_at, results, truncated);

        self.finalize_cycle(&report).await;
        report
    }

    /// Persists, updates rings/latest-results, and runs the alert policy
    /// over every result. Store/transport failures are logged, never
    /// propagated.
    async fn finalize_cycle(&self, report: &CycleReport) {
        if let Err(err) = self.store.write_cycle(report).await {
            tracing::error!("failed to persist cycle {}: {err}", report.cycle_id);
        }

        self.rings.lock().await.record_cycle(report);

        {
            let mut latest = self.latest_results.write().await;
            for result in &report.results {
                latest.insert(result.check_id.clone(), result.clone());
            }
        }

        for result in &report.results {
            let alert = self.alert_policy.lock().await.record(result);
            if let Some(alert) = alert {
                self.alerts_total.fetch_add(1, Ordering::Relaxed);
                dispatch(&self.transports, &alert).await;
            }
        }

        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        *self.last_cycle.write().await = Some(report.clone());
    }

    /// Records a host-ingested result (C9) outside the normal cycle loop.
    pub async fn ingest_host_result(&self, result: CheckResult) {
        if let Err(err) = self
            .store
            .write_cycle(&CycleReport::build(
                Uuid::new_v4(),
                result.timestamp,
                result.timestamp,
                vec![result.clone()],
                false,
            ))
            .await
        {
            tracing::error!("failed to persist host-check result: {err}");
        }
        self.rings.lock().await.record_host_result(&result);
        self.latest_results
            .write()
            .await
            .insert(result.check_id.clone(), result.clone());
        let alert = self.alert_policy.lock().await.record(&result);
        if let Some(alert) = alert {
            self.alerts_total.fetch_add(1, Ordering::Relaxed);
            dispatch(&self.transports, &alert).await;
        }
    }

    fn context_for(&self, id: &str) -> CheckContext {
        let timeout = self
            .registry
            .get(id, &self.config)
            .map(|d| std::time::Duration::from_millis(d.default_timeout_ms))
            .unwrap_or(self.config.per_check_timeout);
        CheckContext {
            target_base_url: self.config.target_base_url.clone(),
            timeout,
            client: self.client.clone(),
            credentials: self.credentials(),
        }
    }

    fn credentials(&self) -> Credentials {
        self.config.credentials.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentinel_registry::default_catalog;

    struct SleepyCheck {
        id: &'static str,
        sleep: Duration,
    }

    #[async_trait]
    impl Check for SleepyCheck {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn run(&self, _ctx: &CheckContext) -> CheckResult {
            tokio::time::sleep(self.sleep).await;
            CheckResult::pass(self.id, self.sleep.as_millis() as u64, "done")
        }
    }

    fn test_config(max_parallel: usize, per_check_timeout_ms: u64, cycle_budget_ms: u64) -> Config {
        let mut cfg = Config::from_env().unwrap();
        cfg.max_parallel = max_parallel;
        cfg.per_check_timeout = Duration::from_millis(per_check_timeout_ms);
        cfg.cycle_budget = Duration::from_millis(cycle_budget_ms);
        cfg.enabled_checks = ["S1-probes", "S2-recall", "S3-paraphrase", "S4-metrics", "S5-security"]
            .into_iter()
            .map(String::from)
            .collect();
        cfg
    }

    async fn new_scheduler(cfg: Config, sleep_ms: u64) -> (Scheduler, tempfile::TempDir) {
        let mut checks: HashMap<&'static str, Arc<dyn Check>> = HashMap::new();
        for id in ["S1-probes", "S2-recall", "S3-paraphrase", "S4-metrics", "S5-security"] {
            checks.insert(
                id,
                Arc::new(SleepyCheck {
                    id,
                    sleep: Duration::from_millis(sleep_ms),
                }),
            );
        }
        let registry = Registry::new(default_catalog());
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("s.db")).await.unwrap());
        (Scheduler::new(cfg, registry, checks, store, Vec::new()), dir)
    }

    #[tokio::test]
    async fn cycle_budget_truncates_and_marks_synthetic_errors() {
        let cfg = test_config(1, 200, 500);
        let (scheduler, _dir) = new_scheduler(cfg, 200).await;
        let report = scheduler.try_run_cycle().await.unwrap();
        // S9/S10 are deprecated and bypass the allow-list (`enabled_ids` keeps
        // `d.enabled || d.deprecated`), so they run too, with no impl
        // registered for them here — each becomes a synthetic error.
        assert_eq!(report.total_checks, 7);
        assert!(report.truncated);
        assert!(report
            .results
            .iter()
            .any(|r| r.message.starts_with("cycle budget")));
        assert!(report.duration_ms >= 500);
        assert!(report.duration_ms < 1500);
    }

    #[tokio::test]
    async fn concurrent_run_returns_cycle_in_progress() {
        let cfg = test_config(5, 5_000, 10_000);
        let (scheduler, _dir) = new_scheduler(cfg, 300).await;
        let scheduler = Arc::new(scheduler);
        let s1 = scheduler.clone();
        let handle = tokio::spawn(async move { s1.try_run_cycle().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = scheduler.try_run_cycle().await;
        assert!(matches!(second, Err(ApiError::CycleInProgress)));
        handle.await.unwrap().unwrap();
    }
}
