//! In-memory FIFO ring buffers (C6). Independent of the SQLite store so a
//! database hiccup never blocks `/status` or `/report` from serving recent
//! data out of memory.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use sentinel_types::{CheckResult, CheckStatus, CycleReport};
use serde::Serialize;
use uuid::Uuid;

const RECENT_FAILURES_CAPACITY: usize = 200;
const RECENT_REPORTS_CAPACITY: usize = 50;
const RECENT_TRACES_CAPACITY: usize = 500;

/// A compact record of one check execution's trace, kept independently of
/// the full `CheckResult` so the traces buffer stays cheap even when
/// `details` payloads are large.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub check_id: String,
    pub trace_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub excerpt: String,
}

impl From<&CheckResult> for TraceEntry {
    fn from(result: &CheckResult) -> Self {
        let excerpt: String = result.message.chars().take(200).collect();
        Self {
            check_id: result.check_id.clone(),
            trace_id: result.trace_id,
            timestamp: result.timestamp,
            excerpt,
        }
    }
}

/// A compact summary of a `CycleReport` without per-result details, kept
/// lean for the recent-reports ring.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_checks: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub truncated: bool,
}

impl From<&CycleReport> for ReportSummary {
    fn from(report: &CycleReport) -> Self {
        Self {
            cycle_id: report.cycle_id,
            started_at: report.started_at,
            finished_at: report.finished_at,
            total_checks: report.total_checks,
            passed: report.passed,
            warned: report.warned,
            failed: report.failed,
            errored: report.errored,
            duration_ms: report.duration_ms,
            truncated: report.truncated,
        }
    }
}

/// A single bounded FIFO queue. Pushing past capacity evicts the oldest
/// entry first.
struct Ring<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Ring<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// The three ring buffers, guarded together behind a single lock by the
/// caller (`sentinel-scheduler` holds this inside its shared state).
pub struct RingBuffers {
    failures: Ring<CheckResult>,
    reports: Ring<ReportSummary>,
    traces: Ring<TraceEntry>,
}

impl Default for RingBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuffers {
    pub fn new() -> Self {
        Self {
            failures: Ring::new(RECENT_FAILURES_CAPACITY),
            reports: Ring::new(RECENT_REPORTS_CAPACITY),
            traces: Ring::new(RECENT_TRACES_CAPACITY),
        }
    }

    /// Records one cycle: every failing/erroring result goes into the
    /// failures ring, every result gets a trace entry, and the cycle itself
    /// is summarized into the reports ring.
    pub fn record_cycle(&mut self, report: &CycleReport) {
        for result in &report.results {
            self.traces.push(TraceEntry::from(result));
            if result.status.counts_as_failure() {
                self.failures.push(result.clone());
            }
        }
        self.reports.push(ReportSummary::from(report));
    }

    /// Host-ingested results (C9) bypass the scheduler but still need to
    /// land in the failures/traces rings.
    pub fn record_host_result(&mut self, result: &CheckResult) {
        self.traces.push(TraceEntry::from(result));
        if result.status.counts_as_failure() {
            self.failures.push(result.clone());
        }
    }

    pub fn recent_failures(&self) -> Vec<CheckResult> {
        self.failures.snapshot()
    }

    pub fn recent_failures_count(&self) -> usize {
        self.failures.len()
    }

    /// Newest first, so `/report?n=` reads the same
    /// way the persisted rows do when queried most-recent-first.
    pub fn recent_reports(&self, n: usize) -> Vec<ReportSummary> {
        let snapshot = self.reports.snapshot();
        let start = snapshot.len().saturating_sub(n);
        snapshot[start..].iter().rev().cloned().collect()
    }

    pub fn recent_traces(&self) -> Vec<TraceEntry> {
        self.traces.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(statuses: &[CheckStatus]) -> CycleReport {
        let now = Utc::now();
        let results = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| match status {
                CheckStatus::Pass => CheckResult::pass(format!("S{i}"), 1, "ok"),
                _ => {
                    let mut r = CheckResult::error(format!("S{i}"), "bad");
                    r.status = *status;
                    r
                }
            })
            .collect();
        CycleReport::build(Uuid::new_v4(), now, now, results, false)
    }

    #[test]
    fn only_failing_results_enter_failures_ring() {
        let mut rings = RingBuffers::new();
        let report = report_with(&[CheckStatus::Pass, CheckStatus::Fail, CheckStatus::Error]);
        rings.record_cycle(&report);
        assert_eq!(rings.recent_failures_count(), 2);
        assert_eq!(rings.recent_traces().len(), 3);
    }

    #[test]
    fn failures_ring_evicts_oldest_past_capacity() {
        let mut rings = RingBuffers::new();
        for _ in 0..(RECENT_FAILURES_CAPACITY + 10) {
            let report = report_with(&[CheckStatus::Fail]);
            rings.record_cycle(&report);
        }
        assert_eq!(rings.recent_failures_count(), RECENT_FAILURES_CAPACITY);
    }

    #[test]
    fn recent_reports_returns_last_n_in_order() {
        let mut rings = RingBuffers::new();
        for _ in 0..5 {
            rings.record_cycle(&report_with(&[CheckStatus::Pass]));
        }
        let last_two = rings.recent_reports(2);
        assert_eq!(last_two.len(), 2);
    }
}
