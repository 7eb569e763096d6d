//! SQLite persistence layer: connection handling, schema init, and startup
//! corruption recovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sentinel_types::{CheckResult, CheckStatus, CycleReport};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

pub struct Store {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl Store {
    pub async fn open(db_path: &Path) -> StoreResult<Self> {
        let conn = match Self::open_connection(db_path) {
            Ok(conn) => conn,
            Err(err) => {
                // A missing or corrupt file must not crash the process.
                // Log and start fresh.
                tracing::warn!("failed to open database at {}: {err}; reinitializing", db_path.display());
                let _ = std::fs::remove_file(db_path);
                Self::open_connection(db_path)?
            }
        };

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: db_path.to_path_buf(),
        };
        store.init_schema().await?;
        if let Err(err) = store.validate_integrity().await {
            tracing::warn!("database integrity check failed ({err}); reinitializing schema");
            drop(std::fs::remove_file(&store.db_path));
            let fresh = Self::open_connection(&store.db_path)?;
            *store.conn.lock().await = fresh;
            store.init_schema().await?;
        }
        Ok(store)
    }

    fn open_connection(db_path: &Path) -> StoreResult<Connection> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(10))?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        conn.execute("PRAGMA synchronous = NORMAL", [])?;
        Ok(conn)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS check_results (
                cycle_id TEXT NOT NULL,
                check_id TEXT NOT NULL,
                status TEXT NOT NULL,
                latency_ms INTEGER NOT NULL,
                message TEXT NOT NULL,
                details_json TEXT NOT NULL,
                ts TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_check_results_check_id ON check_results(check_id, ts)",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cycle_reports (
                cycle_id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                total INTEGER NOT NULL,
                passed INTEGER NOT NULL,
                warned INTEGER NOT NULL,
                failed INTEGER NOT NULL,
                errored INTEGER NOT NULL,
                truncated INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Early integrity probe so startup recovery can heal a corrupt file.
    async fn validate_integrity(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let check: String = conn.query_row("PRAGMA quick_check(1)", [], |row| row.get(0))?;
        if check.trim().eq_ignore_ascii_case("ok") {
            return Ok(());
        }
        Err(StoreError::InvalidRow(format!(
            "quick_check reported: {check}"
        )))
    }

    /// Persists one cycle in a single transaction. Failures here are
    /// logged by the caller and never fail the cycle itself.
    pub async fn write_cycle(&self, report: &CycleReport) -> StoreResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO cycle_reports
                (cycle_id, started_at, finished_at, duration_ms, total, passed, warned, failed, errored, truncated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                report.cycle_id.to_string(),
                report.started_at.to_rfc3339(),
                report.finished_at.to_rfc3339(),
                report.duration_ms as i64,
                report.total_checks as i64,
                report.passed as i64,
                report.warned as i64,
                report.failed as i64,
                report.errored as i64,
                report.truncated as i64,
            ],
        )?;
        for result in &report.results {
            tx.execute(
                "INSERT INTO check_results (cycle_id, check_id, status, latency_ms, message, details_json, ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    report.cycle_id.to_string(),
                    result.check_id,
                    result.status.as_str(),
                    result.latency_ms as i64,
                    result.message,
                    serde_json::to_string(&result.details)?,
                    result.timestamp.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub async fn recent_cycles(&self, n: usize) -> StoreResult<Vec<CycleReport>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT cycle_id, started_at, finished_at, duration_ms, total, passed, warned, failed, errored, truncated
             FROM cycle_reports ORDER BY started_at DESC LIMIT ?1",
        )?;
        let summaries: Vec<CycleSummary> = stmt
            .query_map(params![n as i64], row_to_summary)?
            .collect::<Result<_, _>>()?;
        drop(stmt);

        let mut reports = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let mut results_stmt = conn.prepare(
                "SELECT check_id, status, latency_ms, message, details_json, ts
                 FROM check_results WHERE cycle_id = ?1 ORDER BY ts ASC",
            )?;
            let results: Vec<CheckResult> = results_stmt
                .query_map(params![summary.cycle_id.to_string()], row_to_result)?
                .collect::<Result<_, _>>()?;
            reports.push(summary.into_report(results));
        }
        Ok(reports)
    }

    pub async fn history_for_check(&self, check_id: &str, limit: usize) -> StoreResult<Vec<CheckResult>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT check_id, status, latency_ms, message, details_json, ts
             FROM check_results WHERE check_id = ?1 ORDER BY ts DESC LIMIT ?2",
        )?;
        let results = stmt
            .query_map(params![check_id, limit as i64], row_to_result)?
            .collect::<Result<_, _>>()?;
        Ok(results)
    }

    pub async fn latest_result(&self, check_id: &str) -> StoreResult<Option<CheckResult>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT check_id, status, latency_ms, message, details_json, ts
             FROM check_results WHERE check_id = ?1 ORDER BY ts DESC LIMIT 1",
            params![check_id],
            row_to_result,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Deletes rows older than `retention_days`. Ring buffers are
    /// independent and unaffected.
    pub async fn sweep_retention(&self, retention_days: i64) -> StoreResult<usize> {
        let cutoff = (Utc::now() - chrono::Duration::days(retention_days)).to_rfc3339();
        let conn = self.conn.lock().await;
        let a = conn.execute("DELETE FROM check_results WHERE ts < ?1", params![cutoff])?;
        let b = conn.execute(
            "DELETE FROM cycle_reports WHERE started_at < ?1",
            params![cutoff],
        )?;
        Ok(a + b)
    }
}

struct CycleSummary {
    cycle_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    duration_ms: u64,
    total: usize,
    passed: usize,
    warned: usize,
    failed: usize,
    errored: usize,
    truncated: bool,
}

impl CycleSummary {
    fn into_report(self, results: Vec<CheckResult>) -> CycleReport {
        CycleReport {
            cycle_id: self.cycle_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            results,
            total_checks: self.total,
            passed: self.passed,
            warned: self.warned,
            failed: self.failed,
            errored: self.errored,
            duration_ms: self.duration_ms,
            truncated: self.truncated,
        }
    }
}

fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<CycleSummary> {
    let cycle_id: String = row.get(0)?;
    let started_at: String = row.get(1)?;
    let finished_at: String = row.get(2)?;
    Ok(CycleSummary {
        cycle_id: Uuid::parse_str(&cycle_id).unwrap_or_default(),
        started_at: parse_rfc3339(&started_at),
        finished_at: parse_rfc3339(&finished_at),
        duration_ms: row.get::<_, i64>(3)? as u64,
        total: row.get::<_, i64>(4)? as usize,
        passed: row.get::<_, i64>(5)? as usize,
        warned: row.get::<_, i64>(6)? as usize,
        failed: row.get::<_, i64>(7)? as usize,
        errored: row.get::<_, i64>(8)? as usize,
        truncated: row.get::<_, i64>(9)? != 0,
    })
}

fn row_to_result(row: &rusqlite::Row) -> rusqlite::Result<CheckResult> {
    let check_id: String = row.get(0)?;
    let status: String = row.get(1)?;
    let latency_ms: i64 = row.get(2)?;
    let message: String = row.get(3)?;
    let details_json: String = row.get(4)?;
    let ts: String = row.get(5)?;
    let details: Value = serde_json::from_str(&details_json).unwrap_or(Value::Null);
    let status: CheckStatus = status.parse().unwrap_or(CheckStatus::Error);
    Ok(CheckResult {
        check_id,
        timestamp: parse_rfc3339(&ts),
        status,
        latency_ms: latency_ms as u64,
        message,
        details,
        trace_id: Uuid::new_v4(),
        deprecated: None,
        deprecation_info: None,
    })
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
