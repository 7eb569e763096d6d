use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sentinel_scheduler::Scheduler;
use sentinel_types::{ApiError, CheckResult, CheckStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiErrorResponse;
use crate::host_check::validate_secret;
use crate::metrics;

pub type SentinelState = Arc<Scheduler>;

pub async fn get_health() -> impl IntoResponse {
    Json(json!({ "healthy": true }))
}

pub async fn get_status(State(scheduler): State<SentinelState>) -> impl IntoResponse {
    let last = scheduler.last_cycle().await;
    let host_results: Value = {
        let mut map = serde_json::Map::new();
        for id in scheduler.registry().host_ingested_ids() {
            if let Some(result) = scheduler.latest_result(&id).await {
                map.insert(id, serde_json::to_value(result).unwrap_or(Value::Null));
            }
        }
        Value::Object(map)
    };
    Json(json!({
        "running": scheduler.is_running(),
        "last_cycle": last,
        "recent_failures_count": scheduler.recent_failures_count().await,
        "cycles_total": scheduler.cycles_total(),
        "alerts_total": scheduler.alerts_total(),
        "host_check_results": host_results,
    }))
}

pub async fn post_run(
    State(scheduler): State<SentinelState>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let report = scheduler.try_run_cycle().await?;
    Ok(Json(report))
}

pub async fn get_checks(State(scheduler): State<SentinelState>) -> impl IntoResponse {
    Json(scheduler.registry().list(scheduler.config()))
}

pub async fn get_check(
    State(scheduler): State<SentinelState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let descriptor = scheduler
        .registry()
        .get(&id, scheduler.config())
        .ok_or_else(|| ApiError::UnknownCheck(id.clone()))?;
    let latest = scheduler.latest_result(&id).await;
    Ok(Json(json!({ "descriptor": descriptor, "latest_result": latest })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
}

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 200;

pub async fn get_check_history(
    State(scheduler): State<SentinelState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    if scheduler.registry().get(&id, scheduler.config()).is_none() {
        return Err(ApiError::UnknownCheck(id).into());
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let history = scheduler.history_for_check(&id, limit).await;
    Ok(Json(history))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    n: Option<usize>,
}

const DEFAULT_REPORT_COUNT: usize = 10;
const MAX_REPORT_COUNT: usize = 50;

pub async fn get_report(
    State(scheduler): State<SentinelState>,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let n = query.n.unwrap_or(DEFAULT_REPORT_COUNT).clamp(1, MAX_REPORT_COUNT);
    Json(scheduler.recent_reports(n).await)
}

pub async fn get_metrics(State(scheduler): State<SentinelState>) -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(&scheduler).await,
    )
}

pub async fn post_start(State(scheduler): State<SentinelState>) -> impl IntoResponse {
    scheduler.start();
    Json(json!({ "running": true }))
}

pub async fn post_stop(State(scheduler): State<SentinelState>) -> impl IntoResponse {
    scheduler.stop();
    Json(json!({ "running": false }))
}

#[derive(Debug, Deserialize)]
pub struct HostCheckBody {
    status: CheckStatus,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Value>,
    #[serde(default)]
    timestamp: Option<chrono::DateTime<Utc>>,
}

const HOST_SECRET_HEADER: &str = "x-sentinel-host-secret";

pub async fn post_host_check(
    State(scheduler): State<SentinelState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<HostCheckBody>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let configured = scheduler
        .config()
        .host_check_shared_secret
        .as_deref()
        .ok_or(ApiError::Unauthorized)?;

    let provided = headers
        .get(HOST_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if !validate_secret(provided, configured) {
        return Err(ApiError::Unauthorized.into());
    }

    if !scheduler.registry().is_host_ingested(&id) {
        return Err(ApiError::NotHostIngested(id).into());
    }

    let timestamp = body.timestamp.unwrap_or_else(Utc::now);
    let mut result = CheckResult::new(
        id,
        body.status,
        0,
        body.message.unwrap_or_default(),
        body.details.unwrap_or(Value::Null),
    );
    result.timestamp = timestamp;
    result.trace_id = Uuid::new_v4();

    scheduler.ingest_host_result(result.clone()).await;
    Ok((StatusCode::ACCEPTED, Json(result)))
}
