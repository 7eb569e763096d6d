use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use sentinel_config::Config;
use sentinel_registry::{default_catalog, Check, CheckContext, Registry};
use sentinel_scheduler::Scheduler;
use sentinel_store::Store;
use sentinel_types::CheckResult;
use serde_json::Value;
use tower::ServiceExt;

use crate::router::build_router;

struct AlwaysPassCheck;

#[async_trait]
impl Check for AlwaysPassCheck {
    fn id(&self) -> &'static str {
        "S1-probes"
    }

    async fn run(&self, _ctx: &CheckContext) -> CheckResult {
        CheckResult::pass("S1-probes", 5, "ok")
    }
}

async fn test_scheduler(host_secret: Option<&str>) -> (Arc<Scheduler>, tempfile::TempDir) {
    let mut cfg = Config::from_env().unwrap();
    cfg.enabled_checks = ["S1-probes".to_string()].into_iter().collect();
    cfg.host_check_shared_secret = host_secret.map(str::to_string);

    let mut checks: HashMap<&'static str, Arc<dyn Check>> = HashMap::new();
    checks.insert("S1-probes", Arc::new(AlwaysPassCheck));

    let registry = Registry::new(default_catalog());
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(&dir.path().join("api-test.db")).await.unwrap());
    let scheduler = Arc::new(Scheduler::new(cfg, registry, checks, store, Vec::new()));
    (scheduler, dir)
}

#[tokio::test]
async fn health_endpoint_is_always_ok() {
    let (scheduler, _dir) = test_scheduler(None).await;
    let app = build_router(scheduler);
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn run_then_status_reflects_completed_cycle() {
    let (scheduler, _dir) = test_scheduler(None).await;
    let app = build_router(scheduler);

    let run_req = Request::builder()
        .method("POST")
        .uri("/run")
        .body(Body::empty())
        .unwrap();
    let run_resp = app.clone().oneshot(run_req).await.unwrap();
    assert_eq!(run_resp.status(), StatusCode::OK);

    let status_req = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let status_resp = app.oneshot(status_req).await.unwrap();
    assert_eq!(status_resp.status(), StatusCode::OK);
    let body = to_bytes(status_resp.into_body(), usize::MAX).await.unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["cycles_total"], 1);
}

#[tokio::test]
async fn unknown_check_id_returns_404() {
    let (scheduler, _dir) = test_scheduler(None).await;
    let app = build_router(scheduler);
    let req = Request::builder()
        .uri("/checks/does-not-exist")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn host_check_without_header_is_unauthorized() {
    let (scheduler, _dir) = test_scheduler(Some("a-real-host-secret-value")).await;
    let app = build_router(scheduler);
    let req = Request::builder()
        .method("POST")
        .uri("/host-checks/S11-firewall-status")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"status":"pass","message":"ok"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn host_check_with_valid_secret_is_accepted() {
    let secret = "a-real-host-secret-value";
    let (scheduler, _dir) = test_scheduler(Some(secret)).await;
    let app = build_router(scheduler);
    let req = Request::builder()
        .method("POST")
        .uri("/host-checks/S11-firewall-status")
        .header("content-type", "application/json")
        .header("x-sentinel-host-secret", secret)
        .body(Body::from(r#"{"status":"pass","message":"firewall ok"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn host_check_for_non_host_ingested_id_is_rejected() {
    let secret = "a-real-host-secret-value";
    let (scheduler, _dir) = test_scheduler(Some(secret)).await;
    let app = build_router(scheduler);
    let req = Request::builder()
        .method("POST")
        .uri("/host-checks/S1-probes")
        .header("content-type", "application/json")
        .header("x-sentinel-host-secret", secret)
        .body(Body::from(r#"{"status":"pass","message":"ok"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stop_then_status_reports_not_running() {
    let (scheduler, _dir) = test_scheduler(None).await;
    let app = build_router(scheduler);
    let req = Request::builder()
        .method("POST")
        .uri("/stop")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let status_req = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let status_resp = app.oneshot(status_req).await.unwrap();
    let body = to_bytes(status_resp.into_body(), usize::MAX).await.unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["running"], false);
}

