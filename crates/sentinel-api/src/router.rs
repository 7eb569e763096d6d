use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sentinel_scheduler::Scheduler;
use tower_http::cors::{Any, CorsLayer};

use crate::routes::{
    get_check, get_check_history, get_checks, get_health, get_metrics, get_report, get_status,
    post_host_check, post_run, post_start, post_stop,
};

/// Builds the full router: a permissive CORS layer plus one route per
/// endpoint, backed by a single cloneable `Arc` state.
pub fn build_router(scheduler: Arc<Scheduler>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(get_status))
        .route("/run", post(post_run))
        .route("/checks", get(get_checks))
        .route("/checks/{id}", get(get_check))
        .route("/checks/{id}/history", get(get_check_history))
        .route("/report", get(get_report))
        .route("/metrics", get(get_metrics))
        .route("/health", get(get_health))
        .route("/start", post(post_start))
        .route("/stop", post(post_stop))
        .route("/host-checks/{id}", post(post_host_check))
        .layer(cors)
        .with_state(scheduler)
}
