use std::net::SocketAddr;
use std::sync::Arc;

use sentinel_scheduler::Scheduler;

use crate::router::build_router;

/// Binds and serves the API, running the scheduler's periodic check loop
/// and its hourly retention sweep alongside it via `tokio::spawn`, with
/// `axum::serve` wired to a graceful shutdown on ctrl-c.
pub async fn serve(addr: SocketAddr, scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    let periodic_scheduler = scheduler.clone();
    let periodic = tokio::spawn(async move {
        periodic_scheduler.run_periodic().await;
    });

    let retention_scheduler = scheduler.clone();
    let retention = tokio::spawn(async move {
        retention_scheduler.run_retention_sweep().await;
    });

    let app = build_router(scheduler);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("sentinel API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    periodic.abort();
    retention.abort();
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
