//! Wiring for the `sentinel` binary: resolves configuration, builds the
//! executable check table, opens persistence, assembles the scheduler, and
//! hands it to the HTTP API — one function that constructs every
//! long-lived collaborator and returns a single handle the rest of the
//! process shares.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use sentinel_alerts::{ChatTransport, Transport, WebhookTransport};
use sentinel_checks::build_executable_registry;
use sentinel_config::Config;
use sentinel_registry::{default_catalog, Registry};
use sentinel_scheduler::Scheduler;
use sentinel_store::Store;

/// Builds the shared `Scheduler` from process configuration: opens the
/// database, wires transports from whichever credentials are configured,
/// and loads the executable check table. Does not start the periodic loop
/// or bind the HTTP listener — callers decide whether this is a `serve` or
/// a one-shot `doctor` run.
pub async fn build_scheduler(config: Config) -> anyhow::Result<Arc<Scheduler>> {
    let store = Store::open(Path::new(&config.db_path))
        .await
        .with_context(|| format!("opening database at {}", config.db_path))?;

    let transports = build_transports(&config);
    let registry = Registry::new(default_catalog());
    let checks = build_executable_registry();

    Ok(Arc::new(Scheduler::new(
        config,
        registry,
        checks,
        Arc::new(store),
        transports,
    )))
}

fn build_transports(config: &Config) -> Vec<Box<dyn Transport>> {
    let mut transports: Vec<Box<dyn Transport>> = Vec::new();
    if let Some(url) = &config.webhook_url {
        transports.push(Box::new(WebhookTransport::new(url.clone())));
    }
    if let (Some(token), Some(channel_id)) = (&config.chat_token, &config.chat_channel_id) {
        transports.push(Box::new(ChatTransport::new(
            "https://api.telegram.org/bot",
            token,
            channel_id.clone(),
        )));
    }
    transports
}
