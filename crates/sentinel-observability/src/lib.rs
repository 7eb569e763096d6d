//! Process-wide logging setup: an env-filter plus a fmt layer. Sentinel is
//! a headless daemon rather than a desktop app, so there is no per-process
//! log directory or file rotation here — just stdout, with an optional
//! JSON mode for log shippers.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Installs the global subscriber. Safe to call once per process; a second
/// call is a no-op (mirrors `init_process_logging`'s `try_init().ok()`
/// posture, since integration tests may initialize more than once).
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false).with_span_list(false))
            .try_init(),
    };
    result.ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_does_not_panic_when_called_twice() {
        init_logging(LogFormat::Compact);
        init_logging(LogFormat::Compact);
    }
}
