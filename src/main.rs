use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sentinel::build_scheduler;
use sentinel_config::Config;
use sentinel_observability::{init_logging, LogFormat};
use sentinel_types::CheckStatus;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(about = "Autonomous health-and-behavior monitor for a running memory/context service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the periodic scheduler and HTTP API.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        db_path: Option<String>,
        #[arg(long, default_value_t = false)]
        json_logs: bool,
    },
    /// Run a single on-demand cycle against the configured target and
    /// print a summary, exiting non-zero if anything failed or errored.
    Doctor {
        #[arg(long, default_value_t = false)]
        json_logs: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, port, db_path, json_logs } => {
            init_logging(log_format(json_logs));
            let mut config = Config::from_env().context("resolving configuration")?;
            if let Some(bind) = bind {
                config.api_bind = bind;
            }
            if let Some(port) = port {
                config.api_port = port;
            }
            if let Some(db_path) = db_path {
                config.db_path = db_path;
            }

            let addr: SocketAddr = format!("{}:{}", config.api_bind, config.api_port)
                .parse()
                .context("invalid api_bind/api_port")?;

            let scheduler = build_scheduler(config).await?;
            info!("sentinel starting, {} checks registered", scheduler.checks_len());
            sentinel_api::serve(addr, scheduler).await?;
        }
        Command::Doctor { json_logs } => {
            init_logging(log_format(json_logs));
            let config = Config::from_env().context("resolving configuration")?;
            let scheduler = build_scheduler(config).await?;

            let report = scheduler
                .try_run_cycle()
                .await
                .context("running diagnostic cycle")?;

            println!(
                "cycle {} — {} checks: {} passed, {} warned, {} failed, {} errored ({}ms{})",
                report.cycle_id,
                report.total_checks,
                report.passed,
                report.warned,
                report.failed,
                report.errored,
                report.duration_ms,
                if report.truncated { ", truncated" } else { "" },
            );
            for result in &report.results {
                println!("  [{}] {} — {}", result.status.as_str(), result.check_id, result.message);
            }

            let unhealthy = report
                .results
                .iter()
                .any(|r| matches!(r.status, CheckStatus::Fail | CheckStatus::Error));
            if unhealthy {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn log_format(json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    }
}
