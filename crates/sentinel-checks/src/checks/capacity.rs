use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus};
use serde_json::json;

const ID: &str = "S8-capacity";
const BURST_SIZE: usize = 20;
const P95_CEILING_MS: u64 = 2_000;
const P99_CEILING_MS: u64 = 4_000;
const ERROR_RATE_CEILING: f64 = 0.1;

/// S8: a small burst of concurrent health requests; asserts p95/p99
/// latency bounds and an error-rate ceiling. Latency stats are computed
/// only from successful responses.
pub struct CapacitySmokeCheck;

#[async_trait]
impl Check for CapacitySmokeCheck {
    fn id(&self) -> &'static str {
        ID
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = std::time::Instant::now();
        let url = ctx.url("/health/live");

        let futures = (0..BURST_SIZE).map(|_| ctx.client.timed_get(&url, ctx.timeout));
        let outcomes = futures::future::join_all(futures).await;

        let mut latencies: Vec<u64> = Vec::new();
        let mut successes = 0usize;
        for outcome in &outcomes {
            if let Ok(resp) = outcome {
                if resp.is_success() {
                    successes += 1;
                    latencies.push(resp.elapsed_ms);
                }
            }
        }

        let attempts = outcomes.len();
        let success_rate = successes as f64 / attempts as f64;
        let error_rate = 1.0 - success_rate;
        let latency_ms = start.elapsed().as_millis() as u64;

        if success_rate < 0.5 {
            return CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("success rate {success_rate:.2} below 50% of {attempts} attempts"),
                json!({ "attempts": attempts, "successes": successes, "error_rate": error_rate }),
            );
        }

        latencies.sort_unstable();
        let p95 = percentile(&latencies, 0.95);
        let p99 = percentile(&latencies, 0.99);

        let details = json!({
            "attempts": attempts,
            "successes": successes,
            "error_rate": error_rate,
            "p95_ms": p95,
            "p99_ms": p99,
        });

        if error_rate > ERROR_RATE_CEILING {
            CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("error rate {error_rate:.2} exceeds ceiling {ERROR_RATE_CEILING:.2}"),
                details,
            )
        } else if p95 > P95_CEILING_MS || p99 > P99_CEILING_MS {
            CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                format!("p95={p95}ms/p99={p99}ms exceed ceilings {P95_CEILING_MS}ms/{P99_CEILING_MS}ms"),
                details,
            )
        } else {
            CheckResult::new(
                ID,
                CheckStatus::Pass,
                latency_ms,
                "capacity smoke within bounds",
                details,
            )
        }
    }
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}
