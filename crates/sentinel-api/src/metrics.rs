//! Prometheus text exposition for `GET /metrics`. The bucket ladder is
//! held stable within a process lifetime via a `once_cell::sync::Lazy`
//! table.

use once_cell::sync::Lazy;
use sentinel_scheduler::Scheduler;
use sentinel_types::CheckResult;
use std::collections::BTreeMap;
use std::fmt::Write as _;

static LATENCY_BUCKETS_MS: Lazy<Vec<f64>> = Lazy::new(|| {
    vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, f64::INFINITY]
});

pub async fn render(scheduler: &Scheduler) -> String {
    let mut out = String::new();

    let running = if scheduler.is_running() { 1 } else { 0 };
    let _ = writeln!(out, "# HELP sentinel_running Whether the scheduler loop is active.");
    let _ = writeln!(out, "# TYPE sentinel_running gauge");
    let _ = writeln!(out, "sentinel_running {running}");

    if let Some(last) = scheduler.last_cycle().await {
        let _ = writeln!(out, "# TYPE sentinel_last_cycle_duration_ms gauge");
        let _ = writeln!(out, "sentinel_last_cycle_duration_ms {}", last.duration_ms);
        let _ = writeln!(out, "# TYPE sentinel_last_cycle_total gauge");
        let _ = writeln!(out, "sentinel_last_cycle_total {}", last.total_checks);
        let _ = writeln!(out, "# TYPE sentinel_last_cycle_passed gauge");
        let _ = writeln!(out, "sentinel_last_cycle_passed {}", last.passed);
        let _ = writeln!(out, "# TYPE sentinel_last_cycle_warned gauge");
        let _ = writeln!(out, "sentinel_last_cycle_warned {}", last.warned);
        let _ = writeln!(out, "# TYPE sentinel_last_cycle_failed gauge");
        let _ = writeln!(out, "sentinel_last_cycle_failed {}", last.failed);
        let _ = writeln!(out, "# TYPE sentinel_last_cycle_errored gauge");
        let _ = writeln!(out, "sentinel_last_cycle_errored {}", last.errored);
        let _ = writeln!(out, "# TYPE sentinel_last_cycle_truncated gauge");
        let _ = writeln!(out, "sentinel_last_cycle_truncated {}", last.truncated as u8);
    }

    let _ = writeln!(out, "# TYPE sentinel_cycles_total counter");
    let _ = writeln!(out, "sentinel_cycles_total {}", scheduler.cycles_total());
    let _ = writeln!(out, "# TYPE sentinel_alerts_total counter");
    let _ = writeln!(out, "sentinel_alerts_total {}", scheduler.alerts_total());
    let _ = writeln!(out, "# TYPE sentinel_recent_failures gauge");
    let _ = writeln!(out, "sentinel_recent_failures {}", scheduler.recent_failures_count().await);

    render_latency_histogram(&mut out, &scheduler.all_latest_results().await);

    out
}

fn render_latency_histogram(out: &mut String, results: &[CheckResult]) {
    let _ = writeln!(out, "# HELP sentinel_check_latency_ms Per-check latency, bucketed.");
    let _ = writeln!(out, "# TYPE sentinel_check_latency_ms histogram");

    let mut by_check: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    for result in results {
        by_check.entry(result.check_id.as_str()).or_default().push(result.latency_ms);
    }

    for (check_id, latencies) in &by_check {
        for bucket in LATENCY_BUCKETS_MS.iter() {
            let count = latencies.iter().filter(|&&l| l as f64 <= *bucket).count();
            let label = if bucket.is_infinite() {
                "+Inf".to_string()
            } else {
                format!("{bucket}")
            };
            let _ = writeln!(
                out,
                "sentinel_check_latency_ms_bucket{{check_id=\"{check_id}\",le=\"{label}\"}} {count}",
            );
        }
        let _ = writeln!(
            out,
            "sentinel_check_latency_ms_count{{check_id=\"{check_id}\"}} {}",
            latencies.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_ladder_is_monotonic_and_ends_at_infinity() {
        let buckets = &*LATENCY_BUCKETS_MS;
        assert!(buckets.windows(2).all(|w| w[0] < w[1]));
        assert!(buckets.last().unwrap().is_infinite());
    }

    #[test]
    fn single_observation_yields_flat_ones_not_a_running_count() {
        let mut out = String::new();
        render_latency_histogram(&mut out, &[CheckResult::pass("S1-probes", 42, "ok")]);
        let counts: Vec<u64> = out
            .lines()
            .filter(|l| l.starts_with("sentinel_check_latency_ms_bucket"))
            .map(|l| l.rsplit(' ').next().unwrap().parse().unwrap())
            .collect();
        // 42ms clears buckets 50..+Inf (6 of the 11 ladder entries) and
        // misses 5/10/25; every bucket it clears should read 1, never 2+.
        assert_eq!(counts, vec![0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn repeated_observations_for_one_check_aggregate() {
        let mut out = String::new();
        let results = vec![
            CheckResult::pass("S1-probes", 3, "ok"),
            CheckResult::pass("S1-probes", 8, "ok"),
        ];
        render_latency_histogram(&mut out, &results);
        assert!(out.contains("le=\"5\"} 1"));
        assert!(out.contains("le=\"10\"} 2"));
        assert!(out.contains("sentinel_check_latency_ms_count{check_id=\"S1-probes\"} 2"));
    }
}
