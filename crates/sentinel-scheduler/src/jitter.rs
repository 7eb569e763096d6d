use std::time::Duration;

use rand::Rng;

/// Draws the wait until the next tick: `T * (1 + j)` with `j` uniform in
/// `[-J, J]`, so the gap between ticks is bounded to `[T*(1-J), T*(1+J)]`
/// by construction.
pub fn next_wait(period: Duration, jitter_fraction: f64) -> Duration {
    let jitter_fraction = jitter_fraction.clamp(0.0, 0.99);
    let j = rand::thread_rng().gen_range(-jitter_fraction..=jitter_fraction);
    let secs = (period.as_secs_f64() * (1.0 + j)).max(0.0);
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_stays_within_bounds() {
        let period = Duration::from_secs(60);
        for _ in 0..200 {
            let wait = next_wait(period, 0.2);
            assert!(wait >= Duration::from_secs_f64(60.0 * 0.8) - Duration::from_millis(1));
            assert!(wait <= Duration::from_secs_f64(60.0 * 1.2) + Duration::from_millis(1));
        }
    }

    #[test]
    fn zero_jitter_is_exact_period() {
        let period = Duration::from_secs(1);
        assert_eq!(next_wait(period, 0.0), Duration::from_secs(1));
    }
}
