//! Exponential backoff between failed sends.

use rand::Rng;
use std::time::Duration;

const DEFAULT_BASE_MS: f64 = 100.0;
const DEFAULT_FACTOR: f64 = 2.0;
const DEFAULT_RETRY_COUNT_CAP: u32 = 10;
const DEFAULT_JITTER: f64 = 0.1;

/// Backoff state for the emitter loop.
///
/// After `n` consecutive rounds with retryable failures the delay is
/// `base * factor^(min(n, cap) - 1)`, randomly shifted by up to `jitter`
/// of itself in either direction.
#[derive(Debug, Clone)]
pub struct RetryDelay {
    base_ms: f64,
    factor: f64,
    retry_count_cap: u32,
    jitter: f64,
    retry_count: u32,
}

impl RetryDelay {
    pub fn new(base: Duration, factor: f64, retry_count_cap: u32, jitter: f64) -> Self {
        Self {
            base_ms: base.as_millis() as f64,
            factor,
            retry_count_cap,
            jitter,
            retry_count: 0,
        }
    }

    pub fn will_retry(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
    }

    pub fn wont_retry(&mut self) {
        self.retry_count = 0;
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn delay(&self) -> Duration {
        self.delay_with_seed(rand::thread_rng().gen_range(0.0..1.0))
    }

    /// Delay for a given jitter seed in `[0, 1)`.
    pub(crate) fn delay_with_seed(&self, seed: f64) -> Duration {
        if self.retry_count == 0 {
            return Duration::ZERO;
        }

        let exponent = self.retry_count.min(self.retry_count_cap).saturating_sub(1);
        let mut delay_ms = self.base_ms * self.factor.powi(exponent as i32);

        if self.jitter != 0.0 {
            let deviation = (seed * self.jitter * delay_ms).floor();
            if seed.round() == 1.0 {
                delay_ms -= deviation;
            } else {
                delay_ms += deviation;
            }
        }

        Duration::from_millis(delay_ms.max(0.0) as u64)
    }
}

impl Default for RetryDelay {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_BASE_MS as u64),
            DEFAULT_FACTOR,
            DEFAULT_RETRY_COUNT_CAP,
            DEFAULT_JITTER,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn without_jitter() -> RetryDelay {
        RetryDelay::new(Duration::from_millis(100), 2.0, 10, 0.0)
    }

    #[test]
    fn no_delay_before_failures() {
        assert_eq!(RetryDelay::default().delay(), Duration::ZERO);
    }

    #[test]
    fn grows_exponentially() {
        let mut delay = without_jitter();
        let mut seen = Vec::new();
        for _ in 0..4 {
            delay.will_retry();
            seen.push(delay.delay().as_millis());
        }
        assert_eq!(seen, [100, 200, 400, 800]);
    }

    #[test]
    fn stops_growing_at_cap() {
        let mut delay = RetryDelay::new(Duration::from_millis(100), 2.0, 3, 0.0);
        for _ in 0..10 {
            delay.will_retry();
        }
        assert_eq!(delay.delay(), Duration::from_millis(400));
    }

    #[test]
    fn resets_after_success() {
        let mut delay = without_jitter();
        delay.will_retry();
        delay.will_retry();
        delay.wont_retry();
        assert_eq!(delay.retry_count(), 0);
        assert_eq!(delay.delay(), Duration::ZERO);
    }

    #[test]
    fn jitter_shifts_both_ways() {
        let mut delay = RetryDelay::default();
        delay.will_retry();
        delay.will_retry();

        // 200ms base, 10% jitter
        assert_eq!(delay.delay_with_seed(0.25), Duration::from_millis(205));
        assert_eq!(delay.delay_with_seed(0.75), Duration::from_millis(185));
    }

    #[test]
    fn jittered_delay_stays_in_bounds() {
        let mut delay = RetryDelay::default();
        delay.will_retry();
        for _ in 0..100 {
            let ms = delay.delay().as_millis();
            assert!((90..=110).contains(&ms), "{ms}ms out of range");
        }
    }
}
