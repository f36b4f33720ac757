use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};

/// Rate limiter for outbound provider calls during backfill.
///
/// The free tiers in play are tight (Alpha Vantage 5 req/min is the
/// binding one), so besides capping concurrency a minimum delay is
/// enforced between consecutive acquisitions.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    /// `max_concurrent` caps in-flight requests; `requests_per_minute`
    /// sets the minimum spacing between calls.
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / requests_per_minute as u64;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(60))),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Blocks until a permit is free and the inter-call spacing has
    /// elapsed. The permit releases on drop.
    pub async fn acquire(&self) -> RateLimitGuard {
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();

        let wait_time = {
            let last = self.last_request.lock();
            let elapsed = last.elapsed();
            (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
        }; // lock dropped before sleeping

        if let Some(delay) = wait_time {
            sleep(delay).await;
        }

        *self.last_request.lock() = Instant::now();
        RateLimitGuard { _permit: permit }
    }
}

pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn enforces_minimum_delay() {
        // 60 per minute = 1s spacing
        let limiter = RateLimiter::new(2, 60);
        let start = StdInstant::now();

        let guard = limiter.acquire().await;
        assert!(start.elapsed().as_millis() < 100);
        drop(guard);

        let _guard = limiter.acquire().await;
        assert!(start.elapsed().as_millis() >= 900);
    }
}
