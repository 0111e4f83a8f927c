use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Best-effort in-memory guard against button mashing: a sliding window of
/// recent presses per user. Not persisted; a restart clears it.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<i64, VecDeque<Instant>>>>,
    max_hits: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_hits: usize, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_hits,
            window,
        }
    }

    /// Record one event and report whether the user is still inside the
    /// allowance. Rejected events are not recorded, so a spammer is not
    /// locked out forever by their own rejections.
    pub async fn check(&self, tg_id: i64) -> bool {
        let now = Instant::now();
        let mut map = self.inner.lock().await;
        let hits = map.entry(tg_id).or_default();
        while let Some(front) = hits.front() {
            if now.duration_since(*front) > self.window {
                hits.pop_front();
            } else {
                break;
            }
        }
        if hits.len() >= self.max_hits {
            return false;
        }
        hits.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_cap_then_blocks() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check(1).await);
        assert!(limiter.check(1).await);
        assert!(limiter.check(1).await);
        assert!(!limiter.check(1).await);
        // A different user has their own window.
        assert!(limiter.check(2).await);
    }

    #[tokio::test]
    async fn window_slides_open_again() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));
        assert!(limiter.check(1).await);
        assert!(limiter.check(1).await);
        assert!(!limiter.check(1).await);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.check(1).await);
    }
}
