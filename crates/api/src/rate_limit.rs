use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Once the map holds this many distinct keys, stale entries are swept
/// on the next call so one-off callers do not accumulate forever.
const IDLE_SWEEP_THRESHOLD: usize = 1024;

/// Sliding-window request limiter keyed by caller address.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    hits: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    /// Records a hit for `key` and reports whether it stays under the cap.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let window = self.window;
        let mut hits = self.hits.lock();

        if hits.len() > IDLE_SWEEP_THRESHOLD {
            hits.retain(|_, stamps| {
                stamps.retain(|stamp| now.duration_since(*stamp) <= window);
                !stamps.is_empty()
            });
        }

        let stamps = hits.entry(key.to_string()).or_default();
        stamps.retain(|stamp| now.duration_since(*stamp) <= window);

        if stamps.len() >= self.max_requests {
            return false;
        }

        stamps.push(now);
        true
    }
}
