//! Per-IP rate-limit table (spec §5, §8 invariant 8). The one piece of
//! contended mutable state in the process; everything else (synonym
//! index, static corpora) is read-only after startup.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Window {
    count: u32,
    started_at: Instant,
}

/// Fixed-window counter, not sliding: a window starts on an IP's first
/// request and resets once `window` has elapsed since that start.
pub struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, Window>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Records a request from `ip`. Returns `true` if it's allowed,
    /// `false` if the IP has exhausted its window (caller should
    /// respond 429 with `Retry-After`).
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limit mutex poisoned");

        sweep_stale(&mut windows, now, self.window);

        match windows.get_mut(&ip) {
            Some(w) if now.duration_since(w.started_at) >= self.window => {
                w.started_at = now;
                w.count = 1;
                true
            }
            Some(w) => {
                if w.count >= self.max_requests {
                    false
                } else {
                    w.count += 1;
                    true
                }
            }
            None => {
                windows.insert(ip, Window { count: 1, started_at: now });
                true
            }
        }
    }
}

/// Lazily drops entries whose window has long since expired, so the
/// map doesn't grow unbounded with one-off callers. Piggybacks on every
/// `check` call rather than running a background task.
fn sweep_stale(windows: &mut HashMap<IpAddr, Window>, now: Instant, window: Duration) {
    windows.retain(|_, w| now.duration_since(w.started_at) < window * 2);
}
