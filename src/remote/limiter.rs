use std::thread;
use std::time::{Duration, Instant};

/// Token-bucket gate bounding the long-run call rate to `capacity` calls per
/// `period`, with bursts allowed up to `capacity`.
///
/// A limiter is a single shared counter, not a per-caller queue: it makes no
/// fairness guarantee, and `acquire` takes `&mut self` so concurrent workers
/// must either serialize access or split the budget across their own limiters.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    period: Duration,
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(capacity: u32, period: Duration) -> Self {
        Self {
            capacity: f64::from(capacity),
            period,
            tokens: f64::from(capacity),
            last_refill: Instant::now(),
        }
    }

    /// Consume one token, sleeping for exactly the time needed to refill one
    /// when the bucket is empty. Never fails.
    pub fn acquire(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let rate = self.capacity / self.period.as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens < 1.0 {
            let wait = Duration::from_secs_f64((1.0 - self.tokens) / rate);
            thread::sleep(wait);
            self.last_refill = Instant::now();
            self.tokens = 0.0;
        } else {
            self.tokens -= 1.0;
        }
    }
}
