//! Guard rails for outbound API traffic: a token-bucket rate limiter and an
//! exponential-backoff retry policy. Both block the calling thread; callers on
//! an async runtime should hop through `spawn_blocking` first.

mod limiter;
mod retry;

pub use limiter::RateLimiter;
pub use retry::{Retryable, RetryPolicy};
