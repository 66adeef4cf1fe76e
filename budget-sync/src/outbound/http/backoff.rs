//! Sleep and jitter seams for the retry loop.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// Waits between attempts.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Spreads retry delays so clients do not retry in lock step.
pub trait BackoffJitter: Send + Sync {
    /// Return the delay to actually wait for retry number `retry`.
    fn jittered_delay(&self, base: Duration, retry: u32) -> Duration;
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform ±25% jitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl RandomJitter {
    const SPREAD: f64 = 0.25;
}

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, _retry: u32) -> Duration {
        let factor = rand::thread_rng().gen_range((1.0 - Self::SPREAD)..=(1.0 + Self::SPREAD));
        base.mul_f64(factor)
    }
}
