//! How long a minted key is reused.

use std::time::Duration;

const SECONDS_PER_HOUR: u64 = 3600;
const DEFAULT_HOURS: u64 = 24;
// A key must outlive the longest retry sequence; ten years is plenty.
const MIN_HOURS: u64 = 1;
const MAX_HOURS: u64 = 24 * 365 * 10;

/// Reuse window for idempotency keys, measured from when a key was minted.
///
/// ```
/// # use budget_sync::domain::idempotency::IdempotencyConfig;
/// # use std::time::Duration;
/// assert_eq!(IdempotencyConfig::default().ttl(), Duration::from_secs(86_400));
/// assert_eq!(IdempotencyConfig::from_hours(Some(0)).ttl(), Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
}

impl IdempotencyConfig {
    /// Window of `hours` (24 when absent), clamped to one hour .. ten years.
    #[must_use]
    pub fn from_hours(hours: Option<u64>) -> Self {
        let hours = hours.unwrap_or(DEFAULT_HOURS).clamp(MIN_HOURS, MAX_HOURS);
        Self {
            ttl: Duration::from_secs(hours * SECONDS_PER_HOUR),
        }
    }

    /// Unclamped window; sub-hour values are only useful in tests.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a key minted `age` ago must be replaced.
    pub fn has_lapsed(&self, age: Duration) -> bool {
        age >= self.ttl
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self::from_hours(None)
    }
}
