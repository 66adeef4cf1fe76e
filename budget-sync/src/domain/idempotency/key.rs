//! The token carried in the `Idempotency-Key` header.

use std::fmt;

use uuid::Uuid;

/// Names one logical mutation across all of its retries.
///
/// Keys are minted on the client and never parsed back, so there is no
/// validating constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Fresh UUID v4 key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}
