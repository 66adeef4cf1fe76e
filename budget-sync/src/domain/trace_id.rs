//! Correlation id shared by every attempt of one request.

use std::fmt;

use uuid::Uuid;

/// Sent as `x-trace-id` and copied into the failure record, so a logged
/// failure can be matched against every attempt the server saw.
///
/// ```
/// use budget_sync::TraceId;
///
/// let id = TraceId::generate();
/// assert_eq!(id.to_string().len(), 36);
/// assert_ne!(id, TraceId::generate());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_a_hyphenated_v4_uuid() {
        let id = TraceId::generate();
        let parsed = Uuid::parse_str(&id.to_string()).expect("uuid text");

        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed, id.0);
    }
}
