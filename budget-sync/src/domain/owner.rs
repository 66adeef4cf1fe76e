//! Owner identity scoping every entity to one user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`OwnerId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerIdValidationError {
    Empty,
    SurroundingWhitespace,
}

impl fmt::Display for OwnerIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "owner id must not be empty"),
            Self::SurroundingWhitespace => {
                write!(f, "owner id must not start or end with whitespace")
            }
        }
    }
}

impl std::error::Error for OwnerIdValidationError {}

/// Opaque identifier of the user that owns a collection.
///
/// The value is supplied by the session provider and never interpreted; it
/// only needs to be non-empty so it can key stores and URL paths.
///
/// # Examples
/// ```
/// use budget_sync::domain::OwnerId;
///
/// let owner = OwnerId::new("user-42").expect("valid owner id");
/// assert_eq!(owner.as_ref(), "user-42");
/// assert!(OwnerId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Validate and construct an [`OwnerId`].
    pub fn new(id: impl AsRef<str>) -> Result<Self, OwnerIdValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, OwnerIdValidationError> {
        if id.is_empty() {
            return Err(OwnerIdValidationError::Empty);
        }
        if id.trim() != id {
            return Err(OwnerIdValidationError::SurroundingWhitespace);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = OwnerIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}
