//! Identity and behaviour shared by every synchronised entity.
//!
//! Entities are addressed by [`EntityId`], never by position, so a
//! confirmation or rollback that settles late still finds the right entity
//! after other mutations have reordered the collection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OwnerId;

const TEMPORARY_PREFIX: &str = "tmp-";

/// Identity of an entity in a local view or a backend.
///
/// A temporary id is minted locally when an entity is created optimistically;
/// it is replaced (never merged) by the canonical id once the backend
/// confirms the create.
///
/// # Examples
/// ```
/// use budget_sync::domain::EntityId;
///
/// let temporary = EntityId::temporary();
/// assert!(temporary.is_temporary());
/// assert!(temporary.to_string().starts_with("tmp-"));
///
/// let canonical = EntityId::canonical("tx-1");
/// assert!(!canonical.is_temporary());
/// assert_eq!(canonical.to_string().parse::<EntityId>(), Ok(canonical));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityId {
    /// Backend-assigned identity.
    Canonical(String),
    /// Locally generated identity pending confirmation.
    Temporary(Uuid),
}

impl EntityId {
    /// Mint a fresh temporary id.
    #[must_use]
    pub fn temporary() -> Self {
        Self::Temporary(Uuid::new_v4())
    }

    /// Wrap a backend-assigned id.
    pub fn canonical(id: impl Into<String>) -> Self {
        Self::Canonical(id.into())
    }

    /// Whether the id is still awaiting backend confirmation.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(id) => f.write_str(id),
            Self::Temporary(uuid) => write!(f, "{TEMPORARY_PREFIX}{uuid}"),
        }
    }
}

/// Error returned when parsing an empty entity id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyEntityId;

impl fmt::Display for EmptyEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity id must not be empty")
    }
}

impl std::error::Error for EmptyEntityId {}

impl std::str::FromStr for EntityId {
    type Err = EmptyEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(EmptyEntityId);
        }
        let temporary = s
            .strip_prefix(TEMPORARY_PREFIX)
            .and_then(|rest| Uuid::parse_str(rest).ok());
        Ok(match temporary {
            Some(uuid) => Self::Temporary(uuid),
            None => Self::Canonical(s.to_owned()),
        })
    }
}

impl TryFrom<String> for EntityId {
    type Error = EmptyEntityId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.to_string()
    }
}

/// Direction of money flow; shared by transactions and categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl EntryType {
    /// Wire name of the variant.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entry type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntryType(pub String);

impl fmt::Display for UnknownEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry type must be income or expense, got {:?}", self.0)
    }
}

impl std::error::Error for UnknownEntryType {}

impl std::str::FromStr for EntryType {
    type Err = UnknownEntryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(UnknownEntryType(other.to_owned())),
        }
    }
}

/// Behaviour the mutation coordinator and the backends need from an entity.
///
/// `Draft` is the caller-supplied data for a create; `Patch` is a partial
/// update where `None` fields are left untouched.
pub trait SyncEntity: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Caller-supplied fields for a create.
    type Draft: Clone + fmt::Debug + Send + Sync + 'static;
    /// Partial update applied by `update`.
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    /// Collection name used in URL paths and store file names.
    const COLLECTION: &'static str;

    /// Singular noun used in user-facing messages.
    const NOUN: &'static str;

    /// Identity of this entity.
    fn id(&self) -> &EntityId;

    /// Owner of this entity.
    fn owner_id(&self) -> &OwnerId;

    /// Build an entity from a draft with the given identity.
    fn from_draft(
        id: EntityId,
        owner_id: OwnerId,
        draft: &Self::Draft,
        created_at: DateTime<Utc>,
    ) -> Self;

    /// Apply the set fields of `patch` in place.
    fn apply_patch(&mut self, patch: &Self::Patch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_ids_round_trip_through_strings() {
        let id = EntityId::temporary();
        let parsed: EntityId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
        assert!(parsed.is_temporary());
    }

    #[test]
    fn prefixed_non_uuid_stays_canonical() {
        let parsed: EntityId = "tmp-not-a-uuid".parse().expect("parse");
        assert_eq!(parsed, EntityId::canonical("tmp-not-a-uuid"));
    }

    #[test]
    fn empty_ids_are_rejected() {
        assert_eq!("".parse::<EntityId>(), Err(EmptyEntityId));
    }

    #[test]
    fn entry_type_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&EntryType::Expense).expect("serialise");
        assert_eq!(json, "\"expense\"");
        assert_eq!("income".parse::<EntryType>(), Ok(EntryType::Income));
        assert!("transfer".parse::<EntryType>().is_err());
    }
}
