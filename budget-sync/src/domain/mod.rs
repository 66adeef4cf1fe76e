//! Domain primitives, ports, and the optimistic mutation coordinator.
//!
//! Purpose: define strongly typed domain entities and the failure taxonomy
//! used by every adapter. Nothing in this module performs I/O directly;
//! persistence and collaborators are reached through [`ports`].

pub mod coordinator;
mod category;
mod entity;
mod error;
mod failure_reporter;
pub mod idempotency;
mod money;
mod notification;
mod owner;
pub mod ports;
mod trace_id;
mod transaction;

pub use self::category::{Category, CategoryPatch, NewCategory};
pub use self::coordinator::{MutationCoordinator, MutationState, PendingMutation, follow_session};
pub use self::entity::{EmptyEntityId, EntityId, EntryType, SyncEntity, UnknownEntryType};
pub use self::error::{Error, FailureKind};
pub use self::failure_reporter::FailureReporter;
pub use self::money::{Amount, AmountValidationError};
pub use self::notification::{Notification, NotificationLevel};
pub use self::owner::{OwnerId, OwnerIdValidationError};
pub use self::trace_id::TraceId;
pub use self::transaction::{NewTransaction, Transaction, TransactionParts, TransactionPatch};
