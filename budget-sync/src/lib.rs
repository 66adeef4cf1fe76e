//! Resilient data synchronisation for a personal budget tracker.
//!
//! The crate keeps an owner-scoped, in-memory view of budget entities that
//! the UI mutates optimistically, and reconciles every change with either an
//! embedded durable store or a remote REST API reached through a retrying,
//! idempotent HTTP transport.
//!
//! - [`domain`]: entities, the failure taxonomy, ports, and the
//!   [`domain::MutationCoordinator`].
//! - [`outbound`]: the HTTP transport, persistence backends, and default
//!   logger/notifier/session adapters.
//! - [`settings`]: deployment configuration.

pub mod domain;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
