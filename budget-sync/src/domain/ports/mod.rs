//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod entity_backend;
mod failure_logger;
mod notifier;
mod session_provider;

pub use entity_backend::EntityBackend;
#[cfg(test)]
pub use failure_logger::MockFailureLogger;
pub use failure_logger::{FailureLogError, FailureLogger, FailureRecord};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notifier, NotifierError};
pub use session_provider::SessionProvider;
