//! Outbound adapters: HTTP transport, persistence backends, and default
//! collaborators.

pub mod http;
mod logging;
mod notify;
pub mod persistence;
mod session;

pub use logging::TracingFailureLogger;
pub use notify::{ChannelNotifier, TracingNotifier};
pub use session::WatchSessionProvider;
