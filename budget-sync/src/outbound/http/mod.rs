//! HTTP transport adapter.
//!
//! [`HttpTransport`] knows nothing about budget entities; the remote
//! persistence backend builds URLs and DTOs on top of it.

mod backoff;
mod config;
mod error;
mod executor;
mod idempotency_cache;
mod in_flight;
mod transport;


pub use backoff::{BackoffJitter, RandomJitter, RetrySleeper, TokioSleeper};
pub use config::{Backoff, HttpMethod, RequestConfig, RetryPolicy};
pub use error::{RequestFailure, TransportError};
#[cfg(test)]
pub use executor::MockHttpExecutor;
pub use executor::{HttpExecutor, OutgoingRequest, RawResponse, ReqwestExecutor};
pub use idempotency_cache::IdempotencyCache;
pub use transport::{
    CLIENT_TIMESTAMP_HEADER, HttpTransport, IDEMPOTENCY_KEY_HEADER, TRACE_ID_HEADER,
    TransportRuntime, TransportSettings,
};
