//! Building blocks for retry-safe writes.
//!
//! A write is identified by its endpoint plus a [`PayloadHash`] of its body.
//! The transport mints one [`IdempotencyKey`] per identity and keeps sending
//! it for as long as [`IdempotencyConfig`] allows, so a server that saw the
//! first attempt can recognise the retries.

mod config;
mod key;
mod payload;

pub use config::IdempotencyConfig;
pub use key::IdempotencyKey;
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash};

#[cfg(test)]
mod tests;
