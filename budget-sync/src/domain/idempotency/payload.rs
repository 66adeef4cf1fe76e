//! Order-insensitive digest of a JSON request body.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// The body could not be encoded while hashing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot encode request body for hashing: {message}")]
pub struct PayloadHashError {
    message: String,
}

/// SHA-256 of a body's canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Lower-case hex form, for logs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Hash `value` so that object key order and whitespace do not matter.
///
/// The canonical form is compact JSON with object keys sorted at every depth.
/// It is streamed straight into the hasher rather than built up first.
///
/// # Errors
///
/// Returns [`PayloadHashError`] when a scalar cannot be encoded.
pub fn canonicalize_and_hash(value: &Value) -> Result<PayloadHash, PayloadHashError> {
    let mut hasher = Sha256::new();
    feed(value, &mut hasher)?;
    Ok(PayloadHash(hasher.finalize().into()))
}

fn feed(value: &Value, hasher: &mut Sha256) -> Result<(), PayloadHashError> {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_unstable_by(|a, b| a.0.cmp(b.0));
            hasher.update(b"{");
            for (index, (name, field)) in fields.into_iter().enumerate() {
                if index > 0 {
                    hasher.update(b",");
                }
                hasher.update(encode(name)?);
                hasher.update(b":");
                feed(field, hasher)?;
            }
            hasher.update(b"}");
        }
        Value::Array(items) => {
            hasher.update(b"[");
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    hasher.update(b",");
                }
                feed(item, hasher)?;
            }
            hasher.update(b"]");
        }
        scalar => hasher.update(encode(scalar)?),
    }
    Ok(())
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PayloadHashError> {
    serde_json::to_vec(value).map_err(|err| PayloadHashError {
        message: err.to_string(),
    })
}
