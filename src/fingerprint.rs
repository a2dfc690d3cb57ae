//! Content fingerprints for caller-side caching.
//!
//! The core never caches plans itself; callers that do can key their cache on
//! [`request_fingerprint`], which changes whenever the question, the schema
//! snapshot, or the target dialect changes.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::sql::{Dialect, SqlDialect};

/// Compute the SHA-256 hash of a serializable value.
///
/// The value is serialized to JSON before hashing, so map-ordered inputs
/// hash deterministically. Returns 64 lowercase hex characters.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(hex_digest(json.as_bytes()))
}

/// Fingerprint of one compile request.
pub fn request_fingerprint(text: &str, schema_fingerprint: &str, dialect: Dialect) -> String {
    let mut hasher = Sha256::new();
    for part in [text.trim(), schema_fingerprint, dialect.name()] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
