//! Content fingerprints for uploaded fonts.
//!
//! A fingerprint is the lowercase hex SHA-256 of the complete font binary.
//! Two uploads with equal fingerprints are treated as the same font.

use crate::error::{PadError, Result};
use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Fonts larger than this are hashed on the blocking pool.
const BLOCKING_THRESHOLD: usize = 1024 * 1024;

/// Compute the fingerprint of `data`.
pub fn compute_fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compute the fingerprint without blocking the async runtime on big fonts.
pub async fn compute_fingerprint_async(data: Bytes) -> Result<String> {
    if data.len() < BLOCKING_THRESHOLD {
        return Ok(compute_fingerprint(&data));
    }
    tokio::task::spawn_blocking(move || compute_fingerprint(&data))
        .await
        .map_err(|e| PadError::Other(format!("Fingerprint task failed: {}", e)))
}
