//! Helpers for constructing and hashing index point payloads.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ingest::DocumentChunk;

/// Build the payload object stored alongside each indexed chunk.
pub(crate) fn build_payload(chunk: &DocumentChunk, source: &str, timestamp_rfc3339: &str) -> Value {
    let mut payload = Map::new();
    payload.insert("text".into(), Value::String(chunk.text.clone()));
    payload.insert("source".into(), Value::String(source.to_string()));
    payload.insert("page".into(), Value::from(chunk.page));
    payload.insert("chunk_index".into(), Value::from(chunk.chunk_index));
    payload.insert(
        "chunk_hash".into(),
        Value::String(compute_chunk_hash(&chunk.text)),
    );
    payload.insert(
        "timestamp".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Compute a deterministic SHA-256 hash for the chunk text.
///
/// Stored for provenance only; the index is append-only and the hash is never
/// consulted before insertion.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct a fresh point identifier; every upsert inserts, never updates.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}
