//! Qdrant-backed vector index for document chunks.

pub mod client;
pub mod payload;
pub mod types;

pub use client::QdrantIndex;
pub use payload::compute_chunk_hash;
pub use types::{IndexError, RetrievedChunk};
