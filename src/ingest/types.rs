//! Core data types and error definitions for the ingestion pipeline.

use thiserror::Error;

/// Errors produced while turning extracted text into chunks.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Splitter configured with an impossible character budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for fresh content in every chunk.
    #[error("chunk overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapTooLarge {
        /// Configured overlap in characters.
        overlap: usize,
        /// Configured chunk size in characters.
        chunk_size: usize,
    },
}

/// Text extracted from a single PDF page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// One-based page number within the source document.
    pub page: u32,
    /// Raw text content extracted from the page.
    pub text: String,
}

/// A chunk of document text ready for embedding.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    /// Chunk content with surrounding whitespace removed.
    pub text: String,
    /// One-based page number the chunk was extracted from.
    pub page: u32,
    /// Zero-based position of the chunk within the document.
    pub chunk_index: usize,
}
