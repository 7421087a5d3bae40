//! Document ingestion: PDF text extraction and chunking.

pub mod chunking;
pub mod pdf;
pub mod types;

pub use chunking::{chunk_pages, chunk_text};
pub use pdf::extract_pages;
pub use types::{DocumentChunk, IngestError, PageText};
