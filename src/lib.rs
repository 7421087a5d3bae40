#![deny(missing_docs)]

//! Core library for the Rusty Tutor study server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Text-generation client for answer synthesis.
pub mod generation;
/// Qdrant vector index integration.
pub mod index;
/// PDF ingestion and chunking pipeline.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and answering metrics helpers.
pub mod metrics;
/// Tutor pipeline: prompts, modes, and answer generation.
pub mod tutor;
