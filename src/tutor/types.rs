//! Request modes, model-output shapes, and validation for tutor answers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::EmbeddingClientError;
use crate::generation::GenerationClientError;
use crate::index::IndexError;
use crate::ingest::IngestError;

/// Number of flashcards requested from the model per generation.
pub const FLASHCARD_COUNT: usize = 4;

/// Exam question count used when the caller's request cannot be parsed.
pub const DEFAULT_EXAM_COUNT: usize = 3;

/// Upper bound on the number of exam questions per request.
pub const MAX_EXAM_COUNT: usize = 20;

/// Answering mode selecting the prompt template and output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Free-form conversational answer grounded in retrieved context.
    #[default]
    Chat,
    /// JSON array of short-answer exam questions.
    Exam,
    /// JSON array of front/back flashcards.
    Flashcard,
}

/// One turn of conversation supplied by the caller.
///
/// The server keeps no session state; the full history arrives on every
/// request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatTurn {
    /// Speaker label, typically `user` or `assistant`.
    pub role: String,
    /// Utterance content for this turn.
    pub content: String,
}

/// A single short-answer exam question produced by the model.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExamItem {
    /// One-based question number.
    pub id: u64,
    /// Question text.
    pub question: String,
    /// Model answer for grading reference.
    pub answer: String,
}

/// A single study flashcard produced by the model.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Flashcard {
    /// Prompt side shown to the student.
    pub front: String,
    /// Answer side revealed after recall.
    pub back: String,
}

/// Result of ingesting one uploaded document.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    /// Number of chunks embedded and appended to the index.
    pub chunks_added: usize,
    /// Number of pages that yielded extractable text.
    pub pages: usize,
}

/// Errors surfaced by the tutor pipeline.
#[derive(Debug, Error)]
pub enum TutorError {
    /// No documents have ever been indexed; retrieval cannot run.
    #[error("No documents have been uploaded yet")]
    EmptyIndex,
    /// Chunking rejected the configured splitter parameters.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// Embedding provider failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// Vector store operation failed.
    #[error(transparent)]
    Index(IndexError),
    /// Generation provider failed.
    #[error(transparent)]
    Generation(#[from] GenerationClientError),
    /// The model's output did not match the requested JSON shape.
    #[error("Model returned malformed output: {0}")]
    MalformedModelOutput(String),
}

impl From<IndexError> for TutorError {
    fn from(error: IndexError) -> Self {
        match error {
            IndexError::Empty => Self::EmptyIndex,
            other => Self::Index(other),
        }
    }
}

/// Interpret the question field of an exam request as a question count.
///
/// The caller reuses the question string to carry N; anything unparseable
/// falls back to the default, and the result is clamped to a sane range.
pub fn parse_exam_count(question: &str) -> usize {
    question
        .trim()
        .parse::<usize>()
        .unwrap_or(DEFAULT_EXAM_COUNT)
        .clamp(1, MAX_EXAM_COUNT)
}

/// Remove Markdown code-fence markers the model wraps around JSON output.
pub fn strip_code_fences(text: &str) -> &str {
    let mut inner = text.trim();
    if let Some(rest) = inner.strip_prefix("```") {
        inner = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = inner.strip_suffix("```") {
        inner = rest;
    }
    inner.trim()
}

/// Parse and validate exam output, re-serializing it in canonical form.
pub fn validate_exam_output(raw: &str, expected: usize) -> Result<String, TutorError> {
    let stripped = strip_code_fences(raw);
    let items: Vec<ExamItem> = serde_json::from_str(stripped).map_err(|error| {
        TutorError::MalformedModelOutput(format!(
            "exam output is not a JSON array of questions: {error}"
        ))
    })?;
    if items.len() != expected {
        return Err(TutorError::MalformedModelOutput(format!(
            "expected {expected} exam questions, got {}",
            items.len()
        )));
    }
    serde_json::to_string(&items)
        .map_err(|error| TutorError::MalformedModelOutput(error.to_string()))
}

/// Parse and validate flashcard output, re-serializing it in canonical form.
pub fn validate_flashcard_output(raw: &str) -> Result<String, TutorError> {
    let stripped = strip_code_fences(raw);
    let cards: Vec<Flashcard> = serde_json::from_str(stripped).map_err(|error| {
        TutorError::MalformedModelOutput(format!(
            "flashcard output is not a JSON array of cards: {error}"
        ))
    })?;
    if cards.len() != FLASHCARD_COUNT {
        return Err(TutorError::MalformedModelOutput(format!(
            "expected {FLASHCARD_COUNT} flashcards, got {}",
            cards.len()
        )));
    }
    serde_json::to_string(&cards)
        .map_err(|error| TutorError::MalformedModelOutput(error.to_string()))
}
