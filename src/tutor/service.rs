//! Tutor service coordinating ingestion, retrieval, and answer generation.

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    generation::{GenerationClient, GenerationRequest, get_generation_client},
    index::QdrantIndex,
    ingest::{chunk_pages, extract_pages},
    metrics::{MetricsSnapshot, TutorMetrics},
    tutor::{
        prompts::{build_chat_prompt, build_exam_prompt, build_flashcard_prompt},
        types::{
            ChatTurn, IngestOutcome, Mode, TutorError, parse_exam_count, validate_exam_output,
            validate_flashcard_output,
        },
    },
};
use async_trait::async_trait;
use std::sync::Arc;

/// Sampling temperature for conversational answers.
const CHAT_TEMPERATURE: f32 = 0.7;
/// Lower temperature for the JSON modes to keep the output shape stable.
const STRUCTURED_TEMPERATURE: f32 = 0.1;

/// Coordinates the full pipeline: extraction, chunking, embedding, indexing,
/// retrieval, and answer generation.
///
/// The service owns long-lived handles to the embedding client, generation
/// client, index transport, and metrics registry. Construct it once near
/// process start and share it through an `Arc`; there is no other mutable
/// process-wide state.
pub struct TutorService {
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    generation_client: Box<dyn GenerationClient + Send + Sync>,
    index: QdrantIndex,
    metrics: Arc<TutorMetrics>,
}

/// Abstraction over the tutor pipeline consumed by the HTTP surface.
#[async_trait]
pub trait TutorApi: Send + Sync {
    /// Extract, chunk, embed, and index one uploaded document.
    ///
    /// A document yielding no extractable text produces an outcome with zero
    /// chunks rather than an error; the caller decides whether to reject it.
    async fn ingest_document(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome, TutorError>;

    /// Answer a question in the requested mode using retrieved context.
    async fn answer(
        &self,
        question: &str,
        history: &[ChatTurn],
        mode: Mode,
    ) -> Result<String, TutorError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl TutorService {
    /// Build a new tutor service, failing fast when the store is unreachable
    /// or the collection cannot be created.
    pub async fn new() -> Result<Self, TutorError> {
        tracing::info!("Initializing embedding and generation clients");
        let embedding_client = get_embedding_client();
        let generation_client = get_generation_client();

        let index = QdrantIndex::new().map_err(TutorError::from)?;
        index.ensure_collection().await?;
        tracing::debug!("Document collection ready");

        Ok(Self {
            embedding_client,
            generation_client,
            index,
            metrics: Arc::new(TutorMetrics::new()),
        })
    }

    async fn ingest_document(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome, TutorError> {
        tracing::info!(filename, size = bytes.len(), "Ingesting document");
        let config = get_config();

        let pages = extract_pages(bytes);
        if pages.is_empty() {
            tracing::warn!(filename, "Document yielded no extractable text");
            return Ok(IngestOutcome {
                chunks_added: 0,
                pages: 0,
            });
        }

        let chunks = chunk_pages(
            &pages,
            config.text_splitter_chunk_size,
            config.text_splitter_chunk_overlap,
        )?;
        if chunks.is_empty() {
            return Ok(IngestOutcome {
                chunks_added: 0,
                pages: pages.len(),
            });
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedding_client.generate_embeddings(texts).await?;
        let chunks_added = self.index.append_chunks(&chunks, embeddings, filename).await?;

        self.metrics.record_document(chunks_added as u64);
        tracing::info!(
            filename,
            pages = pages.len(),
            chunks = chunks_added,
            "Document indexed"
        );

        Ok(IngestOutcome {
            chunks_added,
            pages: pages.len(),
        })
    }

    async fn answer(
        &self,
        question: &str,
        history: &[ChatTurn],
        mode: Mode,
    ) -> Result<String, TutorError> {
        let config = get_config();

        let mut vectors = self
            .embedding_client
            .generate_embeddings(vec![question.to_string()])
            .await?;
        let vector = vectors.pop().ok_or_else(|| {
            TutorError::MalformedModelOutput("embedding provider returned no vector".into())
        })?;

        let context = self.index.query(vector, config.retrieval_top_k).await?;
        tracing::debug!(mode = ?mode, hits = context.len(), "Retrieved context");

        let (prompt, temperature) = match mode {
            Mode::Chat => (
                build_chat_prompt(history, &context, question),
                CHAT_TEMPERATURE,
            ),
            Mode::Exam => (
                build_exam_prompt(&context, parse_exam_count(question)),
                STRUCTURED_TEMPERATURE,
            ),
            Mode::Flashcard => (build_flashcard_prompt(&context), STRUCTURED_TEMPERATURE),
        };

        let raw = self
            .generation_client
            .generate(GenerationRequest {
                model: config.chat_model.clone(),
                prompt,
                temperature,
            })
            .await?;

        let answer = match mode {
            Mode::Chat => raw,
            Mode::Exam => validate_exam_output(&raw, parse_exam_count(question))?,
            Mode::Flashcard => validate_flashcard_output(&raw)?,
        };

        self.metrics.record_question();
        tracing::info!(mode = ?mode, answer_len = answer.len(), "Question answered");
        Ok(answer)
    }

    /// Return the current ingestion and answering counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl TutorApi for TutorService {
    async fn ingest_document(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome, TutorError> {
        TutorService::ingest_document(self, filename, bytes).await
    }

    async fn answer(
        &self,
        question: &str,
        history: &[ChatTurn],
        mode: Mode,
    ) -> Result<String, TutorError> {
        TutorService::answer(self, question, history, mode).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        TutorService::metrics_snapshot(self)
    }
}
