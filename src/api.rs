//! HTTP surface for Rusty Tutor.
//!
//! This module exposes a compact Axum router with three endpoints:
//!
//! - `POST /api/documents/upload` – Accept a multipart PDF upload, persist the raw file,
//!   extract and chunk its text, embed the chunks, and append them to the vector index.
//!   Returns `201 {filename, message, chunks_added}`; uploads without extractable text
//!   are rejected with `400`.
//! - `POST /api/chat/` – Answer a question about the uploaded material in one of three
//!   modes (`chat`, `exam`, `flashcard`). Failures are reported inside the `answer`
//!   field with an `Error:` prefix rather than as HTTP errors.
//! - `GET /` – Liveness message.
//!
//! The two endpoints deliberately signal failure differently: the upload path speaks
//! HTTP status codes, the chat path embeds error text in a normal response body.

use crate::config::get_config;
use crate::tutor::{ChatTurn, Mode, TutorApi, TutorError};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Maximum accepted upload size in bytes.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Answer prefix used when a chat-path failure is embedded in the response.
const ERROR_MARKER: &str = "Error:";

/// Build the HTTP router exposing the tutor API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: TutorApi + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/api/documents/upload", post(upload_document::<S>))
        .route("/api/chat/", post(chat::<S>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

/// Liveness route mirroring the upload/chat API prefix.
async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Rusty Tutor is running" }))
}

/// Success response for the upload endpoint.
#[derive(Serialize)]
struct UploadResponse {
    /// Original filename as supplied by the client.
    filename: String,
    /// Human-readable confirmation message.
    message: String,
    /// Number of chunks appended to the index for this upload.
    chunks_added: usize,
}

/// Accept a PDF upload, persist it, and index its text.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError>
where
    S: TutorApi,
{
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|error| {
        AppError::bad_request(format!("Malformed multipart body: {error}"))
    })? {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(ToString::to_string)
                .ok_or_else(|| AppError::bad_request("File part is missing a filename"))?;
            let bytes = field.bytes().await.map_err(|error| {
                AppError::bad_request(format!("Failed to read file part: {error}"))
            })?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload
        .ok_or_else(|| AppError::bad_request("Request is missing a 'file' part"))?;

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::bad_request("Only PDF documents are supported"));
    }

    persist_upload(&filename, &bytes).await?;

    let outcome = service.ingest_document(&filename, &bytes).await?;
    if outcome.chunks_added == 0 {
        return Err(AppError::bad_request(
            "No extractable text found in the document",
        ));
    }

    tracing::info!(
        filename = %filename,
        pages = outcome.pages,
        chunks_added = outcome.chunks_added,
        "Upload completed"
    );
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: format!("'{filename}' uploaded and indexed successfully"),
            filename,
            chunks_added: outcome.chunks_added,
        }),
    ))
}

/// Write the raw upload into the uploads directory, kept indefinitely.
async fn persist_upload(filename: &str, bytes: &[u8]) -> Result<(), AppError> {
    // Strip any client-supplied directory components before touching disk.
    let basename = Path::new(filename)
        .file_name()
        .ok_or_else(|| AppError::bad_request("Invalid filename"))?;
    let destination = get_config().upload_dir.join(basename);
    tokio::fs::write(&destination, bytes).await.map_err(|error| {
        tracing::error!(path = %destination.display(), error = %error, "Failed to persist upload");
        AppError::internal(format!("Failed to store the uploaded file: {error}"))
    })
}

/// Request body for the `POST /api/chat/` endpoint.
#[derive(Deserialize)]
struct ChatRequest {
    /// Question text; in exam mode this carries the requested question count.
    question: String,
    /// Prior conversation turns, oldest first. The server stores nothing.
    #[serde(default)]
    chat_history: Vec<ChatTurn>,
    /// Answering mode (defaults to conversational chat).
    #[serde(default)]
    mode: Mode,
}

/// Response body for the `POST /api/chat/` endpoint.
#[derive(Serialize)]
struct ChatResponse {
    /// Free text, a JSON array string, or an error-marked message.
    answer: String,
}

/// Answer a question about the indexed material.
///
/// Always returns `200`; pipeline failures are folded into the `answer` field
/// so conversational clients render them inline.
async fn chat<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse>
where
    S: TutorApi,
{
    let answer = match service
        .answer(&request.question, &request.chat_history, request.mode)
        .await
    {
        Ok(answer) => answer,
        Err(TutorError::EmptyIndex) => format!(
            "{ERROR_MARKER} No documents have been uploaded yet. Please upload a PDF first."
        ),
        Err(error) => {
            tracing::error!(mode = ?request.mode, error = %error, "Answer pipeline failed");
            format!("{ERROR_MARKER} {error}")
        }
    };
    Json(ChatResponse { answer })
}

/// Error envelope converting pipeline failures into HTTP responses.
struct AppError {
    status: StatusCode,
    detail: String,
}

impl AppError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<TutorError> for AppError {
    fn from(error: TutorError) -> Self {
        let status = match &error {
            TutorError::Embedding(_) | TutorError::Generation(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::config::{CONFIG, Config};
    use crate::metrics::MetricsSnapshot;
    use crate::tutor::{ChatTurn, IngestOutcome, Mode, TutorApi, TutorError};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::{Arc, Once};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "rusty-tutor-test-boundary";

    fn multipart_body(filename: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(filename: &str, data: &[u8]) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/documents/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(filename, data)))
            .expect("request")
    }

    fn chat_request(payload: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/chat/")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn upload_returns_created_with_chunk_count() {
        ensure_test_config();
        let service = Arc::new(StubTutorService::new(IngestOutcome {
            chunks_added: 7,
            pages: 2,
        }));
        let app = create_router(service.clone());

        let response = app
            .oneshot(upload_request("biology.pdf", b"%PDF-stub"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        assert_eq!(json["filename"], "biology.pdf");
        assert_eq!(json["chunks_added"], 7);
        assert!(json["message"].as_str().expect("message").contains("biology.pdf"));

        let calls = service.ingest_calls().await;
        assert_eq!(calls, vec!["biology.pdf".to_string()]);
    }

    #[tokio::test]
    async fn upload_rejects_document_without_text() {
        ensure_test_config();
        let service = Arc::new(StubTutorService::new(IngestOutcome {
            chunks_added: 0,
            pages: 0,
        }));
        let app = create_router(service);

        let response = app
            .oneshot(upload_request("scanned.pdf", b"%PDF-stub"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert!(
            json["detail"]
                .as_str()
                .expect("detail")
                .contains("No extractable text")
        );
    }

    #[tokio::test]
    async fn upload_rejects_non_pdf_filename() {
        ensure_test_config();
        let service = Arc::new(StubTutorService::new(IngestOutcome {
            chunks_added: 1,
            pages: 1,
        }));
        let app = create_router(service.clone());

        let response = app
            .oneshot(upload_request("notes.txt", b"plain text"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.ingest_calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_missing_file_part() {
        ensure_test_config();
        let service = Arc::new(StubTutorService::new(IngestOutcome {
            chunks_added: 1,
            pages: 1,
        }));
        let app = create_router(service);

        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{BOUNDARY}--\r\n"
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/documents/upload")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_passes_history_and_mode_to_service() {
        ensure_test_config();
        let service = Arc::new(StubTutorService::new(IngestOutcome {
            chunks_added: 0,
            pages: 0,
        }));
        let app = create_router(service.clone());

        let payload = json!({
            "question": "4",
            "chat_history": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" }
            ],
            "mode": "exam"
        });
        let response = app
            .oneshot(chat_request(payload))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["answer"], "stub answer");

        let calls = service.answer_calls().await;
        assert_eq!(calls.len(), 1);
        let (question, history, mode) = &calls[0];
        assert_eq!(question, "4");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].content, "hello");
        assert_eq!(*mode, Mode::Exam);
    }

    #[tokio::test]
    async fn chat_defaults_to_chat_mode_and_empty_history() {
        ensure_test_config();
        let service = Arc::new(StubTutorService::new(IngestOutcome {
            chunks_added: 0,
            pages: 0,
        }));
        let app = create_router(service.clone());

        let response = app
            .oneshot(chat_request(json!({ "question": "What is osmosis?" })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let calls = service.answer_calls().await;
        let (_, history, mode) = &calls[0];
        assert!(history.is_empty());
        assert_eq!(*mode, Mode::Chat);
    }

    #[tokio::test]
    async fn chat_reports_empty_index_inside_the_answer() {
        ensure_test_config();
        let service = Arc::new(
            StubTutorService::new(IngestOutcome {
                chunks_added: 0,
                pages: 0,
            })
            .failing_with(|| TutorError::EmptyIndex),
        );
        let app = create_router(service);

        let response = app
            .oneshot(chat_request(json!({ "question": "anything" })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let answer = json["answer"].as_str().expect("answer");
        assert!(answer.starts_with("Error:"));
        assert!(answer.contains("No documents have been uploaded"));
    }

    type AnswerCall = (String, Vec<ChatTurn>, Mode);

    struct StubTutorService {
        ingest_calls: Mutex<Vec<String>>,
        answer_calls: Mutex<Vec<AnswerCall>>,
        outcome: IngestOutcome,
        failure: Option<fn() -> TutorError>,
    }

    impl StubTutorService {
        fn new(outcome: IngestOutcome) -> Self {
            Self {
                ingest_calls: Mutex::new(Vec::new()),
                answer_calls: Mutex::new(Vec::new()),
                outcome,
                failure: None,
            }
        }

        fn failing_with(mut self, failure: fn() -> TutorError) -> Self {
            self.failure = Some(failure);
            self
        }

        async fn ingest_calls(&self) -> Vec<String> {
            self.ingest_calls.lock().await.clone()
        }

        async fn answer_calls(&self) -> Vec<AnswerCall> {
            self.answer_calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl TutorApi for StubTutorService {
        async fn ingest_document(
            &self,
            filename: &str,
            _bytes: &[u8],
        ) -> Result<IngestOutcome, TutorError> {
            self.ingest_calls.lock().await.push(filename.to_string());
            Ok(self.outcome)
        }

        async fn answer(
            &self,
            question: &str,
            history: &[ChatTurn],
            mode: Mode,
        ) -> Result<String, TutorError> {
            self.answer_calls
                .lock()
                .await
                .push((question.to_string(), history.to_vec(), mode));
            match self.failure {
                Some(failure) => Err(failure()),
                None => Ok("stub answer".to_string()),
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 0,
                chunks_indexed: 0,
                questions_answered: 0,
            }
        }
    }

    fn ensure_test_config() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let upload_dir = std::env::temp_dir().join("rusty-tutor-api-tests");
            std::fs::create_dir_all(&upload_dir).expect("create upload dir");
            let _ = CONFIG.set(Config {
                qdrant_url: "http://127.0.0.1:6333".into(),
                qdrant_collection_name: "documents".into(),
                qdrant_api_key: None,
                ollama_url: None,
                embedding_model: "nomic-embed-text".into(),
                embedding_dimension: 768,
                chat_model: "llama3".into(),
                text_splitter_chunk_size: 1000,
                text_splitter_chunk_overlap: 100,
                retrieval_top_k: 3,
                upload_dir,
                server_port: None,
            });
        });
    }
}
