//! HTTP client wrapper for the Qdrant-backed vector index.

use crate::config::get_config;
use crate::index::{
    payload::{build_payload, current_timestamp_rfc3339, generate_point_id},
    types::{CountResponse, IndexError, QueryResponse, QueryResponseResult, RetrievedChunk},
};
use crate::ingest::DocumentChunk;
use reqwest::{Client, Method, StatusCode};
use serde_json::json;

/// Lightweight HTTP client for the document collection.
///
/// The handle is immutable after construction and safe to share; writes are
/// atomic upserts, so there is no retrieval handle to rebuild between requests.
pub struct QdrantIndex {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) collection: String,
    pub(crate) vector_size: u64,
}

impl QdrantIndex {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, IndexError> {
        let config = get_config();
        let client = Client::builder().user_agent("rusty-tutor/0.1").build()?;

        let base_url = normalize_base_url(&config.qdrant_url).map_err(IndexError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            collection = %config.qdrant_collection_name,
            has_api_key = %config
                .qdrant_api_key
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized Qdrant HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.qdrant_api_key.clone(),
            collection: config.qdrant_collection_name.clone(),
            vector_size: config.embedding_dimension as u64,
        })
    }

    /// Create the document collection when it is missing from Qdrant.
    ///
    /// Called once at startup so a misconfigured store fails the process
    /// instead of degrading every request.
    pub async fn ensure_collection(&self) -> Result<(), IndexError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        tracing::debug!(
            collection = %self.collection,
            vector_size = self.vector_size,
            "Creating collection"
        );
        let body = json!({
            "vectors": {
                "size": self.vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{}", self.collection))
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = %self.collection, "Collection created");
        })
        .await
    }

    /// Append embedded chunks to the collection, returning the inserted count.
    ///
    /// Every point receives a fresh UUID, so re-uploading a document appends
    /// duplicates rather than updating in place.
    pub async fn append_chunks(
        &self,
        chunks: &[DocumentChunk],
        vectors: Vec<Vec<f32>>,
        source: &str,
    ) -> Result<usize, IndexError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let now = current_timestamp_rfc3339();
        let serialized: Vec<_> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                json!({
                    "id": generate_point_id(),
                    "vector": vector,
                    "payload": build_payload(chunk, source, &now),
                })
            })
            .collect();

        let point_count = serialized.len();
        let response = self
            .request(
                Method::PUT,
                &format!("collections/{}/points", self.collection),
            )
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = %self.collection,
                points = point_count,
                "Points appended"
            );
        })
        .await?;

        Ok(point_count)
    }

    /// Retrieve the top-`k` nearest chunks for the supplied query vector.
    ///
    /// Checks the point count first: a missing collection or an empty one
    /// yields [`IndexError::Empty`] rather than a successful empty result.
    pub async fn query(&self, vector: Vec<f32>, k: usize) -> Result<Vec<RetrievedChunk>, IndexError> {
        if self.count_points().await? == 0 {
            return Err(IndexError::Empty);
        }

        let body = json!({
            "query": vector,
            "limit": k,
            "with_payload": true,
        });

        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/query", self.collection),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(collection = %self.collection, error = %error, "Qdrant search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points, .. } => points,
        };
        let results = points
            .into_iter()
            .map(|point| {
                let payload = point.payload.unwrap_or_default();
                RetrievedChunk {
                    text: payload
                        .get("text")
                        .and_then(|value| value.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    source: payload
                        .get("source")
                        .and_then(|value| value.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    page: payload
                        .get("page")
                        .and_then(serde_json::Value::as_u64)
                        .unwrap_or_default() as u32,
                    score: point.score,
                }
            })
            .collect();

        Ok(results)
    }

    /// Exact number of points stored in the collection.
    ///
    /// A missing collection counts as zero so callers see one empty-index
    /// condition regardless of whether the collection was ever created.
    pub async fn count_points(&self) -> Result<u64, IndexError> {
        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/count", self.collection),
            )
            .json(&json!({ "exact": true }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let payload: CountResponse = response.json().await?;
                Ok(payload.result.count)
            }
            StatusCode::NOT_FOUND => Ok(0),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = IndexError::UnexpectedStatus { status, body };
                tracing::error!(collection = %self.collection, error = %error, "Point count failed");
                Err(error)
            }
        }
    }

    async fn collection_exists(&self) -> Result<bool, IndexError> {
        let response = self
            .request(Method::GET, &format!("collections/{}", self.collection))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = IndexError::UnexpectedStatus { status, body };
                tracing::error!(collection = %self.collection, error = %error, "Collection existence check failed");
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), IndexError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
