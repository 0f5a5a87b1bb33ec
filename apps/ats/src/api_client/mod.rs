//! API client: the single HTTP entry point for the ATS backend.
//!
//! Every request to the REST API goes through `ApiClient`. Callers work
//! against the `CandidateApi` trait so the controller can be driven by a fake
//! in tests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::CandidateId;

pub mod multipart;

pub use multipart::MultipartPayload;

const CANDIDATES_PATH: &str = "candidates";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Remote candidate store as seen by the controller.
///
/// Methods return the raw JSON body; envelope decoding is the caller's job.
#[async_trait]
pub trait CandidateApi: Send + Sync {
    /// `GET /candidates?{params}`
    async fn list_candidates(&self, params: &[(&'static str, String)]) -> Result<Value, AppError>;

    /// `GET /candidates/{id}`
    async fn get_candidate(&self, id: &CandidateId) -> Result<Value, AppError>;

    /// `POST /candidates` with a JSON body.
    async fn create_candidate(&self, payload: &Value) -> Result<Value, AppError>;

    /// `POST /candidates` with a multipart body.
    async fn upload_candidate(&self, payload: MultipartPayload) -> Result<Value, AppError>;

    /// `PUT /candidates/{id}`
    async fn update_candidate(&self, id: &CandidateId, payload: &Value)
        -> Result<Value, AppError>;

    /// `PUT /candidates/{id}/status`
    async fn update_status(&self, id: &CandidateId, status: &str) -> Result<Value, AppError>;
}

/// reqwest-backed client for the ATS REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Result<Self, AppError> {
        Self::with_timeout(
            base_url,
            api_token,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `{base}/candidates/{id}/{tail...}` with every segment percent-encoded,
    /// so ids containing `/`, `?` or `#` stay inside their segment.
    fn candidate_url(&self, id: &CandidateId, tail: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AppError::Validation(format!("Invalid API base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Validation(format!("API base URL '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push(CANDIDATES_PATH)
            .push(id.as_str())
            .extend(tail);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and decodes the JSON body. An empty body decodes to `null`.
    pub async fn send_json(&self, request: RequestBuilder) -> Result<Value, AppError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("ATS API returned {}: {}", status, truncate(&body));
            return Err(AppError::from_response(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends a request and returns the raw body bytes.
    pub async fn send_bytes(&self, request: RequestBuilder) -> Result<Bytes, AppError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("ATS API returned {}: {}", status, truncate(&body));
            return Err(AppError::from_response(status, &body));
        }

        Ok(response.bytes().await?)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }
}

#[async_trait]
impl CandidateApi for ApiClient {
    async fn list_candidates(&self, params: &[(&'static str, String)]) -> Result<Value, AppError> {
        debug!("GET /{} {:?}", CANDIDATES_PATH, params);
        self.send_json(self.get(CANDIDATES_PATH).query(params)).await
    }

    async fn get_candidate(&self, id: &CandidateId) -> Result<Value, AppError> {
        let url = self.candidate_url(id, &[])?;
        self.send_json(self.client.get(url)).await
    }

    async fn create_candidate(&self, payload: &Value) -> Result<Value, AppError> {
        self.send_json(self.post(CANDIDATES_PATH).json(payload)).await
    }

    async fn upload_candidate(&self, payload: MultipartPayload) -> Result<Value, AppError> {
        debug!("POST /{} multipart {:?}", CANDIDATES_PATH, payload.field_names());
        let form = payload.into_form()?;
        self.send_json(self.post(CANDIDATES_PATH).multipart(form))
            .await
    }

    async fn update_candidate(
        &self,
        id: &CandidateId,
        payload: &Value,
    ) -> Result<Value, AppError> {
        let url = self.candidate_url(id, &[])?;
        self.send_json(self.client.put(url).json(payload)).await
    }

    async fn update_status(&self, id: &CandidateId, status: &str) -> Result<Value, AppError> {
        let url = self.candidate_url(id, &["status"])?;
        self.send_json(self.client.put(url).json(&json!({ "status": status })))
            .await
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
