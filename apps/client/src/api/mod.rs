//! REST client for the lesson backend.

use lesson_core::{Gender, LessonDocument, ReviewCard, ReviewQuality};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

// === API Request/Response Types ===

/// Body of `POST /api/tts/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

#[derive(Debug, Serialize)]
struct ReviewQualityRequest {
    quality: u8,
}

/// Body of `POST /api/lessons/{id}/progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub user_id: String,
    pub progress: u32,
    pub is_completed: bool,
    pub score: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReviewWordsResponse {
    Wrapped { words: Vec<ReviewCard> },
    Bare(Vec<ReviewCard>),
}

impl ReviewWordsResponse {
    fn into_cards(self) -> Vec<ReviewCard> {
        match self {
            Self::Wrapped { words } => words,
            Self::Bare(words) => words,
        }
    }
}

struct ApiClientInner {
    client: Client,
    base_url: String,
}

/// Client for the lesson, TTS, vocabulary and progress endpoints.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// `GET /api/lessons/{id}`
    pub async fn get_lesson(&self, lesson_id: &str) -> Result<LessonDocument, ApiError> {
        let url = format!("{}/api/lessons/{}", self.inner.base_url, lesson_id);
        let resp = self
            .inner
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let resp = check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// `POST /api/tts/`, returning the raw audio payload.
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/api/tts/", self.inner.base_url);
        let resp = self
            .inner
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let resp = check_status(resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// `GET /api/vocabulary/review?user_id=&limit=`, in queue order.
    pub async fn get_due_reviews(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ReviewCard>, ApiError> {
        let url = format!("{}/api/vocabulary/review", self.inner.base_url);
        let limit = limit.to_string();
        let resp = self
            .inner
            .client
            .get(&url)
            .query(&[("user_id", user_id), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let resp = check_status(resp).await?;
        let words: ReviewWordsResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(words.into_cards())
    }

    /// `POST /api/vocabulary/review/{wordId}`
    pub async fn submit_review(
        &self,
        word_id: &str,
        quality: ReviewQuality,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/vocabulary/review/{}", self.inner.base_url, word_id);
        let request = ReviewQualityRequest {
            quality: quality.to_value(),
        };
        let resp = self
            .inner
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        check_status(resp).await.map(|_| ())
    }

    /// `POST /api/lessons/{id}/progress`
    pub async fn save_progress(
        &self,
        lesson_id: &str,
        update: &ProgressUpdate,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/lessons/{}/progress", self.inner.base_url, lesson_id);
        let resp = self
            .inner
            .client
            .post(&url)
            .json(update)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        check_status(resp).await.map(|_| ())
    }
}

async fn check_status(resp: Response) -> Result<Response, ApiError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    Err(ApiError::Backend { status, message })
}
