//! Shared test infrastructure: an in-process mock of the lesson REST API.
//!
//! Every request is recorded so tests can assert on what the client sent.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use hebrew_lesson_client::config::ClientConfig;
use hebrew_lesson_client::state::AppState;

pub const USER_ID: &str = "learner-1";
pub const AUDIO_BYTES: &[u8] = b"ID3fake-mp3";

/// Requests seen by the mock.
#[derive(Debug, Default)]
pub struct Recorded {
    pub tts: Vec<Value>,
    pub review_queries: Vec<HashMap<String, String>>,
    pub reviews: Vec<(String, u8)>,
    pub progress: Vec<(String, Value)>,
}

#[derive(Clone)]
struct MockState {
    recorded: Arc<Mutex<Recorded>>,
    lessons: Arc<HashMap<String, Value>>,
    due: Arc<Vec<Value>>,
    tts_status: u16,
    fail_progress: bool,
    fail_reviews: Arc<Vec<String>>,
    fail_due_after: Option<usize>,
}

/// Running mock backend.
pub struct MockBackend {
    pub base_url: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockBackend {
    pub fn builder() -> MockBuilder {
        MockBuilder::default()
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }

    /// Client config pointing at this backend, with a learner id set.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url.clone(),
            user_id: Some(USER_ID.to_string()),
            ..ClientConfig::default()
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.config())
    }
}

pub struct MockBuilder {
    lessons: HashMap<String, Value>,
    due: Vec<Value>,
    tts_status: u16,
    fail_progress: bool,
    fail_reviews: Vec<String>,
    fail_due_after: Option<usize>,
}

impl Default for MockBuilder {
    fn default() -> Self {
        Self {
            lessons: HashMap::new(),
            due: Vec::new(),
            tts_status: 200,
            fail_progress: false,
            fail_reviews: Vec::new(),
            fail_due_after: None,
        }
    }
}

impl MockBuilder {
    pub fn lesson(mut self, lesson: Value) -> Self {
        let id = lesson["id"].as_str().unwrap().to_string();
        self.lessons.insert(id, lesson);
        self
    }

    pub fn due_words(mut self, words: Vec<Value>) -> Self {
        self.due = words;
        self
    }

    pub fn tts_status(mut self, status: u16) -> Self {
        self.tts_status = status;
        self
    }

    pub fn fail_progress(mut self) -> Self {
        self.fail_progress = true;
        self
    }

    pub fn fail_review(mut self, word_id: &str) -> Self {
        self.fail_reviews.push(word_id.to_string());
        self
    }

    /// Answer the first `n` due-review fetches, then fail with 500.
    pub fn fail_due_after(mut self, n: usize) -> Self {
        self.fail_due_after = Some(n);
        self
    }

    pub async fn start(self) -> MockBackend {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = MockState {
            recorded: recorded.clone(),
            lessons: Arc::new(self.lessons),
            due: Arc::new(self.due),
            tts_status: self.tts_status,
            fail_progress: self.fail_progress,
            fail_reviews: Arc::new(self.fail_reviews),
            fail_due_after: self.fail_due_after,
        };

        let app = Router::new()
            .route("/api/lessons/:id", get(get_lesson))
            .route("/api/lessons/:id/progress", post(save_progress))
            .route("/api/tts/", post(synthesize))
            .route("/api/vocabulary/review", get(due_reviews))
            .route("/api/vocabulary/review/:id", post(submit_review))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockBackend {
            base_url: format!("http://{}", addr),
            recorded,
        }
    }
}

async fn get_lesson(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    state
        .lessons
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "lesson not found"))
}

async fn synthesize(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.recorded.lock().unwrap().tts.push(body);
    if state.tts_status != 200 {
        let status = StatusCode::from_u16(state.tts_status).unwrap();
        return (status, "tts unavailable").into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        AUDIO_BYTES.to_vec(),
    )
        .into_response()
}

async fn due_reviews(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let limit = query
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let served = {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.review_queries.push(query);
        recorded.review_queries.len() - 1
    };
    if state.fail_due_after.is_some_and(|n| served >= n) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "review store down").into_response();
    }
    let words: Vec<Value> = state.due.iter().take(limit).cloned().collect();
    Json(json!({ "words": words })).into_response()
}

async fn submit_review(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let quality = body["quality"].as_u64().unwrap() as u8;
    state.recorded.lock().unwrap().reviews.push((id.clone(), quality));
    if state.fail_reviews.contains(&id) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn save_progress(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.recorded.lock().unwrap().progress.push((id, body));
    if state.fail_progress {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}
