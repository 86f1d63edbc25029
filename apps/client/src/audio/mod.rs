//! Audio cues for exercises.
//!
//! Each exercise owns one [`AudioCueController`]. A new `play` always
//! supersedes the previous one: the in-flight TTS request is cancelled and any
//! sound still playing is stopped, so at most one request and one playback are
//! live per controller. Releasing (or dropping) the controller does the same
//! and refuses further cues.

pub mod output;

use crate::api::{ApiClient, ApiError, SpeechRequest};
use lesson_core::Gender;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use output::{CommandOutput, CommandSpeech, LogOnlyOutput};

/// Audio errors.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio unavailable: {0}")]
    Unavailable(String),
}

/// Remote text-to-speech.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        request: &SpeechRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;
}

impl SpeechSynthesizer for ApiClient {
    fn synthesize(
        &self,
        request: &SpeechRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send {
        ApiClient::synthesize(self, request)
    }
}

/// A sound that is (or was) playing.
pub trait Playback: Send {
    fn is_playing(&mut self) -> bool;

    /// Stop and release the underlying resources. Must be idempotent.
    fn stop(&mut self);
}

/// Plays synthesized audio payloads.
pub trait AudioOutput: Send + Sync {
    fn play(&self, audio: Vec<u8>) -> Result<Box<dyn Playback>, AudioError>;
}

/// On-device speech used when remote synthesis fails.
pub trait SpeechFallback: Send + Sync {
    fn speak(&self, text: &str, gender: Gender) -> Result<Box<dyn Playback>, AudioError>;
}

/// Observable state of a cue controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueState {
    Idle,
    Requesting,
    Playing,
}

/// How a `play` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueOutcome {
    /// Remote audio is playing.
    Playing,
    /// Remote synthesis failed; on-device speech is playing.
    Fallback,
    /// No audio could be produced. The exercise stays usable through its text.
    Silent,
    /// A later call or a release cancelled this one. Not an error.
    Superseded,
}

#[derive(Default)]
struct CueInner {
    generation: u64,
    pending: Option<CancellationToken>,
    playback: Option<Box<dyn Playback>>,
    released: bool,
}

impl CueInner {
    fn cancel_all(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        if let Some(mut playback) = self.playback.take() {
            playback.stop();
        }
    }
}

/// Single-flight audio cue for one exercise instance.
pub struct AudioCueController<S> {
    synthesizer: Arc<S>,
    output: Arc<dyn AudioOutput>,
    fallback: Option<Arc<dyn SpeechFallback>>,
    language: String,
    inner: Mutex<CueInner>,
}

impl<S: SpeechSynthesizer> AudioCueController<S> {
    pub fn new(
        synthesizer: Arc<S>,
        output: Arc<dyn AudioOutput>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            output,
            fallback: None,
            language: language.into(),
            inner: Mutex::new(CueInner::default()),
        }
    }

    pub fn with_fallback(mut self, fallback: Option<Arc<dyn SpeechFallback>>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Speak `text`, superseding any earlier cue from this controller.
    pub async fn play(&self, text: &str, gender: Gender) -> CueOutcome {
        let (generation, token) = {
            let mut inner = self.lock();
            if inner.released {
                return CueOutcome::Silent;
            }
            inner.cancel_all();
            inner.generation += 1;
            let token = CancellationToken::new();
            inner.pending = Some(token.clone());
            (inner.generation, token)
        };

        let request = SpeechRequest {
            text: text.to_string(),
            language: self.language.clone(),
            gender: Some(gender),
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(text, "audio cue superseded");
                return CueOutcome::Superseded;
            }
            result = self.synthesizer.synthesize(&request) => result,
        };

        if token.is_cancelled() {
            debug!(text, "audio cue superseded after synthesis");
            return CueOutcome::Superseded;
        }

        // Starting a player may block, so it happens outside the lock.
        let remote = match result {
            Ok(audio) => self.output.play(audio).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        let (playback, outcome) = match remote {
            Ok(playback) => (Some(playback), CueOutcome::Playing),
            Err(error) => {
                warn!(text, %error, "remote speech unavailable");
                match self.speak_locally(text, gender) {
                    Some(playback) => (Some(playback), CueOutcome::Fallback),
                    None => (None, CueOutcome::Silent),
                }
            }
        };

        let mut inner = self.lock();
        if inner.generation != generation || token.is_cancelled() {
            drop(inner);
            if let Some(mut playback) = playback {
                playback.stop();
            }
            debug!(text, "audio cue superseded while starting playback");
            return CueOutcome::Superseded;
        }
        inner.pending = None;
        inner.playback = playback;
        outcome
    }

    fn speak_locally(&self, text: &str, gender: Gender) -> Option<Box<dyn Playback>> {
        let fallback = self.fallback.as_ref()?;
        match fallback.speak(text, gender) {
            Ok(playback) => Some(playback),
            Err(error) => {
                warn!(text, %error, "speech fallback failed");
                None
            }
        }
    }
}

impl<S> AudioCueController<S> {
    pub fn state(&self) -> CueState {
        let mut inner = self.lock();
        if inner.pending.is_some() {
            CueState::Requesting
        } else if inner.playback.as_mut().map(|p| p.is_playing()).unwrap_or(false) {
            CueState::Playing
        } else {
            CueState::Idle
        }
    }

    /// Cancel the pending request and stop playback. Later cues still work.
    pub fn stop(&self) {
        self.lock().cancel_all();
    }

    /// Tear down for good: like `stop`, and every later `play` is silent.
    pub fn release(&self) {
        let mut inner = self.lock();
        inner.cancel_all();
        inner.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    fn lock(&self) -> MutexGuard<'_, CueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> Drop for AudioCueController<S> {
    fn drop(&mut self) {
        self.release();
    }
}
