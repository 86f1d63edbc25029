//! Application state.

use crate::api::ApiClient;
use crate::audio::{
    AudioCueController, AudioOutput, CommandOutput, CommandSpeech, LogOnlyOutput, SpeechFallback,
};
use crate::config::ClientConfig;
use lesson_core::{Gender, LessonSession, ReviewQueue};
use std::sync::{Arc, Mutex};
use tracing::warn;
use uuid::Uuid;

/// State shared by every command for one run of the client.
///
/// The session and review queue are only ever locked briefly and never across
/// an `.await`.
pub struct AppState {
    pub config: ClientConfig,
    pub api: Arc<ApiClient>,
    /// Gender applied to newly loaded lessons.
    pub preferred_gender: Gender,
    /// Correlates log lines from one run.
    pub run_id: Uuid,
    pub session: Mutex<Option<LessonSession>>,
    pub review: Mutex<Option<ReviewQueue>>,
    output: Arc<dyn AudioOutput>,
    fallback: Option<Arc<dyn SpeechFallback>>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Self {
        let api = Arc::new(ApiClient::new(config.api_base_url.clone()));

        let output: Arc<dyn AudioOutput> = match config.audio_player.as_deref() {
            Some(command) => match CommandOutput::new(command) {
                Some(output) => Arc::new(output),
                None => {
                    warn!(command, "unusable AUDIO_PLAYER, audio will be discarded");
                    Arc::new(LogOnlyOutput)
                }
            },
            None => Arc::new(LogOnlyOutput),
        };
        let fallback = config
            .speech_fallback
            .as_deref()
            .and_then(CommandSpeech::new)
            .map(|speech| Arc::new(speech) as Arc<dyn SpeechFallback>);

        Self::with_parts(config, api, output, fallback)
    }

    /// Build state from explicit collaborators.
    pub fn with_parts(
        config: ClientConfig,
        api: Arc<ApiClient>,
        output: Arc<dyn AudioOutput>,
        fallback: Option<Arc<dyn SpeechFallback>>,
    ) -> Self {
        Self {
            config,
            api,
            preferred_gender: Gender::default(),
            run_id: Uuid::new_v4(),
            session: Mutex::new(None),
            review: Mutex::new(None),
            output,
            fallback,
        }
    }

    pub fn with_preferred_gender(mut self, gender: Gender) -> Self {
        self.preferred_gender = gender;
        self
    }

    /// A fresh cue controller for one exercise instance.
    pub fn cue_controller(&self) -> AudioCueController<ApiClient> {
        AudioCueController::new(
            self.api.clone(),
            self.output.clone(),
            self.config.tts_language.clone(),
        )
        .with_fallback(self.fallback.clone())
    }
}
