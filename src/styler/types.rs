use serde::{Deserialize, Serialize};

use super::audio::AudioError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Reads the provider secret and optional overrides from the environment.
    ///
    /// `GEMINI_API_KEY` wins over the generic `API_KEY`.
    pub fn from_env() -> Self {
        let api_key = non_blank(std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| non_blank(std::env::var("API_KEY").ok()));
        let timeout_secs = std::env::var("VOICE_STYLER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            api_key,
            base_url: non_blank(std::env::var("VOICE_STYLER_BASE_URL").ok()),
            model: non_blank(std::env::var("VOICE_STYLER_MODEL").ok()),
            timeout_secs,
        }
    }

    pub fn resolved_base_url(&self) -> String {
        non_blank(self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn resolved_model(&self) -> String {
        non_blank(self.model.clone()).unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim().to_string();
        if t.is_empty() {
            None
        } else {
            Some(t)
        }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("No API key set for the speech provider")]
    NoApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned error: {status} ({message})")]
    ApiResponse { status: u16, message: String },

    #[error("No audio data generated.")]
    NoAudio,

    #[error("Inline audio payload is not valid base64: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Errors surfaced to callers of the session and the playback layer.
#[derive(Debug, thiserror::Error)]
pub enum StylerError {
    #[error("Malformed audio data: {0}")]
    MalformedAudioData(String),

    #[error("{0}")]
    GenerationFailed(String),

    #[error("Audio {audio_id} is unavailable for playback: {reason}")]
    PlaybackUnavailable { audio_id: String, reason: String },

    #[error("A generation is already in progress")]
    GenerationInProgress,

    #[error("Enter some text before generating")]
    EmptyText,

    #[error("Unknown voice style: {0}")]
    UnknownStyle(String),

    #[error("No generated audio with id {0}")]
    UnknownAudio(String),
}

impl From<AudioError> for StylerError {
    fn from(e: AudioError) -> Self {
        match e {
            AudioError::MalformedAudioData { .. } => StylerError::MalformedAudioData(e.to_string()),
            AudioError::UnsupportedChannels(_)
            | AudioError::WavEncode(_)
            | AudioError::WavDecode(_) => StylerError::GenerationFailed(e.to_string()),
        }
    }
}

impl From<ProviderError> for StylerError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidPayload(_) => StylerError::MalformedAudioData(e.to_string()),
            other => StylerError::GenerationFailed(other.to_string()),
        }
    }
}
