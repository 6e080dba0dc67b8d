use serde::{Deserialize, Serialize};

use super::store::AudioHandle;

/// One generated, playable result. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAudio {
    pub id: String,
    pub text: String,
    pub style_name: String,
    /// Unix milliseconds.
    pub timestamp: u64,
    pub audio_url: String,
    pub duration: f64,
    #[serde(skip)]
    pub handle: AudioHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioStage {
    Requesting,
    Decoding,
    Encoding,
}

/// The downloadable form of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WavDownload {
    pub file_name: String,
    pub content_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Observable playback view: drives the progress bar and the waveform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    pub progress: f64,
}
