mod styler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub use styler::audio::{
    decode_pcm16, encode_wav, quantize, read_wav_samples, wav_info, AudioError, EncodedAudio,
    WavInfo, PROVIDER_CHANNELS, PROVIDER_SAMPLE_RATE, WAV_HEADER_LEN,
};
pub use styler::audio_types::{AudioStage, GeneratedAudio, PlaybackState, WavDownload};
pub use styler::gemini::{extract_inline_audio, speech_request_body, GeminiClient, SpeechProvider};
pub use styler::playback::{progress_fraction, PlaybackController, PlaybackPhase, PlaybackSignal};
pub use styler::speech::synthesize_speech;
pub use styler::store::{download_file_name, ArtifactStore, AudioHandle, WAV_CONTENT_TYPE};
pub use styler::styles::{build_prompt, catalog, default_style, find_style, StyleIcon, VoiceStyle};
pub use styler::types::{ProviderConfig, ProviderError, StylerError};
pub use styler::waveform::{
    draw_frame, FrameClock, PathOp, PathSurface, RefreshClock, RenderLoop, Surface,
};

use tracing::{error, info};

const FALLBACK_ERROR: &str = "Failed to generate audio. Please try again.";

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

struct Inputs {
    text: String,
    style: &'static VoiceStyle,
    last_error: Option<String>,
}

/// Clears the in-flight flag however the generation ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One user session: the script being edited, the selected style, at most one
/// generation in flight, and the history of generated audio.
pub struct VoiceStyler {
    provider: Arc<dyn SpeechProvider>,
    store: ArtifactStore,
    generating: AtomicBool,
    inputs: Mutex<Inputs>,
}

impl VoiceStyler {
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self {
            provider,
            store: ArtifactStore::new(),
            generating: AtomicBool::new(false),
            inputs: Mutex::new(Inputs {
                text: String::new(),
                style: default_style(),
                last_error: None,
            }),
        }
    }

    /// Session backed by the Gemini client configured from the environment.
    pub fn from_env() -> Result<Self, StylerError> {
        let client = GeminiClient::new(ProviderConfig::from_env())?;
        info!(model = client.model(), "speech provider ready");
        Ok(Self::new(Arc::new(client)))
    }

    fn inputs(&self) -> std::sync::MutexGuard<'_, Inputs> {
        self.inputs.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn input_text(&self) -> String {
        self.inputs().text.clone()
    }

    pub fn set_input_text(&self, text: impl Into<String>) -> Result<(), StylerError> {
        if self.is_generating() {
            return Err(StylerError::GenerationInProgress);
        }
        self.inputs().text = text.into();
        Ok(())
    }

    pub fn selected_style(&self) -> &'static VoiceStyle {
        self.inputs().style
    }

    pub fn select_style(&self, id: &str) -> Result<&'static VoiceStyle, StylerError> {
        if self.is_generating() {
            return Err(StylerError::GenerationInProgress);
        }
        let style = find_style(id)?;
        self.inputs().style = style;
        Ok(style)
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    /// Whether the generate trigger is enabled.
    pub fn can_generate(&self) -> bool {
        !self.is_generating() && !self.inputs().text.trim().is_empty()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inputs().last_error.clone()
    }

    pub async fn generate(&self) -> Result<GeneratedAudio, StylerError> {
        self.generate_with_progress(|_, _| {}).await
    }

    /// Synthesize the current text in the selected style and prepend the
    /// result to the history. The input text is left as is.
    pub async fn generate_with_progress(
        &self,
        on_progress: impl FnMut(AudioStage, &str),
    ) -> Result<GeneratedAudio, StylerError> {
        let (text, style) = {
            let inputs = self.inputs();
            (inputs.text.clone(), inputs.style)
        };
        if text.trim().is_empty() {
            return Err(StylerError::EmptyText);
        }
        if self
            .generating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StylerError::GenerationInProgress);
        }
        let _in_flight = InFlight(&self.generating);
        self.inputs().last_error = None;

        info!(style = style.id, chars = text.len(), "generating speech");
        match synthesize_speech(self.provider.as_ref(), &text, style, on_progress).await {
            Ok(encoded) => Ok(self
                .store
                .create(encoded.wav, &text, style.name, encoded.duration_secs)),
            Err(e) => {
                error!(style = style.id, error = %e, "generation failed");
                let message = e.to_string();
                self.inputs().last_error = Some(if message.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message
                });
                Err(e)
            }
        }
    }

    /// Newest first.
    pub fn history(&self) -> Arc<Vec<GeneratedAudio>> {
        self.store.list()
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn download(&self, id: &str) -> Result<WavDownload, StylerError> {
        self.store.download(id)
    }

    /// A fresh, independent player for one history entry.
    pub fn open_player(&self, id: &str) -> Result<PlaybackController, StylerError> {
        let audio = self
            .store
            .get(id)
            .ok_or_else(|| StylerError::UnknownAudio(id.to_string()))?;
        PlaybackController::open(&audio)
    }

    pub fn remove(&self, id: &str) -> Result<(), StylerError> {
        self.store.release(id)
    }

    /// Drops the whole history and frees every audio buffer.
    pub fn clear_history(&self) -> usize {
        self.store.clear()
    }
}
