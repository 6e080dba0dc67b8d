use super::audio::{
    decode_pcm16, duration_secs, encode_wav, EncodedAudio, PROVIDER_CHANNELS, PROVIDER_SAMPLE_RATE,
};
use super::audio_types::AudioStage;
use super::gemini::SpeechProvider;
use super::styles::{build_prompt, VoiceStyle};
use super::types::StylerError;

use tracing::{debug, warn};

/// Provider call, then PCM decode and WAV encode.
///
/// Decode and encode are synchronous; the only suspension point is the
/// provider request.
pub async fn synthesize_speech(
    provider: &dyn SpeechProvider,
    text: &str,
    style: &VoiceStyle,
    mut on_progress: impl FnMut(AudioStage, &str),
) -> Result<EncodedAudio, StylerError> {
    let prompt = build_prompt(style, text);

    on_progress(AudioStage::Requesting, "Requesting speech...");
    let pcm = provider
        .synthesize(&prompt, style.voice_name)
        .await
        .map_err(|e| {
            warn!(style = style.id, error = %e, "speech request failed");
            StylerError::from(e)
        })?;

    if pcm.is_empty() {
        return Err(StylerError::GenerationFailed("No audio data generated.".to_string()));
    }
    debug!(bytes = pcm.len(), "received pcm");

    on_progress(AudioStage::Decoding, "Decoding audio...");
    let samples = decode_pcm16(&pcm)?;

    on_progress(AudioStage::Encoding, "Encoding WAV...");
    let wav = encode_wav(&samples, PROVIDER_SAMPLE_RATE, PROVIDER_CHANNELS)?;
    let frames = samples.len() / PROVIDER_CHANNELS as usize;

    Ok(EncodedAudio {
        wav,
        frames,
        duration_secs: duration_secs(frames, PROVIDER_SAMPLE_RATE),
    })
}
