//! End-to-end generation flow against a scripted speech provider.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};
use voice_styler::{
    read_wav_samples, wav_info, AudioStage, PlaybackPhase, PlaybackSignal, ProviderError,
    SpeechProvider, StylerError, VoiceStyler, WAV_HEADER_LEN,
};

/// Replies from a queue and records every request it sees.
#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Vec<u8>, ProviderError>>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    fn with(replies: Vec<Result<Vec<u8>, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechProvider for ScriptedProvider {
    async fn synthesize(&self, prompt: &str, voice_name: &str) -> Result<Vec<u8>, ProviderError> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), voice_name.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::NoAudio))
    }
}

/// Holds the request open until the test releases it.
struct GatedProvider {
    started: Mutex<Option<oneshot::Sender<()>>>,
    release: Notify,
}

#[async_trait]
impl SpeechProvider for GatedProvider {
    async fn synthesize(&self, _prompt: &str, _voice: &str) -> Result<Vec<u8>, ProviderError> {
        if let Some(tx) = self.started.lock().unwrap().take() {
            let _ = tx.send(());
        }
        self.release.notified().await;
        Ok(vec![0; 4800])
    }
}

#[tokio::test]
async fn villain_hello_world_lands_in_history() {
    let provider = ScriptedProvider::with(vec![Ok(vec![0u8; 48000])]);
    let session = VoiceStyler::new(provider.clone());
    session.set_input_text("Hello world").unwrap();
    session.select_style("villain").unwrap();

    let mut stages = Vec::new();
    let audio = session
        .generate_with_progress(|stage, _| stages.push(stage))
        .await
        .unwrap();

    assert_eq!(audio.style_name, "The Villain");
    assert_eq!(audio.text, "Hello world");
    assert!((audio.duration - 1.0).abs() < 1e-6);
    assert_eq!(stages.len(), 3);
    assert_eq!(stages[0], AudioStage::Requesting);

    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, audio.id);

    let download = session.download(&audio.id).unwrap();
    assert_eq!(download.bytes.len(), WAV_HEADER_LEN + 48000);
    assert_eq!(download.file_name, format!("voice-styler-{}.wav", audio.id));
    assert_eq!(download.content_type, "audio/wav");
    assert_eq!(wav_info(&download.bytes).unwrap().frames, 24000);

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].1, "Fenrir");
    assert!(requests[0].0.ends_with("like a classic villain: Hello world"));

    // text is kept for tweaking
    assert_eq!(session.input_text(), "Hello world");
    assert!(session.can_generate());
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn missing_audio_leaves_history_untouched() {
    let provider = ScriptedProvider::with(vec![Err(ProviderError::NoAudio)]);
    let session = VoiceStyler::new(provider);
    session.set_input_text("Hello world").unwrap();

    let err = session.generate().await.unwrap_err();
    assert!(matches!(err, StylerError::GenerationFailed(_)));
    assert_eq!(session.history().len(), 0);
    assert!(!session.is_generating());
    assert!(session.can_generate());
    assert_eq!(session.last_error().as_deref(), Some("No audio data generated."));
}

#[tokio::test]
async fn odd_length_pcm_fails_without_entry() {
    let provider = ScriptedProvider::with(vec![Ok(vec![1, 2, 3])]);
    let session = VoiceStyler::new(provider);
    session.set_input_text("x").unwrap();

    let err = session.generate().await.unwrap_err();
    assert!(matches!(err, StylerError::MalformedAudioData(_)));
    assert!(session.history().is_empty());
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn blank_text_never_reaches_provider() {
    let provider = ScriptedProvider::with(vec![]);
    let session = VoiceStyler::new(provider.clone());
    session.set_input_text("   \n").unwrap();

    assert!(!session.can_generate());
    assert!(matches!(session.generate().await, Err(StylerError::EmptyText)));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn error_is_cleared_by_next_success_and_history_is_newest_first() {
    let provider = ScriptedProvider::with(vec![
        Ok(vec![0; 2400]),
        Err(ProviderError::ApiResponse {
            status: 500,
            message: "boom".into(),
        }),
        Ok(vec![0; 4800]),
    ]);
    let session = VoiceStyler::new(provider);
    session.set_input_text("one").unwrap();
    let first = session.generate().await.unwrap();

    assert!(session.generate().await.is_err());
    assert!(session.last_error().unwrap().contains("500"));

    session.select_style("hero").unwrap();
    let third = session.generate().await.unwrap();
    assert!(session.last_error().is_none());

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, third.id);
    assert_eq!(history[0].style_name, "The Hero");
    assert_eq!(history[1].id, first.id);
    assert_eq!(history[1].style_name, "The Narrator");
}

#[tokio::test]
async fn second_request_is_rejected_while_one_is_in_flight() {
    let (started_tx, started_rx) = oneshot::channel();
    let provider = Arc::new(GatedProvider {
        started: Mutex::new(Some(started_tx)),
        release: Notify::new(),
    });
    let session = Arc::new(VoiceStyler::new(provider.clone()));
    session.set_input_text("busy").unwrap();

    let running = {
        let session = session.clone();
        tokio::spawn(async move { session.generate().await })
    };
    started_rx.await.unwrap();

    assert!(session.is_generating());
    assert!(!session.can_generate());
    assert!(matches!(
        session.generate().await,
        Err(StylerError::GenerationInProgress)
    ));
    assert!(matches!(
        session.set_input_text("edit"),
        Err(StylerError::GenerationInProgress)
    ));
    assert!(matches!(
        session.select_style("hero"),
        Err(StylerError::GenerationInProgress)
    ));

    provider.release.notify_one();
    let audio = running.await.unwrap().unwrap();
    assert!((audio.duration - 0.1).abs() < 1e-6);
    assert!(!session.is_generating());
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn players_are_independent_and_clear_releases_them() {
    let provider = ScriptedProvider::with(vec![Ok(vec![0; 4800]), Ok(vec![0; 9600])]);
    let session = VoiceStyler::new(provider);
    session.set_input_text("a").unwrap();
    let short = session.generate().await.unwrap();
    let long = session.generate().await.unwrap();

    let mut p_short = session.open_player(&short.id).unwrap();
    let mut p_long = session.open_player(&long.id).unwrap();
    assert!((p_long.duration() - 0.2).abs() < 1e-9);

    p_short.play().unwrap();
    p_long.play().unwrap();
    p_short.handle(PlaybackSignal::Ended).unwrap();
    assert_eq!(p_short.phase(), PlaybackPhase::Ended);
    assert_eq!(p_long.phase(), PlaybackPhase::Playing);

    assert_eq!(session.clear_history(), 2);
    assert!(session.history().is_empty());
    assert!(short.handle.is_released());
    assert!(matches!(
        session.open_player(&long.id),
        Err(StylerError::UnknownAudio(_))
    ));
    assert!(matches!(
        voice_styler::PlaybackController::open(&long),
        Err(StylerError::PlaybackUnavailable { .. })
    ));
}

#[tokio::test]
async fn stored_wav_round_trips_provider_samples() {
    let pcm: Vec<u8> = [i16::MIN, -1234, 0, 1234, i16::MAX]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let provider = ScriptedProvider::with(vec![Ok(pcm)]);
    let session = VoiceStyler::new(provider);
    session.set_input_text("levels").unwrap();
    let audio = session.generate().await.unwrap();

    let samples = read_wav_samples(&session.download(&audio.id).unwrap().bytes).unwrap();
    assert_eq!(samples[0], i16::MIN);
    assert_eq!(samples[1], -1234);
    assert_eq!(samples[2], 0);
    assert!((samples[3] - 1234).abs() <= 1);
    assert!((samples[4] as i32 - i16::MAX as i32).abs() <= 1);
}
