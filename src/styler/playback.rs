//! Per-artifact playback state machine.
//!
//! The host's media element reports its native events as [`PlaybackSignal`]s;
//! the controller folds them into a [`PlaybackState`] that observers (progress
//! bar, waveform) read through a watch channel.

use super::audio::wav_info;
use super::audio_types::{GeneratedAudio, PlaybackState};
use super::types::StylerError;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    Idle,
    Playing,
    Paused,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSignal {
    /// User pressed play.
    Play,
    /// User pressed pause.
    Pause,
    /// The platform paused us, e.g. another stream took the output device.
    ExternalPause,
    TimeUpdate(f64),
    Seeked(f64),
    DurationChange(f64),
    Ended,
    LoadFailed(String),
}

pub struct PlaybackController {
    audio_id: String,
    phase: PlaybackPhase,
    position: f64,
    duration: f64,
    unavailable: Option<String>,
    state_tx: watch::Sender<PlaybackState>,
}

impl PlaybackController {
    /// Open the artifact's resource and read its duration from the WAV header.
    pub fn open(audio: &GeneratedAudio) -> Result<Self, StylerError> {
        let unavailable = |reason: String| StylerError::PlaybackUnavailable {
            audio_id: audio.id.clone(),
            reason,
        };

        let bytes = audio.handle.open().map_err(|e| match e {
            StylerError::PlaybackUnavailable { reason, .. } => unavailable(reason),
            other => unavailable(other.to_string()),
        })?;
        let info = wav_info(&bytes).map_err(|e| unavailable(e.to_string()))?;

        Ok(Self::with_duration(&audio.id, info.duration_secs))
    }

    pub fn with_duration(audio_id: &str, duration_secs: f64) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::default());
        Self {
            audio_id: audio_id.to_string(),
            phase: PlaybackPhase::Idle,
            position: 0.0,
            duration: sanitize_duration(duration_secs),
            unavailable: None,
            state_tx,
        }
    }

    pub fn audio_id(&self) -> &str {
        &self.audio_id
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.phase == PlaybackPhase::Playing,
            progress: self.progress(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    pub fn play(&mut self) -> Result<PlaybackPhase, StylerError> {
        self.handle(PlaybackSignal::Play)
    }

    pub fn pause(&mut self) -> Result<PlaybackPhase, StylerError> {
        self.handle(PlaybackSignal::Pause)
    }

    /// Play/pause button semantics.
    pub fn toggle(&mut self) -> Result<PlaybackPhase, StylerError> {
        if self.phase == PlaybackPhase::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    pub fn handle(&mut self, signal: PlaybackSignal) -> Result<PlaybackPhase, StylerError> {
        if let Some(reason) = &self.unavailable {
            if matches!(signal, PlaybackSignal::Pause | PlaybackSignal::ExternalPause) {
                return Ok(self.phase);
            }
            return Err(StylerError::PlaybackUnavailable {
                audio_id: self.audio_id.clone(),
                reason: reason.clone(),
            });
        }

        let before = self.phase;
        match signal {
            PlaybackSignal::Play => match self.phase {
                PlaybackPhase::Idle | PlaybackPhase::Paused => self.phase = PlaybackPhase::Playing,
                PlaybackPhase::Ended => {
                    self.position = 0.0;
                    self.phase = PlaybackPhase::Playing;
                }
                PlaybackPhase::Playing => {}
            },
            PlaybackSignal::Pause | PlaybackSignal::ExternalPause => {
                if self.phase == PlaybackPhase::Playing {
                    self.phase = PlaybackPhase::Paused;
                }
            }
            PlaybackSignal::TimeUpdate(pos) => {
                self.position = sanitize_position(pos);
                if self.phase == PlaybackPhase::Playing
                    && self.duration > 0.0
                    && self.position >= self.duration
                {
                    self.finish();
                } else {
                    self.leave_end_if_rewound();
                }
            }
            PlaybackSignal::Seeked(pos) => {
                self.position = sanitize_position(pos);
                self.leave_end_if_rewound();
            }
            PlaybackSignal::DurationChange(d) => {
                self.duration = sanitize_duration(d);
            }
            PlaybackSignal::Ended => self.finish(),
            PlaybackSignal::LoadFailed(reason) => {
                warn!(audio_id = %self.audio_id, %reason, "playback resource failed to load");
                self.phase = PlaybackPhase::Idle;
                self.position = 0.0;
                self.unavailable = Some(reason.clone());
                self.publish();
                return Err(StylerError::PlaybackUnavailable {
                    audio_id: self.audio_id.clone(),
                    reason,
                });
            }
        }

        if before != self.phase {
            debug!(
                audio_id = %self.audio_id,
                from = ?before,
                to = ?self.phase,
                "playback transition"
            );
        }
        self.publish();
        Ok(self.phase)
    }

    fn finish(&mut self) {
        self.phase = PlaybackPhase::Ended;
        self.position = self.duration;
    }

    /// Progress is pinned at 1.0 only while the position sits at the end.
    fn leave_end_if_rewound(&mut self) {
        if self.phase == PlaybackPhase::Ended && self.position < self.duration {
            self.phase = PlaybackPhase::Paused;
        }
    }

    fn progress(&self) -> f64 {
        if self.phase == PlaybackPhase::Ended {
            return 1.0;
        }
        progress_fraction(self.position, self.duration)
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state());
    }
}

/// `position / duration` clamped to [0, 1]; unknown or zero duration is 0.
pub fn progress_fraction(position: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !position.is_finite() {
        return 0.0;
    }
    (position / duration).clamp(0.0, 1.0)
}

fn sanitize_duration(d: f64) -> f64 {
    if d.is_finite() && d > 0.0 {
        d
    } else {
        0.0
    }
}

fn sanitize_position(p: f64) -> f64 {
    if p.is_finite() && p > 0.0 {
        p
    } else {
        0.0
    }
}
