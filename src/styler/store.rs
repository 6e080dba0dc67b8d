use super::audio_types::{GeneratedAudio, WavDownload};
use super::types::StylerError;

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// Owned reference to an in-memory WAV buffer.
///
/// Clones share the same buffer; `release` frees it for every clone, after
/// which `open` fails.
#[derive(Clone)]
pub struct AudioHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: String,
    url: String,
    bytes: RwLock<Option<Arc<[u8]>>>,
}

impl AudioHandle {
    fn new(id: &str, wav: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: id.to_string(),
                url: format!("blob:voice-styler/{}", id),
                bytes: RwLock::new(Some(Arc::from(wav))),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn open(&self) -> Result<Arc<[u8]>, StylerError> {
        self.inner
            .bytes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| StylerError::PlaybackUnavailable {
                audio_id: self.inner.id.clone(),
                reason: "resource has been released".to_string(),
            })
    }

    pub fn is_released(&self) -> bool {
        self.inner
            .bytes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// Returns true if this call freed the buffer.
    pub fn release(&self) -> bool {
        self.inner
            .bytes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
    }
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioHandle")
            .field("url", &self.inner.url)
            .field("released", &self.is_released())
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn download_file_name(id: &str) -> String {
    format!("voice-styler-{}.wav", id)
}

/// Session history of generated audio, newest first.
///
/// Writers replace the whole list, so a snapshot from `list` is never
/// observed half-updated.
#[derive(Default)]
pub struct ArtifactStore {
    entries: RwLock<Arc<Vec<GeneratedAudio>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        wav: Vec<u8>,
        text: &str,
        style_name: &str,
        duration_secs: f64,
    ) -> GeneratedAudio {
        let id = uuid::Uuid::new_v4().to_string();
        let handle = AudioHandle::new(&id, wav);
        let audio = GeneratedAudio {
            id,
            text: text.to_string(),
            style_name: style_name.to_string(),
            timestamp: now_ms(),
            audio_url: handle.url().to_string(),
            duration: duration_secs,
            handle,
        };

        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.push(audio.clone());
        next.extend(guard.iter().cloned());
        *guard = Arc::new(next);

        info!(id = %audio.id, style = %audio.style_name, duration = audio.duration, "audio stored");
        audio
    }

    pub fn list(&self) -> Arc<Vec<GeneratedAudio>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn get(&self, id: &str) -> Option<GeneratedAudio> {
        self.list().iter().find(|a| a.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn download(&self, id: &str) -> Result<WavDownload, StylerError> {
        let audio = self
            .get(id)
            .ok_or_else(|| StylerError::UnknownAudio(id.to_string()))?;
        let bytes = audio.handle.open()?;
        Ok(WavDownload {
            file_name: download_file_name(&audio.id),
            content_type: WAV_CONTENT_TYPE,
            bytes: bytes.to_vec(),
        })
    }

    /// Removes one record and frees its buffer.
    pub fn release(&self, id: &str) -> Result<(), StylerError> {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let removed = guard
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| StylerError::UnknownAudio(id.to_string()))?;
        *guard = Arc::new(guard.iter().filter(|a| a.id != id).cloned().collect());
        drop(guard);

        removed.handle.release();
        debug!(id, "audio released");
        Ok(())
    }

    /// Empties the history and frees every buffer. Returns the number removed.
    pub fn clear(&self) -> usize {
        let old = {
            let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        for audio in old.iter() {
            audio.handle.release();
        }
        if !old.is_empty() {
            info!(count = old.len(), "history cleared");
        }
        old.len()
    }
}
