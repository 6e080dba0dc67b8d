pub mod audio;
pub mod audio_types;
pub mod gemini;
pub mod playback;
pub mod speech;
pub mod store;
pub mod styles;
pub mod types;
pub mod waveform;
