use std::io::Cursor;

/// Sample rate of the PCM returned by the speech provider.
pub const PROVIDER_SAMPLE_RATE: u32 = 24000;
pub const PROVIDER_CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const WAV_HEADER_LEN: usize = 44;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("PCM16 buffer has odd length {len}")]
    MalformedAudioData { len: usize },

    #[error("unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),

    #[error("WAV encoding error: {0}")]
    WavEncode(String),

    #[error("WAV decoding error: {0}")]
    WavDecode(String),
}

/// Interprets `bytes` as signed 16-bit little-endian PCM and normalizes each
/// sample by 32768, so `i16::MIN` maps to exactly -1.0.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>, AudioError> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::MalformedAudioData { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

/// Re-quantizes a normalized sample. Negative values scale by 32768 and
/// positive ones by 32767 so both extremes land on the i16 endpoints.
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * i16::MAX as f32) as i16
    }
}

/// Encodes interleaved normalized samples as a 16-bit PCM WAV file.
pub fn encode_wav(
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, AudioError> {
    if channels == 0 || channels > 2 {
        return Err(AudioError::UnsupportedChannels(channels));
    }
    if samples.len() % channels as usize != 0 {
        return Err(AudioError::WavEncode(format!(
            "{} samples do not fill whole frames of {} channels",
            samples.len(),
            channels
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AudioError::WavEncode(e.to_string()))?;
        for &sample in samples {
            writer
                .write_sample(quantize(sample))
                .map_err(|e| AudioError::WavEncode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::WavEncode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Samples per channel.
    pub frames: u32,
    pub duration_secs: f64,
}

/// Parse WAV header to extract layout and duration.
pub fn wav_info(bytes: &[u8]) -> Result<WavInfo, AudioError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AudioError::WavDecode(e.to_string()))?;
    let spec = reader.spec();
    let frames = reader.duration();
    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames,
        duration_secs: duration_secs(frames as usize, spec.sample_rate),
    })
}

/// Reads the data chunk of a 16-bit WAV file back as raw samples.
pub fn read_wav_samples(bytes: &[u8]) -> Result<Vec<i16>, AudioError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AudioError::WavDecode(e.to_string()))?;
    reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AudioError::WavDecode(e.to_string()))
}

pub fn duration_secs(frames: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64
}

#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub wav: Vec<u8>,
    pub frames: usize,
    pub duration_secs: f64,
}
