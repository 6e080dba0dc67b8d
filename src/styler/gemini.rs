use super::types::{non_blank, ProviderConfig, ProviderError};

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// A speech synthesis backend. Returns raw PCM16 little-endian mono bytes.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(&self, prompt: &str, voice_name: &str) -> Result<Vec<u8>, ProviderError>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = non_blank(config.api_key.clone()).ok_or(ProviderError::NoApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.resolved_base_url(),
            model: config.resolved_model(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generate_content_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl SpeechProvider for GeminiClient {
    async fn synthesize(&self, prompt: &str, voice_name: &str) -> Result<Vec<u8>, ProviderError> {
        let url = self.generate_content_url();
        let body = speech_request_body(prompt, voice_name);

        debug!(model = %self.model, voice = voice_name, "requesting speech");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiResponse {
                status: status.as_u16(),
                message,
            });
        }

        let raw: Value = response.json().await?;
        extract_inline_audio(&raw)
    }
}

pub fn speech_request_body(prompt: &str, voice_name: &str) -> Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice_name }
                }
            }
        }
    })
}

/// Pulls the first inline audio part out of a `generateContent` response.
pub fn extract_inline_audio(raw: &Value) -> Result<Vec<u8>, ProviderError> {
    let data = raw
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c0| c0.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .and_then(|parts| {
            parts
                .iter()
                .find_map(|part| part.get("inlineData").and_then(|d| d.get("data")))
        })
        .and_then(|d| d.as_str())
        .filter(|d| !d.is_empty())
        .ok_or(ProviderError::NoAudio)?;

    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_prompt_and_voice() {
        let body = speech_request_body("Narrate: hi", "Charon");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Narrate: hi");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Charon"
        );
    }

    #[test]
    fn finds_inline_part_after_text_part() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "ignored" },
                    { "inlineData": { "mimeType": "audio/L16;rate=24000", "data": "AAD/fw==" } }
                ]}
            }]
        });
        assert_eq!(extract_inline_audio(&raw).unwrap(), vec![0x00, 0x00, 0xff, 0x7f]);
    }

    #[test]
    fn missing_audio_is_reported() {
        for raw in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [{ "content": { "parts": [{ "text": "no" }] } }] }),
            json!({ "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "" } }] } }] }),
        ] {
            assert!(matches!(extract_inline_audio(&raw), Err(ProviderError::NoAudio)));
        }
    }

    #[test]
    fn bad_base64_is_invalid_payload() {
        let raw = json!({ "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "***" } }] } }] });
        assert!(matches!(extract_inline_audio(&raw), Err(ProviderError::InvalidPayload(_))));
    }

    #[test]
    fn client_requires_api_key() {
        let err = GeminiClient::new(ProviderConfig::default()).err().unwrap();
        assert!(matches!(err, ProviderError::NoApiKey));
    }

    #[test]
    fn endpoint_uses_model() {
        let client = GeminiClient::new(ProviderConfig {
            api_key: Some("k".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.generate_content_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-tts:generateContent"
        );
    }
}
