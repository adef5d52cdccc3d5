//! Speech-synthesis collaborator.
//!
//! The conversation core only needs `text -> {mime_type, base64}`; the
//! provider behind it is opaque.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;

use bmo_core::config::SpeechConfig;

use crate::error::SpeechError;
use crate::types::SpeechPayload;

/// MIME type of the audio produced by [`OpenAiSpeechClient`].
pub const MP3_MIME_TYPE: &str = "audio/mpeg";

/// Turns narration text into encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SpeechPayload, SpeechError>;
}

/// Client for an OpenAI-compatible `/audio/speech` endpoint.
#[derive(Clone)]
pub struct OpenAiSpeechClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    voice: String,
}

impl OpenAiSpeechClient {
    pub fn new(config: &SpeechConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/audio/speech", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            voice: config.voice.clone(),
        })
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<SpeechPayload, SpeechError> {
        let body = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError(format!("TTS request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SpeechError(format!(
                "TTS failed with HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError(format!("failed to read TTS audio: {e}")))?;
        tracing::debug!(bytes = audio.len(), "Speech synthesized");

        Ok(encode_audio(&audio))
    }
}

/// Wrap raw MP3 bytes as a payload.
pub fn encode_audio(audio: &[u8]) -> SpeechPayload {
    SpeechPayload {
        mime_type: MP3_MIME_TYPE.to_string(),
        base64: BASE64_STANDARD.encode(audio),
    }
}

// =============================================================================
// Tests
// =============================================================================
