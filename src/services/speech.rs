use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::config::SpeechConfig;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("ElevenLabs API key is not configured")]
    NotConfigured,

    #[error("ElevenLabs {0} error: {1}")]
    Http(&'static str, reqwest::Error),

    #[error("ElevenLabs STT error: response did not contain a transcription")]
    MissingText,
}

/// Text-to-speech and speech-to-text. Audio bytes pass through untouched.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>, SpeechError>;

    async fn speech_to_text(&self, audio: Vec<u8>, filename: &str) -> Result<String, SpeechError>;
}

pub struct ElevenLabsClient {
    http: reqwest::Client,
    config: SpeechConfig,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Deserialize)]
struct SttResponse {
    text: Option<String>,
}

impl ElevenLabsClient {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Result<&str, SpeechError> {
        let key = self.config.elevenlabs_api_key.trim();
        if key.is_empty() {
            return Err(SpeechError::NotConfigured);
        }
        Ok(key)
    }
}

#[async_trait]
impl SpeechClient for ElevenLabsClient {
    async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let tts = |e| SpeechError::Http("TTS", e);
        let body = TtsRequest {
            text,
            model_id: &self.config.tts_model_id,
            voice_settings: VoiceSettings { stability: 0.5, similarity_boost: 0.75 },
        };

        let bytes = self
            .http
            .post(self.url(&format!("/v1/text-to-speech/{}", self.config.voice_id)))
            .query(&[("output_format", self.config.output_format.as_str())])
            .header("xi-api-key", self.api_key()?)
            .json(&body)
            .send()
            .await
            .map_err(tts)?
            .error_for_status()
            .map_err(tts)?
            .bytes()
            .await
            .map_err(tts)?;

        Ok(bytes.to_vec())
    }

    async fn speech_to_text(&self, audio: Vec<u8>, filename: &str) -> Result<String, SpeechError> {
        let stt = |e| SpeechError::Http("STT", e);
        let form = Form::new()
            .text("model_id", self.config.stt_model_id.clone())
            .text("tag_audio_events", "true")
            .text("language_code", self.config.language_code.clone())
            .text("diarize", "true")
            .part("file", Part::bytes(audio).file_name(filename.to_string()));

        let response = self
            .http
            .post(self.url("/v1/speech-to-text"))
            .header("xi-api-key", self.api_key()?)
            .multipart(form)
            .send()
            .await
            .map_err(stt)?
            .error_for_status()
            .map_err(stt)?
            .json::<SttResponse>()
            .await
            .map_err(stt)?;

        response.text.ok_or(SpeechError::MissingText)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tts_body_shape() {
        let body = TtsRequest {
            text: "hello",
            model_id: "eleven_flash_v2_5",
            voice_settings: VoiceSettings { stability: 0.5, similarity_boost: 0.75 },
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["model_id"], "eleven_flash_v2_5");
        assert_eq!(value["voice_settings"]["similarity_boost"], 0.75);
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let client = ElevenLabsClient::new(&SpeechConfig::default());
        assert!(matches!(client.text_to_speech("hi").await, Err(SpeechError::NotConfigured)));
    }
}
