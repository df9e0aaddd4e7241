use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}

/// POST /api/v1/tts/tts - synthesize speech, returned base64 encoded
pub async fn text_to_speech(State(state): State<AppState>, Json(input): Json<TtsRequest>) -> ApiResult<Value> {
    if input.text.trim().is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }
    let audio = state.speech.text_to_speech(&input.text).await?;
    Ok(ApiResponse::success(json!({ "audio_content": STANDARD.encode(audio) })))
}

/// POST /api/v1/stt/stt - transcribe the multipart `audio` field
pub async fn speech_to_text(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Value> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let filename = field.file_name().unwrap_or("audio").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read audio: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Audio file is empty"));
        }

        let transcription = state.speech.speech_to_text(bytes.to_vec(), &filename).await?;
        return Ok(ApiResponse::success(json!({ "transcription": transcription })));
    }

    Err(ApiError::bad_request("Audio file is required"))
}
