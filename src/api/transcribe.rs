//! Transcription endpoint
//!
//! Accepts a multipart upload and forwards the audio bytes to the hosted
//! transcription model without re-encoding.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use super::{ApiError, ApiState};

/// Accepted upload content types; anything else is rejected up front
const ALLOWED_AUDIO_TYPES: &[&str] = &[
    "audio/webm",
    "audio/mpeg",
    "audio/wav",
    "audio/mp4",
    "audio/x-m4a",
    "audio/ogg",
    "audio/opus",
];

/// Transcription response
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Transcribe an uploaded audio file
///
/// Expects a `file` part carrying the audio and an optional `language`
/// part (defaults to English).
pub async fn transcribe(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<(String, Vec<u8>)> = None;
    let mut language = "en".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let mime = normalize_mime(field.content_type().unwrap_or_default());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
                audio = Some((mime, bytes.to_vec()));
            }
            "language" => {
                language = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
            }
            _ => {}
        }
    }

    let (mime, bytes) = audio.ok_or_else(|| ApiError::bad_request("No audio file provided"))?;

    if !ALLOWED_AUDIO_TYPES.contains(&mime.as_str()) {
        return Err(ApiError::bad_request(format!(
            "Unsupported audio format: {mime}"
        )));
    }
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Empty audio file"));
    }

    tracing::debug!(%mime, bytes = bytes.len(), %language, "transcribing upload");

    let text = state
        .gemini
        .transcribe(&bytes, &mime, &language)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "transcription failed");
            ApiError::internal(e.to_string())
        })?;

    Ok(Json(TranscribeResponse { text }))
}

/// Strip parameters such as `;codecs=opus` from a content type
fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
