//! Gemini API wire protocol
//!
//! Typed request/response schema for the `generateContent` endpoint, used
//! for both chat completion and inline-audio transcription. Fields the
//! provider may omit are explicit options; a response without usable text
//! is detected here and reported as a local error, never returned silently.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::llm::{ChatMessage, Role};
use crate::{Error, Result};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

/// Request timeout for chat calls
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Request timeout for audio calls; transcription uploads are slower
const AUDIO_TIMEOUT: Duration = Duration::from_secs(90);

/// One entry of the `contents` array
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

/// A single content part: text or inline binary data
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded binary payload with its MIME type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl Content {
    /// Plain text content for the given wire role
    pub fn text(role: &'static str, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part {
                text: Some(text.into()),
                ..Part::default()
            }],
        }
    }

    /// Map a conversation message onto the wire schema; the provider calls
    /// the assistant role "model"
    pub fn from_message(message: &ChatMessage) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };
        Self::text(role, message.content.clone())
    }

    /// Inline audio followed by a textual instruction
    pub fn audio(mime_type: &str, data: &[u8], instruction: impl Into<String>) -> Self {
        Self {
            role: "user",
            parts: vec![
                Part {
                    inline_data: Some(InlineData {
                        mime_type: mime_type.to_string(),
                        data: BASE64.encode(data),
                    }),
                    ..Part::default()
                },
                Part {
                    text: Some(instruction.into()),
                    ..Part::default()
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Extract the first candidate's text, joining multiple parts.
    /// Returns `None` when no candidate carries usable text.
    fn text(&self) -> Option<String> {
        for candidate in &self.candidates {
            let Some(content) = &candidate.content else {
                continue;
            };
            let texts: Vec<&str> = content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .filter(|t| !t.is_empty())
                .collect();
            if !texts.is_empty() {
                let joined = texts.join("\n");
                let trimmed = joined.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }
}

/// Provider error body: `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Client for the hosted chat and transcription models
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    stt_model: String,
}

impl GeminiClient {
    /// Build a client from settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .gemini_api_key
            .clone()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is required".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            chat_model: settings.gemini_chat_model.clone(),
            stt_model: settings.gemini_stt_model.clone(),
        })
    }

    /// Run a chat completion over pre-assembled contents
    ///
    /// # Errors
    ///
    /// Returns a chat-completion error on transport or provider failure,
    /// and when the response carries no text.
    pub async fn generate_chat(
        &self,
        contents: Vec<Content>,
        tuning: Option<(f32, u32)>,
    ) -> Result<String> {
        let request = GenerateContentRequest {
            contents,
            generation_config: tuning.map(|(temperature, max_output_tokens)| GenerationConfig {
                temperature,
                max_output_tokens,
            }),
        };

        self.generate(&self.chat_model, &request, CHAT_TIMEOUT)
            .await
            .map_err(Error::ChatCompletion)
    }

    /// Transcribe encoded audio by sending it inline with an instruction
    /// naming the target language
    ///
    /// # Errors
    ///
    /// Returns a transcription error on transport or provider failure, and
    /// when the response carries no text.
    pub async fn transcribe(&self, audio: &[u8], mime_type: &str, language: &str) -> Result<String> {
        tracing::debug!(
            audio_bytes = audio.len(),
            mime_type,
            language,
            "starting hosted transcription"
        );

        let request = GenerateContentRequest {
            contents: vec![Content::audio(
                mime_type,
                audio,
                transcription_instruction(language),
            )],
            generation_config: None,
        };

        let text = self
            .generate(&self.stt_model, &request, AUDIO_TIMEOUT)
            .await
            .map_err(Error::Transcription)?;

        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        timeout: Duration,
    ) -> std::result::Result<String, String> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| format!("network error contacting Gemini: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(status, &body);
            tracing::error!(status = %status, %message, "Gemini API error");
            return Err(message);
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse Gemini response: {e}"))?;

        result
            .text()
            .ok_or_else(|| "Gemini response did not include text output".to_string())
    }
}

/// Instruction asking the model to return only the spoken words
fn transcription_instruction(language: &str) -> String {
    let target = match language {
        "hi" => "Hindi",
        _ => "English",
    };
    format!(
        "Transcribe the audio input in {target}. \
         Return only the words you hear without any additional commentary."
    )
}

/// Pull the provider's message out of an error body, falling back to a
/// status-labelled description
fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let fallback = format!("Gemini API error ({status})");

    let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) else {
        return fallback;
    };
    let message = parsed
        .error
        .and_then(|e| e.message)
        .map(|m| m.trim().to_string())
        .unwrap_or_default();

    if message.is_empty() {
        fallback
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_inline_data() {
        let content = Content::audio("audio/wav", b"abc", "transcribe this");
        let json = serde_json::to_value(&content).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["parts"][0]["inlineData"]["mimeType"], "audio/wav");
        assert_eq!(json["parts"][0]["inlineData"]["data"], "YWJj");
        assert_eq!(json["parts"][1]["text"], "transcribe this");
        // absent fields are omitted entirely
        assert!(json["parts"][0].get("text").is_none());
    }

    #[test]
    fn assistant_messages_map_to_model_role() {
        let content = Content::from_message(&ChatMessage::assistant("hello"));
        assert_eq!(content.role, "model");

        let content = Content::from_message(&ChatMessage::user("hello"));
        assert_eq!(content.role, "user");
    }

    #[test]
    fn response_text_joins_parts_of_first_usable_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": ""}]}},
                    {"content": {"parts": [{"text": "Hello"}, {"text": "world "}]}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(response.text().unwrap(), "Hello\nworld");
    }

    #[test]
    fn response_without_text_yields_none() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap();
        assert!(response.text().is_none());

        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn error_message_extraction_prefers_provider_text() {
        let status = reqwest::StatusCode::BAD_REQUEST;

        let message =
            extract_error_message(status, r#"{"error": {"message": " quota exceeded "}}"#);
        assert_eq!(message, "quota exceeded");

        let message = extract_error_message(status, "not json");
        assert_eq!(message, "Gemini API error (400 Bad Request)");

        let message = extract_error_message(status, r#"{"error": {}}"#);
        assert_eq!(message, "Gemini API error (400 Bad Request)");
    }
}
