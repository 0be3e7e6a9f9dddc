//! Chat completion endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::gemini::Content;
use crate::llm::ChatMessage;

/// Chat request: caller-supplied conversation plus a language tag
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Chat response; `conversation_id` is echoed unchanged, including null
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Complete one chat exchange over the caller-supplied history
pub async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.messages.is_empty() {
        return Err(ApiError::bad_request("No messages provided"));
    }

    let mut contents = Vec::with_capacity(payload.messages.len() + 1);
    contents.push(Content::text("user", chat_instruction(&payload.language)));
    contents.extend(payload.messages.iter().map(Content::from_message));

    let response = state
        .gemini
        .generate_chat(contents, None)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "chat completion failed");
            ApiError::internal(e.to_string())
        })?;

    Ok(Json(ChatResponse {
        response,
        conversation_id: payload.conversation_id,
    }))
}

/// Per-language assistant instruction, prepended once per call and never
/// stored in history
fn chat_instruction(language: &str) -> String {
    match language {
        "hi" => "You are a helpful AI assistant. \
                 Reply to the user only in Hindi, using Devanagari script."
            .to_string(),
        _ => "You are a helpful AI assistant. Reply concisely using natural English.".to_string(),
    }
}
