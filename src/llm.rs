//! Chat completion adapter
//!
//! Translates the gateway's conversation model into provider chat APIs.
//! Two backends are supported: the Gemini `generateContent` protocol and
//! OpenAI-compatible chat completions (Groq).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ChatProvider, Settings};
use crate::gemini::{Content, GeminiClient};
use crate::{Error, Result};

/// Request timeout for chat completion calls
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Speaker of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Gemini reports this role as "model"
    #[serde(alias = "model")]
    Assistant,
}

/// One turn of conversation: a role paired with text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Produces a reply given prior conversation and new user text
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Complete one turn of conversation
    ///
    /// `history` is the windowed prior conversation, oldest first. The
    /// persona/system instruction is the backend's concern and is never
    /// part of `history`.
    ///
    /// # Errors
    ///
    /// Returns a chat-completion error on transport or provider failure,
    /// and when the provider reply is empty.
    async fn complete(&self, history: &[ChatMessage], user_text: &str) -> Result<String>;
}

/// Chat provider backend
enum Backend {
    Gemini(GeminiClient),
    /// OpenAI-compatible chat completions endpoint
    OpenAiCompat {
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
    },
}

/// Chat completion client with a fixed persona and tuning parameters
pub struct ChatClient {
    backend: Backend,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

/// Groq's OpenAI-compatible endpoint
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

impl ChatClient {
    /// Build a chat client for the provider selected in `settings`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the selected provider's
    /// credential is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let backend = match settings.chat_provider {
            ChatProvider::Gemini => Backend::Gemini(GeminiClient::from_settings(settings)?),
            ChatProvider::Groq => {
                let api_key = settings.groq_api_key.clone().ok_or_else(|| {
                    Error::Config("GROQ_API_KEY is required for the groq chat provider".to_string())
                })?;
                Backend::OpenAiCompat {
                    client: reqwest::Client::new(),
                    base_url: GROQ_BASE_URL.to_string(),
                    api_key,
                    model: settings.groq_model.clone(),
                }
            }
        };

        Ok(Self {
            backend,
            system_prompt: settings.persona.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    async fn complete_gemini(
        &self,
        gemini: &GeminiClient,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<String> {
        // The persona rides along as the leading user content; it is never
        // stored in history.
        let mut contents = Vec::with_capacity(history.len() + 2);
        contents.push(Content::text("user", &self.system_prompt));
        contents.extend(history.iter().map(Content::from_message));
        contents.push(Content::text("user", user_text));

        gemini
            .generate_chat(contents, Some((self.temperature, self.max_tokens)))
            .await
    }

    async fn complete_openai_compat(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        api_key: &str,
        model: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct WireMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: &'a str,
            messages: Vec<WireMessage<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: Option<String>,
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: &self.system_prompt,
        });
        messages.extend(history.iter().map(|m| WireMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));
        messages.push(WireMessage {
            role: "user",
            content: user_text,
        });

        let request = CompletionRequest {
            model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model, turns = history.len(), "sending chat completion request");

        let response = client
            .post(format!("{base_url}/chat/completions"))
            .header("Authorization", format!("Bearer {api_key}"))
            .timeout(CHAT_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ChatCompletion(format!("network error contacting provider: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat provider error");
            return Err(Error::ChatCompletion(format!(
                "provider error {status}: {body}"
            )));
        }

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::ChatCompletion(format!("failed to parse provider response: {e}")))?;

        let reply = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let reply = reply.trim();

        if reply.is_empty() {
            return Err(Error::ChatCompletion(
                "provider returned an empty reply".to_string(),
            ));
        }

        Ok(reply.to_string())
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn complete(&self, history: &[ChatMessage], user_text: &str) -> Result<String> {
        let reply = match &self.backend {
            Backend::Gemini(gemini) => self.complete_gemini(gemini, history, user_text).await?,
            Backend::OpenAiCompat {
                client,
                base_url,
                api_key,
                model,
            } => {
                self.complete_openai_compat(client, base_url, api_key, model, history, user_text)
                    .await?
            }
        };

        tracing::info!(chars = reply.len(), "received chat reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_serde() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");

        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn model_role_is_accepted_as_assistant() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "model", "content": "hi"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = serde_json::from_str::<ChatMessage>(r#"{"role": "system", "content": "x"}"#);
        assert!(result.is_err());
    }
}
