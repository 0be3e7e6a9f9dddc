//! Voice agent pipeline orchestrator
//!
//! Sequences transcription, chat completion, history update, and speech
//! synthesis for one turn-taking conversation. History lives only in
//! process memory for the lifetime of the agent.

use crate::config::{ChatProvider, Settings};
use crate::llm::{ChatBackend, ChatClient, ChatMessage};
use crate::voice::{
    EspeakSynthesizer, HostedTranscriber, LocalTranscriber, NullSynthesizer, SpeechToText,
    Synthesizer,
};
use crate::Result;

/// Coordinates transcription, chat completion, and speech output over a
/// bounded rolling conversation history
pub struct VoiceAgent {
    settings: Settings,
    chat: Box<dyn ChatBackend>,
    transcriber: Box<dyn SpeechToText>,
    synthesizer: Box<dyn Synthesizer>,
    history: Vec<ChatMessage>,
}

impl VoiceAgent {
    /// Wire up the default adapters for the given settings
    ///
    /// Transcription prefers the local whisper backend when a model path
    /// is configured and falls back to hosted transcription otherwise.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required credential, model,
    /// or engine is missing.
    pub fn from_settings(settings: Settings, mute: bool) -> Result<Self> {
        let chat = Box::new(ChatClient::from_settings(&settings)?);

        let transcriber: Box<dyn SpeechToText> = if settings.whisper_model_path.is_some() {
            Box::new(LocalTranscriber::from_settings(&settings)?)
        } else {
            Box::new(HostedTranscriber::from_settings(&settings)?)
        };

        let synthesizer: Box<dyn Synthesizer> = if mute {
            Box::new(NullSynthesizer)
        } else {
            Box::new(EspeakSynthesizer::from_settings(&settings)?)
        };

        Ok(Self::new(settings, chat, transcriber, synthesizer))
    }

    /// Assemble an agent from explicit adapters
    #[must_use]
    pub fn new(
        settings: Settings,
        chat: Box<dyn ChatBackend>,
        transcriber: Box<dyn SpeechToText>,
        synthesizer: Box<dyn Synthesizer>,
    ) -> Self {
        Self {
            settings,
            chat,
            transcriber,
            synthesizer,
            history: Vec::new(),
        }
    }

    /// Eagerly initialize the transcription backend so load failures
    /// surface before the first request
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the backend cannot be used.
    pub fn ensure_ready(&self) -> Result<()> {
        self.transcriber.ensure_ready()
    }

    /// Clear the full conversation history
    pub fn reset_history(&mut self) {
        tracing::debug!("resetting conversation history");
        self.history.clear();
    }

    /// The complete stored history, oldest first
    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// The most recent window of history forwarded to the chat provider.
    /// Always a tail slice in chronological order; empty when the
    /// configured window size is zero or negative.
    #[must_use]
    pub fn recent_history(&self) -> &[ChatMessage] {
        let window = self.settings.max_history_messages;
        if window <= 0 {
            return &[];
        }
        #[allow(clippy::cast_sign_loss)]
        let window = window as usize;
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    /// Transcribe audio, then run a full chat turn on the transcript
    ///
    /// # Errors
    ///
    /// Propagates transcription, chat-completion, and speech-synthesis
    /// errors. A synthesis failure occurs after the turn has been
    /// committed to history and does not roll it back.
    pub async fn process_audio(&mut self, sample_rate: u32, samples: &[f32]) -> Result<String> {
        tracing::debug!("processing audio input");
        let text = self.transcriber.transcribe(sample_rate, samples).await?;
        self.run_turn(text).await
    }

    /// Run a full chat turn on typed text
    ///
    /// # Errors
    ///
    /// Propagates chat-completion and speech-synthesis errors. A
    /// synthesis failure occurs after the turn has been committed to
    /// history and does not roll it back.
    pub async fn process_text(&mut self, user_text: &str) -> Result<String> {
        tracing::debug!("processing text input");
        self.run_turn(user_text.to_string()).await
    }

    async fn run_turn(&mut self, user_text: String) -> Result<String> {
        let reply = self.chat.complete(self.recent_history(), &user_text).await?;

        // The reply exists once the chat call succeeds, so the turn is
        // committed before playback; a synthesis failure surfaces to the
        // caller but the committed turn stays.
        self.history.push(ChatMessage::user(user_text));
        self.history.push(ChatMessage::assistant(reply.clone()));

        self.synthesizer.speak(&reply).await?;
        Ok(reply)
    }

    /// Display name of the configured persona
    #[must_use]
    pub fn persona_name(&self) -> &str {
        &self.settings.persona_name
    }

    /// Which chat provider the agent talks to
    #[must_use]
    pub fn chat_provider(&self) -> ChatProvider {
        self.settings.chat_provider
    }
}
