//! Aria Gateway - voice chat assistant
//!
//! This library provides the core functionality for the Aria gateway:
//! - The `VoiceAgent` pipeline orchestrator (transcription, chat, speech)
//! - Adapters for hosted and local speech-to-text
//! - A local speech-synthesis adapter
//! - A stateless HTTP surface for chat and transcription
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Interfaces                      │
//! │   Terminal chat  │  HTTP API  │  `say` command  │
//! └───────────────────────┬─────────────────────────┘
//!                         │
//! ┌───────────────────────▼─────────────────────────┐
//! │                 VoiceAgent                       │
//! │   transcribe → chat → history → speak           │
//! └───────────────────────┬─────────────────────────┘
//!                         │
//! ┌───────────────────────▼─────────────────────────┐
//! │             External services                    │
//! │   Gemini  │  Groq  │  whisper.cpp  │  espeak-ng │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod llm;
pub mod voice;

pub use agent::VoiceAgent;
pub use config::{ChatProvider, Settings};
pub use error::{Error, Result};
pub use gemini::GeminiClient;
pub use llm::{ChatBackend, ChatClient, ChatMessage, Role};
pub use voice::{SpeechToText, Synthesizer};
