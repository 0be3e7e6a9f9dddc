//! Configuration management for the aria gateway
//!
//! Settings resolve in three layers: built-in defaults, then an optional
//! YAML/JSON config file, then environment variables on top. The merged
//! result is an immutable record constructed once and passed by reference
//! into every component; there is no ambient global lookup.

pub mod file;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::{Error, Result};
use file::SettingsOverlay;

/// Config file names probed in the working directory when no explicit
/// path is given
const DEFAULT_CONFIG_FILENAMES: &[&str] =
    &["aria.config.yaml", "aria.config.yml", "aria.config.json"];

/// Which hosted API serves chat completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    Gemini,
    Groq,
}

impl std::fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Groq => write!(f, "groq"),
        }
    }
}

impl FromStr for ChatProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            other => Err(Error::Config(format!(
                "unknown chat provider: {other} (expected \"gemini\" or \"groq\")"
            ))),
        }
    }
}

/// Resolved gateway configuration, immutable after load
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Chat completion provider
    pub chat_provider: ChatProvider,

    /// Gemini API key (chat and hosted transcription)
    pub gemini_api_key: Option<String>,

    /// Gemini model for chat completions
    pub gemini_chat_model: String,

    /// Gemini model for audio transcription
    pub gemini_stt_model: String,

    /// Groq API key, required when `chat_provider` is groq
    pub groq_api_key: Option<String>,

    /// Groq model identifier
    pub groq_model: String,

    /// Display name used by the terminal session
    pub persona_name: String,

    /// Persona/system instruction prepended to every chat request,
    /// excluded from stored history
    pub persona: String,

    /// Language hint for transcription ("en", "hi", ...)
    pub language: String,

    /// Translate instead of transcribe in the local speech-to-text step
    pub translate: bool,

    /// whisper.cpp CLI binary name or path
    pub whisper_binary: String,

    /// Path to a local whisper model; enables local transcription
    pub whisper_model_path: Option<PathBuf>,

    /// Speaking rate in words per minute
    pub speech_rate: u32,

    /// Speaking volume, 0.0 to 1.0
    pub speech_volume: f32,

    /// Keywords for preferred-voice selection, first match wins
    pub voice_keywords: Vec<String>,

    /// History window size forwarded to the chat provider; `<= 0`
    /// disables the window entirely
    pub max_history_messages: i32,

    /// Sampling temperature for chat completions
    pub temperature: f32,

    /// Reply length cap for chat completions
    pub max_tokens: u32,

    /// Default log level when no verbosity flag is given
    pub logging_level: String,

    /// Optional directory of static web assets served by the HTTP mode
    pub static_dir: Option<PathBuf>,

    /// Config file the base layer came from, if any
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the environment and an optional config file
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an explicit config file cannot
    /// be read or an environment value cannot be parsed. Credentials are
    /// checked separately by [`Settings::validate`].
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        // A .env file in the working directory participates in the
        // environment layer.
        dotenvy::dotenv().ok();

        let (file_overlay, source) = match config_path {
            Some(path) => (file::load(path)?, Some(path.to_path_buf())),
            None => match DEFAULT_CONFIG_FILENAMES
                .iter()
                .map(Path::new)
                .find(|p| p.exists())
            {
                Some(path) => (file::load(path)?, Some(path.to_path_buf())),
                None => (SettingsOverlay::default(), None),
            },
        };

        let env_overlay = env_overlay()?;
        Self::resolve(file_overlay, env_overlay, source)
    }

    /// Merge the file base layer with the environment overlay and apply
    /// defaults. Environment values win wherever both layers are present.
    fn resolve(
        file: SettingsOverlay,
        env: SettingsOverlay,
        config_file: Option<PathBuf>,
    ) -> Result<Self> {
        let chat_provider = env
            .chat_provider
            .or(file.chat_provider)
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(ChatProvider::Gemini);

        let settings = Self {
            chat_provider,
            gemini_api_key: env.gemini_api_key.or(file.gemini_api_key),
            gemini_chat_model: env
                .gemini_chat_model
                .or(file.gemini_chat_model)
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            gemini_stt_model: env
                .gemini_stt_model
                .or(file.gemini_stt_model)
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            groq_api_key: env.groq_api_key.or(file.groq_api_key),
            groq_model: env
                .groq_model
                .or(file.groq_model)
                .unwrap_or_else(|| "llama-3.1-8b-instant".to_string()),
            persona_name: env
                .persona_name
                .or(file.persona_name)
                .unwrap_or_else(|| "Aria".to_string()),
            persona: env.persona.or(file.persona).unwrap_or_else(|| {
                "You are Aria, a warm and friendly AI assistant. \
                 Reply concisely in two or three sentences using natural language."
                    .to_string()
            }),
            language: env
                .language
                .or(file.language)
                .unwrap_or_else(|| "en".to_string()),
            translate: env.translate.or(file.translate).unwrap_or(false),
            whisper_binary: env
                .whisper_binary
                .or(file.whisper_binary)
                .unwrap_or_else(|| "whisper-cli".to_string()),
            whisper_model_path: env.whisper_model_path.or(file.whisper_model_path),
            speech_rate: env.speech_rate.or(file.speech_rate).unwrap_or(160),
            speech_volume: env.speech_volume.or(file.speech_volume).unwrap_or(1.0),
            voice_keywords: env.voice_keywords.or(file.voice_keywords).unwrap_or_else(
                || {
                    vec![
                        "female".to_string(),
                        "zira".to_string(),
                        "heera".to_string(),
                    ]
                },
            ),
            max_history_messages: env
                .max_history_messages
                .or(file.max_history_messages)
                .unwrap_or(6),
            temperature: env.temperature.or(file.temperature).unwrap_or(0.9),
            max_tokens: env.max_tokens.or(file.max_tokens).unwrap_or(200),
            logging_level: env
                .logging_level
                .or(file.logging_level)
                .unwrap_or_else(|| "info".to_string()),
            static_dir: env.static_dir.or(file.static_dir),
            config_file,
        };

        Ok(settings)
    }

    /// Check that the selected chat provider has a credential. Called by
    /// the entry points that talk to a provider; inspection-only commands
    /// skip it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the missing credential.
    pub fn validate(&self) -> Result<()> {
        match self.chat_provider {
            ChatProvider::Gemini if self.gemini_api_key.is_none() => Err(Error::Config(
                "GEMINI_API_KEY is required. Provide it via the environment, .env, or a config file"
                    .to_string(),
            )),
            ChatProvider::Groq if self.groq_api_key.is_none() => Err(Error::Config(
                "GROQ_API_KEY is required. Provide it via the environment, .env, or a config file"
                    .to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Assemble the environment overlay; only set variables become `Some`
fn env_overlay() -> Result<SettingsOverlay> {
    Ok(SettingsOverlay {
        chat_provider: env_string("ARIA_CHAT_PROVIDER"),
        gemini_api_key: env_string("GEMINI_API_KEY"),
        gemini_chat_model: env_string("GEMINI_CHAT_MODEL"),
        gemini_stt_model: env_string("GEMINI_STT_MODEL"),
        groq_api_key: env_string("GROQ_API_KEY"),
        groq_model: env_string("GROQ_MODEL"),
        persona_name: env_string("ARIA_PERSONA_NAME"),
        persona: env_string("ARIA_PERSONA"),
        language: env_string("ARIA_LANGUAGE"),
        translate: env_bool("ARIA_TRANSLATE")?,
        whisper_binary: env_string("ARIA_WHISPER_BINARY"),
        whisper_model_path: env_string("ARIA_WHISPER_MODEL").map(PathBuf::from),
        speech_rate: env_parse("ARIA_SPEECH_RATE")?,
        speech_volume: env_parse("ARIA_SPEECH_VOLUME")?,
        voice_keywords: env_string("ARIA_VOICE_KEYWORDS").map(|v| {
            v.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        }),
        max_history_messages: env_parse("ARIA_MAX_HISTORY_MESSAGES")?,
        temperature: env_parse("ARIA_TEMPERATURE")?,
        max_tokens: env_parse("ARIA_MAX_TOKENS")?,
        logging_level: env_string("ARIA_LOG_LEVEL"),
        static_dir: env_string("ARIA_STATIC_DIR").map(PathBuf::from),
    })
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env_string(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("invalid value for {name}: {value}"))),
    }
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    match env_string(name) {
        None => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(Error::Config(format!(
                "invalid boolean for {name}: {other}"
            ))),
        },
    }
}
