//! Configuration file loading
//!
//! YAML or JSON, chosen by file extension. All fields are optional — the
//! file is the base layer that environment variables overlay.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Partial settings overlay, as read from a config file or assembled from
/// environment variables
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsOverlay {
    pub chat_provider: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_chat_model: Option<String>,
    pub gemini_stt_model: Option<String>,
    pub groq_api_key: Option<String>,
    pub groq_model: Option<String>,
    pub persona_name: Option<String>,
    pub persona: Option<String>,
    pub language: Option<String>,
    pub translate: Option<bool>,
    pub whisper_binary: Option<String>,
    pub whisper_model_path: Option<PathBuf>,
    pub speech_rate: Option<u32>,
    pub speech_volume: Option<f32>,
    pub voice_keywords: Option<Vec<String>>,
    pub max_history_messages: Option<i32>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub logging_level: Option<String>,
    pub static_dir: Option<PathBuf>,
}

/// Load an overlay from a YAML or JSON file
///
/// # Errors
///
/// Returns a configuration error if the file is missing, unparseable, or
/// has an unsupported extension.
pub fn load(path: &Path) -> Result<SettingsOverlay> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let overlay = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid YAML in {}: {e}", path.display())))?,
        "json" => serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid JSON in {}: {e}", path.display())))?,
        other => {
            return Err(Error::Config(format!(
                "unsupported config file format: .{other}"
            )))
        }
    };

    tracing::info!(path = %path.display(), "loaded config file");
    Ok(overlay)
}
