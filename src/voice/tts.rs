//! Speech-synthesis adapter
//!
//! Drives the host espeak-ng engine. The preferred voice is chosen by
//! case-insensitive keyword match against the engine's voice listing;
//! playback blocks the current turn until the engine finishes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Settings;
use crate::{Error, Result};

/// Timeout for one playback run
const SPEAK_TIMEOUT: Duration = Duration::from_secs(60);

/// Engine amplitude for full volume; the scale tops out at 200
const FULL_VOLUME_AMPLITUDE: f32 = 100.0;

/// Speaks text aloud, blocking until playback completes
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// # Errors
    ///
    /// Returns a speech-synthesis error when the engine fails.
    async fn speak(&self, text: &str) -> Result<()>;
}

/// A voice offered by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
struct Voice {
    /// Identifier passed back to the engine (`-v`)
    identifier: String,
    /// Human-readable name, matched against preference keywords
    name: String,
}

/// espeak-ng driver with voice, rate and volume configuration
pub struct EspeakSynthesizer {
    binary: PathBuf,
    voice: Option<String>,
    rate: u32,
    volume: f32,
}

impl EspeakSynthesizer {
    /// Locate the engine and pick a preferred voice
    ///
    /// # Errors
    ///
    /// Returns a configuration error if espeak-ng is not installed.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let binary = which::which("espeak-ng")
            .map_err(|_| Error::Config("espeak-ng not found on PATH".to_string()))?;

        let voice = match list_voices(&binary) {
            Ok(listing) => match select_voice(&listing, &settings.voice_keywords) {
                Some(voice) => {
                    tracing::info!(voice = %voice.name, "selected voice");
                    Some(voice.identifier)
                }
                None => {
                    tracing::warn!("no preferred voice found; using default voice");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to list voices; using default voice");
                None
            }
        };

        Ok(Self {
            binary,
            voice,
            rate: settings.speech_rate,
            volume: settings.speech_volume,
        })
    }
}

#[async_trait]
impl Synthesizer for EspeakSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let amplitude = (self.volume.clamp(0.0, 2.0) * FULL_VOLUME_AMPLITUDE).round() as u32;

        let mut command = tokio::process::Command::new(&self.binary);
        if let Some(voice) = &self.voice {
            command.arg("-v").arg(voice);
        }
        command
            .arg("-s")
            .arg(self.rate.to_string())
            .arg("-a")
            .arg(amplitude.to_string())
            .arg(text)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped());

        let child = command
            .spawn()
            .map_err(|e| Error::SpeechSynthesis(format!("failed to spawn espeak-ng: {e}")))?;

        let output = tokio::time::timeout(SPEAK_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::SpeechSynthesis(format!(
                    "playback timed out after {} seconds",
                    SPEAK_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| Error::SpeechSynthesis(format!("failed to run espeak-ng: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SpeechSynthesis(format!(
                "espeak-ng failed: {}",
                stderr.trim()
            )));
        }

        tracing::debug!(chars = text.len(), "playback complete");
        Ok(())
    }
}

/// Synthesizer that discards all output; used for muted sessions
pub struct NullSynthesizer;

#[async_trait]
impl Synthesizer for NullSynthesizer {
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Run `espeak-ng --voices` and return the raw listing
fn list_voices(binary: &Path) -> Result<String> {
    let output = std::process::Command::new(binary)
        .arg("--voices")
        .output()
        .map_err(|e| Error::SpeechSynthesis(format!("failed to list voices: {e}")))?;

    if !output.status.success() {
        return Err(Error::SpeechSynthesis(
            "espeak-ng --voices failed".to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Pick the first voice whose name contains any keyword,
/// case-insensitively, in engine-reported order
fn select_voice(listing: &str, keywords: &[String]) -> Option<Voice> {
    let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    for voice in parse_voices(listing) {
        let name = voice.name.to_lowercase();
        if lowered.iter().any(|keyword| name.contains(keyword)) {
            return Some(voice);
        }
    }
    None
}

/// Parse the `--voices` table: pty, language, age/gender, then the voice
/// name up to the file column
fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let identifier = fields[1].to_string();
            let name = fields[3..]
                .iter()
                .take_while(|f| !f.contains('/'))
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            if name.is_empty() {
                return None;
            }
            Some(Voice { identifier, name })
        })
        .collect()
}
