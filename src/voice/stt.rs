//! Speech-to-text adapters
//!
//! Two backends: hosted transcription through the Gemini inline-audio
//! protocol, and local transcription through a whisper.cpp CLI binary.
//! Both treat an empty transcript as an error.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::{Error, Result};

/// Timeout for the local transcription process
const WHISPER_TIMEOUT: Duration = Duration::from_secs(120);

/// Transcribes raw audio samples to text
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe mono f32 samples at the given sample rate
    ///
    /// # Errors
    ///
    /// Returns a transcription error when the backend fails or the
    /// resulting transcript is empty.
    async fn transcribe(&self, sample_rate: u32, samples: &[f32]) -> Result<String>;

    /// Surface backend load/availability problems before first use
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the backend cannot be used.
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }
}

/// Encode f32 samples in [-1.0, 1.0] as 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns a transcription error if WAV encoding fails.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Transcription(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Transcription(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| Error::Transcription(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Collapse process output into a single-spaced transcript
fn join_segments(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hosted transcription via the Gemini inline-audio protocol
pub struct HostedTranscriber {
    client: GeminiClient,
    language: String,
}

impl HostedTranscriber {
    /// # Errors
    ///
    /// Returns a configuration error if the Gemini API key is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::from_settings(settings)?,
            language: settings.language.clone(),
        })
    }
}

#[async_trait]
impl SpeechToText for HostedTranscriber {
    async fn transcribe(&self, sample_rate: u32, samples: &[f32]) -> Result<String> {
        let wav = samples_to_wav(samples, sample_rate)?;
        self.client
            .transcribe(&wav, "audio/wav", &self.language)
            .await
    }
}

/// Local transcription through a whisper.cpp CLI binary
///
/// Samples are written to a temporary WAV container and handed to the
/// binary with the configured model, language hint, and translate flag.
pub struct LocalTranscriber {
    binary: String,
    model_path: PathBuf,
    language: String,
    translate: bool,
}

impl LocalTranscriber {
    /// # Errors
    ///
    /// Returns a configuration error if no model path is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let model_path = settings.whisper_model_path.clone().ok_or_else(|| {
            Error::Config("ARIA_WHISPER_MODEL is required for local transcription".to_string())
        })?;

        Ok(Self {
            binary: settings.whisper_binary.clone(),
            model_path,
            language: settings.language.clone(),
            translate: settings.translate,
        })
    }
}

#[async_trait]
impl SpeechToText for LocalTranscriber {
    async fn transcribe(&self, sample_rate: u32, samples: &[f32]) -> Result<String> {
        tracing::debug!(
            sample_rate,
            samples = samples.len(),
            "beginning local transcription"
        );

        let wav = samples_to_wav(samples, sample_rate)?;
        let scratch = tempfile::Builder::new()
            .prefix("aria-stt-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| Error::Transcription(format!("failed to create scratch file: {e}")))?;
        std::fs::write(scratch.path(), &wav)
            .map_err(|e| Error::Transcription(format!("failed to write scratch file: {e}")))?;

        let mut command = tokio::process::Command::new(&self.binary);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(scratch.path())
            .arg("-l")
            .arg(&self.language)
            .arg("--no-timestamps")
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        if self.translate {
            command.arg("--translate");
        }

        let child = command
            .spawn()
            .map_err(|e| Error::Transcription(format!("failed to spawn {}: {e}", self.binary)))?;

        let output = tokio::time::timeout(WHISPER_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::Transcription(format!(
                    "transcription timed out after {} seconds",
                    WHISPER_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| Error::Transcription(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Transcription(format!(
                "whisper failed: {}",
                stderr.trim()
            )));
        }

        let text = join_segments(&String::from_utf8_lossy(&output.stdout));
        if text.is_empty() {
            return Err(Error::Transcription(
                "could not understand the provided audio".to_string(),
            ));
        }

        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }

    fn ensure_ready(&self) -> Result<()> {
        which::which(&self.binary).map_err(|_| {
            Error::Config(format!(
                "whisper binary not found: {} (set ARIA_WHISPER_BINARY)",
                self.binary
            ))
        })?;

        if !self.model_path.exists() {
            return Err(Error::Config(format!(
                "whisper model not found: {}",
                self.model_path.display()
            )));
        }

        tracing::debug!(
            binary = %self.binary,
            model = %self.model_path.display(),
            "local transcriber ready"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_encoding_produces_riff_container() {
        let samples = vec![0.0, 0.5, -0.5, 1.0, -1.0];
        let wav = samples_to_wav(&samples, 16_000).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header plus two bytes per sample
        assert_eq!(wav.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn wav_round_trips_sample_count_and_rate() {
        let samples = vec![0.25f32; 320];
        let wav = samples_to_wav(&samples, 8000).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len() as usize, samples.len());
    }

    #[test]
    fn segments_join_with_single_spaces() {
        let joined = join_segments(" Hello there.\n\n  General Kenobi. \n");
        assert_eq!(joined, "Hello there. General Kenobi.");

        assert_eq!(join_segments("\n \n"), "");
    }

    #[test]
    fn local_transcriber_requires_model_path() {
        let settings = crate::config::Settings {
            whisper_model_path: None,
            ..test_settings()
        };
        let result = LocalTranscriber::from_settings(&settings);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn ensure_ready_reports_missing_model() {
        let transcriber = LocalTranscriber {
            // `ls` exists everywhere; the model path does not
            binary: "ls".to_string(),
            model_path: PathBuf::from("/nonexistent/ggml-tiny.bin"),
            language: "en".to_string(),
            translate: false,
        };
        assert!(matches!(transcriber.ensure_ready(), Err(Error::Config(_))));
    }

    fn test_settings() -> crate::config::Settings {
        crate::config::Settings {
            chat_provider: crate::config::ChatProvider::Gemini,
            gemini_api_key: Some("test".to_string()),
            gemini_chat_model: "gemini-2.5-flash".to_string(),
            gemini_stt_model: "gemini-2.5-flash".to_string(),
            groq_api_key: None,
            groq_model: "llama-3.1-8b-instant".to_string(),
            persona_name: "Aria".to_string(),
            persona: "You are a test assistant.".to_string(),
            language: "en".to_string(),
            translate: false,
            whisper_binary: "whisper-cli".to_string(),
            whisper_model_path: None,
            speech_rate: 160,
            speech_volume: 1.0,
            voice_keywords: vec!["female".to_string()],
            max_history_messages: 6,
            temperature: 0.9,
            max_tokens: 200,
            logging_level: "info".to_string(),
            static_dir: None,
            config_file: None,
        }
    }
}
