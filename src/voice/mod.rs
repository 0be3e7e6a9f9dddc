//! Voice processing module
//!
//! Speech-to-text adapters (hosted and local whisper.cpp) and the local
//! speech-synthesis adapter.

pub mod stt;
pub mod tts;

pub use stt::{samples_to_wav, HostedTranscriber, LocalTranscriber, SpeechToText};
pub use tts::{EspeakSynthesizer, NullSynthesizer, Synthesizer};
