//! Speech-to-text transcription module
//!
//! The engine is an external whisper-cli compatible executable invoked as
//! a child process per session; this module owns the full pipeline from
//! raw f32 samples to cleaned transcript text.

pub mod engine;

use crate::config::EngineConfig;
use crate::error::TranscribeError;

/// Trait for speech-to-text implementations
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio samples to text
    /// Input: f32 samples, mono, 16kHz
    async fn transcribe(&self, samples: &[f32]) -> Result<String, TranscribeError>;
}

/// Factory function to create the configured transcriber
pub fn create_transcriber(config: &EngineConfig) -> Result<Box<dyn Transcriber>, TranscribeError> {
    Ok(Box::new(engine::EngineTranscriber::new(config)?))
}
