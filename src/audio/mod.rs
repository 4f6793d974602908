//! Audio capture module
//!
//! Provides the microphone stream using cpal, which works with PipeWire,
//! PulseAudio, and ALSA backends. The stream stays open for the daemon's
//! lifetime; each mono 16 kHz block is handed to a sink callback on the
//! driver's thread, and the session state machine decides whether to keep
//! or drop it.

pub mod cpal_capture;

use crate::config::AudioConfig;
use crate::error::AudioError;
use std::sync::Arc;

/// Per-block sink invoked on the audio driver thread
pub type FrameSink = Arc<dyn Fn(&[f32]) + Send + Sync>;

/// Trait for audio capture implementations
#[async_trait::async_trait]
pub trait AudioCapture: Send {
    /// Open the stream; `sink` receives every mono 16 kHz block
    async fn start(&mut self, sink: FrameSink) -> Result<(), AudioError>;

    /// Close the stream; must tolerate being called when not started
    async fn stop(&mut self) -> Result<(), AudioError>;
}

/// Factory function to create audio capture
pub fn create_capture(config: &AudioConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
    Ok(Box::new(cpal_capture::CpalCapture::new(config)?))
}
