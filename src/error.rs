//! Error types for scribekey
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.
//!
//! Session-level failures (no audio, no speech, engine failure) never
//! escalate past the current gesture: the daemon logs them, flashes an
//! overlay message, and returns the session to idle.

use thiserror::Error;

/// Top-level error type for the scribekey application
#[derive(Error, Debug)]
pub enum ScribekeyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Audio capture error: {0}")]
    Audio(#[from] AudioError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to trigger parsing and the input hook
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Invalid hotkey spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    #[error("Input hook failed to start: {0}")]
    HookStart(String),

    #[error("Input hook stopped unexpectedly")]
    HookLost,
}

impl HotkeyError {
    /// Convenience constructor for spec validation failures
    pub fn invalid_spec(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to audio capture
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio connection failed: {0}")]
    Connection(String),

    #[error("Audio device not found: '{0}'. List devices with: pactl list sources short")]
    DeviceNotFound(String),

    #[error("Audio stream error: {0}")]
    StreamError(String),
}

/// Errors related to the external recognition engine pipeline
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("No audio was captured. Check your microphone.")]
    NoAudioCaptured,

    #[error("No speech detected")]
    NoSpeechDetected,

    #[error("Engine binary not found: {0}\n  Set engine.path in the config or install whisper-cli in PATH.")]
    EngineNotFound(String),

    #[error("Engine failed: {0}")]
    EngineFailed(String),

    #[error("Engine timed out after {0}s")]
    Timeout(u64),

    #[error("Transport file error: {0}")]
    Io(String),
}

/// Errors related to text output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("wl-copy not found in PATH. Install wl-clipboard via your package manager.")]
    WlCopyNotFound,

    #[error("Clipboard write failed: {0}")]
    ClipboardFailed(String),
}

/// Result type alias using ScribekeyError
pub type Result<T> = std::result::Result<T, ScribekeyError>;
