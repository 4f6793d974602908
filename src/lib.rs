//! Scribekey: Push-to-talk voice-to-clipboard for Wayland
//!
//! This library provides the core functionality for:
//! - Detecting a hold-to-record trigger via a global input hook (rdev)
//! - Capturing audio via cpal (supports PipeWire, PulseAudio, ALSA)
//! - Transcribing speech with an external whisper-cli compatible engine
//! - Delivering the transcript to the clipboard via wl-copy
//! - Presenting status through a single-owner overlay channel
//!
//! # Architecture
//!
//! ```text
//!                 ┌─────────────────────────────────────┐
//!                 │               Daemon                │
//!                 └─────────────────────────────────────┘
//!                                   │
//!          ┌────────────────────────┼────────────────────────┐
//!          │                        │                        │
//!          ▼                        ▼                        ▼
//! ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//! │  Input Hook  │         │    Audio     │         │   Overlay    │
//! │    (rdev)    │         │    (cpal)    │         │    Actor     │
//! └──────────────┘         └──────────────┘         └──────────────┘
//!          │                        │
//!          │ raw press/release      │ audio frames
//!          ▼                        ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Recording Session                         │
//! │  [Press] ──▶ Recording ──▶ [Release] ──▶ Transcribing ──▶ Idle  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                   │
//!                                   ▼ captured buffer
//!                          ┌──────────────┐
//!                          │    Engine    │ (whisper-cli subprocess,
//!                          │  (WAV file)  │  timeout-bounded)
//!                          └──────────────┘
//!                                   │
//!                                   ▼ cleaned transcript
//!                          ┌──────────────┐
//!                          │  Clipboard   │
//!                          │  (wl-copy)   │
//!                          └──────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod daemon;
pub mod error;
pub mod hotkey;
pub mod output;
pub mod overlay;
pub mod session;
pub mod transcribe;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Result, ScribekeyError};
