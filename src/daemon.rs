//! Daemon module - main event loop orchestration
//!
//! Coordinates the input hook, binding registry, recording session, audio
//! capture, transcription worker, clipboard, and overlay channel. All
//! binding dispatch and rebind decisions happen on this one loop; the hook
//! and audio threads only ever feed it through channels or the session
//! mutex.
//!
//! Rebinds are two-phase: a captured binding is queued as an intent and
//! applied only at the idle fence (session Idle, no gesture in flight),
//! never from inside an event dispatch.

use crate::audio::{self, AudioCapture, FrameSink};
use crate::config::{self, Config};
use crate::error::{Result, ScribekeyError, TranscribeError};
use crate::hotkey::capture::{CaptureAssistant, CaptureOutcome};
use crate::hotkey::registry::{BindingEvent, BindingRegistry};
use crate::hotkey::{self, spec::parse_spec, InputHook, Modifier, TriggerBinding, TriggerKind};
use crate::output::{self, TextOutput};
use crate::overlay::{self, OverlayEvent, OverlayHandle, SilentSurface, StatusLogSurface};
use crate::session::{RecordingSession, ReleaseOutcome};
use crate::transcribe::{self, Transcriber};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Overlay message for a failed session
fn failure_message(error: &TranscribeError) -> &'static str {
    match error {
        TranscribeError::NoAudioCaptured => "no audio captured",
        TranscribeError::NoSpeechDetected => "no speech",
        TranscribeError::EngineNotFound(_) | TranscribeError::EngineFailed(_) => "engine failed",
        TranscribeError::Timeout(_) => "timeout",
        TranscribeError::Io(_) => "io failure",
    }
}

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
    config_path: Option<PathBuf>,
}

impl Daemon {
    /// Create a new daemon with the given configuration
    ///
    /// `config_path` is where runtime rebinds are persisted; None falls
    /// back to the default location.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Parse the configured recording trigger, falling back to the default
    /// spec when the stored string is invalid
    fn recording_binding(&self) -> TriggerBinding {
        match parse_spec(&self.config.hotkey.recording_trigger) {
            Ok(binding) => binding,
            Err(e) => {
                tracing::warn!("{}; falling back to default recording trigger", e);
                TriggerBinding {
                    modifiers: [Modifier::Ctrl].into(),
                    kind: TriggerKind::Keyboard,
                    trigger: "`".to_string(),
                }
            }
        }
    }

    fn settings_binding(&self) -> Option<TriggerBinding> {
        match parse_spec(&self.config.hotkey.settings_trigger) {
            Ok(binding) => Some(binding),
            Err(e) => {
                tracing::warn!("{}; settings trigger disabled", e);
                None
            }
        }
    }

    /// Apply a queued rebind if the idle fence is clear: persist the new
    /// spec and swap the registration
    fn maybe_apply_rebind(
        &mut self,
        registry: &mut BindingRegistry,
        session: &RecordingSession,
        pending: &mut Option<TriggerBinding>,
    ) {
        if pending.is_none() || !session.is_idle() || registry.gesture_in_flight() {
            return;
        }
        let Some(binding) = pending.take() else {
            return;
        };

        self.config.hotkey.recording_trigger = binding.spec_string();
        let path = self.config_path.clone().or_else(Config::default_path);
        if let Some(path) = path {
            if let Err(e) = config::save_config(&self.config, &path) {
                tracing::warn!("Failed to persist rebind: {}", e);
            }
        }

        registry.register_recording(binding);
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting scribekey daemon");

        Config::ensure_directories().map_err(|e| {
            ScribekeyError::Config(format!("Failed to create directories: {}", e))
        })?;

        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            ScribekeyError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        // Input hook and binding registry
        let mut hook = hotkey::create_hook();
        let hook_state = hook.state();
        let mut raw_rx = hook.start().await.map_err(ScribekeyError::Hotkey)?;

        let mut registry = BindingRegistry::new(hook_state.clone());
        registry.register_recording(self.recording_binding());
        if let Some(binding) = self.settings_binding() {
            registry.register_settings(binding);
        }

        // Overlay presentation actor
        let overlay: OverlayHandle = if self.config.overlay.enabled {
            overlay::spawn(Box::new(StatusLogSurface::new()), hook_state.clone())
        } else {
            overlay::spawn(Box::new(SilentSurface), hook_state.clone())
        };

        // The one recording session, shared with the audio driver thread
        let session = Arc::new(RecordingSession::new());

        // Microphone stream stays open; the session decides frame by frame
        // whether to keep or drop
        let mut capture = audio::create_capture(&self.config.audio).map_err(ScribekeyError::Audio)?;
        let frame_session = session.clone();
        let sink: FrameSink = Arc::new(move |block| frame_session.on_audio_frame(block));
        capture.start(sink).await.map_err(ScribekeyError::Audio)?;

        let transcriber: Arc<Box<dyn Transcriber>> = Arc::new(
            transcribe::create_transcriber(&self.config.engine).map_err(ScribekeyError::Transcribe)?,
        );
        let clipboard: Arc<Box<dyn TextOutput>> = Arc::new(output::create_clipboard());

        // Completion channel from the transcription worker
        let (result_tx, mut result_rx) =
            mpsc::channel::<std::result::Result<String, TranscribeError>>(4);

        let mut capture_assistant: Option<CaptureAssistant> = None;
        let mut pending_rebind: Option<TriggerBinding> = None;

        let max_duration = Duration::from_secs(u64::from(self.config.audio.max_duration_secs));

        tracing::info!(
            "Hold {} to record, release to transcribe to clipboard",
            self.config.hotkey.recording_trigger
        );

        loop {
            tokio::select! {
                maybe_event = raw_rx.recv() => {
                    let Some(event) = maybe_event else {
                        tracing::error!("Input hook channel closed");
                        break;
                    };

                    // Capture mode consumes every raw event until it ends
                    if let Some(assistant) = capture_assistant.as_mut() {
                        match assistant.on_event(&event) {
                            CaptureOutcome::Pending => {}
                            CaptureOutcome::Finalized(binding) => {
                                capture_assistant = None;
                                pending_rebind = Some(binding);
                                self.maybe_apply_rebind(&mut registry, &session, &mut pending_rebind);
                            }
                            CaptureOutcome::Rejected(e) => {
                                capture_assistant = None;
                                overlay.emit(OverlayEvent::Error(e.to_string()));
                            }
                        }
                        continue;
                    }

                    match registry.dispatch(&event) {
                        Some(BindingEvent::RecordingPressed) => {
                            if session.on_trigger_press() {
                                tracing::info!("Recording started");
                                overlay.emit(OverlayEvent::Recording);
                            }
                        }
                        Some(BindingEvent::RecordingReleased) => {
                            match session.on_trigger_release() {
                                ReleaseOutcome::NotRecording => {}
                                ReleaseOutcome::NoAudio => {
                                    tracing::warn!("Recording stopped with no audio captured");
                                    overlay.emit(OverlayEvent::Error("no audio captured".to_string()));
                                    self.maybe_apply_rebind(&mut registry, &session, &mut pending_rebind);
                                }
                                ReleaseOutcome::Captured(buffer) => {
                                    tracing::info!(
                                        "Recording stopped, transcribing {:.1}s of audio",
                                        buffer.len() as f32 / 16000.0
                                    );
                                    overlay.emit(OverlayEvent::Transcribing);

                                    let transcriber = transcriber.clone();
                                    let result_tx = result_tx.clone();
                                    tokio::spawn(async move {
                                        let result = transcriber.transcribe(&buffer).await;
                                        let _ = result_tx.send(result).await;
                                    });
                                }
                            }
                        }
                        Some(BindingEvent::SettingsActivated) => {
                            capture_assistant = Some(CaptureAssistant::new());
                        }
                        None => {}
                    }
                }

                // Transcription worker finished: deliver and return to idle
                Some(result) = result_rx.recv() => {
                    session.complete();
                    match result {
                        Ok(text) => {
                            tracing::info!("Transcribed: {:?}", text);
                            match clipboard.set_text(&text).await {
                                Ok(()) => overlay.emit(OverlayEvent::Success),
                                Err(e) => {
                                    tracing::error!("Clipboard delivery failed: {}", e);
                                    overlay.emit(OverlayEvent::Error("clipboard failed".to_string()));
                                }
                            }
                        }
                        Err(e) => {
                            tracing::error!("Transcription failed: {}", e);
                            overlay.emit(OverlayEvent::Error(failure_message(&e).to_string()));
                        }
                    }
                    self.maybe_apply_rebind(&mut registry, &session, &mut pending_rebind);
                }

                // Recording safety limit
                _ = tokio::time::sleep(Duration::from_millis(100)), if session.is_recording() => {
                    if let Some(duration) = session.recording_duration() {
                        if duration > max_duration {
                            tracing::warn!(
                                "Recording timeout ({:.0}s limit), stopping",
                                max_duration.as_secs_f32()
                            );
                            session.abort_recording();
                            overlay.emit(OverlayEvent::Error("recording timeout".to_string()));
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }
        }

        // Cleanup
        overlay.emit(OverlayEvent::Hide);
        registry.unregister_all();
        capture.stop().await.map_err(ScribekeyError::Audio)?;
        hook.stop().await.map_err(ScribekeyError::Hotkey)?;

        tracing::info!("Daemon stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        assert_eq!(failure_message(&TranscribeError::NoSpeechDetected), "no speech");
        assert_eq!(
            failure_message(&TranscribeError::EngineFailed("x".to_string())),
            "engine failed"
        );
        assert_eq!(failure_message(&TranscribeError::Timeout(30)), "timeout");
        assert_eq!(
            failure_message(&TranscribeError::Io("x".to_string())),
            "io failure"
        );
        assert_eq!(
            failure_message(&TranscribeError::NoAudioCaptured),
            "no audio captured"
        );
    }

    #[test]
    fn test_invalid_configured_trigger_falls_back() {
        let mut config = Config::default();
        config.hotkey.recording_trigger = "ctrl+shift".to_string();
        let daemon = Daemon::new(config, None);
        let binding = daemon.recording_binding();
        assert_eq!(binding.spec_string(), "ctrl+`");
    }

    #[test]
    fn test_invalid_settings_trigger_disables_chord() {
        let mut config = Config::default();
        config.hotkey.settings_trigger = String::new();
        let daemon = Daemon::new(config, None);
        assert!(daemon.settings_binding().is_none());
    }
}
