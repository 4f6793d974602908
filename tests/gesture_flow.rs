//! End-to-end gesture tests over the public component APIs
//!
//! These drive the registry, session, and engine pipeline the same way
//! the daemon loop does, with synthetic input events and a stub engine
//! binary, so the full press-record-release-transcribe path is testable
//! without a microphone or a real model.

use std::sync::Arc;
use scribekey::hotkey::capture::{CaptureAssistant, CaptureOutcome};
use scribekey::hotkey::registry::{BindingEvent, BindingRegistry};
use scribekey::hotkey::spec::parse_spec;
use scribekey::hotkey::{HookState, Modifier, RawInputEvent};
use scribekey::session::{RecordingSession, ReleaseOutcome};

/// Registry bound to "ctrl+`" with a live hook state handle
fn recording_registry() -> (BindingRegistry, Arc<HookState>) {
    let state = Arc::new(HookState::new());
    let mut registry = BindingRegistry::new(state.clone());
    registry.register_recording(parse_spec("ctrl+`").unwrap());
    (registry, state)
}

fn key_press(name: &str) -> RawInputEvent {
    RawInputEvent::KeyPress(name.to_string())
}

fn key_release(name: &str) -> RawInputEvent {
    RawInputEvent::KeyRelease(name.to_string())
}

// ============================================================================
// Press / release gesture flow
// ============================================================================

#[test]
fn full_gesture_captures_audio_between_press_and_release() {
    let (mut registry, state) = recording_registry();
    let session = RecordingSession::new();

    // Frames before the press are dropped
    session.on_audio_frame(&[0.5; 160]);
    assert!(session.is_idle());

    state.set_modifier(Modifier::Ctrl, true);
    assert_eq!(
        registry.dispatch(&key_press("`")),
        Some(BindingEvent::RecordingPressed)
    );
    assert!(session.on_trigger_press());
    assert!(session.is_recording());

    for _ in 0..10 {
        session.on_audio_frame(&[0.1; 160]);
    }

    assert_eq!(
        registry.dispatch(&key_release("`")),
        Some(BindingEvent::RecordingReleased)
    );
    match session.on_trigger_release() {
        ReleaseOutcome::Captured(buffer) => assert_eq!(buffer.len(), 1600),
        other => panic!("expected captured audio, got {:?}", other),
    }

    // Frames during Transcribing are dropped too
    session.on_audio_frame(&[0.5; 160]);
    session.complete();
    assert!(session.is_idle());
}

#[test]
fn press_without_required_modifier_is_ignored() {
    let (mut registry, _state) = recording_registry();
    assert_eq!(registry.dispatch(&key_press("`")), None);
    assert!(!registry.gesture_in_flight());
}

#[test]
fn release_matches_even_after_modifier_dropped() {
    let (mut registry, state) = recording_registry();

    state.set_modifier(Modifier::Ctrl, true);
    assert_eq!(
        registry.dispatch(&key_press("`")),
        Some(BindingEvent::RecordingPressed)
    );

    // Ctrl released mid-hold; the pinned gesture still ends cleanly
    state.set_modifier(Modifier::Ctrl, false);
    assert_eq!(
        registry.dispatch(&key_release("`")),
        Some(BindingEvent::RecordingReleased)
    );
    assert!(!registry.gesture_in_flight());
}

#[test]
fn release_with_no_audio_reports_empty() {
    let session = RecordingSession::new();
    assert!(session.on_trigger_press());
    assert_eq!(session.on_trigger_release(), ReleaseOutcome::NoAudio);
    assert!(session.is_idle());
}

// ============================================================================
// Rebind safety
// ============================================================================

#[test]
fn rebind_during_gesture_keeps_release_pinned_to_old_trigger() {
    let (mut registry, state) = recording_registry();

    state.set_modifier(Modifier::Ctrl, true);
    assert_eq!(
        registry.dispatch(&key_press("`")),
        Some(BindingEvent::RecordingPressed)
    );

    // Swap the binding while the old trigger is still held
    registry.register_recording(parse_spec("x2").unwrap());

    // The in-flight gesture releases on the old trigger, not the new one
    assert_eq!(
        registry.dispatch(&RawInputEvent::ButtonRelease("x2".to_string())),
        None
    );
    assert_eq!(
        registry.dispatch(&key_release("`")),
        Some(BindingEvent::RecordingReleased)
    );

    // The next gesture uses the new binding
    assert_eq!(
        registry.dispatch(&RawInputEvent::ButtonPress("x2".to_string())),
        Some(BindingEvent::RecordingPressed)
    );
    assert_eq!(
        registry.dispatch(&RawInputEvent::ButtonRelease("x2".to_string())),
        Some(BindingEvent::RecordingReleased)
    );
}

// ============================================================================
// Interactive capture to binding
// ============================================================================

#[test]
fn captured_chord_parses_back_as_a_valid_spec() {
    let mut assistant = CaptureAssistant::new();

    assert!(matches!(
        assistant.on_event(&key_press("ctrl")),
        CaptureOutcome::Pending
    ));
    assert!(matches!(
        assistant.on_event(&key_press("r")),
        CaptureOutcome::Pending
    ));

    match assistant.on_event(&key_release("r")) {
        CaptureOutcome::Finalized(binding) => {
            assert_eq!(binding.spec_string(), "ctrl+r");
            // Round-trips through the parser that loads it at startup
            assert_eq!(parse_spec(&binding.spec_string()).unwrap(), binding);
        }
        other => panic!("expected finalized binding, got {:?}", other),
    }
}

#[test]
fn captured_pointer_button_binds_without_modifiers() {
    let mut assistant = CaptureAssistant::new();

    match assistant.on_event(&RawInputEvent::ButtonPress("x2".to_string())) {
        CaptureOutcome::Finalized(binding) => {
            assert_eq!(binding.spec_string(), "x2");
            assert_eq!(parse_spec("x2").unwrap(), binding);
        }
        other => panic!("expected finalized binding, got {:?}", other),
    }
}

// ============================================================================
// Engine pipeline (unix: stub engine script)
// ============================================================================

#[cfg(unix)]
mod engine_pipeline {
    use super::*;
    use scribekey::config::EngineConfig;
    use scribekey::transcribe::{create_transcriber, Transcriber};
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable stub engine script into a temp dir
    fn stub_engine(dir: &tempfile::TempDir, body: &str) -> EngineConfig {
        let path = dir.path().join("whisper-cli");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();

        EngineConfig {
            path: Some(path.to_string_lossy().into_owned()),
            model: dir.path().join("model.bin").to_string_lossy().into_owned(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn released_buffer_flows_through_engine_to_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let config = stub_engine(&dir, "echo ' hello from the engine '");

        let session = RecordingSession::new();
        assert!(session.on_trigger_press());
        session.on_audio_frame(&[0.25; 16000]);

        let buffer = match session.on_trigger_release() {
            ReleaseOutcome::Captured(buffer) => buffer,
            other => panic!("expected captured audio, got {:?}", other),
        };

        let transcriber = create_transcriber(&config).unwrap();
        let text = transcriber.transcribe(&buffer).await.unwrap();
        assert_eq!(text, "hello from the engine");

        session.complete();
        assert!(session.is_idle());
    }

    #[tokio::test]
    async fn silent_engine_output_is_a_session_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = stub_engine(&dir, "true");

        let transcriber = create_transcriber(&config).unwrap();
        let err = transcriber.transcribe(&[0.25; 16000]).await.unwrap_err();
        assert!(matches!(
            err,
            scribekey::error::TranscribeError::NoSpeechDetected
        ));
    }
}
