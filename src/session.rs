//! Recording session state machine
//!
//! The single authoritative Idle → Recording → Transcribing → Idle state
//! for the push-to-talk workflow. Trigger press/release arrives from the
//! input-hook thread, audio frames from the audio-driver callback thread,
//! and completion from the transcription worker; one mutex serializes all
//! three onto the state and the sample buffer. No entry point blocks or
//! performs I/O while the lock is held.
//!
//! The buffer is owned exclusively by the state machine: frames that
//! arrive while not Recording are dropped on the floor, and release hands
//! the accumulated samples out by value so nothing else ever aliases them.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Audio samples collected during recording (f32, mono, 16kHz)
pub type AudioBuffer = Vec<f32>;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the trigger press
    Idle,
    /// Trigger held, buffering audio
    Recording,
    /// Trigger released, engine running
    Transcribing,
}

/// What a trigger release produced
#[derive(Debug, PartialEq)]
pub enum ReleaseOutcome {
    /// Not recording; release ignored
    NotRecording,
    /// Recording ended with an empty buffer; session is already Idle again
    NoAudio,
    /// Recording ended; the buffer is handed over for transcription and
    /// the session is Transcribing until `complete` is called
    Captured(AudioBuffer),
}

struct SessionInner {
    state: SessionState,
    frames: AudioBuffer,
    started_at: Option<Instant>,
}

/// The process-wide recording session
pub struct RecordingSession {
    inner: Mutex<SessionInner>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                frames: Vec::new(),
                started_at: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        // A poisoned session mutex means a panic mid-transition; the state
        // itself is still a valid enum value, so keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_idle(&self) -> bool {
        self.state() == SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state() == SessionState::Recording
    }

    /// Time since recording started, while Recording
    pub fn recording_duration(&self) -> Option<Duration> {
        let inner = self.lock();
        match inner.state {
            SessionState::Recording => inner.started_at.map(|t| t.elapsed()),
            _ => None,
        }
    }

    /// Trigger pressed: Idle → Recording with a fresh buffer
    ///
    /// Returns false (no-op) in any other state, which also blocks a second
    /// gesture while one is still transcribing.
    pub fn on_trigger_press(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != SessionState::Idle {
            tracing::debug!("Trigger press ignored in {:?}", inner.state);
            return false;
        }
        inner.frames = Vec::new();
        inner.started_at = Some(Instant::now());
        inner.state = SessionState::Recording;
        true
    }

    /// Audio frame from the driver callback: appended only while Recording
    ///
    /// Frames arriving in any other state are discarded, never queued, so
    /// stale audio cannot leak into the next session.
    pub fn on_audio_frame(&self, block: &[f32]) {
        let mut inner = self.lock();
        if inner.state == SessionState::Recording {
            inner.frames.extend_from_slice(block);
        }
    }

    /// Trigger released: Recording → Transcribing, buffer handed out by value
    ///
    /// Returns immediately; the caller dispatches the buffer to the
    /// transcription worker so the hook thread is never stalled. An empty
    /// buffer short-circuits straight back to Idle.
    pub fn on_trigger_release(&self) -> ReleaseOutcome {
        let mut inner = self.lock();
        if inner.state != SessionState::Recording {
            tracing::debug!("Trigger release ignored in {:?}", inner.state);
            return ReleaseOutcome::NotRecording;
        }

        inner.started_at = None;
        if inner.frames.is_empty() {
            inner.state = SessionState::Idle;
            return ReleaseOutcome::NoAudio;
        }

        inner.state = SessionState::Transcribing;
        ReleaseOutcome::Captured(std::mem::take(&mut inner.frames))
    }

    /// Transcription finished (success or error): back to Idle
    ///
    /// Every pipeline exit path ends here; there is no partial-failure
    /// state that survives a session.
    pub fn complete(&self) {
        let mut inner = self.lock();
        if inner.state != SessionState::Transcribing {
            tracing::debug!("Completion ignored in {:?}", inner.state);
            return;
        }
        inner.frames = Vec::new();
        inner.state = SessionState::Idle;
    }

    /// Abort a recording in progress (safety-limit timeout), dropping the
    /// buffer and returning to Idle
    pub fn abort_recording(&self) {
        let mut inner = self.lock();
        if inner.state == SessionState::Recording {
            inner.frames = Vec::new();
            inner.started_at = None;
            inner.state = SessionState::Idle;
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        match inner.state {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Recording => {
                let secs = inner
                    .started_at
                    .map(|t| t.elapsed().as_secs_f32())
                    .unwrap_or(0.0);
                write!(f, "Recording ({:.1}s, {} samples)", secs, inner.frames.len())
            }
            SessionState::Transcribing => write!(f, "Transcribing"),
        }
    }
}
