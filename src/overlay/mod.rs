//! Overlay status channel
//!
//! A single presentation actor owns the one overlay surface. Any thread
//! may queue an `OverlayEvent`; only the actor task ever touches the
//! surface. Recording and Transcribing are persistent, cursor-following
//! presentations; Success and Error auto-hide on a timer; Hide is
//! immediate. A new event preempts whatever timer or tracking the
//! previous one started, and cursor tracking stops the instant the
//! surface hides.

pub mod surface;

pub use surface::{OverlaySurface, SilentSurface, StatusLogSurface};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// State-change events queued to the presentation actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    Recording,
    Transcribing,
    Success,
    Error(String),
    Hide,
}

/// Visual status a surface is asked to present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStatus {
    Recording,
    Transcribing,
    Success,
    Error,
}

/// Source of the current pointer position for cursor-following
pub trait PointerSource: Send + Sync {
    fn pointer_position(&self) -> (f64, f64);
}

/// Success feedback stays up this long
pub const SUCCESS_HIDE_DELAY: Duration = Duration::from_millis(1500);
/// Error feedback stays up this long
pub const ERROR_HIDE_DELAY: Duration = Duration::from_millis(2000);
/// Cursor-following reposition tick (~60 Hz)
pub const FOLLOW_TICK: Duration = Duration::from_millis(16);

/// Cloneable sender half of the overlay channel
#[derive(Clone)]
pub struct OverlayHandle {
    tx: mpsc::Sender<OverlayEvent>,
}

impl OverlayHandle {
    /// Queue an event from any thread; a full queue drops the event
    /// rather than blocking the producer
    pub fn emit(&self, event: OverlayEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::debug!("Overlay event dropped: {}", e);
        }
    }
}

/// Spawn the presentation actor and return its handle
pub fn spawn(
    surface: Box<dyn OverlaySurface>,
    pointer: Arc<dyn PointerSource>,
) -> OverlayHandle {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(actor_loop(rx, surface, pointer));
    OverlayHandle { tx }
}

async fn actor_loop(
    mut rx: mpsc::Receiver<OverlayEvent>,
    mut surface: Box<dyn OverlaySurface>,
    pointer: Arc<dyn PointerSource>,
) {
    let mut following = false;
    let mut hide_at: Option<Instant> = None;
    let mut tick = tokio::time::interval(FOLLOW_TICK);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    surface.hide();
                    break;
                };
                // Each event preempts the previous timer and tracking
                hide_at = None;
                following = false;
                match event {
                    OverlayEvent::Recording => {
                        surface.show(OverlayStatus::Recording, None, pointer.pointer_position());
                        following = true;
                    }
                    OverlayEvent::Transcribing => {
                        surface.show(OverlayStatus::Transcribing, None, pointer.pointer_position());
                        following = true;
                    }
                    OverlayEvent::Success => {
                        surface.show(OverlayStatus::Success, None, pointer.pointer_position());
                        hide_at = Some(Instant::now() + SUCCESS_HIDE_DELAY);
                    }
                    OverlayEvent::Error(message) => {
                        surface.show(
                            OverlayStatus::Error,
                            Some(&message),
                            pointer.pointer_position(),
                        );
                        hide_at = Some(Instant::now() + ERROR_HIDE_DELAY);
                    }
                    OverlayEvent::Hide => {
                        surface.hide();
                    }
                }
            }

            _ = tick.tick(), if following => {
                surface.move_to(pointer.pointer_position());
            }

            _ = async {
                match hide_at {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            } => {
                surface.hide();
                hide_at = None;
                following = false;
            }
        }
    }
}
