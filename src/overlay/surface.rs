//! Overlay surface seam
//!
//! The visual renderer is a collaborator; the daemon ships with a logging
//! surface so the status channel is fully exercised headless. A real
//! compositor-backed surface implements the same trait.

use super::OverlayStatus;

/// One overlay surface, driven exclusively by the presentation actor
pub trait OverlaySurface: Send {
    /// Present a status near the given position; replaces whatever was
    /// showing before
    fn show(&mut self, status: OverlayStatus, detail: Option<&str>, at: (f64, f64));

    /// Reposition while visible (cursor-following tick)
    fn move_to(&mut self, at: (f64, f64));

    /// Remove the surface; must tolerate being called while hidden
    fn hide(&mut self);
}

/// Surface that renders status transitions into the log
pub struct StatusLogSurface {
    visible: bool,
}

impl StatusLogSurface {
    pub fn new() -> Self {
        Self { visible: false }
    }
}

impl Default for StatusLogSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Surface used when the overlay is disabled in config
pub struct SilentSurface;

impl OverlaySurface for SilentSurface {
    fn show(&mut self, _status: OverlayStatus, _detail: Option<&str>, _at: (f64, f64)) {}

    fn move_to(&mut self, _at: (f64, f64)) {}

    fn hide(&mut self) {}
}

impl OverlaySurface for StatusLogSurface {
    fn show(&mut self, status: OverlayStatus, detail: Option<&str>, at: (f64, f64)) {
        self.visible = true;
        match detail {
            Some(detail) => {
                tracing::info!("Overlay: {:?} ({}) at ({:.0}, {:.0})", status, detail, at.0, at.1)
            }
            None => tracing::info!("Overlay: {:?} at ({:.0}, {:.0})", status, at.0, at.1),
        }
    }

    fn move_to(&mut self, _at: (f64, f64)) {
        // Repositioning a log line is meaningless; the tick is exercised
        // by the actor regardless.
    }

    fn hide(&mut self) {
        if self.visible {
            tracing::debug!("Overlay hidden");
            self.visible = false;
        }
    }
}
