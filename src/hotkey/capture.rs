//! Interactive hotkey capture
//!
//! Transient mode that watches raw keyboard and pointer events so the user
//! can define a new recording trigger by performing it. Finalizes on a
//! pointer button press (right/middle/x/x2; left stays free for clicking
//! UI) or on a keyboard key-up once a non-modifier key has been pressed.
//! Keyboard-only captures without a modifier are rejected: an un-modified
//! key is unsafe as a global hotkey.

use super::{Modifier, RawInputEvent, TriggerBinding, TriggerKind, POINTER_BUTTONS};
use crate::error::HotkeyError;
use std::collections::BTreeSet;

/// Result of feeding one raw event to the assistant
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Still listening
    Pending,
    /// Capture finished with a valid binding
    Finalized(TriggerBinding),
    /// Capture finished but the combination was rejected; the previous
    /// binding stays active
    Rejected(HotkeyError),
}

/// Transient capture assistant
///
/// Created when the settings chord fires, fed every raw event until it
/// finalizes, then dropped. Deactivation is idempotent: events arriving
/// after finalize are ignored.
pub struct CaptureAssistant {
    active: bool,
    modifiers: BTreeSet<Modifier>,
    /// Non-modifier keys currently held, in press order
    held_keys: Vec<String>,
}

impl CaptureAssistant {
    pub fn new() -> Self {
        tracing::info!("Hotkey capture started: press the new trigger combination");
        Self {
            active: true,
            modifiers: BTreeSet::new(),
            held_keys: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop listening without producing a binding; safe to call repeatedly
    pub fn cancel(&mut self) {
        self.active = false;
        self.modifiers.clear();
        self.held_keys.clear();
    }

    /// Feed one raw event; may finalize the capture
    pub fn on_event(&mut self, event: &RawInputEvent) -> CaptureOutcome {
        if !self.active {
            return CaptureOutcome::Pending;
        }

        match event {
            RawInputEvent::KeyPress(name) => {
                if let Some(modifier) = Modifier::from_token(name) {
                    self.modifiers.insert(modifier);
                } else if !self.held_keys.iter().any(|k| k == name) {
                    self.held_keys.push(name.clone());
                }
                CaptureOutcome::Pending
            }

            RawInputEvent::KeyRelease(name) => {
                if let Some(modifier) = Modifier::from_token(name) {
                    self.modifiers.remove(&modifier);
                    return CaptureOutcome::Pending;
                }
                if self.held_keys.is_empty() {
                    return CaptureOutcome::Pending;
                }
                self.finalize_keyboard()
            }

            RawInputEvent::ButtonPress(name) => {
                // Left click stays usable for UI while capturing
                if name != "left" && POINTER_BUTTONS.contains(&name.as_str()) {
                    return self.finalize_pointer(name);
                }
                CaptureOutcome::Pending
            }

            RawInputEvent::ButtonRelease(_) => CaptureOutcome::Pending,
        }
    }

    fn finalize_pointer(&mut self, button: &str) -> CaptureOutcome {
        let binding = TriggerBinding {
            modifiers: self.modifiers.clone(),
            kind: TriggerKind::PointerButton,
            trigger: button.to_string(),
        };
        self.cancel();
        tracing::info!("Captured trigger: {}", binding);
        CaptureOutcome::Finalized(binding)
    }

    fn finalize_keyboard(&mut self) -> CaptureOutcome {
        // The most recent non-modifier press is the trigger
        let trigger = match self.held_keys.last() {
            Some(key) => key.clone(),
            None => return CaptureOutcome::Pending,
        };

        if self.modifiers.is_empty() {
            let error = HotkeyError::invalid_spec(
                &trigger,
                "a keyboard trigger needs at least one of ctrl/shift/alt",
            );
            self.cancel();
            tracing::warn!("Capture rejected: {}", error);
            return CaptureOutcome::Rejected(error);
        }

        let binding = TriggerBinding {
            modifiers: self.modifiers.clone(),
            kind: TriggerKind::Keyboard,
            trigger,
        };
        self.cancel();
        tracing::info!("Captured trigger: {}", binding);
        CaptureOutcome::Finalized(binding)
    }
}

impl Default for CaptureAssistant {
    fn default() -> Self {
        Self::new()
    }
}
