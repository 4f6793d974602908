//! Binding registry
//!
//! Owns the active recording and settings bindings and turns raw hook
//! events into binding events. Dispatch runs only on the daemon event loop,
//! so each binding is a single field replaced atomically between turns;
//! there is structurally never a duplicate or missing registration for a
//! configured trigger.
//!
//! A gesture in flight is pinned at press time: the release completes
//! against the trigger that was pressed even if the binding was replaced
//! mid-gesture. The daemon defers rebinds until the registry reports no
//! gesture in flight (the idle fence), never applying one from inside an
//! event dispatch.

use super::{HookState, RawInputEvent, TriggerBinding, TriggerKind};
use std::sync::Arc;

/// Events produced by dispatching raw input against the active bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingEvent {
    /// The recording trigger was pressed with its modifiers satisfied
    RecordingPressed,
    /// The pressed recording trigger was released
    RecordingReleased,
    /// The settings chord was activated
    SettingsActivated,
}

/// Registry of active trigger bindings
pub struct BindingRegistry {
    recording: Option<TriggerBinding>,
    settings: Option<TriggerBinding>,
    /// Trigger pinned by the press of an in-flight gesture
    in_flight: Option<(TriggerKind, String)>,
    hook_state: Arc<HookState>,
}

impl BindingRegistry {
    pub fn new(hook_state: Arc<HookState>) -> Self {
        Self {
            recording: None,
            settings: None,
            in_flight: None,
            hook_state,
        }
    }

    /// Replace the recording binding; safe when none is registered
    pub fn register_recording(&mut self, binding: TriggerBinding) {
        if let Some(ref old) = self.recording {
            tracing::debug!("Unregistering recording binding {}", old);
        }
        tracing::info!("Recording trigger: {}", binding);
        self.recording = Some(binding);
    }

    /// Replace the settings binding; safe when none is registered
    pub fn register_settings(&mut self, binding: TriggerBinding) {
        tracing::info!("Settings trigger: {}", binding);
        self.settings = Some(binding);
    }

    /// Release every registration; no-op when nothing is registered
    pub fn unregister_all(&mut self) {
        self.recording = None;
        self.settings = None;
        self.in_flight = None;
    }

    pub fn recording_binding(&self) -> Option<&TriggerBinding> {
        self.recording.as_ref()
    }

    /// True while a press has happened whose release is still pending
    pub fn gesture_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Dispatch a raw hook event against the active bindings
    ///
    /// Modifier satisfaction is checked at press time against the hook's
    /// live modifier state, not by tracking modifier events separately.
    pub fn dispatch(&mut self, event: &RawInputEvent) -> Option<BindingEvent> {
        let (kind, name) = event.trigger_key();

        if !event.is_press() {
            if let Some((pinned_kind, pinned_name)) = &self.in_flight {
                if *pinned_kind == kind && pinned_name == name {
                    self.in_flight = None;
                    return Some(BindingEvent::RecordingReleased);
                }
            }
            return None;
        }

        if self.in_flight.is_some() {
            // Mid-gesture presses never start anything new
            return None;
        }

        if let Some(ref binding) = self.recording {
            if binding.matches_trigger(kind, name)
                && self.hook_state.satisfies(&binding.modifiers)
            {
                self.in_flight = Some((kind, name.to_string()));
                return Some(BindingEvent::RecordingPressed);
            }
        }

        if let Some(ref binding) = self.settings {
            if binding.matches_trigger(kind, name)
                && self.hook_state.satisfies(&binding.modifiers)
            {
                return Some(BindingEvent::SettingsActivated);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::spec::parse_spec;
    use crate::hotkey::Modifier;

    fn registry_with(recording: &str, settings: &str) -> (BindingRegistry, Arc<HookState>) {
        let state = Arc::new(HookState::new());
        let mut registry = BindingRegistry::new(state.clone());
        registry.register_recording(parse_spec(recording).unwrap());
        registry.register_settings(parse_spec(settings).unwrap());
        (registry, state)
    }

    #[test]
    fn test_press_release_cycle() {
        let (mut registry, state) = registry_with("ctrl+`", "ctrl+shift+h");
        state.set_modifier(Modifier::Ctrl, true);

        let press = RawInputEvent::KeyPress("`".to_string());
        assert_eq!(
            registry.dispatch(&press),
            Some(BindingEvent::RecordingPressed)
        );
        assert!(registry.gesture_in_flight());

        let release = RawInputEvent::KeyRelease("`".to_string());
        assert_eq!(
            registry.dispatch(&release),
            Some(BindingEvent::RecordingReleased)
        );
        assert!(!registry.gesture_in_flight());
    }

    #[test]
    fn test_press_without_modifiers_ignored() {
        let (mut registry, _state) = registry_with("ctrl+`", "ctrl+shift+h");

        let press = RawInputEvent::KeyPress("`".to_string());
        assert_eq!(registry.dispatch(&press), None);
        assert!(!registry.gesture_in_flight());
    }

    #[test]
    fn test_pointer_binding_without_modifiers() {
        let (mut registry, _state) = registry_with("x2", "ctrl+shift+h");

        let press = RawInputEvent::ButtonPress("x2".to_string());
        assert_eq!(
            registry.dispatch(&press),
            Some(BindingEvent::RecordingPressed)
        );
        assert_eq!(
            registry.dispatch(&RawInputEvent::ButtonRelease("x2".to_string())),
            Some(BindingEvent::RecordingReleased)
        );
    }

    #[test]
    fn test_unrelated_events_ignored() {
        let (mut registry, state) = registry_with("ctrl+`", "ctrl+shift+h");
        state.set_modifier(Modifier::Ctrl, true);

        assert_eq!(
            registry.dispatch(&RawInputEvent::KeyPress("a".to_string())),
            None
        );
        assert_eq!(
            registry.dispatch(&RawInputEvent::KeyRelease("a".to_string())),
            None
        );
        assert_eq!(
            registry.dispatch(&RawInputEvent::ButtonPress("left".to_string())),
            None
        );
    }

    #[test]
    fn test_settings_chord_activation() {
        let (mut registry, state) = registry_with("ctrl+`", "ctrl+shift+h");
        state.set_modifier(Modifier::Ctrl, true);
        state.set_modifier(Modifier::Shift, true);

        assert_eq!(
            registry.dispatch(&RawInputEvent::KeyPress("h".to_string())),
            Some(BindingEvent::SettingsActivated)
        );
        // Release of the settings key produces nothing
        assert_eq!(
            registry.dispatch(&RawInputEvent::KeyRelease("h".to_string())),
            None
        );
    }

    #[test]
    fn test_release_pinned_to_press_binding() {
        // Rebinding mid-gesture must not orphan the in-flight release
        let (mut registry, state) = registry_with("ctrl+`", "ctrl+shift+h");
        state.set_modifier(Modifier::Ctrl, true);

        assert_eq!(
            registry.dispatch(&RawInputEvent::KeyPress("`".to_string())),
            Some(BindingEvent::RecordingPressed)
        );

        registry.register_recording(parse_spec("right").unwrap());

        // The new trigger does not start a second gesture mid-flight
        assert_eq!(
            registry.dispatch(&RawInputEvent::ButtonPress("right".to_string())),
            None
        );

        // The old trigger's release still completes the gesture
        assert_eq!(
            registry.dispatch(&RawInputEvent::KeyRelease("`".to_string())),
            Some(BindingEvent::RecordingReleased)
        );

        // Afterwards exactly the new binding is live
        assert_eq!(
            registry.dispatch(&RawInputEvent::ButtonPress("right".to_string())),
            Some(BindingEvent::RecordingPressed)
        );
    }

    #[test]
    fn test_duplicate_press_ignored_while_in_flight() {
        let (mut registry, state) = registry_with("ctrl+`", "ctrl+shift+h");
        state.set_modifier(Modifier::Ctrl, true);

        let press = RawInputEvent::KeyPress("`".to_string());
        assert_eq!(
            registry.dispatch(&press),
            Some(BindingEvent::RecordingPressed)
        );
        // Key auto-repeat shows up as repeated presses
        assert_eq!(registry.dispatch(&press), None);
    }

    #[test]
    fn test_unregister_all_is_idempotent() {
        let (mut registry, _state) = registry_with("ctrl+`", "ctrl+shift+h");
        registry.unregister_all();
        registry.unregister_all();
        assert_eq!(
            registry.dispatch(&RawInputEvent::KeyPress("`".to_string())),
            None
        );
    }
}
