//! Trigger binding types and the input hook seam
//!
//! A trigger is the single key or pointer button whose press/release bounds
//! a recording gesture. Keyboard triggers require at least one ctrl/shift/alt
//! modifier; pointer buttons may stand alone. The hook provider delivers raw
//! press/release events over a channel and answers the synchronous
//! "is this modifier currently held" query the registry needs at press time.

pub mod capture;
pub mod rdev_listener;
pub mod registry;
pub mod spec;

use crate::error::HotkeyError;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Modifier keys accepted in a trigger chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
}

impl Modifier {
    /// Parse a spec token into a modifier, if it names one
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" => Some(Self::Ctrl),
            "shift" => Some(Self::Shift),
            "alt" => Some(Self::Alt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ctrl => "ctrl",
            Self::Shift => "shift",
            Self::Alt => "alt",
        }
    }
}

/// Kind of trigger a binding listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Keyboard,
    PointerButton,
}

/// Pointer button names recognized as triggers
pub const POINTER_BUTTONS: &[&str] = &["left", "right", "middle", "x", "x2"];

/// A parsed, validated trigger binding
///
/// Immutable once created; rebinding replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerBinding {
    pub modifiers: BTreeSet<Modifier>,
    pub kind: TriggerKind,
    pub trigger: String,
}

impl TriggerBinding {
    /// Render the binding back into the persisted spec string form
    pub fn spec_string(&self) -> String {
        let mut parts: Vec<&str> = self.modifiers.iter().map(Modifier::as_str).collect();
        parts.push(&self.trigger);
        parts.join("+")
    }

    /// Whether a raw event's press/release of (kind, name) matches this
    /// binding's trigger, ignoring modifiers
    pub fn matches_trigger(&self, kind: TriggerKind, name: &str) -> bool {
        self.kind == kind && self.trigger == name
    }
}

impl std::fmt::Display for TriggerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.spec_string())
    }
}

/// Raw press/release events delivered by the input hook
///
/// Key and button names are normalized lowercase tokens in the same
/// vocabulary the spec parser uses ("a", "`", "f5", "ctrl", "right", "x2").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInputEvent {
    KeyPress(String),
    KeyRelease(String),
    ButtonPress(String),
    ButtonRelease(String),
}

impl RawInputEvent {
    /// The (kind, name) trigger key this event refers to
    pub fn trigger_key(&self) -> (TriggerKind, &str) {
        match self {
            Self::KeyPress(name) | Self::KeyRelease(name) => (TriggerKind::Keyboard, name),
            Self::ButtonPress(name) | Self::ButtonRelease(name) => {
                (TriggerKind::PointerButton, name)
            }
        }
    }

    pub fn is_press(&self) -> bool {
        matches!(self, Self::KeyPress(_) | Self::ButtonPress(_))
    }
}

/// Live input state maintained by the hook thread
///
/// Modifier flags are written from the hook thread and read at press time
/// by the registry; the pointer position feeds the overlay's cursor
/// tracking. Lock-free so neither reader nor writer can stall the hook.
#[derive(Debug, Default)]
pub struct HookState {
    ctrl: AtomicBool,
    shift: AtomicBool,
    alt: AtomicBool,
    pointer_x: AtomicU64,
    pointer_y: AtomicU64,
}

impl HookState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_modifier(&self, modifier: Modifier, held: bool) {
        let flag = match modifier {
            Modifier::Ctrl => &self.ctrl,
            Modifier::Shift => &self.shift,
            Modifier::Alt => &self.alt,
        };
        flag.store(held, Ordering::SeqCst);
    }

    pub fn is_held(&self, modifier: Modifier) -> bool {
        let flag = match modifier {
            Modifier::Ctrl => &self.ctrl,
            Modifier::Shift => &self.shift,
            Modifier::Alt => &self.alt,
        };
        flag.load(Ordering::SeqCst)
    }

    /// All of the binding's required modifiers currently held?
    pub fn satisfies(&self, required: &BTreeSet<Modifier>) -> bool {
        required.iter().all(|m| self.is_held(*m))
    }

    pub fn set_pointer(&self, x: f64, y: f64) {
        self.pointer_x.store(x.to_bits(), Ordering::Relaxed);
        self.pointer_y.store(y.to_bits(), Ordering::Relaxed);
    }

    pub fn pointer(&self) -> (f64, f64) {
        (
            f64::from_bits(self.pointer_x.load(Ordering::Relaxed)),
            f64::from_bits(self.pointer_y.load(Ordering::Relaxed)),
        )
    }
}

impl crate::overlay::PointerSource for HookState {
    fn pointer_position(&self) -> (f64, f64) {
        self.pointer()
    }
}

/// Trait for input hook implementations
///
/// One hook instance runs for the whole process; the registry and the
/// capture assistant both consume its raw event stream.
#[async_trait::async_trait]
pub trait InputHook: Send {
    /// Start the hook and return the raw event channel
    async fn start(&mut self) -> Result<mpsc::Receiver<RawInputEvent>, HotkeyError>;

    /// Stop delivering events; tolerates being called more than once
    async fn stop(&mut self) -> Result<(), HotkeyError>;

    /// Shared modifier/pointer snapshot updated by the hook thread
    fn state(&self) -> Arc<HookState>;
}

/// Factory function to create the platform input hook
pub fn create_hook() -> Box<dyn InputHook> {
    Box::new(rdev_listener::RdevHook::new())
}
