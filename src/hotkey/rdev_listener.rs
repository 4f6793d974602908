//! rdev-based global input hook
//!
//! Runs the rdev OS hook on a dedicated thread and forwards normalized
//! keyboard and pointer press/release events over a channel. The hook
//! thread also maintains the shared modifier/pointer snapshot, so modifier
//! satisfaction checks and overlay cursor tracking never touch the OS
//! directly.
//!
//! rdev's listen loop cannot be unhooked once installed; stop() flips a
//! flag that silences forwarding, which is enough for a hook that lives as
//! long as the process.

use super::{HookState, InputHook, Modifier, RawInputEvent};
use crate::error::HotkeyError;
use rdev::{Button, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

/// Global input hook backed by rdev
pub struct RdevHook {
    state: Arc<HookState>,
    stopped: Arc<AtomicBool>,
    started: bool,
}

impl RdevHook {
    pub fn new() -> Self {
        Self {
            state: Arc::new(HookState::new()),
            stopped: Arc::new(AtomicBool::new(false)),
            started: false,
        }
    }
}

impl Default for RdevHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InputHook for RdevHook {
    async fn start(&mut self) -> Result<mpsc::Receiver<RawInputEvent>, HotkeyError> {
        if self.started {
            return Err(HotkeyError::HookStart("hook already started".to_string()));
        }
        self.started = true;

        let (tx, rx) = mpsc::channel(256);
        let state = self.state.clone();
        let stopped = self.stopped.clone();

        // rdev::listen never returns on success, so it gets its own thread
        thread::Builder::new()
            .name("input-hook".to_string())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if stopped.load(Ordering::SeqCst) {
                        return;
                    }
                    handle_event(event.event_type, &state, &tx);
                });
                if let Err(e) = result {
                    tracing::error!("Input hook failed: {:?}", e);
                }
            })
            .map_err(|e| HotkeyError::HookStart(e.to_string()))?;

        tracing::debug!("Input hook thread started");
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), HotkeyError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn state(&self) -> Arc<HookState> {
        self.state.clone()
    }
}

/// Translate one rdev event, updating shared state and forwarding
/// press/release events
fn handle_event(event_type: EventType, state: &HookState, tx: &mpsc::Sender<RawInputEvent>) {
    let raw = match event_type {
        EventType::KeyPress(key) => {
            if let Some(modifier) = modifier_of(key) {
                state.set_modifier(modifier, true);
            }
            RawInputEvent::KeyPress(key_name(key))
        }
        EventType::KeyRelease(key) => {
            if let Some(modifier) = modifier_of(key) {
                state.set_modifier(modifier, false);
            }
            RawInputEvent::KeyRelease(key_name(key))
        }
        EventType::ButtonPress(button) => match button_name(button) {
            Some(name) => RawInputEvent::ButtonPress(name),
            None => return,
        },
        EventType::ButtonRelease(button) => match button_name(button) {
            Some(name) => RawInputEvent::ButtonRelease(name),
            None => return,
        },
        EventType::MouseMove { x, y } => {
            state.set_pointer(x, y);
            return;
        }
        EventType::Wheel { .. } => return,
    };

    // Dropping events on a full queue beats stalling the OS hook
    if let Err(e) = tx.try_send(raw) {
        tracing::trace!("Input event dropped: {}", e);
    }
}

/// Modifier represented by a key, if any
fn modifier_of(key: Key) -> Option<Modifier> {
    match key {
        Key::ControlLeft | Key::ControlRight => Some(Modifier::Ctrl),
        Key::ShiftLeft | Key::ShiftRight => Some(Modifier::Shift),
        Key::Alt | Key::AltGr => Some(Modifier::Alt),
        _ => None,
    }
}

/// Normalize an rdev key into the spec parser's token vocabulary
fn key_name(key: Key) -> String {
    let name = match key {
        Key::ControlLeft | Key::ControlRight => "ctrl",
        Key::ShiftLeft | Key::ShiftRight => "shift",
        Key::Alt | Key::AltGr => "alt",
        Key::MetaLeft | Key::MetaRight => "meta",

        Key::KeyA => "a",
        Key::KeyB => "b",
        Key::KeyC => "c",
        Key::KeyD => "d",
        Key::KeyE => "e",
        Key::KeyF => "f",
        Key::KeyG => "g",
        Key::KeyH => "h",
        Key::KeyI => "i",
        Key::KeyJ => "j",
        Key::KeyK => "k",
        Key::KeyL => "l",
        Key::KeyM => "m",
        Key::KeyN => "n",
        Key::KeyO => "o",
        Key::KeyP => "p",
        Key::KeyQ => "q",
        Key::KeyR => "r",
        Key::KeyS => "s",
        Key::KeyT => "t",
        Key::KeyU => "u",
        Key::KeyV => "v",
        Key::KeyW => "w",
        Key::KeyX => "x-key",
        Key::KeyY => "y",
        Key::KeyZ => "z",

        Key::Num0 => "0",
        Key::Num1 => "1",
        Key::Num2 => "2",
        Key::Num3 => "3",
        Key::Num4 => "4",
        Key::Num5 => "5",
        Key::Num6 => "6",
        Key::Num7 => "7",
        Key::Num8 => "8",
        Key::Num9 => "9",

        Key::F1 => "f1",
        Key::F2 => "f2",
        Key::F3 => "f3",
        Key::F4 => "f4",
        Key::F5 => "f5",
        Key::F6 => "f6",
        Key::F7 => "f7",
        Key::F8 => "f8",
        Key::F9 => "f9",
        Key::F10 => "f10",
        Key::F11 => "f11",
        Key::F12 => "f12",

        Key::BackQuote => "`",
        Key::Minus => "-",
        Key::Equal => "=",
        Key::LeftBracket => "[",
        Key::RightBracket => "]",
        Key::SemiColon => ";",
        Key::Quote => "'",
        Key::BackSlash => "\\",
        Key::Comma => ",",
        Key::Dot => ".",
        Key::Slash => "/",

        Key::Space => "space",
        Key::Tab => "tab",
        Key::Return => "enter",
        Key::Backspace => "backspace",
        Key::Escape => "escape",
        Key::Delete => "delete",
        Key::Insert => "insert",
        Key::Home => "home",
        Key::End => "end",
        Key::PageUp => "pageup",
        Key::PageDown => "pagedown",
        Key::UpArrow => "up",
        Key::DownArrow => "down",
        Key::LeftArrow => "left-arrow",
        Key::RightArrow => "right-arrow",
        Key::CapsLock => "capslock",
        Key::ScrollLock => "scrolllock",
        Key::NumLock => "numlock",
        Key::PrintScreen => "printscreen",
        Key::Pause => "pause",

        Key::Unknown(code) => return format!("key{}", code),
        other => return format!("{:?}", other).to_lowercase(),
    };
    name.to_string()
}

/// Normalize an rdev pointer button into the spec parser's vocabulary
///
/// Side buttons arrive as raw codes; 8/9 are the X11 back/forward buttons.
fn button_name(button: Button) -> Option<String> {
    let name = match button {
        Button::Left => "left",
        Button::Right => "right",
        Button::Middle => "middle",
        Button::Unknown(8) => "x",
        Button::Unknown(9) => "x2",
        Button::Unknown(code) => {
            tracing::trace!("Ignoring pointer button {}", code);
            return None;
        }
    };
    Some(name.to_string())
}
