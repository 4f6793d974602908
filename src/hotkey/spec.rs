//! Hotkey spec parsing
//!
//! A spec is a string of "+"-joined lowercase tokens, e.g. "ctrl+shift+h"
//! or "x2". The last token is the trigger; preceding ctrl/shift/alt tokens
//! become the required modifier set. Other preceding tokens are silently
//! ignored (known laxity, kept for compatibility with hand-edited configs).
//!
//! Validation is strict where it matters: empty specs, modifier-only specs,
//! and keyboard triggers without any modifier are rejected, since a bare
//! key makes an unsafe global hotkey.

use super::{Modifier, TriggerBinding, TriggerKind, POINTER_BUTTONS};
use crate::error::HotkeyError;
use std::collections::BTreeSet;

/// Parse a trigger spec string into a validated binding
pub fn parse_spec(spec: &str) -> Result<TriggerBinding, HotkeyError> {
    let normalized = spec.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(HotkeyError::invalid_spec(spec, "empty spec"));
    }

    let tokens: Vec<&str> = normalized.split('+').collect();

    let trigger = match tokens.last() {
        Some(&last) if !last.is_empty() => last.to_string(),
        _ => return Err(HotkeyError::invalid_spec(spec, "missing trigger key")),
    };

    if Modifier::from_token(&trigger).is_some() {
        return Err(HotkeyError::invalid_spec(
            spec,
            "spec names only modifiers, no trigger key",
        ));
    }

    let mut modifiers = BTreeSet::new();
    for token in &tokens[..tokens.len() - 1] {
        match Modifier::from_token(token) {
            Some(modifier) => {
                modifiers.insert(modifier);
            }
            None => {
                tracing::debug!("Ignoring unrecognized modifier token {:?} in spec {:?}", token, spec);
            }
        }
    }

    let kind = if POINTER_BUTTONS.contains(&trigger.as_str()) {
        TriggerKind::PointerButton
    } else {
        TriggerKind::Keyboard
    };

    if kind == TriggerKind::Keyboard && modifiers.is_empty() {
        return Err(HotkeyError::invalid_spec(
            spec,
            "keyboard triggers need at least one of ctrl/shift/alt",
        ));
    }

    Ok(TriggerBinding {
        modifiers,
        kind,
        trigger,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyboard_chord() {
        let binding = parse_spec("ctrl+shift+h").unwrap();
        assert_eq!(binding.kind, TriggerKind::Keyboard);
        assert_eq!(binding.trigger, "h");
        assert_eq!(
            binding.modifiers,
            [Modifier::Ctrl, Modifier::Shift].into_iter().collect()
        );
    }

    #[test]
    fn test_parse_pointer_button_bare() {
        let binding = parse_spec("x2").unwrap();
        assert_eq!(binding.kind, TriggerKind::PointerButton);
        assert_eq!(binding.trigger, "x2");
        assert!(binding.modifiers.is_empty());
    }

    #[test]
    fn test_parse_pointer_button_with_modifier() {
        let binding = parse_spec("ctrl+middle").unwrap();
        assert_eq!(binding.kind, TriggerKind::PointerButton);
        assert_eq!(binding.trigger, "middle");
        assert_eq!(binding.modifiers, [Modifier::Ctrl].into_iter().collect());
    }

    #[test]
    fn test_parse_default_recording_trigger() {
        let binding = parse_spec("ctrl+`").unwrap();
        assert_eq!(binding.kind, TriggerKind::Keyboard);
        assert_eq!(binding.trigger, "`");
        assert_eq!(binding.modifiers, [Modifier::Ctrl].into_iter().collect());
    }

    #[test]
    fn test_parse_uppercase_is_normalized() {
        let binding = parse_spec("Ctrl+Shift+H").unwrap();
        assert_eq!(binding.trigger, "h");
        assert_eq!(binding.modifiers.len(), 2);
    }

    #[test]
    fn test_unrecognized_leading_tokens_ignored() {
        // Documented laxity: unknown tokens before the trigger are dropped
        let binding = parse_spec("super+ctrl+k").unwrap();
        assert_eq!(binding.trigger, "k");
        assert_eq!(binding.modifiers, [Modifier::Ctrl].into_iter().collect());
    }

    #[test]
    fn test_reject_empty_spec() {
        assert!(matches!(
            parse_spec(""),
            Err(HotkeyError::InvalidSpec { .. })
        ));
        assert!(matches!(
            parse_spec("   "),
            Err(HotkeyError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_reject_modifier_only_spec() {
        assert!(matches!(
            parse_spec("ctrl+shift"),
            Err(HotkeyError::InvalidSpec { .. })
        ));
        assert!(matches!(
            parse_spec("ctrl"),
            Err(HotkeyError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_reject_bare_keyboard_key() {
        assert!(matches!(
            parse_spec("h"),
            Err(HotkeyError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_reject_trailing_separator() {
        assert!(matches!(
            parse_spec("ctrl+"),
            Err(HotkeyError::InvalidSpec { .. })
        ));
    }
}
