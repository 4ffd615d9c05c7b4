//! Translation of native keyboard events into editor key events.

use blockpad_engine::editing::{Key as EditorKey, KeyEvent, Modifiers as EditorModifiers};
use dioxus::events::{Key, Modifiers};

pub fn editor_key(key: &Key) -> EditorKey {
    match key {
        Key::Enter => EditorKey::Enter,
        Key::Backspace => EditorKey::Backspace,
        Key::Escape => EditorKey::Escape,
        Key::ArrowUp => EditorKey::ArrowUp,
        Key::ArrowDown => EditorKey::ArrowDown,
        Key::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => EditorKey::Character(c),
                _ => EditorKey::Other,
            }
        }
        _ => EditorKey::Other,
    }
}

pub fn editor_modifiers(modifiers: Modifiers) -> EditorModifiers {
    EditorModifiers {
        ctrl: modifiers.ctrl(),
        meta: modifiers.meta(),
        shift: modifiers.shift(),
    }
}

/// `cursor` is the caret offset last reported by the text node
pub fn key_event(key: &Key, modifiers: Modifiers, cursor: usize) -> KeyEvent {
    KeyEvent {
        key: editor_key(key),
        modifiers: editor_modifiers(modifiers),
        cursor,
    }
}
