//! Keyboard interpretation for the focused block.
//!
//! `interpret` is a pure function from a key press plus the relevant editor
//! state to an [`EditorAction`]. The session executes the action against the
//! store and the persistence adapter; front ends only translate their native
//! key events into [`KeyEvent`].

use crate::editing::block::BlockKind;
use crate::editing::menu::TRIGGER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    Character(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
    };

    pub fn command() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn command_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl on Linux/Windows, Cmd on macOS
    pub fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Caret offset within the block's text
    pub cursor: usize,
}

impl KeyEvent {
    pub fn plain(key: Key, cursor: usize) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            cursor,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            cursor: 0,
        }
    }
}

/// Editor state a key binding depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub content_empty: bool,
    pub block_count: usize,
    pub menu_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    /// Commit pending content and insert a paragraph after the focused block
    InsertBlockAfter,
    /// Remove the focused empty block and focus the previous one
    DeleteBlock,
    OpenMenu,
    CloseMenu,
    MenuPrevious,
    MenuNext,
    MenuSelect,
    Retype(BlockKind),
    FocusPrevious,
    FocusNext,
    Undo,
    Redo,
}

/// Result of interpreting a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    pub action: Option<EditorAction>,
    /// Whether the front end must suppress the native key behaviour
    pub prevent_default: bool,
}

impl KeyOutcome {
    pub const IGNORED: KeyOutcome = KeyOutcome {
        action: None,
        prevent_default: false,
    };

    fn handled(action: EditorAction) -> Self {
        Self {
            action: Some(action),
            prevent_default: true,
        }
    }

    /// Act, but let the character reach the text node
    fn pass_through(action: EditorAction) -> Self {
        Self {
            action: Some(action),
            prevent_default: false,
        }
    }
}

pub fn interpret(event: &KeyEvent, ctx: KeyContext) -> KeyOutcome {
    if event.modifiers.is_command() {
        return interpret_command(event);
    }

    match (&event.key, ctx.menu_open) {
        (Key::Enter, true) => KeyOutcome::handled(EditorAction::MenuSelect),
        (Key::Enter, false) if event.modifiers.shift => KeyOutcome::IGNORED,
        (Key::Enter, false) => KeyOutcome::handled(EditorAction::InsertBlockAfter),
        (Key::Escape, true) => KeyOutcome::handled(EditorAction::CloseMenu),
        (Key::ArrowUp, true) => KeyOutcome::handled(EditorAction::MenuPrevious),
        (Key::ArrowDown, true) => KeyOutcome::handled(EditorAction::MenuNext),
        (Key::ArrowUp, false) if event.cursor == 0 => {
            KeyOutcome::handled(EditorAction::FocusPrevious)
        }
        (Key::ArrowDown, false) if ctx.content_empty => {
            KeyOutcome::handled(EditorAction::FocusNext)
        }
        (Key::Backspace, _)
            if ctx.content_empty && event.cursor == 0 && ctx.block_count > 1 =>
        {
            KeyOutcome::handled(EditorAction::DeleteBlock)
        }
        (Key::Character(c), false) if *c == TRIGGER && ctx.content_empty && event.cursor == 0 => {
            KeyOutcome::pass_through(EditorAction::OpenMenu)
        }
        _ => KeyOutcome::IGNORED,
    }
}

fn interpret_command(event: &KeyEvent) -> KeyOutcome {
    let Key::Character(c) = event.key else {
        return KeyOutcome::IGNORED;
    };
    let c = c.to_ascii_lowercase();
    if c == 'z' {
        let action = if event.modifiers.shift {
            EditorAction::Redo
        } else {
            EditorAction::Undo
        };
        return KeyOutcome::handled(action);
    }
    if c == 'i' {
        return KeyOutcome::handled(EditorAction::Retype(BlockKind::Image));
    }
    match BlockKind::from_shortcut_digit(c) {
        Some(kind) => KeyOutcome::handled(EditorAction::Retype(kind)),
        None => KeyOutcome::IGNORED,
    }
}
