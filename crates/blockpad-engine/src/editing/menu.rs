//! Type-conversion menu opened by typing `/` into an empty block.
//!
//! States are `Closed` and `Open`. The menu opens only while the focused
//! block holds exactly the trigger character; further typing, Escape, an
//! outside click or a selection close it again. In `Filtering` mode (the
//! simplified text page) text typed after the trigger narrows the options
//! by case-insensitive substring match instead of closing the menu.

use crate::editing::block::BlockKind;

/// Character that opens the menu
pub const TRIGGER: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOption {
    pub kind: BlockKind,
    pub label: &'static str,
    pub description: &'static str,
    pub shortcut: Option<&'static str>,
}

pub const MENU_OPTIONS: [MenuOption; 5] = [
    MenuOption {
        kind: BlockKind::Paragraph,
        label: "Paragraph",
        description: "Plain text",
        shortcut: Some("Ctrl+0"),
    },
    MenuOption {
        kind: BlockKind::Heading1,
        label: "Heading 1",
        description: "Large section heading",
        shortcut: Some("Ctrl+1"),
    },
    MenuOption {
        kind: BlockKind::Heading2,
        label: "Heading 2",
        description: "Medium section heading",
        shortcut: Some("Ctrl+2"),
    },
    MenuOption {
        kind: BlockKind::Heading3,
        label: "Heading 3",
        description: "Small section heading",
        shortcut: Some("Ctrl+3"),
    },
    MenuOption {
        kind: BlockKind::Image,
        label: "Image",
        description: "Upload or embed an image",
        shortcut: Some("Ctrl+I"),
    },
];

/// Screen position the menu is anchored to (the caret)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MenuAnchor {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuMode {
    /// Fixed list of all five options; any further typing closes the menu
    #[default]
    Fixed,
    /// Text after the trigger filters the options
    Filtering,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open {
        anchor: MenuAnchor,
        highlighted: usize,
        query: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TypeMenu {
    state: MenuState,
    mode: MenuMode,
}

impl TypeMenu {
    pub fn new(mode: MenuMode) -> Self {
        Self {
            state: MenuState::Closed,
            mode,
        }
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open { .. })
    }

    pub fn anchor(&self) -> Option<MenuAnchor> {
        match &self.state {
            MenuState::Open { anchor, .. } => Some(*anchor),
            MenuState::Closed => None,
        }
    }

    pub fn open(&mut self, anchor: MenuAnchor) {
        self.state = MenuState::Open {
            anchor,
            highlighted: 0,
            query: String::new(),
        };
    }

    pub fn close(&mut self) {
        self.state = MenuState::Closed;
    }

    /// Options currently offered
    pub fn options(&self) -> Vec<&'static MenuOption> {
        let query = match &self.state {
            MenuState::Open { query, .. } if self.mode == MenuMode::Filtering => {
                query.to_lowercase()
            }
            _ => String::new(),
        };
        MENU_OPTIONS
            .iter()
            .filter(|option| option.label.to_lowercase().contains(&query))
            .collect()
    }

    pub fn highlighted(&self) -> Option<usize> {
        match &self.state {
            MenuState::Open { highlighted, .. } => Some(*highlighted),
            MenuState::Closed => None,
        }
    }

    pub fn highlighted_kind(&self) -> Option<BlockKind> {
        let index = self.highlighted()?;
        self.options().get(index).map(|option| option.kind)
    }

    pub fn highlight_next(&mut self) {
        self.step_highlight(1);
    }

    pub fn highlight_previous(&mut self) {
        self.step_highlight(-1);
    }

    /// Pointer hover over an option
    pub fn highlight(&mut self, index: usize) {
        let count = self.options().len();
        if let MenuState::Open { highlighted, .. } = &mut self.state
            && index < count
        {
            *highlighted = index;
        }
    }

    fn step_highlight(&mut self, delta: isize) {
        let count = self.options().len() as isize;
        if count == 0 {
            return;
        }
        if let MenuState::Open { highlighted, .. } = &mut self.state {
            *highlighted = (*highlighted as isize + delta).rem_euclid(count) as usize;
        }
    }

    /// React to the focused block's text changing.
    ///
    /// Returns whether the menu is still open afterwards.
    pub fn on_text_changed(&mut self, text: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        let stays_open = match self.mode {
            MenuMode::Fixed => text.len() == TRIGGER.len_utf8() && text.starts_with(TRIGGER),
            MenuMode::Filtering => text.starts_with(TRIGGER),
        };
        if !stays_open {
            self.close();
            return false;
        }
        if self.mode == MenuMode::Filtering {
            let new_query = text[TRIGGER.len_utf8()..].to_string();
            if let MenuState::Open {
                query, highlighted, ..
            } = &mut self.state
                && *query != new_query
            {
                *query = new_query;
                *highlighted = 0;
            }
        }
        true
    }

    /// Text a block keeps after a text-type selection: the trigger (and in
    /// filtering mode the query typed after it) is removed.
    pub fn strip_trigger(&self, text: &str) -> String {
        let Some(rest) = text.strip_prefix(TRIGGER) else {
            return text.to_string();
        };
        match (&self.state, self.mode) {
            (MenuState::Open { query, .. }, MenuMode::Filtering) => rest
                .strip_prefix(query.as_str())
                .unwrap_or(rest)
                .to_string(),
            _ => rest.to_string(),
        }
    }
}
