use std::collections::HashSet;

use blockpad_engine::{Document, DocumentService};
use dioxus::events::{Key, KeyboardEvent};
use dioxus::prelude::*;
use uuid::Uuid;

/// One visible row of the sidebar page tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry {
    pub document: Document,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Flatten the user's page tree, descending only into expanded pages
pub fn tree_entries(
    service: &DocumentService,
    user_id: &str,
    expanded: &HashSet<Uuid>,
) -> Vec<TreeEntry> {
    let mut entries = Vec::new();
    push_children(service, user_id, expanded, None, 0, &mut entries);
    entries
}

fn push_children(
    service: &DocumentService,
    user_id: &str,
    expanded: &HashSet<Uuid>,
    parent: Option<Uuid>,
    depth: usize,
    entries: &mut Vec<TreeEntry>,
) {
    for document in service.list_sidebar(user_id, parent) {
        let id = document.id;
        let has_children = !service.list_sidebar(user_id, Some(id)).is_empty();
        let is_expanded = expanded.contains(&id);
        entries.push(TreeEntry {
            document,
            depth,
            has_children,
            expanded: is_expanded,
        });
        if is_expanded {
            push_children(service, user_id, expanded, Some(id), depth + 1, entries);
        }
    }
}

#[component]
pub fn DocumentTree(
    entries: Vec<TreeEntry>,
    selected: Option<Uuid>,
    on_select: EventHandler<Uuid>,
    on_toggle: EventHandler<Uuid>,
    on_create_child: EventHandler<Uuid>,
    on_archive: EventHandler<Uuid>,
) -> Element {
    let mut has_focus = use_signal(|| false);
    let focused_index = entries
        .iter()
        .position(|entry| Some(entry.document.id) == selected)
        .unwrap_or(0);

    let handle_keydown = {
        let entries = entries.clone();
        move |evt: KeyboardEvent| {
            if !*has_focus.read() || entries.is_empty() {
                return;
            }
            let target = match evt.key() {
                Key::ArrowDown => (focused_index + 1).min(entries.len() - 1),
                Key::ArrowUp => focused_index.saturating_sub(1),
                Key::ArrowRight | Key::ArrowLeft => {
                    let entry = &entries[focused_index];
                    let wants_open = evt.key() == Key::ArrowRight;
                    if entry.has_children && entry.expanded != wants_open {
                        on_toggle.call(entry.document.id);
                    }
                    evt.prevent_default();
                    return;
                }
                _ => return,
            };
            evt.prevent_default();
            on_select.call(entries[target].document.id);
        }
    };

    rsx! {
        div {
            class: "tree-view",
            tabindex: "0",
            onkeydown: handle_keydown,
            onfocus: move |_| has_focus.set(true),
            onblur: move |_| has_focus.set(false),
            if entries.is_empty() {
                p { class: "tree-empty", "No pages yet" }
            }
            for entry in entries.iter() {
                TreeItem {
                    key: "{entry.document.id}",
                    entry: entry.clone(),
                    is_selected: Some(entry.document.id) == selected,
                    on_select,
                    on_toggle,
                    on_create_child,
                    on_archive,
                }
            }
        }
    }
}

#[component]
fn TreeItem(
    entry: TreeEntry,
    is_selected: bool,
    on_select: EventHandler<Uuid>,
    on_toggle: EventHandler<Uuid>,
    on_create_child: EventHandler<Uuid>,
    on_archive: EventHandler<Uuid>,
) -> Element {
    let id = entry.document.id;
    let classes = if is_selected {
        "tree-item selected"
    } else {
        "tree-item"
    };
    let title = entry.document.title.clone();
    let icon = entry.document.icon.clone().unwrap_or_default();

    rsx! {
        div {
            class: "{classes}",
            style: "padding-left: {entry.depth * 16}px;",
            onclick: move |_| on_select.call(id),
            span {
                class: "tree-toggle",
                onclick: move |evt| {
                    evt.stop_propagation();
                    on_toggle.call(id);
                },
                if !entry.has_children { "  " } else if entry.expanded { "▾ " } else { "▸ " }
            }
            span { class: "tree-label", "{icon}{title}" }
            span {
                class: "tree-actions",
                button {
                    title: "Add a page inside",
                    onclick: move |evt| {
                        evt.stop_propagation();
                        on_create_child.call(id);
                    },
                    "+"
                }
                button {
                    title: "Move to trash",
                    onclick: move |evt| {
                        evt.stop_propagation();
                        on_archive.call(id);
                    },
                    "🗑"
                }
            }
        }
    }
}
