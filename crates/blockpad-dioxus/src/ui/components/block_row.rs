use blockpad_engine::editing::{BlockKind, BlockView, MenuAnchor, MenuOption, Point};
use dioxus::prelude::*;

use crate::ui::components::editor::{EditorHandle, dom_id};
use crate::ui::components::keys::key_event;
use crate::ui::components::{ImageBlock, TypeMenuPopup};

pub fn input_class(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Paragraph => "block-input paragraph",
        BlockKind::Heading1 => "block-input heading-1",
        BlockKind::Heading2 => "block-input heading-2",
        BlockKind::Heading3 => "block-input heading-3",
        BlockKind::Image => "block-input image",
    }
}

/// The type menu as shown under the focused block
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMenu {
    pub options: Vec<MenuOption>,
    pub highlighted: Option<usize>,
    pub anchor: Option<MenuAnchor>,
}

/// One block: drag handle, editable node and, when focused, the type menu
#[component]
pub fn BlockRow(
    view: BlockView,
    text: String,
    index: usize,
    handle: EditorHandle,
    #[props(!optional)] menu: Option<OpenMenu>,
    is_drag_source: bool,
) -> Element {
    let key = view.key;
    let node_id = dom_id(view.render_key);
    let row_class = match (view.focused, is_drag_source) {
        (_, true) => "block-row drag-source",
        (true, false) => "block-row focused",
        (false, false) => "block-row",
    };

    let on_enter_row = {
        let handle = handle.clone();
        move |_| {
            if handle.is_dragging() {
                handle.update(|s| s.drag_over(index));
            }
        }
    };
    let on_grab = {
        let handle = handle.clone();
        move |evt: MouseEvent| {
            evt.prevent_default();
            let point = evt.client_coordinates();
            handle.update(|s| s.begin_drag(key, Point::new(point.x, point.y)));
        }
    };

    rsx! {
        div {
            class: "{row_class}",
            "data-order": "{view.order}",
            onmouseenter: on_enter_row,
            span {
                class: "drag-handle",
                title: "Drag to move",
                onmousedown: on_grab,
                "⋮⋮"
            }
            if let Some(image) = view.image.clone() {
                ImageBlock { block_key: key, image, handle: handle.clone() }
            } else {
                TextNode {
                    node_id: node_id.clone(),
                    view: view.clone(),
                    text,
                    handle: handle.clone(),
                }
            }
            if let Some(OpenMenu { options, highlighted, anchor }) = menu {
                TypeMenuPopup {
                    options,
                    highlighted,
                    anchor,
                    on_hover: {
                        let handle = handle.clone();
                        move |i: usize| {
                            handle.update(|s| s.hover_menu_option(i));
                        }
                    },
                    on_choose: {
                        let handle = handle.clone();
                        move |i: usize| {
                            handle.update(|s| s.choose_menu_option(i));
                        }
                    },
                }
            }
        }
    }
}

#[component]
fn TextNode(node_id: String, view: BlockView, text: String, handle: EditorHandle) -> Element {
    let key = view.key;

    let on_input = {
        let handle = handle.clone();
        let node_id = node_id.clone();
        move |evt: FormEvent| {
            handle.update(|s| s.handle_input(key, &evt.value()));
            handle.track_caret(node_id.clone());
        }
    };
    let on_keydown = {
        let handle = handle.clone();
        move |evt: KeyboardEvent| {
            let event = key_event(&evt.key(), evt.modifiers(), handle.caret());
            let anchor = handle.menu_anchor();
            let outcome = handle.update(|s| s.handle_key(key, &event, anchor));
            if outcome.is_some_and(|o| o.prevent_default) {
                evt.prevent_default();
            }
        }
    };
    let on_keyup = {
        let handle = handle.clone();
        let node_id = node_id.clone();
        move |_| handle.track_caret(node_id.clone())
    };
    let on_click = {
        let handle = handle.clone();
        let node_id = node_id.clone();
        move |_| handle.track_caret(node_id.clone())
    };
    let on_select = {
        let handle = handle.clone();
        let node_id = node_id.clone();
        move |_| handle.track_caret(node_id.clone())
    };
    let on_focus = {
        let handle = handle.clone();
        let node_id = node_id.clone();
        move |_| {
            handle.update(|s| s.focus(key));
            handle.track_caret(node_id.clone());
        }
    };
    let on_blur = {
        let handle = handle.clone();
        move |_| {
            handle.update(|s| s.blur(key));
        }
    };

    rsx! {
        textarea {
            id: "{node_id}",
            class: input_class(view.kind),
            rows: "1",
            placeholder: view.placeholder,
            initial_value: "{text}",
            oninput: on_input,
            onkeydown: on_keydown,
            onkeyup: on_keyup,
            onclick: on_click,
            onselect: on_select,
            onfocus: on_focus,
            onblur: on_blur,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_each_kind_has_its_own_class() {
        let classes: Vec<&str> = BlockKind::ALL.into_iter().map(input_class).collect();
        assert_eq!(
            classes,
            vec![
                "block-input paragraph",
                "block-input heading-1",
                "block-input heading-2",
                "block-input heading-3",
                "block-input image",
            ]
        );
    }
}
