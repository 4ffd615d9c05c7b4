use blockpad_engine::editing::{MenuAnchor, MenuOption};
use dioxus::prelude::*;

/// The "/" block type menu, shown at the caret that opened it.
///
/// Options react to mousedown with the default prevented, so the block's
/// text node keeps focus and its blur does not close the menu first.
#[component]
pub fn TypeMenuPopup(
    options: Vec<MenuOption>,
    #[props(!optional)] highlighted: Option<usize>,
    #[props(!optional)] anchor: Option<MenuAnchor>,
    on_hover: EventHandler<usize>,
    on_choose: EventHandler<usize>,
) -> Element {
    let position = anchor_style(anchor);
    rsx! {
        div {
            class: "type-menu",
            role: "listbox",
            style: "{position}",
            if options.is_empty() {
                div { class: "type-menu-empty", "No matching block types" }
            }
            for (index, option) in options.iter().enumerate() {
                div {
                    key: "{option.label}",
                    class: if highlighted == Some(index) { "type-menu-option highlighted" } else { "type-menu-option" },
                    role: "option",
                    onmouseenter: move |_| on_hover.call(index),
                    onmousedown: move |evt| {
                        evt.prevent_default();
                        on_choose.call(index);
                    },
                    span { class: "type-menu-label", "{option.label}" }
                    span { class: "type-menu-description", "{option.description}" }
                    if let Some(shortcut) = option.shortcut {
                        kbd { "{shortcut}" }
                    }
                }
            }
        }
    }
}

/// Fixed position at the anchor; without one the menu stays in flow
pub fn anchor_style(anchor: Option<MenuAnchor>) -> String {
    anchor
        .map(|a| format!("left: {}px; top: {}px;", a.x.round(), a.y.round()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpad_engine::editing::MENU_OPTIONS;
    use dioxus::dioxus_core::VirtualDom;
    use dioxus_ssr::render;

    #[component]
    fn Harness(
        options: Vec<MenuOption>,
        #[props(!optional)] highlighted: Option<usize>,
        #[props(!optional)] anchor: Option<MenuAnchor>,
    ) -> Element {
        rsx! {
            TypeMenuPopup {
                options,
                highlighted,
                anchor,
                on_hover: |_| {},
                on_choose: |_| {},
            }
        }
    }

    fn render_menu(options: Vec<MenuOption>, highlighted: Option<usize>) -> String {
        render_anchored(options, highlighted, None)
    }

    fn render_anchored(
        options: Vec<MenuOption>,
        highlighted: Option<usize>,
        anchor: Option<MenuAnchor>,
    ) -> String {
        let mut dom = VirtualDom::new_with_props(
            Harness,
            HarnessProps {
                options,
                highlighted,
                anchor,
            },
        );
        dom.rebuild_in_place();
        render(&dom)
    }

    #[test]
    fn test_lists_all_block_types_with_shortcuts() {
        let html = render_menu(MENU_OPTIONS.to_vec(), Some(0));
        for option in MENU_OPTIONS {
            assert!(html.contains(option.label), "missing {}", option.label);
        }
        assert!(html.contains("Ctrl+1"));
        assert_eq!(html.matches("highlighted").count(), 1);
    }

    #[test]
    fn test_empty_filter_result() {
        let html = render_menu(Vec::new(), None);
        assert!(html.contains("No matching block types"));
    }

    #[test]
    fn test_menu_is_placed_at_the_caret() {
        let anchor = MenuAnchor { x: 40.4, y: 120.0 };
        let html = render_anchored(MENU_OPTIONS.to_vec(), Some(0), Some(anchor));
        assert!(html.contains("left: 40px; top: 120px;"), "{html}");
    }

    #[test]
    fn test_no_anchor_leaves_position_to_css() {
        assert_eq!(anchor_style(None), "");
    }
}
