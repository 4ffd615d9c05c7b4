use blockpad_engine::Document;
use dioxus::prelude::*;
use uuid::Uuid;

/// Flat page list used for search results and the trash
#[component]
pub fn DocumentList(
    documents: Vec<Document>,
    empty_text: &'static str,
    on_open: EventHandler<Uuid>,
    #[props(!optional)] on_restore: Option<EventHandler<Uuid>>,
    #[props(!optional)] on_delete: Option<EventHandler<Uuid>>,
) -> Element {
    if documents.is_empty() {
        return rsx! {
            p { class: "list-empty", "{empty_text}" }
        };
    }

    rsx! {
        ul {
            class: "document-list",
            for document in documents.iter() {
                li {
                    key: "{document.id}",
                    class: "document-list-item",
                    onclick: {
                        let id = document.id;
                        move |_| on_open.call(id)
                    },
                    span { class: "document-title", "{document.title}" }
                    span {
                        class: "document-updated",
                        {document.updated_at.format("%Y-%m-%d %H:%M").to_string()}
                    }
                    if let Some(on_restore) = on_restore {
                        button {
                            onclick: {
                                let id = document.id;
                                move |evt: MouseEvent| {
                                    evt.stop_propagation();
                                    on_restore.call(id);
                                }
                            },
                            "Restore"
                        }
                    }
                    if let Some(on_delete) = on_delete {
                        button {
                            class: "danger",
                            onclick: {
                                let id = document.id;
                                move |evt: MouseEvent| {
                                    evt.stop_propagation();
                                    on_delete.call(id);
                                }
                            },
                            "Delete forever"
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioxus::dioxus_core::VirtualDom;
    use dioxus_ssr::render;

    #[component]
    fn Harness(documents: Vec<Document>, with_actions: bool) -> Element {
        let actions = with_actions.then(|| EventHandler::new(|_: Uuid| {}));
        rsx! {
            DocumentList {
                documents,
                empty_text: "Trash is empty",
                on_open: |_| {},
                on_restore: actions,
                on_delete: actions,
            }
        }
    }

    fn render_list(documents: Vec<Document>, with_actions: bool) -> String {
        let mut dom = VirtualDom::new_with_props(
            Harness,
            HarnessProps {
                documents,
                with_actions,
            },
        );
        dom.rebuild_in_place();
        render(&dom)
    }

    #[test]
    fn test_empty_list_shows_placeholder() {
        let html = render_list(Vec::new(), false);
        assert!(html.contains("Trash is empty"));
    }

    #[test]
    fn test_trash_rows_offer_restore_and_delete() {
        let html = render_list(vec![Document::new("Old notes", "me", None)], true);
        assert!(html.contains("Old notes"));
        assert!(html.contains("Restore"));
        assert!(html.contains("Delete forever"));
    }

    #[test]
    fn test_search_rows_have_no_actions() {
        let html = render_list(vec![Document::new("Ideas", "me", None)], false);
        assert!(html.contains("Ideas"));
        assert!(!html.contains("Restore"));
    }
}
