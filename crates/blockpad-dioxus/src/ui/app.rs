use std::collections::HashSet;
use std::time::Duration;

use blockpad_config::Config;
use blockpad_engine::persistence::RemoteBlock;
use blockpad_engine::{Document, DocumentError, DocumentService, DocumentUpdate, Workspace, io};
use dioxus::prelude::*;
use uuid::Uuid;

use super::components::{DocumentList, DocumentTree, Editor, ErrorScreen, tree_entries};
use super::context::AppContext;

const BLOCKPAD_CSS: &str = include_str!("../assets/blockpad.css");
const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarPanel {
    Pages,
    Search,
    Trash,
}

#[component]
pub fn App(config: Config) -> Element {
    let loaded = use_hook(|| io::load_workspace(&config.data_path).map_err(|e| e.to_string()));

    match loaded {
        Ok(workspace) => rsx! {
            Shell { config, workspace }
        },
        Err(message) => rsx! {
            style { {BLOCKPAD_CSS} }
            ErrorScreen {
                title: "Could not open workspace".to_string(),
                message,
                details: Some(config.data_path.display().to_string()),
            }
        },
    }
}

#[component]
fn Shell(config: Config, workspace: Workspace) -> Element {
    let ctx = use_context_provider(|| AppContext::new(&config, &workspace));
    let mut documents = use_signal(|| DocumentService::from_documents(workspace.documents.clone()));
    let mut selected = use_signal(|| None::<Uuid>);
    let mut panel = use_signal(|| SidebarPanel::Pages);
    let mut query = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);

    // First run: a welcome page
    use_hook({
        let ctx = ctx.clone();
        move || {
            if !documents.peek().documents().is_empty() {
                return;
            }
            let created = documents
                .write()
                .create_document("Getting Started", &ctx.user_id, None);
            let Ok(document) = created else {
                return;
            };
            let api = ctx.api.clone();
            spawn(async move {
                if let Err(e) = api.seed_welcome(document.id).await {
                    log::warn!("could not seed welcome page: {e}");
                }
                selected.set(Some(document.id));
            });
        }
    });

    use_future({
        let ctx = ctx.clone();
        move || {
            let ctx = ctx.clone();
            async move {
                let mut last_saved = None;
                loop {
                    tokio::time::sleep(AUTOSAVE_INTERVAL).await;
                    let blocks = ctx.api.export().await;
                    let docs = documents.peek().documents();
                    save_if_changed(&ctx, docs, &blocks, &mut last_saved);
                }
            }
        }
    });

    use_drop({
        let ctx = ctx.clone();
        move || {
            let Some(blocks) = ctx.api.try_export() else {
                log::warn!("block store busy at shutdown, keeping last autosave");
                return;
            };
            save_if_changed(&ctx, documents.peek().documents(), &blocks, &mut None);
        }
    });

    let user_id = ctx.user_id.clone();
    let mut expanded = use_signal(HashSet::<Uuid>::new);

    let on_create = {
        let user_id = user_id.clone();
        move |parent: Option<Uuid>| {
            let created = documents.write().create_document("Untitled", &user_id, parent);
            if let Some(document) = report(created, error) {
                if let Some(parent) = parent {
                    expanded.write().insert(parent);
                }
                selected.set(Some(document.id));
                panel.set(SidebarPanel::Pages);
            }
        }
    };

    let on_archive = {
        let user_id = user_id.clone();
        move |id: Uuid| {
            let archived = documents.write().archive_document(id, &user_id);
            if report(archived, error).is_some() && *selected.peek() == Some(id) {
                selected.set(None);
            }
        }
    };

    let on_restore = {
        let user_id = user_id.clone();
        move |id: Uuid| {
            let restored = documents.write().restore_document(id, &user_id);
            report(restored, error);
        }
    };

    let on_delete = {
        let user_id = user_id.clone();
        let api = ctx.api.clone();
        move |id: Uuid| {
            let deleted = documents.write().delete_document(id, &user_id);
            match deleted {
                Ok(ids) => {
                    let api = api.clone();
                    spawn(async move {
                        for doc_id in ids {
                            let removed = api.remove_document(doc_id).await;
                            log::info!("deleted document {doc_id} with {removed} blocks");
                        }
                    });
                    let current = *selected.peek();
                    if current.is_some_and(|s| !documents.peek().documents().iter().any(|d| d.id == s)) {
                        selected.set(None);
                    }
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        }
    };

    let on_rename = {
        let user_id = user_id.clone();
        move |(id, title): (Uuid, String)| {
            let title = if title.trim().is_empty() {
                "Untitled".to_string()
            } else {
                title
            };
            let renamed = documents
                .write()
                .update_document(id, &user_id, DocumentUpdate::title(title));
            report(renamed, error);
        }
    };

    let current = selected().and_then(|id| documents.read().get_document(id, Some(&user_id)).ok());
    let listed = match panel() {
        SidebarPanel::Pages => Vec::new(),
        SidebarPanel::Search => filter_by_title(documents.read().search_documents(&user_id), &query.read()),
        SidebarPanel::Trash => filter_by_title(documents.read().list_trash(&user_id), &query.read()),
    };

    rsx! {
        style { {BLOCKPAD_CSS} }
        div {
            class: "app-container",
            div {
                class: "sidebar",
                div {
                    class: "sidebar-tabs",
                    for (label, target) in [("Pages", SidebarPanel::Pages), ("Search", SidebarPanel::Search), ("Trash", SidebarPanel::Trash)] {
                        button {
                            class: if panel() == target { "tab active" } else { "tab" },
                            onclick: move |_| panel.set(target),
                            "{label}"
                        }
                    }
                }
                if panel() != SidebarPanel::Pages {
                    input {
                        class: "sidebar-search",
                        placeholder: "Filter by title",
                        value: "{query}",
                        oninput: move |evt| query.set(evt.value()),
                    }
                }
                match panel() {
                    SidebarPanel::Pages => rsx! {
                        button {
                            class: "new-page",
                            onclick: {
                                let mut on_create = on_create.clone();
                                move |_| on_create(None)
                            },
                            "+ New page"
                        }
                        DocumentTree {
                            entries: tree_entries(&documents.read(), &user_id, &expanded.read()),
                            selected: selected(),
                            on_select: move |id| selected.set(Some(id)),
                            on_toggle: move |id| {
                                let mut open = expanded.write();
                                if !open.remove(&id) {
                                    open.insert(id);
                                }
                            },
                            on_create_child: {
                                let mut on_create = on_create.clone();
                                move |parent| on_create(Some(parent))
                            },
                            on_archive,
                        }
                    },
                    SidebarPanel::Search => rsx! {
                        DocumentList {
                            documents: listed.clone(),
                            empty_text: "No pages found",
                            on_open: move |id| {
                                selected.set(Some(id));
                                panel.set(SidebarPanel::Pages);
                            },
                            on_restore: None,
                            on_delete: None,
                        }
                    },
                    SidebarPanel::Trash => rsx! {
                        DocumentList {
                            documents: listed.clone(),
                            empty_text: "Trash is empty",
                            on_open: move |_| {},
                            on_restore: Some(EventHandler::new(on_restore)),
                            on_delete: Some(EventHandler::new(on_delete)),
                        }
                    },
                }
            }
            div {
                class: "main-content",
                if let Some(message) = error() {
                    div {
                        class: "error-banner",
                        onclick: move |_| error.set(None),
                        "{message}"
                    }
                }
                if let Some(document) = current {
                    Editor {
                        key: "{document.id}",
                        document_id: document.id,
                        title: document.title.clone(),
                        on_rename,
                    }
                } else {
                    div {
                        class: "welcome",
                        h1 { "blockpad" }
                        p { "Select a page from the sidebar or create a new one" }
                    }
                }
            }
        }
    }
}

/// Case-insensitive title filter for search and trash
pub fn filter_by_title(documents: Vec<Document>, query: &str) -> Vec<Document> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return documents;
    }
    documents
        .into_iter()
        .filter(|d| d.title.to_lowercase().contains(&query))
        .collect()
}

fn report<T>(
    result: Result<T, DocumentError>,
    mut error: Signal<Option<String>>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("document operation failed: {e}");
            error.set(Some(e.to_string()));
            None
        }
    }
}

fn save_if_changed(
    ctx: &AppContext,
    documents: Vec<Document>,
    blocks: &[RemoteBlock],
    last_saved: &mut Option<Workspace>,
) {
    let workspace = match Workspace::from_parts(documents, blocks) {
        Ok(workspace) => workspace,
        Err(e) => {
            log::error!("could not serialise workspace: {e}");
            return;
        }
    };
    if last_saved.as_ref() == Some(&workspace) {
        return;
    }
    match io::save_workspace(&ctx.data_path, &workspace) {
        Ok(()) => *last_saved = Some(workspace),
        Err(e) => log::error!("autosave failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_by_title_ignores_case_and_blank_query() {
        let docs = vec![
            Document::new("Meeting notes", "me", None),
            Document::new("Groceries", "me", None),
        ];

        let titles = |docs: Vec<Document>| docs.into_iter().map(|d| d.title).collect::<Vec<_>>();
        assert_eq!(titles(filter_by_title(docs.clone(), "  ")), vec!["Meeting notes", "Groceries"]);
        assert_eq!(titles(filter_by_title(docs, "NOTES")), vec!["Meeting notes"]);
    }
}
