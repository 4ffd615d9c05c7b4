use std::sync::Arc;

use blockpad_engine::editing::{BlockKey, BlockView, MenuAnchor, MenuOption, Point};
use blockpad_engine::{BlockApi, Caret, EditorSession, FocusRequest, SaveStatus, html};
use dioxus::prelude::*;
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use crate::ui::components::block_row::OpenMenu;
use crate::ui::components::{BlockRow, SaveIndicator};
use crate::ui::context::AppContext;

/// A focus move waiting for the next render, addressed by DOM node
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFocus {
    pub dom_id: String,
    pub request: FocusRequest,
    /// Caret offset the node will have once focused
    pub caret: usize,
}

/// Where the focused node's caret was when it last reported
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaretReport {
    /// UTF-16 offset within the node's value
    pub offset: usize,
    /// Viewport point just below the caret
    pub anchor: MenuAnchor,
}

impl CaretReport {
    /// Decode the `[offset, x, y]` triple sent by [`caret_script`]
    pub fn from_js([offset, x, y]: [f64; 3]) -> Self {
        Self {
            offset: offset.max(0.0) as usize,
            anchor: MenuAnchor { x, y },
        }
    }
}

/// Shared access to the open session for the editor's rows.
///
/// Every mutation goes through [`EditorHandle::update`], which wakes the
/// persistence loop so new debounce deadlines are picked up.
#[derive(Clone)]
pub struct EditorHandle {
    session: Signal<Option<EditorSession>>,
    pending_focus: Signal<Option<PendingFocus>>,
    caret: Signal<CaretReport>,
    wake: Arc<Notify>,
}

impl PartialEq for EditorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session && Arc::ptr_eq(&self.wake, &other.wake)
    }
}

impl EditorHandle {
    pub fn update<R>(&self, f: impl FnOnce(&mut EditorSession) -> R) -> Option<R> {
        let mut session = self.session;
        let (result, focus) = {
            let mut guard = session.write();
            let open = guard.as_mut()?;
            let result = f(open);
            let focus = open
                .take_focus_request()
                .map(|request| pending_focus(open, request));
            (result, focus)
        };
        self.wake.notify_one();
        if let Some(focus) = focus {
            let mut pending = self.pending_focus;
            pending.set(Some(focus));
        }
        Some(result)
    }

    pub fn is_dragging(&self) -> bool {
        self.session
            .peek()
            .as_ref()
            .is_some_and(EditorSession::is_dragging)
    }

    /// Caret offset last reported by the focused node
    pub fn caret(&self) -> usize {
        self.caret.peek().offset
    }

    /// Where a menu opened at the caret should appear
    pub fn menu_anchor(&self) -> MenuAnchor {
        self.caret.peek().anchor
    }

    /// Ask the node for its current caret offset and position
    pub fn track_caret(&self, dom_id: String) {
        let mut caret = self.caret;
        spawn(async move {
            let mut eval = document::eval(&caret_script(&dom_id));
            match eval.recv::<[f64; 3]>().await {
                Ok(report) => caret.set(CaretReport::from_js(report)),
                Err(e) => log::debug!("caret report from {dom_id} failed: {e}"),
            }
        });
    }
}

fn pending_focus(session: &EditorSession, request: FocusRequest) -> PendingFocus {
    let render_key = session.store().stable_key(request.key);
    let caret = match request.caret {
        Caret::Start => 0,
        Caret::End => request
            .text
            .clone()
            .or_else(|| session.store().get(request.key).map(|b| b.text().to_string()))
            .map(|text| text.encode_utf16().count())
            .unwrap_or(0),
    };
    PendingFocus {
        dom_id: dom_id(render_key),
        request,
        caret,
    }
}

pub fn dom_id(render_key: BlockKey) -> String {
    format!("block-{render_key}")
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub fn focus_script(focus: &PendingFocus) -> String {
    let text = focus
        .request
        .text
        .as_deref()
        .map(js_string)
        .unwrap_or_else(|| "null".to_string());
    let at_end = focus.request.caret == Caret::End;
    format!(
        r#"(function() {{
            var el = document.getElementById({id});
            if (!el) return;
            var text = {text};
            if (text !== null) el.value = text;
            el.focus();
            var pos = {at_end} ? el.value.length : 0;
            el.setSelectionRange(pos, pos);
        }})();"#,
        id = js_string(&focus.dom_id),
    )
}

/// Report `[offset, x, y]` for the node's caret.
///
/// Textareas expose no caret geometry, so the text before the caret is laid
/// out in a hidden copy of the node and the end of that copy is measured.
pub fn caret_script(dom_id: &str) -> String {
    format!(
        r#"(function() {{
            var el = document.getElementById({id});
            if (!el) {{ dioxus.send([0, 0, 0]); return; }}
            var offset = el.selectionStart;
            var style = getComputedStyle(el);
            var mirror = document.createElement('div');
            ['font', 'letterSpacing', 'lineHeight', 'padding', 'border', 'boxSizing', 'width']
                .forEach(function(p) {{ mirror.style[p] = style[p]; }});
            mirror.style.position = 'absolute';
            mirror.style.visibility = 'hidden';
            mirror.style.whiteSpace = 'pre-wrap';
            mirror.style.overflowWrap = 'break-word';
            mirror.textContent = el.value.substring(0, offset);
            var marker = document.createElement('span');
            marker.textContent = '\u200b';
            mirror.appendChild(marker);
            document.body.appendChild(mirror);
            var rect = el.getBoundingClientRect();
            var x = rect.left + marker.offsetLeft - el.scrollLeft;
            var y = rect.top + marker.offsetTop + marker.offsetHeight - el.scrollTop;
            document.body.removeChild(mirror);
            dioxus.send([offset, x, y]);
        }})();"#,
        id = js_string(dom_id),
    )
}

/// Write store text into nodes that do not hold input focus
pub fn sync_script(views: &[BlockView]) -> Option<String> {
    let updates: Vec<String> = views
        .iter()
        .filter_map(|view| {
            let text = view.sync_text.as_deref()?;
            Some(format!(
                "[{}, {}]",
                js_string(&dom_id(view.render_key)),
                js_string(text)
            ))
        })
        .collect();
    if updates.is_empty() {
        return None;
    }
    Some(format!(
        r#"(function() {{
            [{}].forEach(function(pair) {{
                var el = document.getElementById(pair[0]);
                if (el && el !== document.activeElement && el.value !== pair[1]) el.value = pair[1];
            }});
        }})();"#,
        updates.join(", ")
    ))
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Block editor for one document, with its title and save status
#[component]
pub fn Editor(document_id: Uuid, title: String, on_rename: EventHandler<(Uuid, String)>) -> Element {
    let ctx = use_context::<AppContext>();
    let session = use_signal(|| None::<EditorSession>);
    let pending_focus = use_signal(|| None::<PendingFocus>);
    let caret = use_signal(CaretReport::default);
    let wake = use_hook(|| Arc::new(Notify::new()));
    let mut status = use_signal(|| SaveStatus::Idle);
    let mut load_error = use_signal(|| None::<String>);
    let mut draft_title = use_signal(|| title.clone());
    let mut preview = use_signal(|| false);

    let handle = EditorHandle {
        session,
        pending_focus,
        caret,
        wake: wake.clone(),
    };

    // Owns the persistence event stream for the life of the editor
    {
        let handle = handle.clone();
        use_future(move || {
            let ctx = ctx.clone();
            let handle = handle.clone();
            async move {
                let api: Arc<dyn BlockApi> = ctx.api.clone();
                let (opened, mut events) =
                    match EditorSession::load(api, document_id, &ctx.editor).await {
                        Ok(loaded) => loaded,
                        Err(e) => {
                            log::error!("Failed to open document {document_id}: {e}");
                            load_error.set(Some(e.user_message()));
                            return;
                        }
                    };
                let mut status_rx = opened.status();
                let mut session = handle.session;
                session.set(Some(opened));

                loop {
                    let deadline = session
                        .peek()
                        .as_ref()
                        .and_then(EditorSession::next_deadline);
                    tokio::select! {
                        Some(event) = events.recv() => {
                            if let Some(open) = session.write().as_mut() {
                                open.apply_event(event);
                            }
                        }
                        _ = sleep_until(deadline) => {
                            if let Some(open) = session.write().as_mut() {
                                open.flush_due();
                            }
                        }
                        Ok(()) = status_rx.changed() => {
                            let current = status_rx.borrow_and_update().clone();
                            status.set(current);
                        }
                        _ = handle.wake.notified() => {}
                    }
                }
            }
        });
    }

    use_effect(move || {
        let Some(focus) = pending_focus() else {
            return;
        };
        let mut caret = caret;
        caret.write().offset = focus.caret;
        document::eval(&focus_script(&focus));
        let mut pending_focus = pending_focus;
        pending_focus.set(None);
    });

    use_effect(move || {
        let views = session.read().as_ref().map(EditorSession::views);
        if let Some(script) = views.as_deref().and_then(sync_script) {
            document::eval(&script);
        }
    });

    use_drop(move || {
        if let Ok(mut guard) = session.try_write()
            && let Some(open) = guard.as_mut()
        {
            let sent = open.flush_on_unload();
            log::debug!("Flushed {sent} pending writes for {document_id} on close");
        }
    });

    if let Some(message) = load_error() {
        return rsx! {
            div { class: "editor-error", "Could not open this page: {message}" }
        };
    }

    let guard = session.read();
    let Some(open) = guard.as_ref() else {
        return rsx! {
            div { class: "editor-loading", "Loading…" }
        };
    };
    let views = open.views();
    let texts: Vec<String> = open
        .store()
        .blocks()
        .iter()
        .map(|block| block.text().to_string())
        .collect();
    let menu = open.menu();
    let menu_options: Vec<MenuOption> = menu.options().into_iter().copied().collect();
    let menu_open = menu.is_open();
    let highlighted = menu.highlighted();
    let anchor = menu.anchor();
    let dragged = open.dragged();
    let is_dragging = open.is_dragging();
    let can_undo = open.store().can_undo();
    let can_redo = open.store().can_redo();
    let preview_html = preview().then(|| html::render_blocks(open.store().blocks()));
    drop(guard);

    let commit_title = move |_| {
        let value = draft_title.peek().clone();
        on_rename.call((document_id, value));
    };

    let undo = {
        let handle = handle.clone();
        move |_| {
            handle.update(EditorSession::undo);
        }
    };
    let redo = {
        let handle = handle.clone();
        move |_| {
            handle.update(EditorSession::redo);
        }
    };
    let on_pointer_move = {
        let handle = handle.clone();
        move |evt: MouseEvent| {
            if evt.held_buttons().is_empty() {
                return;
            }
            let point = evt.client_coordinates();
            let pending = session.peek().as_ref().is_some_and(EditorSession::drag_pending);
            if pending {
                handle.update(|s| s.drag_move(Point::new(point.x, point.y)));
            }
        }
    };
    let on_pointer_up = {
        let handle = handle.clone();
        move |_| {
            handle.update(EditorSession::end_drag);
        }
    };
    let on_pointer_leave = {
        let handle = handle.clone();
        move |_| {
            handle.update(EditorSession::cancel_drag);
        }
    };

    rsx! {
        div {
            class: "editor",
            div {
                class: "editor-header",
                input {
                    class: "page-title",
                    value: "{draft_title}",
                    placeholder: "Untitled",
                    oninput: move |evt| draft_title.set(evt.value()),
                    onchange: commit_title,
                }
                div {
                    class: "editor-toolbar",
                    button { disabled: !can_undo, onclick: undo, "Undo" }
                    button { disabled: !can_redo, onclick: redo, "Redo" }
                    button {
                        class: if preview() { "active" } else { "" },
                        onclick: move |_| preview.toggle(),
                        "Preview"
                    }
                    SaveIndicator { status: status() }
                }
            }
            if let Some(html) = preview_html {
                div { class: "preview", dangerous_inner_html: "{html}" }
            } else {
                div {
                    class: if is_dragging { "blocks dragging" } else { "blocks" },
                    onmousemove: on_pointer_move,
                    onmouseup: on_pointer_up,
                    onmouseleave: on_pointer_leave,
                    for (index, view) in views.into_iter().enumerate() {
                        BlockRow {
                            key: "{view.render_key}",
                            text: texts.get(index).cloned().unwrap_or_default(),
                            menu: (view.focused && menu_open).then(|| OpenMenu {
                                options: menu_options.clone(),
                                highlighted,
                                anchor,
                            }),
                            is_drag_source: dragged == Some(view.key) && is_dragging,
                            index,
                            view: view.clone(),
                            handle: handle.clone(),
                        }
                    }
                }
            }
        }
    }
}
