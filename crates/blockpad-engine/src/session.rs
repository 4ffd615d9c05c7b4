//! One open document in the editor.
//!
//! `EditorSession` owns the block store and wires it to the persistence
//! adapter: front ends feed it key, input and pointer events, render from
//! [`EditorSession::views`], and pump [`EditorSession::tick`] so debounced
//! writes fire and remote results are reconciled.
//!
//! Blocks whose create is still in flight have no remote id yet. Edits to
//! them are not sent; once the create resolves the session diffs the
//! server's copy against the local block and sends whatever changed in a
//! single update.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::editing::block::{Block, BlockContent, BlockKey, BlockKind, BlockPatch, ImageContent};
use crate::editing::drag::{DragCoordinator, DragState, Point, move_key};
use crate::editing::input::{self, EditorAction, KeyContext, KeyEvent, KeyOutcome};
use crate::editing::menu::{MenuAnchor, TypeMenu};
use crate::editing::store::BlockStore;
use crate::editing::view::{BlockView, block_views};
use crate::persistence::adapter::{PersistEvent, PersistEvents, PersistenceAdapter};
use crate::persistence::api::{ApiResult, BlockApi, BlockUpdate, NewBlock, OrderEntry, RemoteBlock};
use crate::persistence::debounce::DebounceTimers;
use crate::persistence::error::ApiError;
use crate::persistence::status::{SaveStatus, StatusReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caret {
    Start,
    End,
}

/// Request for the front end to move input focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusRequest {
    pub key: BlockKey,
    pub caret: Caret,
    /// Text to write into the node before focusing it, when the store
    /// changed the focused block's text itself
    pub text: Option<String>,
}

struct InFlightReorder {
    token: u64,
    /// Order carried by the batch
    sent: Vec<BlockKey>,
    /// Last order the remote confirmed
    confirmed: Vec<BlockKey>,
}

pub struct EditorSession {
    document_id: Uuid,
    store: BlockStore,
    adapter: PersistenceAdapter,
    debounce: DebounceTimers,
    drag: DragCoordinator,
    /// Blocks with a create request in flight
    creating: HashSet<BlockKey>,
    /// Drag reorder batch being written; one at a time
    reorder_in_flight: Option<InFlightReorder>,
    /// A drag landed while a batch was in flight; the current order is sent
    /// once that batch resolves
    reorder_queued: bool,
    next_token: u64,
    focus_request: Option<FocusRequest>,
}

impl EditorSession {
    /// Fetch a document's blocks and open it
    pub async fn load(
        api: Arc<dyn BlockApi>,
        document_id: Uuid,
        config: &EditorConfig,
    ) -> ApiResult<(Self, PersistEvents)> {
        let blocks = api
            .list_blocks(document_id)
            .await?
            .into_iter()
            .map(RemoteBlock::into_block)
            .collect();
        Ok(Self::new(api, document_id, blocks, config))
    }

    /// Open a document with already fetched blocks.
    ///
    /// An empty document gets one empty paragraph, which is persisted
    /// right away. Must be called within a tokio runtime.
    pub fn new(
        api: Arc<dyn BlockApi>,
        document_id: Uuid,
        blocks: Vec<Block>,
        config: &EditorConfig,
    ) -> (Self, PersistEvents) {
        let status = StatusReporter::new(config.saved_display);
        let (adapter, events) = PersistenceAdapter::new(api, config.retry_policy(), status);
        let mut session = Self {
            document_id,
            store: BlockStore::with_settings(config.history_capacity, config.menu_mode),
            adapter,
            debounce: DebounceTimers::new(config.quiet_period, config.max_wait),
            drag: DragCoordinator::new(config.drag_threshold_px),
            creating: HashSet::new(),
            reorder_in_flight: None,
            reorder_queued: false,
            next_token: 0,
            focus_request: None,
        };

        if blocks.is_empty() {
            let block = Block::new(BlockKind::Paragraph, 0);
            let key = block.key;
            session.store.set_blocks(vec![block]);
            session.create_remote(key);
        } else {
            session.store.set_blocks(blocks);
        }
        log::info!(
            "opened document {document_id} with {} blocks",
            session.store.len()
        );
        (session, events)
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn menu(&self) -> &TypeMenu {
        self.store.menu()
    }

    pub fn views(&self) -> Vec<BlockView> {
        block_views(&self.store)
    }

    pub fn selected(&self) -> Option<BlockKey> {
        self.store.selected()
    }

    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.adapter.status().subscribe()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.adapter.status().current()
    }

    pub fn take_focus_request(&mut self) -> Option<FocusRequest> {
        self.focus_request.take()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn dragged(&self) -> Option<BlockKey> {
        self.drag.dragged()
    }

    /// A drag handle is held, whether or not the threshold was crossed
    pub fn drag_pending(&self) -> bool {
        *self.drag.state() != DragState::Idle
    }

    // ===== Focus =====

    /// The block's editable node gained input focus
    pub fn focus(&mut self, key: BlockKey) {
        if self.store.selected() == Some(key) {
            return;
        }
        if let Some(previous) = self.store.selected() {
            self.commit(previous);
        }
        self.store.close_menu();
        self.store.select_block(Some(key));
    }

    /// The block's editable node lost input focus
    pub fn blur(&mut self, key: BlockKey) {
        self.commit(key);
        if self.store.selected() == Some(key) {
            self.store.close_menu();
            self.store.select_block(None);
        }
    }

    fn move_focus(&mut self, key: BlockKey, caret: Caret) {
        self.store.close_menu();
        self.store.select_block(Some(key));
        self.focus_request = Some(FocusRequest {
            key,
            caret,
            text: None,
        });
    }

    // ===== Keyboard and text input =====

    /// Interpret a key press in `key`'s editable node.
    ///
    /// `anchor` is the caret position, used if the key opens the type menu.
    pub fn handle_key(&mut self, key: BlockKey, event: &KeyEvent, anchor: MenuAnchor) -> KeyOutcome {
        let Some(block) = self.store.get(key) else {
            return KeyOutcome::IGNORED;
        };
        let ctx = KeyContext {
            content_empty: block.kind.is_text() && block.is_empty(),
            block_count: self.store.len(),
            menu_open: self.store.menu().is_open(),
        };
        // The front end reports the caret after the fact, so it can trail
        // the text it was measured against
        let event = KeyEvent {
            cursor: event.cursor.min(block.text().chars().count()),
            ..event.clone()
        };
        let outcome = input::interpret(&event, ctx);
        if let Some(action) = outcome.action {
            self.execute(key, action, anchor);
        }
        outcome
    }

    fn execute(&mut self, key: BlockKey, action: EditorAction, anchor: MenuAnchor) {
        log::debug!("{action:?} on block {key}");
        match action {
            EditorAction::InsertBlockAfter => {
                self.insert_after(key);
            }
            EditorAction::DeleteBlock => {
                self.delete_block(key);
            }
            EditorAction::OpenMenu => {
                self.store.select_block(Some(key));
                self.store.open_menu(anchor);
            }
            EditorAction::CloseMenu => self.store.close_menu(),
            EditorAction::MenuPrevious => self.store.menu_mut().highlight_previous(),
            EditorAction::MenuNext => self.store.menu_mut().highlight_next(),
            EditorAction::MenuSelect => {
                if let Some(kind) = self.store.menu().highlighted_kind() {
                    self.apply_menu_choice(key, kind);
                }
            }
            EditorAction::Retype(kind) => {
                self.retype(key, kind);
            }
            EditorAction::FocusPrevious => {
                if let Some(previous) = self.store.previous(key).map(|b| b.key) {
                    self.move_focus(previous, Caret::End);
                }
            }
            EditorAction::FocusNext => {
                if let Some(next) = self.store.next(key).map(|b| b.key) {
                    self.move_focus(next, Caret::Start);
                }
            }
            EditorAction::Undo => {
                self.undo();
            }
            EditorAction::Redo => {
                self.redo();
            }
        }
    }

    /// Push the editable node's text into the store
    pub fn handle_input(&mut self, key: BlockKey, text: &str) {
        if !self.store.contains(key) {
            return;
        }
        if self.store.selected() != Some(key) {
            self.focus(key);
        }
        if self.store.menu().is_open() {
            self.store.menu_mut().on_text_changed(text);
        }
        if self.store.update_block(key, BlockPatch::text(text)) {
            self.schedule_write(key);
        }
    }

    // ===== Structure =====

    /// Insert an empty paragraph after `key` and focus it
    pub fn insert_after(&mut self, key: BlockKey) -> Option<BlockKey> {
        self.commit(key);
        let before = self.store.blocks().to_vec();
        let new_key = self.store.insert_block(key, BlockKind::Paragraph)?;
        self.create_remote(new_key);
        self.propagate_orders(&before);
        self.move_focus(new_key, Caret::Start);
        Some(new_key)
    }

    /// Remove a block and focus its predecessor; the last block is kept
    pub fn delete_block(&mut self, key: BlockKey) -> bool {
        let target = self
            .store
            .previous(key)
            .or_else(|| self.store.next(key))
            .map(|b| b.key);
        let before = self.store.blocks().to_vec();
        if !self.store.delete_block(key) {
            return false;
        }
        self.debounce.forget(key);
        if let Some(id) = self.remote_id(key) {
            self.adapter.delete(id);
        }
        self.propagate_orders(&before);
        if let Some(target) = target {
            self.move_focus(target, Caret::End);
        }
        true
    }

    /// Change a block's type, sending the change immediately
    pub fn retype(&mut self, key: BlockKey, kind: BlockKind) -> bool {
        if self.store.get(key).is_none_or(|b| b.kind == kind) {
            return false;
        }
        self.store.close_menu();
        self.store.update_block(key, BlockPatch::kind(kind));
        self.push_full(key);
        if kind.is_text() {
            self.request_refocus(key);
        }
        true
    }

    fn request_refocus(&mut self, key: BlockKey) {
        let text = self.store.get(key).map(|b| b.text().to_string());
        self.store.select_block(Some(key));
        self.focus_request = Some(FocusRequest {
            key,
            caret: Caret::End,
            text,
        });
    }

    // ===== Type menu =====

    pub fn hover_menu_option(&mut self, index: usize) {
        self.store.menu_mut().highlight(index);
    }

    /// Pointer selection of a menu option
    pub fn choose_menu_option(&mut self, index: usize) {
        let Some(key) = self.store.selected() else {
            self.store.close_menu();
            return;
        };
        let kind = self.store.menu().options().get(index).map(|option| option.kind);
        match kind {
            Some(kind) => self.apply_menu_choice(key, kind),
            None => self.store.close_menu(),
        }
    }

    /// Click outside the open menu
    pub fn dismiss_menu(&mut self) {
        self.store.close_menu();
    }

    fn apply_menu_choice(&mut self, key: BlockKey, kind: BlockKind) {
        let Some(block) = self.store.get(key) else {
            self.store.close_menu();
            return;
        };
        let stripped = self.store.menu().strip_trigger(block.text());
        self.store.close_menu();

        let patch = if kind.is_text() {
            BlockPatch {
                kind: Some(kind),
                content: Some(BlockContent::Text(stripped)),
            }
        } else {
            BlockPatch::kind(kind)
        };
        if self.store.update_block(key, patch) {
            self.push_full(key);
        }
        if kind.is_text() {
            self.request_refocus(key);
        }
    }

    // ===== Images =====

    fn image(&self, key: BlockKey) -> Option<ImageContent> {
        self.store.get(key)?.content.image().cloned()
    }

    /// Attach an uploaded or linked image
    pub fn set_image_source(&mut self, key: BlockKey, source: impl Into<String>) -> bool {
        let Some(mut image) = self.image(key) else {
            return false;
        };
        image.source = source.into();
        self.update_image(key, image, false)
    }

    /// Resize an image; written like a content edit
    pub fn resize_image(&mut self, key: BlockKey, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::warn!("ignoring resize of {key} to {width}x{height}");
            return false;
        }
        let Some(mut image) = self.image(key) else {
            return false;
        };
        image.width = width;
        image.height = height;
        self.update_image(key, image, true)
    }

    pub fn set_alt_text(&mut self, key: BlockKey, alt_text: &str) -> bool {
        let Some(mut image) = self.image(key) else {
            return false;
        };
        image.alt_text = Some(alt_text.trim().to_string()).filter(|alt| !alt.is_empty());
        self.update_image(key, image, true)
    }

    fn update_image(&mut self, key: BlockKey, image: ImageContent, debounced: bool) -> bool {
        if !self
            .store
            .update_block(key, BlockPatch::content(BlockContent::Image(image)))
        {
            return false;
        }
        if debounced {
            self.schedule_write(key);
        } else {
            self.push_full(key);
        }
        true
    }

    // ===== Drag reorder =====

    pub fn begin_drag(&mut self, key: BlockKey, point: Point) {
        if self.store.contains(key) {
            self.drag.press(key, point);
        }
    }

    /// Returns whether a drag is active after the move
    pub fn drag_move(&mut self, point: Point) -> bool {
        self.drag.pointer_move(point)
    }

    /// The dragged block is over the slot at `index`
    pub fn drag_over(&mut self, index: usize) {
        self.drag.hover(index);
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Finish a drag; returns whether the order changed
    pub fn end_drag(&mut self) -> bool {
        let current = self.store.keys();
        match self.drag.drop(&current) {
            Some(sequence) => self.apply_reorder(&sequence),
            None => false,
        }
    }

    /// Move a block to `index` outside of a pointer gesture
    pub fn move_block(&mut self, key: BlockKey, index: usize) -> bool {
        match move_key(&self.store.keys(), key, index) {
            Some(sequence) => self.apply_reorder(&sequence),
            None => false,
        }
    }

    /// Reorder optimistically and persist the whole batch.
    ///
    /// Only one drag batch is written at a time. A drag that lands while
    /// one is in flight is sent as the full current order once it resolves,
    /// so the remote always ends on the latest order and a rollback always
    /// returns to an order the remote holds.
    fn apply_reorder(&mut self, sequence: &[BlockKey]) -> bool {
        let before = self.store.keys();
        if !self.store.reorder(sequence) {
            return false;
        }
        if self.reorder_in_flight.is_some() {
            log::debug!("reorder queued behind the batch in flight");
            self.reorder_queued = true;
        } else {
            self.send_reorder(before);
        }
        true
    }

    fn send_reorder(&mut self, confirmed: Vec<BlockKey>) {
        let entries: Vec<OrderEntry> = self
            .store
            .blocks()
            .iter()
            .filter_map(|b| {
                self.remote_id(b.key)
                    .map(|id| OrderEntry { id, order: b.order })
            })
            .collect();
        if entries.is_empty() {
            return;
        }
        let token = self.next_token();
        self.reorder_in_flight = Some(InFlightReorder {
            token,
            sent: self.store.keys(),
            confirmed,
        });
        self.adapter.reorder(token, entries);
    }

    /// Take the in-flight drag batch if `token` is it
    fn resolve_reorder(&mut self, token: u64) -> Option<InFlightReorder> {
        if self.reorder_in_flight.as_ref()?.token != token {
            return None;
        }
        self.reorder_in_flight.take()
    }

    fn reorder_saved(&mut self, token: u64) {
        let Some(flight) = self.resolve_reorder(token) else {
            return;
        };
        if std::mem::take(&mut self.reorder_queued) {
            self.send_reorder(flight.sent);
        }
    }

    fn rollback_reorder(&mut self, token: u64, error: ApiError) {
        let Some(flight) = self.resolve_reorder(token) else {
            log::warn!("order update #{token} failed: {error}");
            return;
        };
        if std::mem::take(&mut self.reorder_queued) {
            log::warn!("reorder #{token} failed, sending the newer order instead: {error}");
            self.send_reorder(flight.confirmed);
            return;
        }
        log::error!("reorder #{token} failed, restoring previous order: {error}");
        if !self.store.reorder(&flight.confirmed) {
            log::warn!("previous order no longer matches the blocks, keeping current order");
        }
    }

    // ===== History =====

    pub fn undo(&mut self) -> bool {
        let before = self.store.blocks().to_vec();
        if !self.store.undo() {
            return false;
        }
        self.sync_history_jump(&before);
        true
    }

    pub fn redo(&mut self) -> bool {
        let before = self.store.blocks().to_vec();
        if !self.store.redo() {
            return false;
        }
        self.sync_history_jump(&before);
        true
    }

    /// Persist the difference between the list before and after an
    /// undo/redo step
    fn sync_history_jump(&mut self, before: &[Block]) {
        let after = self.store.blocks().to_vec();
        let previous: HashMap<BlockKey, &Block> = before.iter().map(|b| (b.key, b)).collect();
        let remaining: HashSet<BlockKey> = after.iter().map(|b| b.key).collect();

        for removed in before.iter().filter(|b| !remaining.contains(&b.key)) {
            self.debounce.forget(removed.key);
            if let Some(id) = self.remote_id(removed.key) {
                self.adapter.delete(id);
            }
        }
        for block in &after {
            match previous.get(&block.key) {
                None if !self.creating.contains(&block.key) => self.create_remote(block.key),
                Some(old) if old.kind != block.kind || old.content != block.content => {
                    self.push_full(block.key)
                }
                _ => {}
            }
        }
        self.propagate_orders(before);

        if let Some(selected) = self.store.selected()
            && let Some(block) = self.store.get(selected)
            && previous
                .get(&selected)
                .is_some_and(|old| old.content != block.content)
        {
            self.request_refocus(selected);
        }
    }

    // ===== Persistence =====

    /// Remote id of a block, unless its create is still in flight
    fn remote_id(&self, key: BlockKey) -> Option<Uuid> {
        if self.creating.contains(&key) {
            return None;
        }
        key.remote_id()
    }

    fn next_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn create_remote(&mut self, key: BlockKey) {
        let Some(block) = self.store.get(key) else {
            return;
        };
        let request = NewBlock::from_block(self.document_id, block);
        self.creating.insert(key);
        self.adapter.create(key, request);
    }

    /// Content edits are debounced; blocks without a remote id are created
    /// instead (a failed create is retried by the next edit)
    fn schedule_write(&mut self, key: BlockKey) {
        if self.remote_id(key).is_some() {
            self.debounce.on_edit(key, Instant::now());
        } else if !self.creating.contains(&key) {
            self.create_remote(key);
        }
    }

    /// Send type and content right away, dropping any pending debounce
    fn push_full(&mut self, key: BlockKey) {
        self.debounce.forget(key);
        match self.remote_id(key) {
            Some(id) => {
                if let Some(block) = self.store.get(key) {
                    self.adapter.update(id, BlockUpdate::full(block));
                }
            }
            None if !self.creating.contains(&key) => self.create_remote(key),
            None => {}
        }
    }

    fn write_content(&mut self, key: BlockKey) {
        let (Some(id), Some(block)) = (self.remote_id(key), self.store.get(key)) else {
            return;
        };
        self.adapter
            .update(id, BlockUpdate::content(block.content.clone()));
    }

    /// Flush a pending debounced write for one block now
    fn commit(&mut self, key: BlockKey) {
        if self.debounce.take(key) {
            self.write_content(key);
        }
    }

    /// Send the new orders of persisted blocks moved by an insert or delete
    fn propagate_orders(&mut self, before: &[Block]) {
        let previous: HashMap<BlockKey, usize> = before.iter().map(|b| (b.key, b.order)).collect();
        let entries: Vec<OrderEntry> = self
            .store
            .blocks()
            .iter()
            .filter(|b| previous.get(&b.key).is_some_and(|order| *order != b.order))
            .filter_map(|b| {
                self.remote_id(b.key)
                    .map(|id| OrderEntry { id, order: b.order })
            })
            .collect();
        if !entries.is_empty() {
            let token = self.next_token();
            self.adapter.reorder(token, entries);
        }
    }

    /// Write every debounced block whose deadline has passed
    pub fn flush_due(&mut self) {
        for key in self.debounce.take_due(Instant::now()) {
            log::debug!("debounce elapsed for block {key}");
            self.write_content(key);
        }
    }

    /// Write every debounced block now, e.g. before switching documents
    pub fn flush_all(&mut self) {
        for key in self.debounce.take_all() {
            self.write_content(key);
        }
    }

    /// Best-effort synchronous save while the host is closing.
    ///
    /// Sends the focused block and every block with a pending edit through
    /// the backend's beacon channel. Returns how many writes were queued.
    pub fn flush_on_unload(&mut self) -> usize {
        let mut keys = self.debounce.take_all();
        if let Some(selected) = self.store.selected()
            && !keys.contains(&selected)
        {
            keys.push(selected);
        }
        keys.into_iter()
            .filter(|key| {
                let (Some(id), Some(block)) = (self.remote_id(*key), self.store.get(*key)) else {
                    return false;
                };
                self.adapter
                    .beacon(id, &BlockUpdate::content(block.content.clone()))
            })
            .count()
    }

    /// Earliest pending debounce deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.next_deadline()
    }

    /// Wait for the next remote result or debounce deadline and handle it
    pub async fn tick(&mut self, events: &mut PersistEvents) {
        let deadline = self.debounce.next_deadline();
        tokio::select! {
            Some(event) = events.recv() => self.apply_event(event),
            _ = sleep_until(deadline) => self.flush_due(),
        }
    }

    /// Reconcile one remote result into the store
    pub fn apply_event(&mut self, event: PersistEvent) {
        match event {
            PersistEvent::Created { local, block } => self.reconcile_created(local, block),
            PersistEvent::CreateFailed { local, error } => {
                self.creating.remove(&local);
                log::error!("creating block {local} failed: {error}");
            }
            PersistEvent::ReorderSaved { token } => self.reorder_saved(token),
            PersistEvent::ReorderFailed { token, error } => self.rollback_reorder(token, error),
        }
    }

    fn reconcile_created(&mut self, local: BlockKey, remote: RemoteBlock) {
        self.creating.remove(&local);
        let key = BlockKey::Persisted(remote.id);

        if !self.store.contains(local) {
            log::debug!("block {local} was removed before its create resolved, deleting {key}");
            self.store.rekey(local, key, None);
            self.rekey_references(local, key);
            self.adapter.delete(remote.id);
            return;
        }

        self.store
            .rekey(local, key, Some((remote.created_at, remote.updated_at)));
        self.rekey_references(local, key);

        if let Some(block) = self.store.get(key) {
            let update = BlockUpdate::diff(&remote, block);
            if !update.is_empty() {
                log::debug!("sending changes made to {key} while it was being created");
                self.adapter.update(remote.id, update);
            }
        }
    }

    fn rekey_references(&mut self, old: BlockKey, new: BlockKey) {
        self.debounce.rekey(old, new);
        if let Some(request) = &mut self.focus_request
            && request.key == old
        {
            request.key = new;
        }
        if let Some(flight) = &mut self.reorder_in_flight {
            for key in flight
                .sent
                .iter_mut()
                .chain(flight.confirmed.iter_mut())
                .filter(|k| **k == old)
            {
                *key = new;
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
