use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::editing::block::{Block, BlockKey, BlockKind, BlockPatch};
use crate::editing::history::History;
use crate::editing::menu::{MenuAnchor, MenuMode, TypeMenu};

/// Single source of truth for one document's blocks, the focused block and
/// the type menu.
///
/// All operations are synchronous and free of I/O. Operations addressing a
/// block that does not exist (for instance one deleted while a network reply
/// was in flight) are silent no-ops. Every mutation that changes the list
/// records the previous list in the bounded history.
///
/// Invariant: after any insert, delete or reorder the `order` fields are
/// exactly `0..len` in array position.
#[derive(Debug, Clone)]
pub struct BlockStore {
    blocks: Vec<Block>,
    selected: Option<BlockKey>,
    menu: TypeMenu,
    history: History,
    /// Rekeyed block -> the key it was first rendered under
    origins: HashMap<BlockKey, BlockKey>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::with_settings(crate::editing::history::DEFAULT_HISTORY_CAPACITY, MenuMode::Fixed)
    }

    pub fn with_settings(history_capacity: usize, menu_mode: MenuMode) -> Self {
        Self {
            blocks: Vec::new(),
            selected: None,
            menu: TypeMenu::new(menu_mode),
            history: History::with_capacity(history_capacity),
            origins: HashMap::new(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, key: BlockKey) -> Option<&Block> {
        self.blocks.iter().find(|b| b.key == key)
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.get(key).is_some()
    }

    pub fn index_of(&self, key: BlockKey) -> Option<usize> {
        self.blocks.iter().position(|b| b.key == key)
    }

    pub fn keys(&self) -> Vec<BlockKey> {
        self.blocks.iter().map(|b| b.key).collect()
    }

    /// Block before `key` in document order
    pub fn previous(&self, key: BlockKey) -> Option<&Block> {
        let index = self.index_of(key)?;
        index.checked_sub(1).and_then(|i| self.blocks.get(i))
    }

    /// Block after `key` in document order
    pub fn next(&self, key: BlockKey) -> Option<&Block> {
        let index = self.index_of(key)?;
        self.blocks.get(index + 1)
    }

    /// Replace the whole list (initial load, reconciliation).
    ///
    /// The caller supplies a valid order sequence; the list is sorted by it
    /// but not validated. History is not recorded.
    pub fn set_blocks(&mut self, mut blocks: Vec<Block>) {
        blocks.sort_by_key(|b| b.order);
        self.blocks = blocks;
        if let Some(selected) = self.selected
            && !self.contains(selected)
        {
            self.selected = None;
        }
    }

    /// Insert an empty block right after `after`, shifting later orders up.
    ///
    /// Returns the provisional key of the new block, or `None` when `after`
    /// is unknown.
    pub fn insert_block(&mut self, after: BlockKey, kind: BlockKind) -> Option<BlockKey> {
        let new_order = self.get(after)?.order + 1;
        self.record();

        for block in self.blocks.iter_mut().filter(|b| b.order >= new_order) {
            block.order += 1;
        }
        let block = Block::new(kind, new_order);
        let key = block.key;
        let position = self
            .blocks
            .iter()
            .position(|b| b.order > new_order)
            .unwrap_or(self.blocks.len());
        self.blocks.insert(position, block);
        log::debug!("inserted {kind} block {key} at order {new_order}");
        Some(key)
    }

    /// Merge `patch` into the block and refresh `updated_at`.
    ///
    /// Setting a kind converts the content (see `Block::retype`) unless the
    /// patch also carries content. Content that does not match the kind is
    /// ignored.
    pub fn update_block(&mut self, key: BlockKey, patch: BlockPatch) -> bool {
        let Some(index) = self.index_of(key) else {
            return false;
        };
        if patch.is_empty() {
            return false;
        }

        let mut updated = self.blocks[index].clone();
        if let Some(kind) = patch.kind
            && kind != updated.kind
        {
            updated.retype(kind);
        }
        if let Some(content) = patch.content
            && content.text().is_some() == updated.kind.is_text()
        {
            updated.content = content;
        }
        if updated.kind == self.blocks[index].kind && updated.content == self.blocks[index].content
        {
            return false;
        }

        self.record();
        updated.updated_at = Utc::now();
        self.blocks[index] = updated;
        true
    }

    /// Remove a block and renumber the rest; refuses to remove the last block
    pub fn delete_block(&mut self, key: BlockKey) -> bool {
        if self.blocks.len() <= 1 {
            return false;
        }
        let Some(index) = self.index_of(key) else {
            return false;
        };
        self.record();
        self.blocks.remove(index);
        self.renumber();
        if self.selected == Some(key) {
            self.selected = None;
        }
        true
    }

    /// Reorder to match `sequence`, which must be a permutation of the
    /// current keys; anything else is ignored.
    pub fn reorder(&mut self, sequence: &[BlockKey]) -> bool {
        if !self.is_permutation(sequence) {
            log::warn!("ignoring reorder that is not a permutation of the current blocks");
            return false;
        }
        if sequence.iter().copied().eq(self.blocks.iter().map(|b| b.key)) {
            return false;
        }
        self.record();
        let mut remaining = std::mem::take(&mut self.blocks);
        for key in sequence {
            if let Some(position) = remaining.iter().position(|b| b.key == *key) {
                self.blocks.push(remaining.swap_remove(position));
            }
        }
        self.renumber();
        true
    }

    fn is_permutation(&self, sequence: &[BlockKey]) -> bool {
        if sequence.len() != self.blocks.len() {
            return false;
        }
        let mut wanted: Vec<BlockKey> = sequence.to_vec();
        let mut current = self.keys();
        wanted.sort();
        current.sort();
        wanted == current
    }

    pub fn selected(&self) -> Option<BlockKey> {
        self.selected
    }

    /// Focus a block (or nothing); unknown keys clear the selection
    pub fn select_block(&mut self, key: Option<BlockKey>) {
        self.selected = key.filter(|k| self.contains(*k));
    }

    pub fn menu(&self) -> &TypeMenu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut TypeMenu {
        &mut self.menu
    }

    pub fn open_menu(&mut self, anchor: MenuAnchor) {
        self.menu.open(anchor);
    }

    pub fn close_menu(&mut self) {
        self.menu.close();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let current = self.blocks.clone();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.blocks.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        if let Some(selected) = self.selected
            && !self.contains(selected)
        {
            self.selected = None;
        }
    }

    /// Replace a provisional key with the authoritative one everywhere the
    /// store holds it: the list, the focus pointer and the history.
    pub fn rekey(
        &mut self,
        old: BlockKey,
        new: BlockKey,
        timestamps: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> bool {
        self.history.rekey(old, new);
        let origin = self.stable_key(old);
        self.origins.remove(&old);
        self.origins.insert(new, origin);
        if self.selected == Some(old) {
            self.selected = Some(new);
        }
        let Some(block) = self.blocks.iter_mut().find(|b| b.key == old) else {
            return false;
        };
        block.key = new;
        if let Some((created_at, updated_at)) = timestamps {
            block.created_at = created_at;
            block.updated_at = updated_at;
        }
        log::debug!("rekeyed block {old} -> {new}");
        true
    }

    /// Key the block was first rendered under; unchanged by `rekey`, so
    /// front ends can keep its node alive across the swap
    pub fn stable_key(&self, key: BlockKey) -> BlockKey {
        self.origins.get(&key).copied().unwrap_or(key)
    }

    fn record(&mut self) {
        self.history.record(self.blocks.clone());
    }

    fn renumber(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.order = index;
        }
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::block::BlockContent;
    use pretty_assertions::assert_eq;

    fn store_with(texts: &[&str]) -> BlockStore {
        let mut store = BlockStore::new();
        let blocks = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut block = Block::new(BlockKind::Paragraph, i);
                block.content = BlockContent::Text(text.to_string());
                block
            })
            .collect();
        store.set_blocks(blocks);
        store
    }

    fn texts(store: &BlockStore) -> Vec<&str> {
        store.blocks().iter().map(|b| b.text()).collect()
    }

    fn orders(store: &BlockStore) -> Vec<usize> {
        store.blocks().iter().map(|b| b.order).collect()
    }

    #[test]
    fn test_set_blocks_sorts_by_order() {
        let mut a = Block::new(BlockKind::Paragraph, 1);
        a.content = BlockContent::Text("second".into());
        let mut b = Block::new(BlockKind::Paragraph, 0);
        b.content = BlockContent::Text("first".into());

        let mut store = BlockStore::new();
        store.set_blocks(vec![a, b]);
        assert_eq!(texts(&store), vec!["first", "second"]);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_insert_after_hello_creates_empty_paragraph() {
        let mut store = store_with(&["Hello"]);
        let first = store.blocks()[0].key;

        let new_key = store.insert_block(first, BlockKind::Paragraph).unwrap();

        assert_eq!(texts(&store), vec!["Hello", ""]);
        assert_eq!(store.blocks()[1].key, new_key);
        assert_eq!(store.blocks()[1].kind, BlockKind::Paragraph);
        assert_eq!(orders(&store), vec![0, 1]);
    }

    #[test]
    fn test_insert_in_middle_shifts_following_orders() {
        let mut store = store_with(&["a", "b", "c"]);
        let first = store.blocks()[0].key;

        store.insert_block(first, BlockKind::Heading1);

        assert_eq!(texts(&store), vec!["a", "", "b", "c"]);
        assert_eq!(orders(&store), vec![0, 1, 2, 3]);
        assert_eq!(store.blocks()[1].kind, BlockKind::Heading1);
    }

    #[test]
    fn test_insert_after_unknown_key_is_noop() {
        let mut store = store_with(&["a"]);
        assert!(store.insert_block(BlockKey::provisional(), BlockKind::Paragraph).is_none());
        assert_eq!(store.len(), 1);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_delete_renumbers() {
        let mut store = store_with(&["a", "b", "c"]);
        let middle = store.blocks()[1].key;

        assert!(store.delete_block(middle));
        assert_eq!(texts(&store), vec!["a", "c"]);
        assert_eq!(orders(&store), vec![0, 1]);
    }

    #[test]
    fn test_delete_last_remaining_block_is_refused() {
        let mut store = store_with(&["only"]);
        let only = store.blocks()[0].key;

        assert!(!store.delete_block(only));
        assert_eq!(store.len(), 1);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_delete_unknown_key_is_noop() {
        let mut store = store_with(&["a", "b"]);
        assert!(!store.delete_block(BlockKey::provisional()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_clears_focus_on_deleted_block() {
        let mut store = store_with(&["a", "b"]);
        let second = store.blocks()[1].key;
        store.select_block(Some(second));
        store.delete_block(second);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_update_merges_and_refreshes_timestamp() {
        let mut store = store_with(&["a"]);
        let key = store.blocks()[0].key;
        let before = store.blocks()[0].updated_at;

        assert!(store.update_block(key, BlockPatch::text("changed")));
        assert_eq!(store.blocks()[0].text(), "changed");
        assert!(store.blocks()[0].updated_at >= before);
    }

    #[test]
    fn test_update_unknown_or_unchanged_is_noop() {
        let mut store = store_with(&["a"]);
        let key = store.blocks()[0].key;

        assert!(!store.update_block(BlockKey::provisional(), BlockPatch::text("x")));
        assert!(!store.update_block(key, BlockPatch::text("a")));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_update_kind_preserves_text() {
        let mut store = store_with(&["Title"]);
        let key = store.blocks()[0].key;

        store.update_block(key, BlockPatch::kind(BlockKind::Heading1));
        assert_eq!(store.blocks()[0].kind, BlockKind::Heading1);
        assert_eq!(store.blocks()[0].text(), "Title");
    }

    #[test]
    fn test_update_ignores_mismatched_content() {
        let mut store = store_with(&["text"]);
        let key = store.blocks()[0].key;
        let image = BlockContent::Image(crate::editing::block::ImageContent::placeholder());

        assert!(!store.update_block(key, BlockPatch::content(image)));
        assert_eq!(store.blocks()[0].text(), "text");
    }

    #[test]
    fn test_reorder_moves_block_to_front() {
        let mut store = store_with(&["a", "b", "c"]);
        let keys = store.keys();

        assert!(store.reorder(&[keys[2], keys[0], keys[1]]));
        assert_eq!(texts(&store), vec!["c", "a", "b"]);
        assert_eq!(orders(&store), vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let mut store = store_with(&["a", "b"]);
        let keys = store.keys();

        assert!(!store.reorder(&[keys[0]]));
        assert!(!store.reorder(&[keys[0], keys[0]]));
        assert!(!store.reorder(&[keys[0], BlockKey::provisional()]));
        assert_eq!(texts(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_select_unknown_key_clears_selection() {
        let mut store = store_with(&["a"]);
        let key = store.blocks()[0].key;
        store.select_block(Some(key));
        assert_eq!(store.selected(), Some(key));

        store.select_block(Some(BlockKey::provisional()));
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_undo_restores_previous_list_and_redo_round_trips() {
        let mut store = store_with(&["a", "b"]);
        let before = store.blocks().to_vec();
        let first = store.blocks()[0].key;

        store.insert_block(first, BlockKind::Paragraph);
        let after = store.blocks().to_vec();

        assert!(store.undo());
        assert_eq!(store.blocks(), before.as_slice());
        assert!(store.redo());
        assert_eq!(store.blocks(), after.as_slice());
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let mut store = store_with(&["a", "b"]);
        let first = store.blocks()[0].key;
        store.update_block(first, BlockPatch::text("x"));
        store.undo();
        assert!(store.can_redo());

        store.update_block(first, BlockPatch::text("y"));
        assert!(!store.can_redo());
    }

    #[test]
    fn test_rekey_updates_selection_and_timestamps() {
        let mut store = store_with(&["a"]);
        let old = store.blocks()[0].key;
        store.select_block(Some(old));
        let new = BlockKey::Persisted(uuid::Uuid::new_v4());
        let stamp = Utc::now();

        assert!(store.rekey(old, new, Some((stamp, stamp))));
        assert_eq!(store.selected(), Some(new));
        assert_eq!(store.blocks()[0].key, new);
        assert_eq!(store.blocks()[0].created_at, stamp);
    }

    #[test]
    fn test_rekey_keeps_stable_key() {
        let mut store = store_with(&["a"]);
        let old = store.blocks()[0].key;
        let new = BlockKey::Persisted(uuid::Uuid::new_v4());

        store.rekey(old, new, None);
        assert_eq!(store.stable_key(new), old);
        assert_eq!(store.stable_key(old), old);
    }

    #[test]
    fn test_rekey_missing_block_is_noop() {
        let mut store = store_with(&["a"]);
        assert!(!store.rekey(BlockKey::provisional(), BlockKey::provisional(), None));
    }

    #[test]
    fn test_neighbours() {
        let store = store_with(&["a", "b", "c"]);
        let keys = store.keys();
        assert_eq!(store.previous(keys[0]).map(|b| b.key), None);
        assert_eq!(store.previous(keys[1]).map(|b| b.key), Some(keys[0]));
        assert_eq!(store.next(keys[1]).map(|b| b.key), Some(keys[2]));
        assert_eq!(store.next(keys[2]).map(|b| b.key), None);
    }
}
