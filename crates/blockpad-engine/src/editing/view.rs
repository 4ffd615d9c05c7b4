//! Render model handed to front ends, one entry per block.

use crate::editing::block::{Block, BlockKey, BlockKind, ImageContent};
use crate::editing::store::BlockStore;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    pub key: BlockKey,
    /// Identity for the front end's node, stable across rekeying
    pub render_key: BlockKey,
    pub kind: BlockKind,
    pub order: usize,
    pub focused: bool,
    /// Text to write into the editable node.
    ///
    /// `None` for the focused block: its node is the live editing buffer and
    /// must not be overwritten while it holds input focus.
    pub sync_text: Option<String>,
    pub image: Option<ImageContent>,
    pub placeholder: &'static str,
}

impl BlockView {
    fn from_block(block: &Block, render_key: BlockKey, focused: bool) -> Self {
        let sync_text = match (focused, block.kind.is_text()) {
            (false, true) => Some(block.text().to_string()),
            _ => None,
        };
        Self {
            key: block.key,
            render_key,
            kind: block.kind,
            order: block.order,
            focused,
            sync_text,
            image: block.content.image().cloned(),
            placeholder: placeholder_for(block.kind),
        }
    }
}

pub fn placeholder_for(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Paragraph => "Type '/' for commands",
        BlockKind::Heading1 => "Heading 1",
        BlockKind::Heading2 => "Heading 2",
        BlockKind::Heading3 => "Heading 3",
        BlockKind::Image => "",
    }
}

pub fn block_views(store: &BlockStore) -> Vec<BlockView> {
    let selected = store.selected();
    store
        .blocks()
        .iter()
        .map(|block| {
            BlockView::from_block(block, store.stable_key(block.key), selected == Some(block.key))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::block::BlockPatch;

    #[test]
    fn test_focused_block_is_not_synced() {
        let mut store = BlockStore::new();
        store.set_blocks(vec![
            Block::new(BlockKind::Paragraph, 0),
            Block::new(BlockKind::Heading1, 1),
        ]);
        let keys = store.keys();
        store.update_block(keys[0], BlockPatch::text("typing"));
        store.update_block(keys[1], BlockPatch::text("Title"));
        store.select_block(Some(keys[0]));

        let views = block_views(&store);
        assert!(views[0].focused);
        assert_eq!(views[0].sync_text, None);
        assert_eq!(views[1].sync_text.as_deref(), Some("Title"));
        assert_eq!(views[1].placeholder, "Heading 1");
    }

    #[test]
    fn test_image_view_carries_metadata() {
        let mut store = BlockStore::new();
        store.set_blocks(vec![Block::new(BlockKind::Image, 0)]);
        let view = &block_views(&store)[0];
        assert_eq!(view.sync_text, None);
        assert_eq!(view.image.as_ref().map(|i| i.width), Some(400));
    }
}
