//! In-memory block backend.
//!
//! Used by the desktop app (whose blocks are written to the workspace file on
//! save) and by tests. Applies the same validation a remote server would.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::editing::block::{BlockContent, BlockKind};
use crate::persistence::api::{
    ApiResult, BlockApi, BlockUpdate, NewBlock, OrderEntry, RemoteBlock,
};
use crate::persistence::error::ApiError;

/// Largest accepted content payload
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4 * 1024 * 1024;

pub struct InMemoryBlockApi {
    blocks: RwLock<HashMap<Uuid, RemoteBlock>>,
    max_payload: usize,
}

impl InMemoryBlockApi {
    pub fn new() -> Self {
        Self::with_blocks(Vec::new())
    }

    pub fn with_blocks(blocks: Vec<RemoteBlock>) -> Self {
        Self {
            blocks: RwLock::new(blocks.into_iter().map(|b| (b.id, b)).collect()),
            max_payload: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Every stored block, grouped by document and sorted by order
    pub async fn export(&self) -> Vec<RemoteBlock> {
        let mut blocks: Vec<RemoteBlock> = self.blocks.read().await.values().cloned().collect();
        blocks.sort_by_key(|b| (b.document_id, b.order));
        blocks
    }

    /// Non-blocking `export` for shutdown paths; `None` while a write holds
    /// the lock
    pub fn try_export(&self) -> Option<Vec<RemoteBlock>> {
        let blocks = self.blocks.try_read().ok()?;
        let mut blocks: Vec<RemoteBlock> = blocks.values().cloned().collect();
        blocks.sort_by_key(|b| (b.document_id, b.order));
        Some(blocks)
    }

    /// Drop every block belonging to `document_id`
    pub async fn remove_document(&self, document_id: Uuid) -> usize {
        let mut blocks = self.blocks.write().await;
        let before = blocks.len();
        blocks.retain(|_, b| b.document_id != document_id);
        before - blocks.len()
    }

    /// Seed a document with a short introduction
    pub async fn seed_welcome(&self, document_id: Uuid) -> ApiResult<()> {
        let intro = [
            (BlockKind::Heading1, "Welcome to Blockpad"),
            (
                BlockKind::Paragraph,
                "Every line is a block. Type / in an empty block to change its type.",
            ),
            (
                BlockKind::Paragraph,
                "Press Enter for a new block and Backspace in an empty one to remove it.",
            ),
        ];
        for (order, (kind, text)) in intro.into_iter().enumerate() {
            self.create_block(NewBlock {
                document_id,
                kind,
                content: BlockContent::Text(text.to_string()),
                order,
            })
            .await?;
        }
        Ok(())
    }

    fn validate(&self, kind: BlockKind, content: &BlockContent) -> ApiResult<()> {
        match content {
            BlockContent::Text(_) if !kind.is_text() => Err(ApiError::Validation(format!(
                "{kind} blocks need image content"
            ))),
            BlockContent::Image(_) if kind.is_text() => Err(ApiError::Validation(format!(
                "{kind} blocks need text content"
            ))),
            BlockContent::Image(image) if !image.has_valid_dimensions() => Err(
                ApiError::Validation("image width and height must be positive".to_string()),
            ),
            _ if content.approximate_len() > self.max_payload => {
                Err(ApiError::PayloadTooLarge(format!(
                    "{} bytes exceeds the {} byte limit",
                    content.approximate_len(),
                    self.max_payload
                )))
            }
            _ => Ok(()),
        }
    }

    fn apply_update(
        &self,
        blocks: &mut HashMap<Uuid, RemoteBlock>,
        id: Uuid,
        update: BlockUpdate,
    ) -> ApiResult<RemoteBlock> {
        let existing = blocks
            .get(&id)
            .ok_or_else(|| ApiError::NotFound(format!("block {id}")))?;
        let kind = update.kind.unwrap_or(existing.kind);
        let content = update.content.unwrap_or_else(|| existing.content.clone());
        self.validate(kind, &content)?;

        let mut updated = existing.clone();
        updated.kind = kind;
        updated.content = content;
        if let Some(order) = update.order {
            updated.order = order;
        }
        updated.updated_at = Utc::now();
        blocks.insert(id, updated.clone());
        Ok(updated)
    }
}

impl Default for InMemoryBlockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockApi for InMemoryBlockApi {
    async fn list_blocks(&self, document_id: Uuid) -> ApiResult<Vec<RemoteBlock>> {
        let blocks = self.blocks.read().await;
        let mut listed: Vec<RemoteBlock> = blocks
            .values()
            .filter(|b| b.document_id == document_id)
            .cloned()
            .collect();
        listed.sort_by_key(|b| b.order);
        Ok(listed)
    }

    async fn create_block(&self, block: NewBlock) -> ApiResult<RemoteBlock> {
        self.validate(block.kind, &block.content)?;
        let now = Utc::now();
        let created = RemoteBlock {
            id: Uuid::new_v4(),
            document_id: block.document_id,
            kind: block.kind,
            content: block.content,
            order: block.order,
            created_at: now,
            updated_at: now,
        };
        self.blocks.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_block(&self, id: Uuid, update: BlockUpdate) -> ApiResult<RemoteBlock> {
        let mut blocks = self.blocks.write().await;
        self.apply_update(&mut blocks, id, update)
    }

    async fn delete_block(&self, id: Uuid) -> ApiResult<()> {
        match self.blocks.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound(format!("block {id}"))),
        }
    }

    async fn reorder_blocks(&self, entries: Vec<OrderEntry>) -> ApiResult<()> {
        let mut blocks = self.blocks.write().await;
        if let Some(missing) = entries.iter().find(|e| !blocks.contains_key(&e.id)) {
            return Err(ApiError::NotFound(format!("block {}", missing.id)));
        }
        let now = Utc::now();
        for entry in entries {
            if let Some(block) = blocks.get_mut(&entry.id) {
                block.order = entry.order;
                block.updated_at = now;
            }
        }
        Ok(())
    }

    fn send_beacon(&self, id: Uuid, update: &BlockUpdate) -> bool {
        let Ok(mut blocks) = self.blocks.try_write() else {
            return false;
        };
        self.apply_update(&mut blocks, id, update.clone()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::block::ImageContent;

    fn new_text(document_id: Uuid, text: &str, order: usize) -> NewBlock {
        NewBlock {
            document_id,
            kind: BlockKind::Paragraph,
            content: BlockContent::Text(text.to_string()),
            order,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_lists_in_order() {
        let api = InMemoryBlockApi::new();
        let doc = Uuid::new_v4();
        api.create_block(new_text(doc, "second", 1)).await.unwrap();
        api.create_block(new_text(doc, "first", 0)).await.unwrap();
        api.create_block(new_text(Uuid::new_v4(), "elsewhere", 0))
            .await
            .unwrap();

        let listed = api.list_blocks(doc).await.unwrap();
        let texts: Vec<_> = listed.iter().filter_map(|b| b.content.text()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_update_unknown_block_is_not_found() {
        let api = InMemoryBlockApi::new();
        let result = api
            .update_block(Uuid::new_v4(), BlockUpdate::default())
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_zero_sized_image_is_rejected() {
        let api = InMemoryBlockApi::new();
        let result = api
            .create_block(NewBlock {
                document_id: Uuid::new_v4(),
                kind: BlockKind::Image,
                content: BlockContent::Image(ImageContent {
                    width: 0,
                    ..ImageContent::placeholder()
                }),
                order: 0,
            })
            .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_oversized_payload_is_rejected() {
        let api = InMemoryBlockApi::new().with_max_payload(4);
        let result = api.create_block(new_text(Uuid::new_v4(), "too long", 0)).await;
        assert!(matches!(result, Err(ApiError::PayloadTooLarge(_))));
    }

    #[tokio::test]
    async fn test_reorder_is_all_or_nothing() {
        let api = InMemoryBlockApi::new();
        let doc = Uuid::new_v4();
        let a = api.create_block(new_text(doc, "a", 0)).await.unwrap();

        let result = api
            .reorder_blocks(vec![
                OrderEntry { id: a.id, order: 1 },
                OrderEntry {
                    id: Uuid::new_v4(),
                    order: 0,
                },
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(api.list_blocks(doc).await.unwrap()[0].order, 0);
    }

    #[tokio::test]
    async fn test_beacon_applies_update() {
        let api = InMemoryBlockApi::new();
        let doc = Uuid::new_v4();
        let block = api.create_block(new_text(doc, "draft", 0)).await.unwrap();

        let queued = api.send_beacon(
            block.id,
            &BlockUpdate::content(BlockContent::Text("final".into())),
        );

        assert!(queued);
        let listed = api.list_blocks(doc).await.unwrap();
        assert_eq!(listed[0].content.text(), Some("final"));
    }

    #[tokio::test]
    async fn test_seed_welcome() {
        let api = InMemoryBlockApi::new();
        let doc = Uuid::new_v4();
        api.seed_welcome(doc).await.unwrap();
        let listed = api.list_blocks(doc).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].kind, BlockKind::Heading1);
    }

    #[tokio::test]
    async fn test_try_export_matches_export() {
        let api = InMemoryBlockApi::new();
        let doc = Uuid::new_v4();
        api.seed_welcome(doc).await.unwrap();

        assert_eq!(api.try_export(), Some(api.export().await));
    }
}
