//! Remote block store abstraction.
//!
//! `BlockApi` is the seam between the editor and whatever stores blocks: the
//! in-memory backend in [`crate::persistence::memory`], or an HTTP client in a
//! web deployment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editing::block::{Block, BlockContent, BlockKey, BlockKind};
use crate::persistence::error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// A block as the remote store returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBlock {
    pub id: Uuid,
    pub document_id: Uuid,
    pub kind: BlockKind,
    pub content: BlockContent,
    pub order: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteBlock {
    pub fn into_block(self) -> Block {
        Block {
            key: BlockKey::Persisted(self.id),
            kind: self.kind,
            content: self.content,
            order: self.order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Create request; the server assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlock {
    pub document_id: Uuid,
    pub kind: BlockKind,
    pub content: BlockContent,
    pub order: usize,
}

impl NewBlock {
    pub fn from_block(document_id: Uuid, block: &Block) -> Self {
        Self {
            document_id,
            kind: block.kind,
            content: block.content.clone(),
            order: block.order,
        }
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlockKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BlockContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

impl BlockUpdate {
    pub fn content(content: BlockContent) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    /// Type and content together, as sent after a retype
    pub fn full(block: &Block) -> Self {
        Self {
            kind: Some(block.kind),
            content: Some(block.content.clone()),
            order: None,
        }
    }

    /// Fields of `local` that differ from `remote`
    pub fn diff(remote: &RemoteBlock, local: &Block) -> Self {
        Self {
            kind: (remote.kind != local.kind).then_some(local.kind),
            content: (remote.content != local.content).then(|| local.content.clone()),
            order: (remote.order != local.order).then_some(local.order),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.content.is_none() && self.order.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: Uuid,
    pub order: usize,
}

/// Operations the editor needs from the remote block store
#[async_trait]
pub trait BlockApi: Send + Sync {
    /// Blocks of a document, sorted by order
    async fn list_blocks(&self, document_id: Uuid) -> ApiResult<Vec<RemoteBlock>>;

    async fn create_block(&self, block: NewBlock) -> ApiResult<RemoteBlock>;

    async fn update_block(&self, id: Uuid, update: BlockUpdate) -> ApiResult<RemoteBlock>;

    async fn delete_block(&self, id: Uuid) -> ApiResult<()>;

    /// Apply a batch of order assignments in one request
    async fn reorder_blocks(&self, entries: Vec<OrderEntry>) -> ApiResult<()>;

    /// Fire-and-forget write used while the host is shutting down.
    ///
    /// Returns whether the write was queued. Backends without such a channel
    /// keep the default.
    fn send_beacon(&self, _id: Uuid, _update: &BlockUpdate) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::block::ImageContent;

    fn remote() -> RemoteBlock {
        let now = Utc::now();
        RemoteBlock {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            kind: BlockKind::Paragraph,
            content: BlockContent::Text(String::new()),
            order: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_diff_of_identical_block_is_empty() {
        let remote = remote();
        let local = remote.clone().into_block();
        assert!(BlockUpdate::diff(&remote, &local).is_empty());
    }

    #[test]
    fn test_diff_picks_changed_fields() {
        let remote = remote();
        let mut local = remote.clone().into_block();
        local.kind = BlockKind::Image;
        local.content = BlockContent::Image(ImageContent::placeholder());

        let update = BlockUpdate::diff(&remote, &local);
        assert_eq!(update.kind, Some(BlockKind::Image));
        assert!(update.content.is_some());
        assert_eq!(update.order, None);
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update = BlockUpdate::content(BlockContent::Text("hi".into()));
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"content":{"format":"text","value":"hi"}}"#);
    }
}
