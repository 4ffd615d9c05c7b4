use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persistence::api::RemoteBlock;

/// A page in the user's document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub owner_id: String,
    /// Serialized block list, written when the workspace is saved
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(title: impl Into<String>, owner_id: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            owner_id: owner_id.into(),
            content: None,
            cover_image: None,
            icon: None,
            is_archived: false,
            is_published: false,
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Published and not archived documents can be read by anyone
    pub fn is_world_readable(&self) -> bool {
        self.is_published && !self.is_archived
    }

    /// Blocks stored in `content`; malformed content reads as empty
    pub fn blocks(&self) -> Vec<RemoteBlock> {
        let Some(content) = &self.content else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<RemoteBlock>>(content) {
            Ok(mut blocks) => {
                blocks.sort_by_key(|b| b.order);
                blocks
            }
            Err(e) => {
                log::warn!("ignoring unreadable content of document {}: {e}", self.id);
                Vec::new()
            }
        }
    }

    pub fn set_blocks(&mut self, blocks: &[RemoteBlock]) -> serde_json::Result<()> {
        self.content = Some(serde_json::to_string(blocks)?);
        Ok(())
    }
}

/// Fields a document update may change; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` removes the cover image
    pub cover_image: Option<Option<String>>,
    /// `Some(None)` removes the icon
    pub icon: Option<Option<String>>,
    pub is_published: Option<bool>,
}

impl DocumentUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}
