use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default width assigned when a block becomes an image
pub const DEFAULT_IMAGE_WIDTH: u32 = 400;
/// Default height assigned when a block becomes an image
pub const DEFAULT_IMAGE_HEIGHT: u32 = 300;

/// Identity of a block inside the editor.
///
/// Blocks start life with a locally minted `Provisional` key. Once the remote
/// store acknowledges the create, every reference is rewritten to the
/// `Persisted` key the server assigned (see `BlockStore::rekey`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum BlockKey {
    Provisional(Uuid),
    Persisted(Uuid),
}

impl BlockKey {
    pub fn provisional() -> Self {
        BlockKey::Provisional(Uuid::new_v4())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, BlockKey::Provisional(_))
    }

    /// The server id, if this key has been reconciled
    pub fn remote_id(&self) -> Option<Uuid> {
        match self {
            BlockKey::Persisted(id) => Some(*id),
            BlockKey::Provisional(_) => None,
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKey::Provisional(id) => write!(f, "tmp-{id}"),
            BlockKey::Persisted(id) => write!(f, "{id}"),
        }
    }
}

/// The closed set of block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading-1")]
    Heading1,
    #[serde(rename = "heading-2")]
    Heading2,
    #[serde(rename = "heading-3")]
    Heading3,
    #[serde(rename = "image")]
    Image,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Paragraph,
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::Heading3,
        BlockKind::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading1 => "heading-1",
            BlockKind::Heading2 => "heading-2",
            BlockKind::Heading3 => "heading-3",
            BlockKind::Image => "image",
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, BlockKind::Image)
    }

    /// Heading level (1-3), `None` for non-headings
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            _ => None,
        }
    }

    /// Text kind bound to Ctrl/Cmd + digit
    pub fn from_shortcut_digit(digit: char) -> Option<Self> {
        match digit {
            '0' => Some(BlockKind::Paragraph),
            '1' => Some(BlockKind::Heading1),
            '2' => Some(BlockKind::Heading2),
            '3' => Some(BlockKind::Heading3),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block type: {0}")]
pub struct UnknownBlockKind(pub String);

impl FromStr for BlockKind {
    type Err = UnknownBlockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownBlockKind(s.to_string()))
    }
}

/// Payload of an image block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// URL or data URI; empty while the placeholder awaits a source
    pub source: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl ImageContent {
    pub fn placeholder() -> Self {
        Self {
            source: String::new(),
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
            alt_text: None,
        }
    }

    pub fn has_valid_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Content of a block; text kinds carry plain text, images a structured payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "value", rename_all = "snake_case")]
pub enum BlockContent {
    Text(String),
    Image(ImageContent),
}

impl BlockContent {
    pub fn empty_for(kind: BlockKind) -> Self {
        if kind.is_text() {
            BlockContent::Text(String::new())
        } else {
            BlockContent::Image(ImageContent::placeholder())
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            BlockContent::Text(text) => Some(text),
            BlockContent::Image(_) => None,
        }
    }

    pub fn image(&self) -> Option<&ImageContent> {
        match self {
            BlockContent::Image(image) => Some(image),
            BlockContent::Text(_) => None,
        }
    }

    /// Rough serialized size, used for payload limits
    pub fn approximate_len(&self) -> usize {
        match self {
            BlockContent::Text(text) => text.len(),
            BlockContent::Image(image) => {
                image.source.len() + image.alt_text.as_ref().map_or(0, String::len)
            }
        }
    }
}

/// One unit of document content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub key: BlockKey,
    pub kind: BlockKind,
    pub content: BlockContent,
    /// Dense zero-based position within the document
    pub order: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    /// A fresh, empty block with a provisional key
    pub fn new(kind: BlockKind, order: usize) -> Self {
        let now = Utc::now();
        Self {
            key: BlockKey::provisional(),
            kind,
            content: BlockContent::empty_for(kind),
            order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn text(&self) -> &str {
        self.content.text().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        match &self.content {
            BlockContent::Text(text) => text.is_empty(),
            BlockContent::Image(image) => image.source.is_empty(),
        }
    }

    /// Change the block type, converting content to match.
    ///
    /// Text → text keeps the text, anything → image resets to the placeholder,
    /// image → text starts empty.
    pub fn retype(&mut self, kind: BlockKind) {
        self.content = match (&self.content, kind.is_text()) {
            (BlockContent::Text(text), true) => BlockContent::Text(text.clone()),
            (_, false) => BlockContent::Image(ImageContent::placeholder()),
            (BlockContent::Image(_), true) => BlockContent::Text(String::new()),
        };
        self.kind = kind;
    }
}

/// Partial update merged into a block by `BlockStore::update_block`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub kind: Option<BlockKind>,
    pub content: Option<BlockContent>,
}

impl BlockPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: None,
            content: Some(BlockContent::Text(text.into())),
        }
    }

    pub fn kind(kind: BlockKind) -> Self {
        Self {
            kind: Some(kind),
            content: None,
        }
    }

    pub fn content(content: BlockContent) -> Self {
        Self {
            kind: None,
            content: Some(content),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BlockKind::Paragraph, "paragraph")]
    #[case(BlockKind::Heading1, "heading-1")]
    #[case(BlockKind::Heading2, "heading-2")]
    #[case(BlockKind::Heading3, "heading-3")]
    #[case(BlockKind::Image, "image")]
    fn test_kind_names_round_trip(#[case] kind: BlockKind, #[case] name: &str) {
        assert_eq!(kind.as_str(), name);
        assert_eq!(name.parse::<BlockKind>().unwrap(), kind);
        assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{name}\""));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert_eq!(
            "h7".parse::<BlockKind>(),
            Err(UnknownBlockKind("h7".to_string()))
        );
    }

    #[test]
    fn test_new_block_is_empty_paragraph() {
        let block = Block::new(BlockKind::Paragraph, 0);
        assert!(block.key.is_provisional());
        assert_eq!(block.content, BlockContent::Text(String::new()));
        assert!(block.is_empty());
    }

    #[test]
    fn test_new_image_block_gets_default_dimensions() {
        let block = Block::new(BlockKind::Image, 0);
        let image = block.content.image().unwrap();
        assert_eq!((image.width, image.height), (400, 300));
        assert!(image.source.is_empty());
    }

    #[test]
    fn test_retype_between_text_kinds_keeps_text() {
        let mut block = Block::new(BlockKind::Paragraph, 0);
        block.content = BlockContent::Text("Title".to_string());
        block.retype(BlockKind::Heading2);
        assert_eq!(block.kind, BlockKind::Heading2);
        assert_eq!(block.text(), "Title");
    }

    #[test]
    fn test_retype_to_image_clears_text() {
        let mut block = Block::new(BlockKind::Paragraph, 0);
        block.content = BlockContent::Text("gone".to_string());
        block.retype(BlockKind::Image);
        assert_eq!(block.content, BlockContent::Image(ImageContent::placeholder()));
    }

    #[test]
    fn test_key_display_marks_provisional() {
        let id = Uuid::nil();
        assert_eq!(
            BlockKey::Provisional(id).to_string(),
            "tmp-00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(BlockKey::Persisted(id).remote_id(), Some(id));
    }

    #[test]
    fn test_shortcut_digits() {
        assert_eq!(BlockKind::from_shortcut_digit('0'), Some(BlockKind::Paragraph));
        assert_eq!(BlockKind::from_shortcut_digit('3'), Some(BlockKind::Heading3));
        assert_eq!(BlockKind::from_shortcut_digit('4'), None);
    }
}
