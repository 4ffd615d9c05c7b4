use crate::documents::Document;
use crate::persistence::api::RemoteBlock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const WORKSPACE_FILE: &str = "workspace.json";
const WORKSPACE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid workspace file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid data directory: {0}")]
    InvalidDataDir(String),
}

/// Everything the desktop app persists: the documents, each carrying its
/// block list in `content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub version: u32,
    pub documents: Vec<Document>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            version: WORKSPACE_VERSION,
            documents: Vec::new(),
        }
    }
}

impl Workspace {
    /// Bundle documents with their blocks, serialising each document's
    /// blocks into its `content`
    pub fn from_parts(mut documents: Vec<Document>, blocks: &[RemoteBlock]) -> Result<Self, IoError> {
        for document in &mut documents {
            let owned: Vec<RemoteBlock> = blocks
                .iter()
                .filter(|b| b.document_id == document.id)
                .cloned()
                .collect();
            document.set_blocks(&owned)?;
        }
        Ok(Self {
            version: WORKSPACE_VERSION,
            documents,
        })
    }

    /// Blocks of every document
    pub fn blocks(&self) -> Vec<RemoteBlock> {
        self.documents.iter().flat_map(Document::blocks).collect()
    }
}

pub fn workspace_path(data_dir: &Path) -> PathBuf {
    data_dir.join(WORKSPACE_FILE)
}

/// Read the workspace file; a missing file is an empty workspace
pub fn load_workspace(data_dir: &Path) -> Result<Workspace, IoError> {
    if data_dir.exists() && !data_dir.is_dir() {
        return Err(IoError::InvalidDataDir(format!(
            "{} is not a directory",
            data_dir.display()
        )));
    }
    let path = workspace_path(data_dir);
    if !path.exists() {
        log::info!("no workspace at {}, starting empty", path.display());
        return Ok(Workspace::default());
    }
    let content = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the workspace file, replacing the previous one atomically
pub fn save_workspace(data_dir: &Path, workspace: &Workspace) -> Result<(), IoError> {
    fs::create_dir_all(data_dir)?;
    let path = workspace_path(data_dir);
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, serde_json::to_string_pretty(workspace)?)?;
    fs::rename(&staging, &path)?;
    log::debug!(
        "saved {} documents to {}",
        workspace.documents.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::block::{BlockContent, BlockKind};
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn block(document_id: Uuid, text: &str, order: usize) -> RemoteBlock {
        let now = Utc::now();
        RemoteBlock {
            id: Uuid::new_v4(),
            document_id,
            kind: BlockKind::Paragraph,
            content: BlockContent::Text(text.to_string()),
            order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_missing_workspace_is_empty() {
        let dir = TempDir::new().unwrap();
        let workspace = load_workspace(dir.path()).unwrap();
        assert!(workspace.documents.is_empty());
    }

    #[test]
    fn test_save_and_load_keeps_blocks_with_their_documents() {
        let dir = TempDir::new().unwrap();
        let first = Document::new("First", "me", None);
        let second = Document::new("Second", "me", None);
        let blocks = vec![
            block(first.id, "a", 0),
            block(second.id, "b", 0),
            block(first.id, "c", 1),
        ];

        let workspace = Workspace::from_parts(vec![first.clone(), second], &blocks).unwrap();
        save_workspace(dir.path(), &workspace).unwrap();
        let loaded = load_workspace(dir.path()).unwrap();

        assert_eq!(loaded, workspace);
        let texts: Vec<_> = loaded.documents[0]
            .blocks()
            .iter()
            .filter_map(|b| b.content.text().map(str::to_string))
            .collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(loaded.blocks().len(), 3);
        assert_eq!(loaded.documents[0].id, first.id);
    }

    #[test]
    fn test_file_as_data_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            load_workspace(&file),
            Err(IoError::InvalidDataDir(_))
        ));
    }

    #[test]
    fn test_corrupt_workspace_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(workspace_path(dir.path()), "{").unwrap();
        assert!(matches!(load_workspace(dir.path()), Err(IoError::Json(_))));
    }
}
