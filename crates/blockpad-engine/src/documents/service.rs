use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::documents::model::{Document, DocumentUpdate};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid document: {0}")]
    Validation(String),
    #[error("Document not found: {0}")]
    NotFound(Uuid),
    #[error("Not authorized to access document {0}")]
    Unauthorized(Uuid),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Owner-scoped document tree.
///
/// Every operation takes the caller's user id and fails with
/// `Unauthorized` unless it owns the document. The one exception is reading
/// a document that is published and not archived.
#[derive(Debug, Clone, Default)]
pub struct DocumentService {
    documents: HashMap<Uuid, Document>,
}

impl DocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    /// All documents, oldest first
    pub fn documents(&self) -> Vec<Document> {
        let mut all: Vec<Document> = self.documents.values().cloned().collect();
        all.sort_by_key(|d| d.created_at);
        all
    }

    fn owned(&self, id: Uuid, user_id: &str) -> DocumentResult<&Document> {
        let document = self.documents.get(&id).ok_or(DocumentError::NotFound(id))?;
        if document.owner_id != user_id {
            return Err(DocumentError::Unauthorized(id));
        }
        Ok(document)
    }

    fn owned_mut(&mut self, id: Uuid, user_id: &str) -> DocumentResult<&mut Document> {
        self.owned(id, user_id)?;
        self.documents
            .get_mut(&id)
            .ok_or(DocumentError::NotFound(id))
    }

    /// Non-archived children of `parent_id` (root documents for `None`),
    /// newest first
    pub fn list_sidebar(&self, user_id: &str, parent_id: Option<Uuid>) -> Vec<Document> {
        let mut listed: Vec<Document> = self
            .documents
            .values()
            .filter(|d| d.owner_id == user_id && !d.is_archived && d.parent_id == parent_id)
            .cloned()
            .collect();
        listed.sort_by_key(|d| Reverse(d.created_at));
        listed
    }

    pub fn get_document(&self, id: Uuid, user_id: Option<&str>) -> DocumentResult<Document> {
        let document = self.documents.get(&id).ok_or(DocumentError::NotFound(id))?;
        if document.is_world_readable() || user_id == Some(document.owner_id.as_str()) {
            return Ok(document.clone());
        }
        Err(DocumentError::Unauthorized(id))
    }

    pub fn create_document(
        &mut self,
        title: &str,
        user_id: &str,
        parent_id: Option<Uuid>,
    ) -> DocumentResult<Document> {
        if title.trim().is_empty() {
            return Err(DocumentError::Validation("title is required".to_string()));
        }
        if user_id.is_empty() {
            return Err(DocumentError::Validation("user id is required".to_string()));
        }
        if let Some(parent_id) = parent_id {
            self.owned(parent_id, user_id)?;
        }
        let document = Document::new(title, user_id, parent_id);
        log::debug!("created document {} ({title})", document.id);
        self.documents.insert(document.id, document.clone());
        Ok(document)
    }

    pub fn update_document(
        &mut self,
        id: Uuid,
        user_id: &str,
        update: DocumentUpdate,
    ) -> DocumentResult<Document> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DocumentError::Validation("title is required".to_string()));
        }
        let document = self.owned_mut(id, user_id)?;
        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(content) = update.content {
            document.content = Some(content);
        }
        if let Some(cover_image) = update.cover_image {
            document.cover_image = cover_image;
        }
        if let Some(icon) = update.icon {
            document.icon = icon;
        }
        if let Some(is_published) = update.is_published {
            document.is_published = is_published;
        }
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    /// Archive a document together with all of its descendants
    pub fn archive_document(&mut self, id: Uuid, user_id: &str) -> DocumentResult<Document> {
        self.owned(id, user_id)?;
        let ids = self.subtree(id, user_id);
        let now = Utc::now();
        for doc_id in &ids {
            if let Some(document) = self.documents.get_mut(doc_id) {
                document.is_archived = true;
                document.updated_at = now;
            }
        }
        log::info!("archived document {id} and {} descendants", ids.len() - 1);
        self.get_document(id, Some(user_id))
    }

    /// Restore a document and its descendants.
    ///
    /// A document whose parent is still archived is moved to the root.
    pub fn restore_document(&mut self, id: Uuid, user_id: &str) -> DocumentResult<Document> {
        let parent_archived = self
            .owned(id, user_id)?
            .parent_id
            .and_then(|parent| self.documents.get(&parent))
            .is_some_and(|parent| parent.is_archived);

        let ids = self.subtree(id, user_id);
        let now = Utc::now();
        for doc_id in &ids {
            if let Some(document) = self.documents.get_mut(doc_id) {
                document.is_archived = false;
                document.updated_at = now;
            }
        }
        if parent_archived && let Some(document) = self.documents.get_mut(&id) {
            document.parent_id = None;
        }
        log::info!("restored document {id} and {} descendants", ids.len() - 1);
        self.get_document(id, Some(user_id))
    }

    /// Delete a document and all of its descendants, returning their ids
    pub fn delete_document(&mut self, id: Uuid, user_id: &str) -> DocumentResult<Vec<Uuid>> {
        self.owned(id, user_id)?;
        let ids = self.subtree(id, user_id);
        for doc_id in &ids {
            self.documents.remove(doc_id);
        }
        Ok(ids)
    }

    /// Non-archived documents, most recently updated first
    pub fn search_documents(&self, user_id: &str) -> Vec<Document> {
        self.listed_by_update(user_id, false)
    }

    /// Archived documents, most recently updated first
    pub fn list_trash(&self, user_id: &str) -> Vec<Document> {
        self.listed_by_update(user_id, true)
    }

    fn listed_by_update(&self, user_id: &str, archived: bool) -> Vec<Document> {
        let mut listed: Vec<Document> = self
            .documents
            .values()
            .filter(|d| d.owner_id == user_id && d.is_archived == archived)
            .cloned()
            .collect();
        listed.sort_by_key(|d| Reverse(d.updated_at));
        listed
    }

    /// `id` followed by all of its descendants owned by `user_id`
    fn subtree(&self, id: Uuid, user_id: &str) -> Vec<Uuid> {
        let mut ids = vec![id];
        let mut next = 0;
        while next < ids.len() {
            let parent = ids[next];
            ids.extend(
                self.documents
                    .values()
                    .filter(|d| d.owner_id == user_id && d.parent_id == Some(parent))
                    .map(|d| d.id),
            );
            next += 1;
        }
        ids
    }
}
