//! services/client/src/state/documents.rs
//!
//! Uploads, searches and the tag catalog. The only cached state is the tag catalog
//! and the documents uploaded during this session.

use document_manager_core::domain::{
    Document, DocumentDraft, FileAttachment, SearchQuery, ValidationError,
};
use document_manager_core::ports::{DocumentManagementApi, PortError, PortResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::adapters::local_file::safe_file_name;
use crate::state::session::SessionHandle;

pub struct DocumentState {
    api: Arc<dyn DocumentManagementApi>,
    session: SessionHandle,
    owner_id: Option<String>,
    tags: Vec<String>,
    documents: Vec<Document>,
    last_error: Option<String>,
}

impl DocumentState {
    /// `owner_id` is sent with uploads; without it the session's phone number is used.
    pub fn new(
        api: Arc<dyn DocumentManagementApi>,
        session: SessionHandle,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            api,
            session,
            owner_id,
            tags: Vec::new(),
            documents: Vec::new(),
            last_error: None,
        }
    }

    //=====================================================================================
    // Tag Catalog
    //=====================================================================================

    /// Replaces the catalog with the service's tags matching `term`.
    /// Returns an empty list on failure and keeps the previous catalog.
    #[instrument(skip(self))]
    pub async fn fetch_tags(&mut self, term: &str) -> Vec<String> {
        self.last_error = None;
        let token = self.session.token();
        match self.api.fetch_tags(token.as_ref(), term.trim()).await {
            Ok(tags) => {
                info!(count = tags.len(), "tag catalog refreshed");
                self.tags = tags.clone();
                tags
            }
            Err(e) => {
                self.fail(e);
                Vec::new()
            }
        }
    }

    /// Adds a tag to the local catalog. Blank and already known tags are ignored.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|known| known == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    //=====================================================================================
    // Documents
    //=====================================================================================

    /// Uploads one document. On success it is appended to `documents()`.
    #[instrument(skip_all, fields(file = %draft.file.name))]
    pub async fn upload_document(&mut self, draft: DocumentDraft) -> Option<Document> {
        self.last_error = None;

        let result: PortResult<Document> = async {
            draft.validate()?;
            let owner_id = self.owner_id()?;
            let token = self.session.token();
            let receipt = self
                .api
                .upload_document(token.as_ref(), &draft, &owner_id)
                .await?;
            Ok::<_, PortError>(receipt.document)
        }
        .await;

        match result {
            Ok(document) => {
                info!(id = %document.id, "document uploaded");
                self.documents.push(document.clone());
                Some(document)
            }
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Documents uploaded during this session, oldest first.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Runs a search. Results are returned, never cached. Only the first page is
    /// ever requested.
    #[instrument(skip_all)]
    pub async fn search_documents(&mut self, query: &SearchQuery) -> Vec<Document> {
        self.last_error = None;

        let result: PortResult<Vec<Document>> = async {
            let query = query.normalized()?;
            let token = self.session.token();
            let results = self.api.search_documents(token.as_ref(), &query).await?;
            Ok::<_, PortError>(results.documents)
        }
        .await;

        match result {
            Ok(documents) => {
                info!(count = documents.len(), "search finished");
                documents
            }
            Err(e) => {
                self.fail(e);
                Vec::new()
            }
        }
    }

    /// Saves a stored file under `dir`, returning where it was written.
    #[instrument(skip_all, fields(file = %file.name))]
    pub async fn download_file(&mut self, file: &FileAttachment, dir: &Path) -> Option<PathBuf> {
        self.last_error = None;

        let result: PortResult<PathBuf> = async {
            if file.uri.trim().is_empty() {
                return Err(PortError::RequestSetup(
                    "The document has no file to download".to_string(),
                ));
            }
            let name = safe_file_name(&file.name).ok_or_else(|| {
                PortError::RequestSetup(format!("'{}' is not a usable file name", file.name))
            })?;
            let token = self.session.token();
            let content = self.api.download_file(token.as_ref(), &file.uri).await?;

            let target = dir.join(name);
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| PortError::Storage(format!("{}: {}", dir.display(), e)))?;
            tokio::fs::write(&target, &content)
                .await
                .map_err(|e| PortError::Storage(format!("{}: {}", target.display(), e)))?;
            Ok::<_, PortError>(target)
        }
        .await;

        match result {
            Ok(path) => {
                info!(path = %path.display(), "file downloaded");
                Some(path)
            }
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn owner_id(&self) -> Result<String, ValidationError> {
        self.owner_id
            .clone()
            .or_else(|| Some(self.session.pending_phone_number()).filter(|p| !p.is_empty()))
            .ok_or(ValidationError::MissingOwner)
    }

    fn fail(&mut self, err: PortError) {
        warn!(error = %err, "document operation failed");
        self.last_error = Some(err.to_string());
    }
}
