use crate::error::{IngestError, PipelineError};
use crate::models::{DocumentRecord, IndexHandle, DOCUMENT_TEXT_FIELD};
use crate::traits::SearchEngine;
use crate::SearchError;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

/// Point operations on single documents. Every call goes to the engine; nothing is cached.
pub struct DocumentService<'a, E: SearchEngine> {
    engine: &'a E,
}

impl<'a, E: SearchEngine> DocumentService<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    pub async fn exists(&self, handle: &IndexHandle, id: &str) -> Result<bool, SearchError> {
        self.engine.document_exists(&handle.name, id).await
    }

    pub async fn get(&self, handle: &IndexHandle, id: &str) -> Result<DocumentRecord, SearchError> {
        let source = self.engine.get_document(&handle.name, id).await?;
        DocumentRecord::from_source(&source)
    }

    /// Returns the document as it was before deletion, or `None` if there was nothing to
    /// delete. The snapshot is read first, so the result does not depend on the engine
    /// serving reads of a just-deleted id.
    pub async fn delete(
        &self,
        handle: &IndexHandle,
        id: &str,
    ) -> Result<Option<DocumentRecord>, SearchError> {
        if !self.engine.document_exists(&handle.name, id).await? {
            info!(index = %handle.name, id, "document does not exist, nothing to delete");
            return Ok(None);
        }

        let snapshot = match self.get(handle, id).await {
            Ok(record) => record,
            Err(SearchError::DocumentNotFound { .. }) => {
                info!(index = %handle.name, id, "document vanished before delete");
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        self.engine.delete_document(&handle.name, id).await?;
        info!(index = %handle.name, id, "document deleted");
        Ok(Some(snapshot))
    }

    /// Replaces `document_text`. No concurrency control: the last writer wins.
    pub async fn update(
        &self,
        handle: &IndexHandle,
        id: &str,
        new_text: &str,
    ) -> Result<(), SearchError> {
        self.engine
            .update_document(&handle.name, id, &json!({ DOCUMENT_TEXT_FIELD: new_text }))
            .await?;
        info!(index = %handle.name, id, "document updated");
        Ok(())
    }

    pub async fn update_from_file(
        &self,
        handle: &IndexHandle,
        id: &str,
        path: &Path,
    ) -> Result<(), PipelineError> {
        let text = fs::read_to_string(path).map_err(|error| IngestError::SourceNotFound {
            path: path.display().to_string(),
            reason: error.to_string(),
        })?;

        self.update(handle, id, &text).await?;
        Ok(())
    }

    pub async fn count(&self, handle: &IndexHandle) -> Result<u64, SearchError> {
        self.engine.count(&handle.name).await
    }
}
