use crate::error::IngestError;
use crate::models::{IndexDeletion, IndexHandle};
use crate::traits::SearchEngine;
use crate::SearchError;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Reads the operator-supplied index schema. The payload is passed to the engine as-is.
pub fn load_schema(path: &Path) -> Result<Value, IngestError> {
    let raw = fs::read_to_string(path).map_err(|error| IngestError::SourceNotFound {
        path: path.display().to_string(),
        reason: error.to_string(),
    })?;

    serde_json::from_str(&raw).map_err(|error| IngestError::MalformedInput {
        path: path.display().to_string(),
        details: error.to_string(),
    })
}

pub struct IndexLifecycle<'a, E: SearchEngine> {
    engine: &'a E,
}

impl<'a, E: SearchEngine> IndexLifecycle<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    pub async fn create_index(&self, handle: &IndexHandle) -> Result<(), SearchError> {
        self.engine.create_index(&handle.name, &handle.schema).await?;
        info!(index = %handle.name, "index created");
        Ok(())
    }

    pub async fn delete_index(&self, handle: &IndexHandle) -> Result<IndexDeletion, SearchError> {
        if !self.engine.index_exists(&handle.name).await? {
            info!(index = %handle.name, "index does not exist, nothing to delete");
            return Ok(IndexDeletion::Absent);
        }

        self.engine.delete_index(&handle.name).await?;
        info!(index = %handle.name, "index deleted");
        Ok(IndexDeletion::Deleted)
    }

    /// Delete-then-create. Not atomic: an interruption between the two steps leaves the
    /// index absent, and the whole reset has to be retried.
    pub async fn reset_index(&self, handle: &IndexHandle) -> Result<(), SearchError> {
        self.delete_index(handle).await?;

        match self.create_index(handle).await {
            Err(SearchError::IndexAlreadyExists(name)) => {
                warn!(index = %name, "index reappeared during reset, keeping it");
                Ok(())
            }
            other => other,
        }
    }
}
