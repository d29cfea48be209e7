use crate::{EngineHit, SearchError};
use async_trait::async_trait;
use serde_json::Value;

/// The narrow contract this crate needs from a full-text document store.
///
/// `index_document` has upsert semantics. `delete_index` on a missing index is not an
/// error. `get_document` and `update_document` return `SearchError::DocumentNotFound`
/// for unknown ids.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn ping(&self) -> bool;

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    async fn create_index(&self, index: &str, schema: &Value) -> Result<(), SearchError>;

    async fn delete_index(&self, index: &str) -> Result<(), SearchError>;

    async fn index_document(&self, index: &str, id: &str, body: &Value)
        -> Result<(), SearchError>;

    async fn get_document(&self, index: &str, id: &str) -> Result<Value, SearchError>;

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchError>;

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchError>;

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), SearchError>;

    async fn count(&self, index: &str) -> Result<u64, SearchError>;

    async fn search(
        &self,
        index: &str,
        query: &Value,
        size: usize,
    ) -> Result<Vec<EngineHit>, SearchError>;
}
