use crate::traits::SearchEngine;
use crate::{EngineHit, SearchError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct FakeIndex {
    schema: Value,
    documents: BTreeMap<String, Value>,
}

/// In-memory engine double. Ids listed in `rejected_ids` fail on write; `scripted_hits`
/// replaces the default "every document, score 1.0" search response.
#[derive(Default)]
pub(crate) struct FakeEngine {
    indices: Mutex<BTreeMap<String, FakeIndex>>,
    rejected_ids: HashSet<String>,
    scripted_hits: Vec<EngineHit>,
    pub(crate) searches: Mutex<Vec<(Value, usize)>>,
}

impl FakeEngine {
    pub(crate) fn with_index(name: &str) -> Self {
        let engine = Self::default();
        engine.lock().insert(name.to_string(), FakeIndex::default());
        engine
    }

    pub(crate) fn rejecting(mut self, ids: &[&str]) -> Self {
        self.rejected_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub(crate) fn with_hits(mut self, hits: Vec<EngineHit>) -> Self {
        self.scripted_hits = hits;
        self
    }

    pub(crate) fn seed(&self, index: &str, id: &str, source: Value) {
        self.lock()
            .entry(index.to_string())
            .or_default()
            .documents
            .insert(id.to_string(), source);
    }

    pub(crate) fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.lock()
            .get(index)
            .and_then(|state| state.documents.get(id).cloned())
    }

    pub(crate) fn schema(&self, index: &str) -> Option<Value> {
        self.lock().get(index).map(|state| state.schema.clone())
    }

    pub(crate) fn has_index(&self, index: &str) -> bool {
        self.lock().contains_key(index)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, FakeIndex>> {
        self.indices.lock().expect("fake engine lock poisoned")
    }

    fn missing_index(index: &str) -> SearchError {
        SearchError::BackendResponse {
            backend: "fake".to_string(),
            details: format!("no such index: {index}"),
        }
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    async fn ping(&self) -> bool {
        true
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        Ok(self.has_index(index))
    }

    async fn create_index(&self, index: &str, schema: &Value) -> Result<(), SearchError> {
        let mut indices = self.lock();
        if indices.contains_key(index) {
            return Err(SearchError::IndexAlreadyExists(index.to_string()));
        }
        indices.insert(
            index.to_string(),
            FakeIndex {
                schema: schema.clone(),
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        self.lock().remove(index);
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
    ) -> Result<(), SearchError> {
        if self.rejected_ids.contains(id) {
            return Err(SearchError::BackendResponse {
                backend: "fake".to_string(),
                details: format!("rejected document {id}"),
            });
        }
        self.seed(index, id, body.clone());
        Ok(())
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Value, SearchError> {
        self.document(index, id)
            .ok_or_else(|| SearchError::DocumentNotFound {
                index: index.to_string(),
                id: id.to_string(),
            })
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        Ok(self.document(index, id).is_some())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchError> {
        if let Some(state) = self.lock().get_mut(index) {
            state.documents.remove(id);
        }
        Ok(())
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), SearchError> {
        let mut indices = self.lock();
        let document = indices
            .get_mut(index)
            .and_then(|state| state.documents.get_mut(id))
            .ok_or_else(|| SearchError::DocumentNotFound {
                index: index.to_string(),
                id: id.to_string(),
            })?;

        if let (Value::Object(target), Value::Object(fields)) = (document, partial) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn count(&self, index: &str) -> Result<u64, SearchError> {
        self.lock()
            .get(index)
            .map(|state| state.documents.len() as u64)
            .ok_or_else(|| Self::missing_index(index))
    }

    async fn search(
        &self,
        index: &str,
        query: &Value,
        size: usize,
    ) -> Result<Vec<EngineHit>, SearchError> {
        self.searches
            .lock()
            .expect("fake engine lock poisoned")
            .push((query.clone(), size));

        if !self.scripted_hits.is_empty() {
            return Ok(self.scripted_hits.iter().take(size).cloned().collect());
        }

        let indices = self.lock();
        let state = indices.get(index).ok_or_else(|| Self::missing_index(index))?;
        Ok(state
            .documents
            .iter()
            .take(size)
            .map(|(id, source)| EngineHit {
                id: id.clone(),
                score: 1.0,
                source: source.clone(),
            })
            .collect())
    }
}

pub(crate) fn text_source(text: &str) -> Value {
    let mut source = Map::new();
    source.insert(
        crate::DOCUMENT_TEXT_FIELD.to_string(),
        Value::String(text.to_string()),
    );
    Value::Object(source)
}
