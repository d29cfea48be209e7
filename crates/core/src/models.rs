use crate::error::{PerDocumentWriteError, SearchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Source field that carries the normalized transcript text in the engine.
pub const DOCUMENT_TEXT_FIELD: &str = "document_text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "document_text")]
    pub text: String,
}

impl DocumentRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn to_source(&self) -> Value {
        json!({ DOCUMENT_TEXT_FIELD: self.text })
    }

    pub fn from_source(source: &Value) -> Result<Self, SearchError> {
        let text = source
            .get(DOCUMENT_TEXT_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| SearchError::BackendResponse {
                backend: "engine".to_string(),
                details: format!("document source has no string `{DOCUMENT_TEXT_FIELD}` field"),
            })?;

        Ok(Self::new(text))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexHandle {
    pub name: String,
    pub schema: Value,
}

impl IndexHandle {
    pub fn new(name: impl Into<String>, schema: Value) -> Result<Self, SearchError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SearchError::InvalidArgument(
                "index name must not be empty".to_string(),
            ));
        }

        Ok(Self { name, schema })
    }

    /// Handle for operations against an index that already exists.
    pub fn named(name: impl Into<String>) -> Result<Self, SearchError> {
        Self::new(name, Value::Object(Map::new()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineHit {
    pub id: String,
    pub score: f64,
    pub source: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: String,
    pub score: f64,
    pub record: DocumentRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: Option<String>,
    pub hits: Vec<SearchHit>,
    /// Set when the index held more documents than one request can return.
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    /// JSON object of `{ "<key>": { "text": "..." } }` records.
    Collection(PathBuf),
    /// Directory of `.txt` files, one document per file.
    TextDirectory(PathBuf),
}

impl CorpusSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Collection(path) | Self::TextDirectory(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Corpus {
    pub source: CorpusSource,
    pub records: Vec<DocumentRecord>,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct BulkLoadReport {
    pub index: String,
    pub attempted: usize,
    pub written: Vec<String>,
    pub failures: Vec<PerDocumentWriteError>,
    pub engine_count: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BulkLoadReport {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|failure| failure.document_id.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IngestionSummary {
    pub corpus_checksum: String,
    pub corpus_len: usize,
    pub load: BulkLoadReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDeletion {
    Deleted,
    Absent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineInfo {
    pub cluster_name: Option<String>,
    pub version: Option<String>,
}
