use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source not found or unreadable: {path}: {reason}")]
    SourceNotFound { path: String, reason: String },

    #[error("malformed input in {path}: {details}")]
    MalformedInput { path: String, details: String },

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("engine unavailable after {attempts} attempt(s): {reason}")]
    Unavailable { attempts: u32, reason: String },

    #[error("document {id} not found in index {index}")]
    DocumentNotFound { index: String, id: String },

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A single rejected write during a bulk load. Collected into the batch report, never
/// returned as an `Err`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unable to load document {document_id} (position {position}): {reason}")]
pub struct PerDocumentWriteError {
    pub position: usize,
    pub document_id: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Search(#[from] SearchError),
}
