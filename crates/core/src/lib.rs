pub mod bulk;
pub mod config;
pub mod corpus;
pub mod documents;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod stores;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use bulk::{assign_ids, BulkLoader};
pub use config::{EngineConfig, DEFAULT_ENDPOINT};
pub use corpus::{
    corpus_checksum, dedupe_preserving_order, discover_text_files, load_collection,
    load_collection_str, load_corpus, load_text_directory,
};
pub use documents::DocumentService;
pub use error::{IngestError, PerDocumentWriteError, PipelineError, SearchError};
pub use lifecycle::{load_schema, IndexLifecycle};
pub use models::{
    BulkLoadReport, Corpus, CorpusSource, DocumentRecord, EngineHit, EngineInfo, IndexDeletion,
    IndexHandle, IngestionSummary, SearchHit, SearchResult, DOCUMENT_TEXT_FIELD,
};
pub use normalize::TextNormalizer;
pub use pipeline::IngestionPipeline;
pub use query::{format_scores, match_all_query, match_query, QueryService, MAX_RESULT_WINDOW};
pub use stores::ElasticsearchStore;
pub use traits::SearchEngine;
