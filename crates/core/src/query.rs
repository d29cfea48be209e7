use crate::models::{
    DocumentRecord, EngineHit, IndexHandle, SearchHit, SearchResult, DOCUMENT_TEXT_FIELD,
};
use crate::traits::SearchEngine;
use crate::SearchError;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Largest page the engine serves without scrolling (`index.max_result_window`).
pub const MAX_RESULT_WINDOW: usize = 10_000;

pub fn match_all_query() -> Value {
    json!({ "query": { "match_all": {} } })
}

/// Single `must` clause matching the raw query text against the document body.
pub fn match_query(query_text: &str) -> Value {
    json!({
        "query": {
            "bool": {
                "must": [
                    { "match": { DOCUMENT_TEXT_FIELD: query_text } }
                ]
            }
        }
    })
}

pub struct QueryService<'a, E: SearchEngine> {
    engine: &'a E,
}

impl<'a, E: SearchEngine> QueryService<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    pub async fn match_all(&self, handle: &IndexHandle) -> Result<SearchResult, SearchError> {
        let total = self.engine.count(&handle.name).await?;
        let wanted = usize::try_from(total).unwrap_or(usize::MAX);
        let truncated = wanted > MAX_RESULT_WINDOW;
        if truncated {
            warn!(
                index = %handle.name,
                total,
                returned = MAX_RESULT_WINDOW,
                "index exceeds the result window, match_all is truncated"
            );
        }
        let size = wanted.min(MAX_RESULT_WINDOW);

        let hits = self
            .engine
            .search(&handle.name, &match_all_query(), size)
            .await?;

        Ok(SearchResult {
            query: None,
            hits: into_search_hits(hits)?,
            truncated,
        })
    }

    /// The query text goes to the engine untouched; tokenization is the analyzer's job.
    pub async fn search(
        &self,
        handle: &IndexHandle,
        query_text: &str,
        top_k: usize,
    ) -> Result<SearchResult, SearchError> {
        if top_k == 0 {
            return Err(SearchError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }

        let hits = self
            .engine
            .search(&handle.name, &match_query(query_text), top_k)
            .await?;
        debug!(index = %handle.name, top_k, hits = hits.len(), "search finished");

        Ok(SearchResult {
            query: Some(query_text.to_string()),
            hits: into_search_hits(hits)?,
            truncated: false,
        })
    }
}

fn into_search_hits(hits: Vec<EngineHit>) -> Result<Vec<SearchHit>, SearchError> {
    hits.into_iter()
        .map(|hit| {
            Ok(SearchHit {
                record: DocumentRecord::from_source(&hit.source)?,
                document_id: hit.id,
                score: hit.score,
            })
        })
        .collect()
}

/// One `Doc ID / Score` line per hit, in result order.
pub fn format_scores(result: &SearchResult) -> String {
    result
        .hits
        .iter()
        .map(|hit| {
            format!(
                "Doc ID: {:>5}  Score: {:5.2}",
                format!("{:?}", hit.document_id),
                hit.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
