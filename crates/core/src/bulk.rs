use crate::error::PerDocumentWriteError;
use crate::models::{BulkLoadReport, DocumentRecord, IndexHandle};
use crate::traits::SearchEngine;
use crate::SearchError;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Position `i` maps to id `start_id + i`, or `i` when no start id is given. Fails when
/// the last id would not fit in a `u64`.
pub fn assign_ids(len: usize, start_id: Option<u64>) -> Result<Vec<String>, SearchError> {
    let start = start_id.unwrap_or(0);
    (0..len as u64)
        .map(|offset| {
            start
                .checked_add(offset)
                .map(|id| id.to_string())
                .ok_or_else(|| {
                    SearchError::InvalidArgument(format!(
                        "{len} documents starting at id {start} overflow the id range"
                    ))
                })
        })
        .collect()
}

/// Best-effort writer: a rejected document is recorded in the report and never stops
/// the rest of the batch.
pub struct BulkLoader<'a, E: SearchEngine> {
    engine: &'a E,
    concurrency: usize,
}

impl<'a, E: SearchEngine> BulkLoader<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self {
            engine,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn load(
        &self,
        handle: &IndexHandle,
        records: &[DocumentRecord],
        start_id: Option<u64>,
    ) -> Result<BulkLoadReport, SearchError> {
        let started_at = Utc::now();
        let index = handle.name.as_str();
        let engine = self.engine;

        // Ids are fixed before anything is dispatched so completion order cannot move them.
        let ids = assign_ids(records.len(), start_id)?;

        let mut outcomes = stream::iter(records.iter().zip(ids).enumerate())
            .map(|(position, (record, id))| async move {
                let outcome = engine.index_document(index, &id, &record.to_source()).await;
                debug!(index, position, id = %id, ok = outcome.is_ok(), "document write finished");
                (position, id, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        outcomes.sort_by_key(|(position, _, _)| *position);

        let mut written = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (position, id, outcome) in outcomes {
            match outcome {
                Ok(()) => written.push(id),
                Err(error) => {
                    warn!(index, position, id = %id, error = %error, "unable to load document");
                    failures.push(PerDocumentWriteError {
                        position,
                        document_id: id,
                        reason: error.to_string(),
                    });
                }
            }
        }

        let engine_count = self.engine.count(index).await?;
        info!(
            index,
            attempted = records.len(),
            written = written.len(),
            failed = failures.len(),
            engine_count,
            "bulk load finished"
        );

        Ok(BulkLoadReport {
            index: handle.name.clone(),
            attempted: records.len(),
            written,
            failures,
            engine_count,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
