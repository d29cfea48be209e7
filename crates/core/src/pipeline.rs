use crate::bulk::BulkLoader;
use crate::corpus::load_corpus;
use crate::error::PipelineError;
use crate::lifecycle::IndexLifecycle;
use crate::models::{CorpusSource, IndexHandle, IngestionSummary};
use crate::traits::SearchEngine;
use tracing::info;

/// Corpus loader feeding the bulk loader, for the two operating modes.
pub struct IngestionPipeline<'a, E: SearchEngine> {
    engine: &'a E,
    write_concurrency: usize,
}

impl<'a, E: SearchEngine> IngestionPipeline<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self {
            engine,
            write_concurrency: 1,
        }
    }

    pub fn with_write_concurrency(mut self, concurrency: usize) -> Self {
        self.write_concurrency = concurrency.max(1);
        self
    }

    /// Fresh start: reset the index with the handle's schema and load with ids from 0.
    pub async fn initialize(
        &self,
        handle: &IndexHandle,
        source: &CorpusSource,
    ) -> Result<IngestionSummary, PipelineError> {
        // Read the corpus before touching the index so a bad path leaves it intact.
        let corpus = load_corpus(source)?;
        IndexLifecycle::new(self.engine).reset_index(handle).await?;

        let load = BulkLoader::new(self.engine)
            .with_concurrency(self.write_concurrency)
            .load(handle, &corpus.records, None)
            .await?;

        Ok(IngestionSummary {
            corpus_checksum: corpus.checksum,
            corpus_len: corpus.records.len(),
            load,
        })
    }

    /// Adds documents after the ones already in the index: ids start at the live count.
    pub async fn append(
        &self,
        handle: &IndexHandle,
        source: &CorpusSource,
    ) -> Result<IngestionSummary, PipelineError> {
        let corpus = load_corpus(source)?;
        let start_id = self.engine.count(&handle.name).await?;
        info!(index = %handle.name, start_id, "appending after existing documents");

        let load = BulkLoader::new(self.engine)
            .with_concurrency(self.write_concurrency)
            .load(handle, &corpus.records, Some(start_id))
            .await?;

        Ok(IngestionSummary {
            corpus_checksum: corpus.checksum,
            corpus_len: corpus.records.len(),
            load,
        })
    }
}
