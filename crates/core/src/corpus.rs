use crate::error::IngestError;
use crate::models::{Corpus, CorpusSource, DocumentRecord};
use crate::normalize::TextNormalizer;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const TEXT_EXTENSION: &str = ".txt";

pub fn load_corpus(source: &CorpusSource) -> Result<Corpus, IngestError> {
    let records = match source {
        CorpusSource::Collection(path) => load_collection(path)?,
        CorpusSource::TextDirectory(path) => load_text_directory(path)?,
    };

    let checksum = corpus_checksum(&records);
    info!(
        path = %source.path().display(),
        records = records.len(),
        checksum = %checksum,
        "corpus loaded"
    );

    Ok(Corpus {
        source: source.clone(),
        records,
        checksum,
    })
}

pub fn load_collection(path: &Path) -> Result<Vec<DocumentRecord>, IngestError> {
    let raw = fs::read_to_string(path).map_err(|error| source_not_found(path, error))?;
    parse_collection(&raw, &path.display().to_string())
}

pub fn load_collection_str(raw: &str) -> Result<Vec<DocumentRecord>, IngestError> {
    parse_collection(raw, "<inline>")
}

fn parse_collection(raw: &str, origin: &str) -> Result<Vec<DocumentRecord>, IngestError> {
    let malformed = |details: String| IngestError::MalformedInput {
        path: origin.to_string(),
        details,
    };

    // `preserve_order` keeps the file's key order, so ids stay stable across runs.
    let collection: Map<String, Value> =
        serde_json::from_str(raw).map_err(|error| malformed(error.to_string()))?;

    let mut texts = Vec::with_capacity(collection.len());
    for (key, record) in &collection {
        let text = record
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("record `{key}` has no string `text` field")))?;
        texts.push(text.to_string());
    }

    let normalizer = TextNormalizer::new()?;
    let distinct = dedupe_preserving_order(texts);
    let normalized = distinct
        .iter()
        .map(|text| normalizer.normalize(text))
        .collect::<Vec<_>>();

    Ok(into_records(normalized, origin))
}

pub fn load_text_directory(folder: &Path) -> Result<Vec<DocumentRecord>, IngestError> {
    if !folder.is_dir() {
        return Err(IngestError::SourceNotFound {
            path: folder.display().to_string(),
            reason: "not a readable directory".to_string(),
        });
    }

    let normalizer = TextNormalizer::new()?;
    let mut texts = Vec::new();
    for path in discover_text_files(folder)? {
        let raw = fs::read_to_string(&path).map_err(|error| source_not_found(&path, error))?;
        texts.push(normalizer.normalize(&raw));
    }

    Ok(into_records(texts, &folder.display().to_string()))
}

/// Direct children of `folder` whose file name ends in `.txt`, sorted by path. Symlinks
/// are followed, so a linked transcript counts as a file.
pub fn discover_text_files(folder: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
    {
        let entry = entry.map_err(|error| IngestError::SourceNotFound {
            path: folder.display().to_string(),
            reason: error.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let is_text = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(TEXT_EXTENSION));

        if is_text {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    Ok(files)
}

/// Exact-equality dedup; the first occurrence keeps its position.
pub fn dedupe_preserving_order(texts: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(texts.len());
    texts
        .into_iter()
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

pub fn corpus_checksum(records: &[DocumentRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn into_records(texts: Vec<String>, origin: &str) -> Vec<DocumentRecord> {
    texts
        .into_iter()
        .enumerate()
        .map(|(position, text)| {
            if text.is_empty() {
                warn!(origin, position, "document is empty after normalization");
            }
            DocumentRecord::new(text)
        })
        .collect()
}

fn source_not_found(path: &Path, error: std::io::Error) -> IngestError {
    IngestError::SourceNotFound {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn texts(records: &[DocumentRecord]) -> Vec<&str> {
        records.iter().map(|record| record.text.as_str()).collect()
    }

    #[test]
    fn duplicates_are_dropped_in_first_seen_order() -> Result<(), Box<dyn std::error::Error>> {
        let records = load_collection_str(
            r#"{
                "k1": {"text": "A"},
                "k2": {"text": "B"},
                "k3": {"text": "A"},
                "k4": {"text": "C"}
            }"#,
        )?;

        assert_eq!(texts(&records), vec!["A", "B", "C"]);
        Ok(())
    }

    #[test]
    fn collection_follows_file_key_order() -> Result<(), Box<dyn std::error::Error>> {
        let records = load_collection_str(
            r#"{"z": {"text": "last key first"}, "a": {"text": "first key last"}}"#,
        )?;

        assert_eq!(texts(&records), vec!["last key first", "first key last"]);
        Ok(())
    }

    #[test]
    fn collection_texts_are_normalized() -> Result<(), Box<dyn std::error::Error>> {
        let records = load_collection_str(
            r#"{"0": {"text": "제154회\\n  완주군의회 #임시회", "title": "ignored"}}"#,
        )?;

        assert_eq!(texts(&records), vec!["제154회 완주군의회 임시회"]);
        Ok(())
    }

    #[test]
    fn distinct_raw_texts_stay_separate_after_normalization(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let records =
            load_collection_str(r#"{"a": {"text": "회의  록"}, "b": {"text": "회의 록\n"}}"#)?;
        assert_eq!(texts(&records), vec!["회의 록", "회의 록"]);

        let records = load_collection_str(
            r#"{"a": {"text": "A#B"}, "b": {"text": "A B"}, "c": {"text": "C"}}"#,
        )?;
        assert_eq!(texts(&records), vec!["A B", "A B", "C"]);
        Ok(())
    }

    #[test]
    fn record_without_text_is_malformed() {
        let result = load_collection_str(r#"{"a": {"body": "no text"}}"#);
        assert!(matches!(result, Err(IngestError::MalformedInput { .. })));
    }

    #[test]
    fn non_object_collection_is_malformed() {
        let result = load_collection_str(r#"[{"text": "a"}]"#);
        assert!(matches!(result, Err(IngestError::MalformedInput { .. })));
    }

    #[test]
    fn missing_collection_file_is_source_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = load_collection(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(IngestError::SourceNotFound { .. })));
        Ok(())
    }

    #[test]
    fn directory_mode_reads_only_txt_files_in_name_order() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempdir()?;
        let base = dir.path();
        fs::create_dir(base.join("nested"))?;
        fs::write(base.join("b.txt"), "두번째\n회의록")?;
        fs::write(base.join("a.txt"), "첫번째 회의록")?;
        fs::write(base.join("notes.md"), "skip me")?;
        fs::write(base.join("nested").join("c.txt"), "not a direct child")?;

        let records = load_text_directory(base)?;

        assert_eq!(texts(&records), vec!["첫번째 회의록", "두번째 회의록"]);
        Ok(())
    }

    #[test]
    fn directory_mode_does_not_dedupe() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("1.txt"), "same")?;
        fs::write(dir.path().join("2.txt"), "same")?;

        let records = load_text_directory(dir.path())?;

        assert_eq!(records.len(), 2);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn directory_mode_follows_symlinked_transcripts() -> Result<(), Box<dyn std::error::Error>> {
        let outside = tempdir()?;
        let target = outside.path().join("shared.txt");
        fs::write(&target, "링크된 회의록")?;

        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "직접 넣은 회의록")?;
        std::os::unix::fs::symlink(&target, dir.path().join("b.txt"))?;

        let records = load_text_directory(dir.path())?;

        assert_eq!(texts(&records), vec!["직접 넣은 회의록", "링크된 회의록"]);
        Ok(())
    }

    #[test]
    fn missing_directory_is_source_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = load_text_directory(&dir.path().join("absent"));
        assert!(matches!(result, Err(IngestError::SourceNotFound { .. })));
        Ok(())
    }

    #[test]
    fn checksum_tracks_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("collection.json");
        fs::write(&path, r#"{"a": {"text": "one"}, "b": {"text": "two"}}"#)?;

        let first = load_corpus(&CorpusSource::Collection(path.clone()))?;
        let second = load_corpus(&CorpusSource::Collection(path))?;
        assert_eq!(first.checksum, second.checksum);

        let swapped = corpus_checksum(&[DocumentRecord::new("two"), DocumentRecord::new("one")]);
        assert_ne!(first.checksum, swapped);
        Ok(())
    }
}
