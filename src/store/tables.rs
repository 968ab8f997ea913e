// CSV tables read and written by the pipeline stages.
//
// The raw scraper file has no header and a loose shape; every table the
// pipeline writes itself has a header row and is (de)serialized through serde.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::models::{Document, Language};

/// Separator for the location set inside a single CSV cell.
pub const LOCATION_SEPARATOR: char = ';';

/// Required raw columns: id, text, user, timestamp. Optional: lang, source.
const RAW_MIN_FIELDS: usize = 4;
const RAW_MAX_FIELDS: usize = 6;

/// `topics.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRow {
    pub id: String,
    pub text: String,
    pub topic: i64,
    pub probability: Option<f64>,
}

/// `clusters.csv` — the topic table with a cluster column appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRow {
    pub id: String,
    pub text: String,
    pub topic: i64,
    pub probability: Option<f64>,
    pub cluster: i64,
}

/// `sentiments.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRow {
    pub id: String,
    pub text: String,
    pub sentiment: String,
    pub score: f64,
    pub user: String,
    pub timestamp: String,
    pub locations: String,
    pub semaxis: Option<f64>,
}

/// `results.csv` — everything known about a document, joined on id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: String,
    pub user: String,
    pub timestamp: String,
    pub lang: Language,
    pub text: String,
    pub topic: Option<i64>,
    pub probability: Option<f64>,
    pub cluster: Option<i64>,
    pub sentiment: Option<String>,
    pub score: Option<f64>,
    pub semaxis: Option<f64>,
    pub locations: String,
}

/// Read the scraper's headerless CSV.
///
/// Rows with the wrong number of fields, an empty id, a repeated id or
/// undecodable bytes are malformed. In strict mode the first one aborts the
/// read; otherwise each is logged and skipped.
pub fn read_raw(path: &Path, strict: bool) -> Result<Vec<Document>> {
    if !path.exists() {
        return Err(PipelineError::missing(path).into());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut documents = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let parsed = match result {
            Ok(record) => parse_raw_record(&record, &seen),
            Err(e) => Err(PipelineError::MalformedRow {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            }),
        };

        match parsed {
            Ok(doc) => {
                seen.insert(doc.id.clone());
                documents.push(doc);
            }
            Err(err) if strict => return Err(err.into()),
            Err(err) => {
                warn!(error = %err, "Skipping malformed raw row");
                skipped += 1;
            }
        }
    }

    debug!(
        path = %path.display(),
        documents = documents.len(),
        skipped,
        "Read raw documents"
    );
    Ok(documents)
}

fn parse_raw_record(
    record: &csv::StringRecord,
    seen: &HashSet<String>,
) -> std::result::Result<Document, PipelineError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let malformed = |reason: String| PipelineError::MalformedRow { line, reason };

    if !(RAW_MIN_FIELDS..=RAW_MAX_FIELDS).contains(&record.len()) {
        return Err(malformed(format!(
            "expected {RAW_MIN_FIELDS} to {RAW_MAX_FIELDS} fields, found {}",
            record.len()
        )));
    }

    let id = record[0].trim();
    if id.is_empty() {
        return Err(malformed("empty id".to_string()));
    }
    if seen.contains(id) {
        return Err(malformed(format!("duplicate id {id}")));
    }

    let non_empty = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());

    Ok(Document {
        id: id.to_string(),
        raw_text: record.get(1).filter(|t| !t.trim().is_empty()).map(str::to_string),
        author: record[2].trim().to_string(),
        timestamp: record[3].trim().to_string(),
        language: Language::from_tag(non_empty(4)),
        source: non_empty(5).map(str::to_string),
    })
}

/// Read a headed table written by one of the stages.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(PipelineError::missing(path).into());
    }

    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T = result
            .map_err(|e| PipelineError::MalformedRow {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            })
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write `rows` with a header row, replacing any existing file.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "Wrote table");
    Ok(())
}

/// Write a JSON artifact (topic info, mention stats).
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(PipelineError::missing(path).into());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn join_locations(locations: &BTreeSet<String>) -> String {
    locations
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(&LOCATION_SEPARATOR.to_string())
}

pub fn split_locations(cell: &str) -> BTreeSet<String> {
    cell.split(LOCATION_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_raw_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "raw.csv",
            "1,hola metro,ana,2024-01-01\n2,Bahn zu spät,ben,2024-01-02,A,T\n",
        );
        let docs = read_raw(&path, false).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].language, Language::Spanish);
        assert_eq!(docs[0].source, None);
        assert_eq!(docs[1].language, Language::German);
        assert_eq!(docs[1].source.as_deref(), Some("T"));
    }

    #[test]
    fn test_read_raw_empty_text_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "raw.csv", "1,,ana,2024-01-01\n");
        let docs = read_raw(&path, false).unwrap();
        assert_eq!(docs[0].raw_text, None);
    }

    #[test]
    fn test_read_raw_skips_malformed_unless_strict() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "raw.csv",
            "1,hola,ana,t\nbroken,row\n1,dup,ana,t\n3,adios,eva,t\n",
        );

        let docs = read_raw(&path, false).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let err = read_raw(&path, true).unwrap_err();
        match crate::error::find_pipeline_error(&err) {
            Some(PipelineError::MalformedRow { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_read_raw_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_raw(&dir.path().join("nope.csv"), false).unwrap_err();
        assert!(matches!(
            crate::error::find_pipeline_error(&err),
            Some(PipelineError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_table_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.csv");
        let rows = vec![
            TopicRow {
                id: "1".into(),
                text: "metro lento".into(),
                topic: 0,
                probability: Some(0.8),
            },
            TopicRow {
                id: "2".into(),
                text: "hola, mundo".into(),
                topic: -1,
                probability: None,
            },
        ];
        write_table(&path, &rows).unwrap();
        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("id,text,topic,probability"));
        let back: Vec<TopicRow> = read_table(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_locations_cell() {
        let set: BTreeSet<String> = ["Zócalo".to_string(), "Pantitlán".to_string()].into();
        let cell = join_locations(&set);
        assert_eq!(cell, "Pantitlán;Zócalo");
        assert_eq!(split_locations(&cell), set);
        assert!(split_locations("").is_empty());
    }
}
