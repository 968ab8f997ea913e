// Clean stage: raw_data.csv -> cleaned.csv + mentions.json.
//
// Order matters: mentions are counted from the raw text before the
// normalizer strips them, collocations are learned over the whole annotated
// corpus, and empty documents are dropped exactly once, at the end.

use anyhow::Result;
use tracing::{debug, info};

use super::runner::{Resources, StageReport};
use super::Stage;
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{CleanedDocument, Document};
use crate::store::tables::{read_raw, write_json, write_table};
use crate::store::{Artifact, DataDir};
use crate::text::mentions::count_mentions;

pub fn run(data: &DataDir, config: &Config, resources: &Resources) -> Result<StageReport> {
    let documents = read_raw(&data.path(Artifact::Raw), config.strict)?;

    let stats = count_mentions(documents.iter().filter_map(|d| d.raw_text.as_deref()));
    write_json(&data.path(Artifact::Mentions), &stats)?;
    debug!(
        mentions = stats.mentions.len(),
        hashtags = stats.hashtags.len(),
        "Counted mentions and hashtags"
    );

    let cleaned = clean_documents(&documents, resources, &config.default_source)?;
    if cleaned.is_empty() {
        return Err(PipelineError::empty(Stage::Clean.name()).into());
    }
    write_table(&data.path(Artifact::Cleaned), &cleaned)?;

    Ok(StageReport::new(Stage::Clean, cleaned.len()))
}

/// Normalize, annotate and phrase-merge every document, dropping the ones
/// left with no working text. Output keeps input order.
pub fn clean_documents(
    documents: &[Document],
    resources: &Resources,
    default_source: &str,
) -> Result<Vec<CleanedDocument>> {
    let mut normalized = Vec::with_capacity(documents.len());
    let mut token_seqs = Vec::with_capacity(documents.len());

    for doc in documents {
        let text = resources.normalizer.normalize(doc.raw_text.as_deref());
        token_seqs.push(resources.annotator.annotate(&text.aliased, doc.language)?);
        normalized.push(text);
    }

    let merged = resources.phrases.detect(&token_seqs);

    let cleaned: Vec<CleanedDocument> = documents
        .iter()
        .zip(normalized)
        .zip(merged)
        .map(|((doc, text), tokens)| CleanedDocument {
            id: doc.id.clone(),
            author: doc.author.clone(),
            timestamp: doc.timestamp.clone(),
            language: doc.language,
            source_tag: doc
                .source
                .clone()
                .unwrap_or_else(|| default_source.to_string()),
            raw_text: doc.raw_text.clone().unwrap_or_default(),
            raw_cleaned_text: text.raw_cleaned,
            normalized_text: tokens.join(" "),
        })
        .filter(|c| !c.normalized_text.is_empty())
        .collect();

    info!(
        documents = documents.len(),
        kept = cleaned.len(),
        dropped = documents.len() - cleaned.len(),
        "Cleaned documents"
    );
    Ok(cleaned)
}
