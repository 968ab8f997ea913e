// Score stage: cleaned.csv (+ embeddings when present) -> sentiments.csv.

use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, warn};

use super::runner::{Resources, StageReport};
use super::Stage;
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::CleanedDocument;
use crate::sentiment::SentimentScorer;
use crate::store::tables::{join_locations, read_table, write_table, SentimentRow};
use crate::store::{Artifact, DataDir, StoredEmbeddings};

pub async fn run(data: &DataDir, config: &Config, resources: &Resources) -> Result<StageReport> {
    let cleaned: Vec<CleanedDocument> = read_table(&data.path(Artifact::Cleaned))?;
    if cleaned.is_empty() {
        return Err(PipelineError::empty(Stage::Score.name()).into());
    }

    let embeddings = if data.exists(Artifact::Embeddings) {
        let stored = StoredEmbeddings::load(&data.path(Artifact::Embeddings))?;
        let known: HashSet<&str> = stored.ids.iter().map(String::as_str).collect();
        let missing = cleaned.iter().filter(|d| !known.contains(d.id.as_str())).count();
        if missing > 0 {
            // Embeddings predate the latest clean; semaxis waits for a re-embed.
            warn!(missing, "Embeddings are stale, skipping the semaxis column");
            None
        } else {
            let ids: Vec<String> = cleaned.iter().map(|d| d.id.clone()).collect();
            Some(stored.aligned_to(&ids)?)
        }
    } else {
        debug!("No embeddings yet, skipping the semaxis column");
        None
    };

    let scorer = SentimentScorer {
        classifier: resources.classifier.as_ref(),
        tagger: resources.tagger.as_ref(),
        gazetteer: &resources.gazetteer,
        semaxis: resources.semaxis.as_ref(),
        concurrency: config.concurrency,
    };
    let scored = scorer.score_all(&cleaned, embeddings.as_deref()).await?;

    let rows: Vec<SentimentRow> = cleaned
        .into_iter()
        .zip(scored)
        .map(|(doc, s)| SentimentRow {
            id: doc.id,
            text: doc.raw_cleaned_text,
            sentiment: s.label,
            score: s.score,
            user: doc.author,
            timestamp: doc.timestamp,
            locations: join_locations(&s.locations),
            semaxis: s.semaxis,
        })
        .collect();

    write_table(&data.path(Artifact::Sentiments), &rows)?;
    Ok(StageReport::new(Stage::Score, rows.len()))
}
