// Merge stage: join every per-document table on id into results.csv.
//
// cleaned.csv is the spine. Topic, cluster and sentiment columns are filled
// from whichever of those tables exist, and left empty otherwise.

use std::collections::HashMap;

use anyhow::Result;
use serde::de::DeserializeOwned;
use tracing::info;

use super::runner::StageReport;
use super::Stage;
use crate::models::CleanedDocument;
use crate::store::tables::{
    read_table, write_table, ClusterRow, ResultRow, SentimentRow, TopicRow,
};
use crate::store::{Artifact, DataDir};

pub fn run(data: &DataDir) -> Result<StageReport> {
    let cleaned: Vec<CleanedDocument> = read_table(&data.path(Artifact::Cleaned))?;

    let topics: HashMap<String, TopicRow> = read_optional::<TopicRow>(data, Artifact::Topics)?
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();
    let clusters: HashMap<String, i64> = read_optional::<ClusterRow>(data, Artifact::Clusters)?
        .into_iter()
        .map(|r| (r.id, r.cluster))
        .collect();
    let mut sentiments: HashMap<String, SentimentRow> =
        read_optional::<SentimentRow>(data, Artifact::Sentiments)?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

    let rows: Vec<ResultRow> = cleaned
        .into_iter()
        .map(|doc| {
            let topic = topics.get(&doc.id);
            let sentiment = sentiments.remove(&doc.id);
            ResultRow {
                topic: topic.map(|t| t.topic),
                probability: topic.and_then(|t| t.probability),
                cluster: clusters.get(&doc.id).copied(),
                sentiment: sentiment.as_ref().map(|s| s.sentiment.clone()),
                score: sentiment.as_ref().map(|s| s.score),
                semaxis: sentiment.as_ref().and_then(|s| s.semaxis),
                locations: sentiment.map(|s| s.locations).unwrap_or_default(),
                id: doc.id,
                user: doc.author,
                timestamp: doc.timestamp,
                lang: doc.language,
                text: doc.raw_text,
            }
        })
        .collect();

    write_table(&data.path(Artifact::Results), &rows)?;
    info!(
        documents = rows.len(),
        with_topic = rows.iter().filter(|r| r.topic.is_some()).count(),
        with_sentiment = rows.iter().filter(|r| r.sentiment.is_some()).count(),
        "Merged results"
    );
    Ok(StageReport::new(Stage::Merge, rows.len()))
}

fn read_optional<T: DeserializeOwned>(data: &DataDir, artifact: Artifact) -> Result<Vec<T>> {
    if data.exists(artifact) {
        read_table(&data.path(artifact))
    } else {
        Ok(Vec::new())
    }
}
