// Grouping stages.
//
// topics:  cleaned.csv + embeddings -> topics.csv + topic_info.json
// cluster: topics.csv + embeddings  -> clusters.csv
//
// Embeddings are looked up by document id, never by row position.

use anyhow::Result;
use tracing::{debug, info};

use super::runner::{Resources, StageReport};
use super::Stage;
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::CleanedDocument;
use crate::store::tables::{read_table, write_json, write_table, ClusterRow, TopicRow};
use crate::store::{Artifact, DataDir, StoredEmbeddings};
use crate::topics::{group, translate_keywords, DensityTopicModel, KMeans};

pub async fn run_topics(
    data: &DataDir,
    config: &Config,
    resources: &Resources,
) -> Result<StageReport> {
    let cleaned: Vec<CleanedDocument> = read_table(&data.path(Artifact::Cleaned))?;
    let ids: Vec<String> = cleaned.iter().map(|d| d.id.clone()).collect();
    let vectors = StoredEmbeddings::load(&data.path(Artifact::Embeddings))?.aligned_to(&ids)?;
    let texts: Vec<String> = cleaned.iter().map(|d| d.normalized_text.clone()).collect();

    let model = DensityTopicModel::new(config.topic_threshold, config.min_topic_size);
    let mut grouping = group(
        &model,
        Stage::Topics.name(),
        &texts,
        &vectors,
        config.top_keywords,
    )?;

    let raw: Vec<String> = cleaned.iter().map(|d| d.raw_text.clone()).collect();
    grouping.attach_examples(&raw);

    if let Some(translator) = &resources.translator {
        for summary in &mut grouping.summaries {
            let translated =
                translate_keywords(translator.as_ref(), &summary.keywords, &config.translate_target)
                    .await;
            summary.keywords_translated = Some(translated);
        }
    }

    let rows: Vec<TopicRow> = cleaned
        .into_iter()
        .enumerate()
        .map(|(i, doc)| TopicRow {
            id: doc.id,
            text: doc.normalized_text,
            topic: grouping.labels[i],
            probability: grouping.probabilities.as_ref().map(|p| p[i]),
        })
        .collect();

    write_table(&data.path(Artifact::Topics), &rows)?;
    write_json(&data.path(Artifact::TopicInfo), &grouping.summaries)?;

    let topics = grouping.topic_count();
    info!(
        documents = rows.len(),
        topics,
        outliers = grouping.labels.iter().filter(|&&l| l < 0).count(),
        "Assigned topics"
    );
    Ok(StageReport::new(Stage::Topics, rows.len()).with_groups(topics))
}

pub fn run_clusters(data: &DataDir, config: &Config) -> Result<StageReport> {
    let topics: Vec<TopicRow> = read_table(&data.path(Artifact::Topics))?;
    if topics.is_empty() {
        return Err(PipelineError::empty(Stage::Cluster.name()).into());
    }

    let ids: Vec<String> = topics.iter().map(|r| r.id.clone()).collect();
    let vectors = StoredEmbeddings::load(&data.path(Artifact::Embeddings))?.aligned_to(&ids)?;
    let texts: Vec<String> = topics.iter().map(|r| r.text.clone()).collect();

    let kmeans = KMeans::new(config.clusters);
    let grouping = group(
        &kmeans,
        Stage::Cluster.name(),
        &texts,
        &vectors,
        config.top_keywords,
    )?;

    for summary in &grouping.summaries {
        debug!(
            cluster = summary.topic,
            size = summary.size,
            keywords = %summary.keywords.join(", "),
            "Cluster"
        );
    }

    let rows: Vec<ClusterRow> = topics
        .into_iter()
        .zip(&grouping.labels)
        .map(|(row, &cluster)| ClusterRow {
            id: row.id,
            text: row.text,
            topic: row.topic,
            probability: row.probability,
            cluster,
        })
        .collect();

    write_table(&data.path(Artifact::Clusters), &rows)?;

    let clusters = grouping.summaries.len();
    info!(documents = rows.len(), clusters, "Assigned clusters");
    Ok(StageReport::new(Stage::Cluster, rows.len()).with_groups(clusters))
}
