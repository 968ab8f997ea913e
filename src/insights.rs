// Insight aggregation over the final tables.
//
// Two read-only views: `summary` is a quick look at clusters.csv, and
// `generate` builds the per-topic dashboard view from results.csv plus the
// optional topic_info.json and mentions.json side files.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use serde::Serialize;

use crate::models::{Language, MentionStats, TopicSummary, OUTLIER_TOPIC};
use crate::store::tables::{read_json, read_table, split_locations, ClusterRow, ResultRow};
use crate::store::{Artifact, DataDir};
use crate::topics::keywords::corpus_keywords;

/// Rows included in `Summary::sample`.
pub const SAMPLE_ROWS: usize = 5;

/// `GET /insights/summary`
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_messages: usize,
    /// Distinct topics, not counting the outlier label.
    pub topics: usize,
    pub clusters: usize,
    pub sample: Vec<ClusterRow>,
}

pub fn summary(data: &DataDir) -> Result<Summary> {
    let rows: Vec<ClusterRow> = read_table(&data.path(Artifact::Clusters))?;

    let topics: BTreeSet<i64> = rows
        .iter()
        .map(|r| r.topic)
        .filter(|&t| t != OUTLIER_TOPIC)
        .collect();
    let clusters: BTreeSet<i64> = rows.iter().map(|r| r.cluster).collect();

    Ok(Summary {
        total_messages: rows.len(),
        topics: topics.len(),
        clusters: clusters.len(),
        sample: rows.into_iter().take(SAMPLE_ROWS).collect(),
    })
}

/// One topic's row in the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopicInsight {
    /// None for documents that never reached the topic stage.
    pub topic: Option<i64>,
    pub total: usize,
    pub primary: usize,
    pub secondary: usize,
    /// Share of secondary-language posts, in percent.
    pub secondary_share: f64,
    /// Mean signed sentiment over scored members; 0.0 if none were scored.
    pub mean_sentiment: f64,
    pub keywords: Vec<String>,
}

/// `GET /insights/`
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub total_messages: usize,
    /// Sorted by mean sentiment, most negative first.
    pub topics: Vec<TopicInsight>,
    pub languages: BTreeMap<String, usize>,
    pub mean_sentiment: Option<f64>,
    pub top_keywords: Vec<(String, f32)>,
    pub top_locations: Vec<(String, usize)>,
    pub top_mentions: Vec<(String, u32)>,
    pub top_hashtags: Vec<(String, u32)>,
}

#[derive(Default)]
struct Tally {
    total: usize,
    primary: usize,
    secondary: usize,
    sentiment_sum: f64,
    sentiment_count: usize,
}

/// Aggregate results.csv into the dashboard view, keeping `top_n` entries
/// in each ranked list.
pub fn generate(data: &DataDir, top_n: usize) -> Result<Insights> {
    let rows: Vec<ResultRow> = read_table(&data.path(Artifact::Results))?;

    let topic_keywords: HashMap<i64, Vec<String>> = if data.exists(Artifact::TopicInfo) {
        read_json::<Vec<TopicSummary>>(&data.path(Artifact::TopicInfo))?
            .into_iter()
            .map(|s| (s.topic, s.keywords_translated.unwrap_or(s.keywords)))
            .collect()
    } else {
        HashMap::new()
    };

    let mentions: MentionStats = if data.exists(Artifact::Mentions) {
        read_json(&data.path(Artifact::Mentions))?
    } else {
        MentionStats::default()
    };

    let mut tallies: BTreeMap<Option<i64>, Tally> = BTreeMap::new();
    let mut languages: BTreeMap<String, usize> = BTreeMap::new();
    let mut locations: HashMap<String, usize> = HashMap::new();

    for row in &rows {
        let tally = tallies.entry(row.topic).or_default();
        tally.total += 1;
        match row.lang {
            Language::Spanish => tally.primary += 1,
            Language::German => tally.secondary += 1,
            Language::Unsupported => {}
        }
        if let Some(score) = row.score {
            tally.sentiment_sum += score;
            tally.sentiment_count += 1;
        }

        *languages.entry(row.lang.to_string()).or_insert(0) += 1;
        for place in split_locations(&row.locations) {
            *locations.entry(place).or_insert(0) += 1;
        }
    }

    let mut topics: Vec<TopicInsight> = tallies
        .into_iter()
        .map(|(topic, t)| TopicInsight {
            topic,
            total: t.total,
            primary: t.primary,
            secondary: t.secondary,
            secondary_share: percent(t.secondary, t.total),
            mean_sentiment: if t.sentiment_count > 0 {
                t.sentiment_sum / t.sentiment_count as f64
            } else {
                0.0
            },
            keywords: topic
                .and_then(|id| topic_keywords.get(&id).cloned())
                .unwrap_or_default(),
        })
        .collect();
    topics.sort_by(|a, b| {
        a.mean_sentiment
            .partial_cmp(&b.mean_sentiment)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.topic.cmp(&b.topic))
    });

    let scores: Vec<f64> = rows.iter().filter_map(|r| r.score).collect();
    let mean_sentiment =
        (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);

    let texts: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
    let top_keywords = corpus_keywords(&texts, top_n);

    let mut top_locations: Vec<(String, usize)> = locations.into_iter().collect();
    top_locations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_locations.truncate(top_n);

    Ok(Insights {
        total_messages: rows.len(),
        topics,
        languages,
        mean_sentiment,
        top_keywords,
        top_locations,
        top_mentions: mentions.mentions.into_iter().take(top_n).collect(),
        top_hashtags: mentions.hashtags.into_iter().take(top_n).collect(),
    })
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tables::write_table;

    fn result(
        id: &str,
        lang: Language,
        topic: Option<i64>,
        score: Option<f64>,
        places: &str,
    ) -> ResultRow {
        ResultRow {
            id: id.to_string(),
            user: "ana".to_string(),
            timestamp: "2024-01-01".to_string(),
            lang,
            text: format!("el metro {id} llega tarde otra vez"),
            topic,
            probability: None,
            cluster: None,
            sentiment: score.map(|s| if s < 0.0 { "NEGATIVE" } else { "POSITIVE" }.to_string()),
            score,
            semaxis: None,
            locations: places.to_string(),
        }
    }

    #[test]
    fn test_summary_counts_distinct_labels() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::new(dir.path());
        let rows: Vec<ClusterRow> = (0..7)
            .map(|i| ClusterRow {
                id: i.to_string(),
                text: "metro".to_string(),
                topic: if i == 0 { OUTLIER_TOPIC } else { i % 2 },
                probability: None,
                cluster: i % 3,
            })
            .collect();
        write_table(&data.path(Artifact::Clusters), &rows).unwrap();

        let s = summary(&data).unwrap();
        assert_eq!(s.total_messages, 7);
        assert_eq!(s.topics, 2);
        assert_eq!(s.clusters, 3);
        assert_eq!(s.sample.len(), SAMPLE_ROWS);
        assert_eq!(s.sample[0].id, "0");
    }

    #[test]
    fn test_generate_per_topic_tallies() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::new(dir.path());
        let rows = vec![
            result("1", Language::Spanish, Some(0), Some(-0.8), "Pantitlán"),
            result("2", Language::German, Some(0), Some(-0.4), "Pantitlán;Zócalo"),
            result("3", Language::Spanish, Some(1), Some(0.9), ""),
            result("4", Language::Spanish, None, None, ""),
        ];
        write_table(&data.path(Artifact::Results), &rows).unwrap();

        let insights = generate(&data, 5).unwrap();
        assert_eq!(insights.total_messages, 4);
        assert_eq!(insights.languages.get("es"), Some(&3));
        assert_eq!(insights.languages.get("de"), Some(&1));

        let first = &insights.topics[0];
        assert_eq!(first.topic, Some(0));
        assert_eq!(first.total, 2);
        assert_eq!(first.secondary, 1);
        assert!((first.secondary_share - 50.0).abs() < 1e-9);
        assert!((first.mean_sentiment + 0.6).abs() < 1e-9);

        assert_eq!(insights.top_locations[0], ("Pantitlán".to_string(), 2));
        assert!(insights.top_mentions.is_empty());
        assert!(insights.mean_sentiment.is_some());
    }

    #[test]
    fn test_generate_requires_results() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate(&DataDir::new(dir.path()), 5).unwrap_err();
        assert!(matches!(
            crate::error::find_pipeline_error(&err),
            Some(crate::error::PipelineError::MissingInput { .. })
        ));
    }
}
