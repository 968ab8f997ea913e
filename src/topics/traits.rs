// Grouper trait — swap-ready abstraction over topic and cluster algorithms.
//
// Both strategies take one embedding per document and return one label per
// document. The density topic model may also emit the outlier label and a
// membership probability; k-means never does either.

use std::collections::BTreeMap;

use anyhow::Result;

use super::keywords::ctfidf_keywords;
use crate::embeddings::vector::{cosine_similarity, mean_embedding};
use crate::error::PipelineError;
use crate::models::TopicSummary;

/// Labels (and optionally probabilities) for a set of embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub labels: Vec<i64>,
    pub probabilities: Option<Vec<f64>>,
}

/// Trait for grouping embeddings into labelled sets.
pub trait Grouper: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Label every row of `embeddings`. Implementations may assume the input
    /// is non-empty and of constant width; `group` checks both.
    fn assign(&self, embeddings: &[Vec<f32>]) -> Result<Assignment>;
}

/// A finished grouping: labels, probabilities and one summary per label.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub labels: Vec<i64>,
    pub probabilities: Option<Vec<f64>>,
    /// Sorted by label, the outlier label first when present.
    pub summaries: Vec<TopicSummary>,
    /// Row index of each label's representative document.
    pub representative_rows: BTreeMap<i64, usize>,
}

impl Grouping {
    /// Swap each summary's representative for the matching entry of
    /// `examples`, which must be row-aligned with the grouped input.
    pub fn attach_examples(&mut self, examples: &[String]) {
        for summary in &mut self.summaries {
            if let Some(&row) = self.representative_rows.get(&summary.topic) {
                summary.representative = examples.get(row).cloned();
            }
        }
    }

    /// Number of distinct labels, not counting the outlier label.
    pub fn topic_count(&self) -> usize {
        self.summaries.iter().filter(|s| s.topic >= 0).count()
    }
}

/// Run `grouper` over the corpus and describe each resulting group.
///
/// `texts` supply keywords and default representatives; they must be
/// row-aligned with `embeddings`.
pub fn group(
    grouper: &dyn Grouper,
    stage: &str,
    texts: &[String],
    embeddings: &[Vec<f32>],
    top_keywords: usize,
) -> Result<Grouping> {
    check_inputs(stage, texts, embeddings)?;

    let Assignment {
        labels,
        probabilities,
    } = grouper.assign(embeddings)?;

    if labels.len() != texts.len() {
        return Err(PipelineError::Misaligned {
            left: "texts".into(),
            right: format!("{} labels", grouper.name()),
            detail: format!("{} texts, {} labels", texts.len(), labels.len()),
        }
        .into());
    }

    let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        members.entry(label).or_default().push(row);
    }

    let dim = embeddings[0].len();
    let mut keywords = ctfidf_keywords(&labels, texts, top_keywords);
    let mut summaries = Vec::with_capacity(members.len());
    let mut representative_rows = BTreeMap::new();

    for (label, rows) in &members {
        let vectors: Vec<&Vec<f32>> = rows.iter().map(|&r| &embeddings[r]).collect();
        let centroid = mean_embedding(&vectors, dim);
        let best = rows
            .iter()
            .copied()
            .max_by(|&a, &b| {
                cosine_similarity(&embeddings[a], &centroid)
                    .partial_cmp(&cosine_similarity(&embeddings[b], &centroid))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.cmp(&a))
            })
            .unwrap_or(rows[0]);
        representative_rows.insert(*label, best);

        summaries.push(TopicSummary {
            topic: *label,
            size: rows.len(),
            keywords: keywords.remove(label).unwrap_or_default(),
            keywords_translated: None,
            representative: Some(texts[best].clone()),
        });
    }

    Ok(Grouping {
        labels,
        probabilities,
        summaries,
        representative_rows,
    })
}

/// Reject empty or misaligned grouping input.
pub fn check_inputs(stage: &str, texts: &[String], embeddings: &[Vec<f32>]) -> Result<()> {
    if texts.is_empty() || embeddings.is_empty() {
        return Err(PipelineError::empty(stage).into());
    }
    if texts.len() != embeddings.len() {
        return Err(PipelineError::Misaligned {
            left: "texts".into(),
            right: "embeddings".into(),
            detail: format!("{} texts, {} embeddings", texts.len(), embeddings.len()),
        }
        .into());
    }
    let dim = embeddings[0].len();
    if embeddings.iter().any(|e| e.len() != dim) {
        return Err(PipelineError::Misaligned {
            left: "embeddings".into(),
            right: "embeddings".into(),
            detail: "vectors differ in width".into(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Halves;

    impl Grouper for Halves {
        fn name(&self) -> &str {
            "halves"
        }

        fn assign(&self, embeddings: &[Vec<f32>]) -> Result<Assignment> {
            let n = embeddings.len();
            Ok(Assignment {
                labels: (0..n).map(|i| if i < n / 2 { 0 } else { 1 }).collect(),
                probabilities: None,
            })
        }
    }

    #[test]
    fn test_group_builds_summaries() {
        let texts: Vec<String> = ["metro lento", "metro hoy", "bici ruta", "bici carril"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let embeddings = vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0], vec![0.1, 0.9]];
        let mut grouping = group(&Halves, "test", &texts, &embeddings, 3).unwrap();

        assert_eq!(grouping.labels, vec![0, 0, 1, 1]);
        assert_eq!(grouping.summaries.len(), 2);
        assert_eq!(grouping.summaries[0].size, 2);
        assert_eq!(grouping.summaries[0].keywords[0], "metro");
        assert_eq!(grouping.topic_count(), 2);

        let raw: Vec<String> = (0..4).map(|i| format!("raw {i}")).collect();
        grouping.attach_examples(&raw);
        assert!(grouping.summaries[1]
            .representative
            .as_deref()
            .is_some_and(|r| r == "raw 2" || r == "raw 3"));
    }

    #[test]
    fn test_empty_input_is_empty_corpus() {
        let err = group(&Halves, "topics", &[], &[], 3).unwrap_err();
        assert!(matches!(
            crate::error::find_pipeline_error(&err),
            Some(PipelineError::EmptyCorpus { .. })
        ));
    }

    #[test]
    fn test_length_mismatch_is_misaligned() {
        let err = check_inputs("topics", &["a".to_string()], &[vec![1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(
            crate::error::find_pipeline_error(&err),
            Some(PipelineError::Misaligned { .. })
        ));
    }
}
