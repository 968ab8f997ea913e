// Density topic model.
//
// The number of topics is not fixed up front. Documents are grouped greedily:
// each one joins the existing group whose centroid it is most similar to, if
// that similarity clears the threshold, and otherwise starts a new group. One
// refinement pass then reassigns every document against the finished
// centroids. Groups too small to count as a topic become outliers.
//
// Surviving topics are numbered by size, largest first, from 0. A document's
// probability is its cosine similarity to its topic's centroid (0.0 for
// outliers).

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use super::traits::{Assignment, Grouper};
use crate::embeddings::vector::{cosine_similarity, l2_normalize, mean_embedding};
use crate::models::OUTLIER_TOPIC;

pub struct DensityTopicModel {
    /// Minimum cosine similarity for a document to join a group.
    pub similarity_threshold: f32,
    /// Groups smaller than this are relabelled as outliers.
    pub min_topic_size: usize,
}

impl Default for DensityTopicModel {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            min_topic_size: 3,
        }
    }
}

impl DensityTopicModel {
    pub fn new(similarity_threshold: f32, min_topic_size: usize) -> Self {
        Self {
            similarity_threshold,
            min_topic_size: min_topic_size.max(1),
        }
    }

    /// Best group for `v` among `centroids`, if any clears the threshold.
    fn best_match(&self, v: &[f32], centroids: &[Vec<f32>]) -> Option<usize> {
        centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, cosine_similarity(v, c)))
            .filter(|&(_, sim)| sim >= self.similarity_threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }
}

impl Grouper for DensityTopicModel {
    fn name(&self) -> &str {
        "density"
    }

    fn assign(&self, embeddings: &[Vec<f32>]) -> Result<Assignment> {
        let dim = embeddings.first().map(Vec::len).unwrap_or(0);
        let vectors: Vec<Vec<f32>> = embeddings
            .iter()
            .map(|e| {
                let mut v = e.clone();
                l2_normalize(&mut v);
                v
            })
            .collect();

        // Leader pass. Centroids are running sums; cosine ignores scale.
        let mut sums: Vec<Vec<f32>> = Vec::new();
        for v in &vectors {
            match self.best_match(v, &sums) {
                Some(g) => {
                    for (s, x) in sums[g].iter_mut().zip(v) {
                        *s += x;
                    }
                }
                None => sums.push(v.clone()),
            }
        }

        // Refinement pass against the finished centroids.
        let groups: Vec<Option<usize>> = vectors.iter().map(|v| self.best_match(v, &sums)).collect();

        let mut sizes: HashMap<usize, usize> = HashMap::new();
        let mut first_seen: HashMap<usize, usize> = HashMap::new();
        for (row, g) in groups.iter().enumerate() {
            if let Some(g) = g {
                *sizes.entry(*g).or_insert(0) += 1;
                first_seen.entry(*g).or_insert(row);
            }
        }

        let mut kept: Vec<usize> = sizes
            .iter()
            .filter(|&(_, &size)| size >= self.min_topic_size)
            .map(|(&g, _)| g)
            .collect();
        kept.sort_by(|a, b| sizes[b].cmp(&sizes[a]).then_with(|| first_seen[a].cmp(&first_seen[b])));
        let topic_of: HashMap<usize, i64> = kept
            .iter()
            .enumerate()
            .map(|(topic, &g)| (g, topic as i64))
            .collect();

        let labels: Vec<i64> = groups
            .iter()
            .map(|g| g.and_then(|g| topic_of.get(&g).copied()).unwrap_or(OUTLIER_TOPIC))
            .collect();

        let centroids: HashMap<i64, Vec<f32>> = (0..kept.len() as i64)
            .map(|topic| {
                let members: Vec<&Vec<f32>> = vectors
                    .iter()
                    .zip(&labels)
                    .filter(|&(_, &l)| l == topic)
                    .map(|(v, _)| v)
                    .collect();
                (topic, mean_embedding(&members, dim))
            })
            .collect();

        let probabilities: Vec<f64> = vectors
            .iter()
            .zip(&labels)
            .map(|(v, label)| match centroids.get(label) {
                Some(c) => cosine_similarity(v, c).clamp(0.0, 1.0) as f64,
                None => 0.0,
            })
            .collect();

        let outliers = labels.iter().filter(|&&l| l == OUTLIER_TOPIC).count();
        info!(
            documents = labels.len(),
            topics = kept.len(),
            outliers,
            "Density topic model finished"
        );

        Ok(Assignment {
            labels,
            probabilities: Some(probabilities),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(center: [f32; 3], n: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| {
                let jitter = 0.01 * i as f32;
                vec![center[0] + jitter, center[1], center[2] - jitter]
            })
            .collect()
    }

    #[test]
    fn test_two_blobs_two_topics_largest_first() {
        let mut embeddings = blob([0.0, 1.0, 0.0], 3);
        embeddings.extend(blob([1.0, 0.0, 0.0], 5));
        let a = DensityTopicModel::default().assign(&embeddings).unwrap();

        assert_eq!(&a.labels[..3], &[1, 1, 1]);
        assert_eq!(&a.labels[3..], &[0, 0, 0, 0, 0]);
        let probs = a.probabilities.unwrap();
        assert!(probs.iter().all(|&p| p > 0.9 && p <= 1.0));
    }

    #[test]
    fn test_small_groups_become_outliers() {
        let mut embeddings = blob([1.0, 0.0, 0.0], 4);
        embeddings.push(vec![0.0, 0.0, 1.0]);
        let a = DensityTopicModel::default().assign(&embeddings).unwrap();
        assert_eq!(a.labels, vec![0, 0, 0, 0, OUTLIER_TOPIC]);
        assert_eq!(a.probabilities.unwrap()[4], 0.0);
    }

    #[test]
    fn test_outlier_is_distinct_from_topics() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let a = DensityTopicModel::default().assign(&embeddings).unwrap();
        assert!(a.labels.iter().all(|&l| l == OUTLIER_TOPIC));
    }

    #[test]
    fn test_deterministic() {
        let mut embeddings = blob([0.0, 1.0, 0.0], 4);
        embeddings.extend(blob([1.0, 0.0, 0.0], 4));
        let model = DensityTopicModel::default();
        assert_eq!(model.assign(&embeddings).unwrap(), model.assign(&embeddings).unwrap());
    }
}
