// K-means clustering with k-means++ seeding.
//
// Every document gets one of `k` labels; there is no outlier label and no
// probability. The RNG is seeded so repeated runs over the same embeddings
// give the same clusters.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::traits::{Assignment, Grouper};
use crate::embeddings::vector::l2_normalize;

pub struct KMeans {
    pub k: usize,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(6)
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            max_iter: 100,
            seed: 42,
        }
    }

    /// k-means++: first centroid uniform, each next one drawn with
    /// probability proportional to squared distance from the nearest chosen.
    fn seed_centroids(&self, points: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
        let mut centroids = vec![points[rng.random_range(0..points.len())].clone()];

        while centroids.len() < k {
            let weights: Vec<f64> = points
                .iter()
                .map(|p| nearest(p, &centroids).1 as f64)
                .collect();
            let total: f64 = weights.iter().sum();

            let next = if total <= f64::EPSILON {
                // Every point sits on a centroid already; take the first unused one.
                points
                    .iter()
                    .position(|p| !centroids.contains(p))
                    .unwrap_or(0)
            } else {
                let mut target = rng.random::<f64>() * total;
                let mut chosen = points.len() - 1;
                for (i, w) in weights.iter().enumerate() {
                    if target < *w {
                        chosen = i;
                        break;
                    }
                    target -= w;
                }
                chosen
            };
            centroids.push(points[next].clone());
        }
        centroids
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// (index, squared distance) of the closest centroid.
fn nearest(p: &[f32], centroids: &[Vec<f32>]) -> (usize, f32) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(p, c)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or((0, 0.0))
}

impl Grouper for KMeans {
    fn name(&self) -> &str {
        "kmeans"
    }

    fn assign(&self, embeddings: &[Vec<f32>]) -> Result<Assignment> {
        let points: Vec<Vec<f32>> = embeddings
            .iter()
            .map(|e| {
                let mut v = e.clone();
                l2_normalize(&mut v);
                v
            })
            .collect();
        let k = self.k.min(points.len());
        let dim = points[0].len();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = self.seed_centroids(&points, k, &mut rng);
        let mut labels: Vec<usize> = points.iter().map(|p| nearest(p, &centroids).0).collect();

        let mut iterations = 0;
        for _ in 0..self.max_iter {
            iterations += 1;

            let mut sums = vec![vec![0.0_f32; dim]; k];
            let mut counts = vec![0usize; k];
            for (p, &l) in points.iter().zip(&labels) {
                counts[l] += 1;
                for (s, x) in sums[l].iter_mut().zip(p) {
                    *s += x;
                }
            }
            for (c, (sum, count)) in centroids.iter_mut().zip(sums.into_iter().zip(&counts)) {
                // An emptied cluster keeps its previous centroid.
                if *count > 0 {
                    *c = sum.into_iter().map(|s| s / *count as f32).collect();
                }
            }

            let next: Vec<usize> = points.iter().map(|p| nearest(p, &centroids).0).collect();
            if next == labels {
                break;
            }
            labels = next;
        }

        debug!(iterations, k, "k-means converged");
        info!(documents = labels.len(), clusters = k, "k-means clustering finished");

        Ok(Assignment {
            labels: labels.into_iter().map(|l| l as i64).collect(),
            probabilities: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0],
            vec![0.95, 0.05],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.05, 0.95],
            vec![0.1, 0.9],
        ]
    }

    #[test]
    fn test_separates_two_groups() {
        let a = KMeans::new(2).assign(&points()).unwrap();
        assert!(a.probabilities.is_none());
        assert_eq!(a.labels[0], a.labels[1]);
        assert_eq!(a.labels[1], a.labels[2]);
        assert_eq!(a.labels[3], a.labels[4]);
        assert_eq!(a.labels[4], a.labels[5]);
        assert_ne!(a.labels[0], a.labels[3]);
    }

    #[test]
    fn test_k_clamped_to_document_count() {
        let a = KMeans::new(6).assign(&points()[..2]).unwrap();
        assert_eq!(a.labels.len(), 2);
        assert!(a.labels.iter().all(|&l| (0..2).contains(&l)));
    }

    #[test]
    fn test_no_outlier_labels() {
        let a = KMeans::default().assign(&points()).unwrap();
        assert!(a.labels.iter().all(|&l| l >= 0));
    }

    #[test]
    fn test_seeded_runs_match() {
        let km = KMeans::new(3);
        assert_eq!(km.assign(&points()).unwrap(), km.assign(&points()).unwrap());
    }

    #[test]
    fn test_duplicate_points() {
        let same = vec![vec![1.0, 0.0]; 4];
        let a = KMeans::new(3).assign(&same).unwrap();
        assert_eq!(a.labels.len(), 4);
    }
}
