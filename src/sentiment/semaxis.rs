// SemAxis polarity projection.
//
// For each language, the negative and positive seed phrases are embedded and
// averaged into two poles. A document's score is the position of its
// embedding along the pole-to-pole axis:
//
//   score = (e - neg) · (pos - neg) / |pos - neg|²
//
// 0 sits at the negative pole, 1 at the positive one. Values outside [0, 1]
// are possible and kept.

use std::collections::HashMap;

use anyhow::Result;
use tracing::debug;

use super::seeds::seeds_for;
use crate::embeddings::vector::{dot, l2_normalize, mean_embedding};
use crate::embeddings::Embedder;
use crate::models::Language;

#[derive(Debug, Clone)]
struct Axis {
    negative: Vec<f32>,
    direction: Vec<f32>,
    length_sq: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SemAxis {
    axes: HashMap<Language, Axis>,
}

impl SemAxis {
    /// Embed the seed lists with `embedder` and build one axis per language.
    pub async fn build(embedder: &dyn Embedder) -> Result<Self> {
        let mut axes = HashMap::new();

        for language in [Language::Spanish, Language::German] {
            let Some((neg, pos)) = seeds_for(language) else {
                continue;
            };
            let negative = pole(embedder, &neg).await?;
            let positive = pole(embedder, &pos).await?;
            if let Some(axis) = Axis::between(negative, positive) {
                axes.insert(language, axis);
            }
        }

        debug!(languages = axes.len(), embedder = embedder.name(), "Built SemAxis poles");
        Ok(Self { axes })
    }

    /// Build directly from pole vectors.
    pub fn from_poles(poles: Vec<(Language, Vec<f32>, Vec<f32>)>) -> Self {
        let axes = poles
            .into_iter()
            .filter_map(|(lang, neg, pos)| Axis::between(neg, pos).map(|a| (lang, a)))
            .collect();
        Self { axes }
    }

    /// Projection of `embedding` on the axis for `language`, if one exists.
    pub fn score(&self, embedding: &[f32], language: Language) -> Option<f64> {
        let axis = self.axes.get(&language)?;
        if embedding.len() != axis.direction.len() {
            return None;
        }
        let offset: Vec<f32> = embedding
            .iter()
            .zip(&axis.negative)
            .map(|(e, n)| e - n)
            .collect();
        Some((dot(&offset, &axis.direction) / axis.length_sq) as f64)
    }
}

impl Axis {
    fn between(negative: Vec<f32>, positive: Vec<f32>) -> Option<Self> {
        let direction: Vec<f32> = positive.iter().zip(&negative).map(|(p, n)| p - n).collect();
        let length_sq = dot(&direction, &direction);
        (length_sq > f32::EPSILON).then_some(Self {
            negative,
            direction,
            length_sq,
        })
    }
}

async fn pole(embedder: &dyn Embedder, seeds: &[String]) -> Result<Vec<f32>> {
    let mut vectors = embedder.embed_batch(seeds).await?;
    for v in &mut vectors {
        l2_normalize(v);
    }
    Ok(mean_embedding(&vectors, embedder.dim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;

    #[test]
    fn test_poles_score_zero_and_one() {
        let axis = SemAxis::from_poles(vec![(Language::Spanish, vec![0.0, 1.0], vec![1.0, 0.0])]);
        assert_eq!(axis.score(&[0.0, 1.0], Language::Spanish), Some(0.0));
        assert_eq!(axis.score(&[1.0, 0.0], Language::Spanish), Some(1.0));
        assert_eq!(axis.score(&[0.5, 0.5], Language::Spanish), Some(0.5));
    }

    #[test]
    fn test_missing_language_or_width() {
        let axis = SemAxis::from_poles(vec![(Language::Spanish, vec![0.0, 1.0], vec![1.0, 0.0])]);
        assert_eq!(axis.score(&[0.0, 1.0], Language::German), None);
        assert_eq!(axis.score(&[0.0, 1.0, 0.0], Language::Spanish), None);
    }

    #[test]
    fn test_degenerate_axis_dropped() {
        let axis = SemAxis::from_poles(vec![(Language::Spanish, vec![1.0], vec![1.0])]);
        assert_eq!(axis.score(&[1.0], Language::Spanish), None);
    }

    #[tokio::test]
    async fn test_build_with_hashing_embedder() {
        let embedder = HashingEmbedder::default();
        let axis = SemAxis::build(&embedder).await.unwrap();
        let neg = embedder.embed_one("lento sucio inseguro");
        let pos = embedder.embed_one("rápido limpio seguro");
        let s_neg = axis.score(&neg, Language::Spanish).unwrap();
        let s_pos = axis.score(&pos, Language::Spanish).unwrap();
        assert!(s_pos > s_neg);
    }
}
