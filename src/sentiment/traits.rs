// Polarity classifier trait and the sign convention for stored scores.

use anyhow::Result;
use async_trait::async_trait;

pub const POSITIVE: &str = "POSITIVE";
pub const NEGATIVE: &str = "NEGATIVE";
pub const NEUTRAL: &str = "NEUTRAL";

/// A classifier's verdict on one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Polarity {
    /// POSITIVE, NEGATIVE, NEUTRAL or whatever else the model emits.
    pub label: String,
    /// Non-negative confidence in the label.
    pub confidence: f64,
}

impl Polarity {
    pub fn new(label: &str, confidence: f64) -> Self {
        Self {
            label: label.to_string(),
            confidence,
        }
    }
}

/// The stored sentiment score for a verdict.
///
/// NEGATIVE negates the confidence, POSITIVE keeps it, and any other label
/// (neutral included) scores 0.0. The result is clamped to [-1, 1].
pub fn signed_score(polarity: &Polarity) -> f64 {
    let magnitude = polarity.confidence.abs();
    let score = if polarity.label.eq_ignore_ascii_case(NEGATIVE) {
        -magnitude
    } else if polarity.label.eq_ignore_ascii_case(POSITIVE) {
        magnitude
    } else {
        0.0
    };
    score.clamp(-1.0, 1.0)
}

/// Trait for sentiment classifiers. Async for the same reason as the
/// embedder: ONNX inference runs on a blocking thread.
#[async_trait]
pub trait PolarityClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Polarity>;

    /// Classify several texts, returning verdicts in input order.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Polarity>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify(text).await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_is_negated() {
        assert_eq!(signed_score(&Polarity::new(NEGATIVE, 0.82)), -0.82);
    }

    #[test]
    fn test_positive_is_kept() {
        assert_eq!(signed_score(&Polarity::new(POSITIVE, 0.91)), 0.91);
    }

    #[test]
    fn test_neutral_and_unknown_are_zero() {
        assert_eq!(signed_score(&Polarity::new(NEUTRAL, 0.99)), 0.0);
        assert_eq!(signed_score(&Polarity::new("MIXED", 0.5)), 0.0);
    }

    #[test]
    fn test_clamped_and_case_insensitive() {
        assert_eq!(signed_score(&Polarity::new("negative", 1.7)), -1.0);
    }
}
