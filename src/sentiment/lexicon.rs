// Lexicon polarity classifier.
//
// Counts whole-word hits of the positive and negative seed phrases (both
// languages at once) and votes. A hit with a negator ("no", "nicht", ...)
// among the two words before it counts for the opposite side. Used when the
// ONNX sentiment model is not downloaded.

use aho_corasick::{AhoCorasick, MatchKind};
use anyhow::{Context, Result};
use async_trait::async_trait;

use super::seeds::{NEGATIVE_DE, NEGATIVE_ES, POSITIVE_DE, POSITIVE_ES};
use super::traits::{Polarity, PolarityClassifier, NEGATIVE, NEUTRAL, POSITIVE};

const NEGATORS: &[&str] = &["no", "nunca", "jamás", "nicht", "kein", "keine", "nie"];

/// How many preceding words a negator may sit in front of a hit.
const NEGATION_WINDOW: usize = 2;

pub struct LexiconClassifier {
    matcher: AhoCorasick,
    /// true for positive seeds, by pattern id.
    positive: Vec<bool>,
}

impl LexiconClassifier {
    pub fn new() -> Result<Self> {
        let mut patterns = Vec::new();
        let mut positive = Vec::new();
        for (list, is_pos) in [
            (NEGATIVE_ES, false),
            (NEGATIVE_DE, false),
            (POSITIVE_ES, true),
            (POSITIVE_DE, true),
        ] {
            for seed in list {
                patterns.push(seed.replace('_', " ").to_lowercase());
                positive.push(is_pos);
            }
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .context("Failed to build sentiment lexicon matcher")?;

        Ok(Self { matcher, positive })
    }

    /// (positive hits, negative hits) in `text`.
    pub fn count_hits(&self, text: &str) -> (usize, usize) {
        let lower = text.to_lowercase();
        let mut pos = 0;
        let mut neg = 0;

        for m in self.matcher.find_iter(&lower) {
            if !is_word_boundary(&lower, m.start(), m.end()) {
                continue;
            }
            let mut is_pos = self.positive[m.pattern().as_usize()];
            let negated = lower[..m.start()]
                .split_whitespace()
                .rev()
                .take(NEGATION_WINDOW)
                .any(|w| NEGATORS.contains(&w));
            if negated {
                is_pos = !is_pos;
            }
            if is_pos {
                pos += 1;
            } else {
                neg += 1;
            }
        }
        (pos, neg)
    }
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    !is_word(before) && !is_word(after)
}

#[async_trait]
impl PolarityClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Polarity> {
        let (pos, neg) = self.count_hits(text);
        let total = (pos + neg) as f64;
        Ok(if pos > neg {
            Polarity::new(POSITIVE, pos as f64 / total)
        } else if neg > pos {
            Polarity::new(NEGATIVE, neg as f64 / total)
        } else {
            Polarity::new(NEUTRAL, if total == 0.0 { 1.0 } else { 0.5 })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_negative_text() {
        let c = LexiconClassifier::new().unwrap();
        let p = c.classify("el metro va lento y sucio otra vez").await.unwrap();
        assert_eq!(p.label, NEGATIVE);
        assert_eq!(p.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_german_positive() {
        let c = LexiconClassifier::new().unwrap();
        let p = c.classify("Die Bahn war pünktlich und sauber").await.unwrap();
        assert_eq!(p.label, POSITIVE);
    }

    #[tokio::test]
    async fn test_no_hits_is_neutral() {
        let c = LexiconClassifier::new().unwrap();
        let p = c.classify("hoy tomé el metrobús").await.unwrap();
        assert_eq!(p.label, NEUTRAL);
    }

    #[test]
    fn test_whole_words_only() {
        let c = LexiconClassifier::new().unwrap();
        // "seguro" must not fire inside "inseguro"; "orden" not inside "desordenado".
        assert_eq!(c.count_hits("muy inseguro"), (0, 1));
        assert_eq!(c.count_hits("desordenado"), (0, 0));
    }

    #[test]
    fn test_negator_flips() {
        let c = LexiconClassifier::new().unwrap();
        assert_eq!(c.count_hits("no es seguro"), (0, 1));
    }

    #[test]
    fn test_multiword_seed() {
        let c = LexiconClassifier::new().unwrap();
        assert_eq!(c.count_hits("pésimo, mal servicio"), (0, 1));
    }
}
