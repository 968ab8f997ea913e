// Bigram collocation detection.
//
// Counts unigrams and adjacent pairs over the whole corpus and keeps pairs
// that co-occur far more often than chance:
//
//   score(a, b) = (count(a b) - min_count) / (count(a) * count(b)) * vocab_size
//
// where vocab_size counts distinct unigrams plus distinct bigrams. Qualifying
// pairs are then merged left to right in every document ("linea_tres").
// Counting is order-independent, so the output is deterministic for a given
// corpus and parameters.

use std::collections::{HashMap, HashSet};

use tracing::info;

/// Conjunctions left dangling at a sequence edge after merging.
pub const DEFAULT_CONJUNCTIONS: &[&str] = &["and", "y", "und"];

/// Learns collocations from a corpus and rewrites it.
#[derive(Debug, Clone)]
pub struct PhraseDetector {
    /// Minimum joint occurrences for a pair to qualify.
    pub min_count: u32,
    /// Score a pair must exceed.
    pub threshold: f64,
    /// Joiner for merged pairs.
    pub delimiter: String,
    /// Tokens trimmed from both ends of each rewritten sequence.
    pub conjunctions: Vec<String>,
}

impl Default for PhraseDetector {
    fn default() -> Self {
        Self::new(5, 10.0)
    }
}

/// The pairs a detector decided to merge, with their scores.
#[derive(Debug, Clone, Default)]
pub struct PhraseModel {
    phrases: HashMap<(String, String), f64>,
    delimiter: String,
}

impl PhraseDetector {
    pub fn new(min_count: u32, threshold: f64) -> Self {
        Self {
            min_count,
            threshold,
            delimiter: "_".to_string(),
            conjunctions: DEFAULT_CONJUNCTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Learn the collocations present in `corpus`.
    pub fn learn(&self, corpus: &[Vec<String>]) -> PhraseModel {
        let mut unigrams: HashMap<&str, u64> = HashMap::new();
        let mut bigrams: HashMap<(&str, &str), u64> = HashMap::new();

        for doc in corpus {
            for token in doc {
                *unigrams.entry(token.as_str()).or_insert(0) += 1;
            }
            for pair in doc.windows(2) {
                *bigrams.entry((pair[0].as_str(), pair[1].as_str())).or_insert(0) += 1;
            }
        }

        let vocab_size = (unigrams.len() + bigrams.len()) as f64;
        let min_count = self.min_count as u64;

        let phrases: HashMap<(String, String), f64> = bigrams
            .iter()
            .filter(|(_, &count)| count >= min_count)
            .filter_map(|(&(a, b), &count)| {
                let score = collocation_score(unigrams[a], unigrams[b], count, min_count, vocab_size);
                (score > self.threshold).then(|| ((a.to_string(), b.to_string()), score))
            })
            .collect();

        info!(
            documents = corpus.len(),
            vocab_size = vocab_size as u64,
            phrases = phrases.len(),
            "Learned bigram collocations"
        );

        PhraseModel {
            phrases,
            delimiter: self.delimiter.clone(),
        }
    }

    /// Learn collocations and rewrite every document.
    ///
    /// The result has one sequence per input document, in input order.
    pub fn detect(&self, corpus: &[Vec<String>]) -> Vec<Vec<String>> {
        let model = self.learn(corpus);
        let conjunctions: HashSet<&str> = self.conjunctions.iter().map(String::as_str).collect();
        corpus
            .iter()
            .map(|doc| trim_conjunctions(model.apply(doc), &conjunctions))
            .collect()
    }
}

impl PhraseModel {
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Merged phrases ordered by descending score, for reporting.
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut v: Vec<(String, f64)> = self
            .phrases
            .iter()
            .map(|((a, b), s)| (format!("{a}{}{b}", self.delimiter), *s))
            .collect();
        v.sort_by(|x, y| {
            y.1.partial_cmp(&x.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| x.0.cmp(&y.0))
        });
        v
    }

    /// Greedily merge qualifying adjacent pairs, left to right.
    pub fn apply(&self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            if i + 1 < tokens.len() {
                let key = (tokens[i].clone(), tokens[i + 1].clone());
                if self.phrases.contains_key(&key) {
                    out.push(format!("{}{}{}", tokens[i], self.delimiter, tokens[i + 1]));
                    i += 2;
                    continue;
                }
            }
            out.push(tokens[i].clone());
            i += 1;
        }
        out
    }
}

/// The collocation score of a pair given its counts.
pub fn collocation_score(
    count_a: u64,
    count_b: u64,
    count_ab: u64,
    min_count: u64,
    vocab_size: f64,
) -> f64 {
    let denom = (count_a * count_b) as f64;
    if denom == 0.0 {
        return f64::NEG_INFINITY;
    }
    (count_ab as f64 - min_count as f64) / denom * vocab_size
}

fn trim_conjunctions(mut tokens: Vec<String>, conjunctions: &HashSet<&str>) -> Vec<String> {
    while tokens.first().is_some_and(|t| conjunctions.contains(t.as_str())) {
        tokens.remove(0);
    }
    while tokens.last().is_some_and(|t| conjunctions.contains(t.as_str())) {
        tokens.pop();
    }
    debug_assert!(tokens.iter().all(|t| !t.is_empty()));
    tokens
}
