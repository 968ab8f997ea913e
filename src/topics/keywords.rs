// Keyword ranking for topics and for the corpus as a whole.
//
// Per-topic keywords use class-based TF-IDF: all member texts of a topic are
// treated as one document, so a word scores high when it is frequent inside
// the topic and rare across the other topics.
//
//   score(t, c) = tf(t, c) * ln(1 + A / f(t))
//
// tf is the term's share of the class's tokens, A the average token count per
// class and f(t) the term's frequency over all classes.
//
// Corpus-wide keywords (the insights endpoint) go through keyword_extraction's
// TF-IDF with the Spanish and German stopword lists.

use std::collections::{BTreeMap, HashMap};

use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use stop_words::{get, LANGUAGE};
use tracing::debug;

/// Top `top_n` class-based TF-IDF keywords for every label.
///
/// `labels` and `texts` are row-aligned. Ties are broken alphabetically so
/// the output is stable.
pub fn ctfidf_keywords(labels: &[i64], texts: &[String], top_n: usize) -> BTreeMap<i64, Vec<String>> {
    let mut class_counts: BTreeMap<i64, HashMap<&str, usize>> = BTreeMap::new();
    let mut totals: HashMap<&str, usize> = HashMap::new();

    for (&label, text) in labels.iter().zip(texts) {
        let counts = class_counts.entry(label).or_default();
        for token in text.split_whitespace() {
            *counts.entry(token).or_insert(0) += 1;
            *totals.entry(token).or_insert(0) += 1;
        }
    }

    if class_counts.is_empty() {
        return BTreeMap::new();
    }

    let total_tokens: usize = totals.values().sum();
    let avg_tokens = total_tokens as f64 / class_counts.len() as f64;

    class_counts
        .into_iter()
        .map(|(label, counts)| {
            let class_tokens: usize = counts.values().sum();
            let mut scored: Vec<(&str, f64)> = counts
                .iter()
                .map(|(&term, &count)| {
                    let tf = count as f64 / class_tokens.max(1) as f64;
                    let idf = (1.0 + avg_tokens / totals[term] as f64).ln();
                    (term, tf * idf)
                })
                .collect();
            scored.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(b.0))
            });
            let keywords = scored
                .into_iter()
                .take(top_n)
                .map(|(t, _)| t.to_string())
                .collect();
            (label, keywords)
        })
        .collect()
}

/// Top `top_n` TF-IDF keywords over the whole corpus, with scores.
pub fn corpus_keywords(texts: &[String], top_n: usize) -> Vec<(String, f32)> {
    if texts.iter().all(|t| t.trim().is_empty()) {
        return Vec::new();
    }

    let mut stop_words: Vec<String> = get(LANGUAGE::Spanish);
    stop_words.extend(get(LANGUAGE::German));

    let params = TfIdfParams::UnprocessedDocuments(texts, &stop_words, None);
    let tfidf = TfIdf::new(params);
    let ranked = tfidf.get_ranked_word_scores(top_n);

    debug!(documents = texts.len(), keywords = ranked.len(), "Ranked corpus keywords");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_distinctive_terms_rank_first() {
        let labels = vec![0, 0, 1, 1];
        let texts = s(&["metro retraso", "metro retraso hoy", "bici hoy", "bici carril"]);
        let kw = ctfidf_keywords(&labels, &texts, 2);
        assert_eq!(kw[&0][0], "metro");
        assert_eq!(kw[&1][0], "bici");
        assert!(kw[&0].len() <= 2);
    }

    #[test]
    fn test_outlier_label_gets_keywords() {
        let kw = ctfidf_keywords(&[-1, 0], &s(&["ruido", "metro"]), 5);
        assert_eq!(kw[&-1], vec!["ruido".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        assert!(ctfidf_keywords(&[], &[], 5).is_empty());
        assert!(corpus_keywords(&[], 5).is_empty());
    }

    #[test]
    fn test_corpus_keywords_skip_stopwords() {
        let texts = s(&["el metro de la ciudad", "el metro otra vez", "la bici y el tren"]);
        let kw = corpus_keywords(&texts, 10);
        assert!(kw.iter().any(|(w, _)| w == "metro"));
        assert!(!kw.iter().any(|(w, _)| w == "el" || w == "la"));
    }
}
