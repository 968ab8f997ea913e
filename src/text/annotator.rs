// Linguistic annotator — text × language → filtered lemma sequence.
//
// Like the embedding and sentiment models, this sits behind a trait so a
// tagger-backed implementation can replace the builtin one without touching
// the pipeline. The builtin `LexiconAnnotator` needs no model files: it uses
// the stop-words lists for Spanish and German, merges known multi-word
// entities, and takes the lowercased surface form as the lemma.

use std::collections::HashSet;

use anyhow::Result;
use stop_words::{get, LANGUAGE};

use crate::models::Language;

/// Tokens dropped in every language on top of the stopword lists.
const EXTRA_STOPWORDS: &[&str] = &["rt", "via"];

/// Lemmas shorter than this (in characters) are dropped.
const MIN_LEMMA_CHARS: usize = 3;

/// Trait for turning cleaned text into the token sequence used downstream.
pub trait LinguisticAnnotator: Send + Sync {
    /// Annotate `text` and return the kept lemmas in order.
    ///
    /// Unsupported languages return an empty sequence.
    fn annotate(&self, text: &str, language: Language) -> Result<Vec<String>>;
}

/// Stopword/lexicon annotator for Spanish and German.
pub struct LexiconAnnotator {
    spanish: HashSet<String>,
    german: HashSet<String>,
    /// Multi-word entities as token sequences, longest first.
    entities: Vec<Vec<String>>,
}

impl LexiconAnnotator {
    /// Build an annotator that merges the given multi-word entities.
    pub fn new(entities: &[String]) -> Self {
        let extra = EXTRA_STOPWORDS.iter().map(|s| s.to_string());

        let spanish: HashSet<String> = get(LANGUAGE::Spanish)
            .into_iter()
            .map(|w| w.to_lowercase())
            .chain(extra.clone())
            .collect();
        let german: HashSet<String> = get(LANGUAGE::German)
            .into_iter()
            .map(|w| w.to_lowercase())
            .chain(extra)
            .collect();

        let mut entities: Vec<Vec<String>> = entities
            .iter()
            .map(|e| e.to_lowercase().split_whitespace().map(str::to_string).collect())
            .filter(|tokens: &Vec<String>| tokens.len() > 1)
            .collect();
        entities.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            spanish,
            german,
            entities,
        }
    }

    fn stopwords(&self, language: Language) -> Option<&HashSet<String>> {
        match language {
            Language::Spanish => Some(&self.spanish),
            Language::German => Some(&self.german),
            Language::Unsupported => None,
        }
    }

    /// Join known multi-word entities into single underscore tokens.
    fn merge_entities(&self, tokens: Vec<String>) -> Vec<String> {
        if self.entities.is_empty() {
            return tokens;
        }

        let mut merged = Vec::with_capacity(tokens.len());
        let mut i = 0;
        'outer: while i < tokens.len() {
            for entity in &self.entities {
                let end = i + entity.len();
                if end <= tokens.len() && tokens[i..end] == entity[..] {
                    merged.push(entity.join("_"));
                    i = end;
                    continue 'outer;
                }
            }
            merged.push(tokens[i].clone());
            i += 1;
        }
        merged
    }
}

impl LinguisticAnnotator for LexiconAnnotator {
    fn annotate(&self, text: &str, language: Language) -> Result<Vec<String>> {
        let Some(stop) = self.stopwords(language) else {
            return Ok(Vec::new());
        };

        let tokens: Vec<String> = text.split_whitespace().map(|t| t.to_lowercase()).collect();
        let tokens = self.merge_entities(tokens);

        Ok(tokens
            .into_iter()
            .filter(|t| !is_punct(t) && !like_url(t) && !like_email(t) && !like_num(t))
            .filter(|t| t.chars().count() >= MIN_LEMMA_CHARS)
            .filter(|t| !stop.contains(t))
            .collect())
    }
}

fn is_punct(token: &str) -> bool {
    token.chars().all(|c| !c.is_alphanumeric() && c != '_')
}

fn like_url(token: &str) -> bool {
    token.starts_with("http") && token.contains("://")
        || token.starts_with("www.")
        || [".com", ".mx", ".de", ".org", ".net"]
            .iter()
            .any(|tld| token.ends_with(tld) && token.len() > tld.len())
}

fn like_email(token: &str) -> bool {
    match token.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.'),
        None => false,
    }
}

fn like_num(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}
