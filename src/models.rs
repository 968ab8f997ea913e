// Data models — the types that flow between pipeline stages.
//
// Every derived record carries the source document's `id`. Stages join on
// that id rather than on row position, so a stage that filters or reorders
// rows cannot silently shift another stage's results onto the wrong post.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Topic label reserved for documents that fit no discovered topic.
pub const OUTLIER_TOPIC: i64 = -1;

/// Languages the annotator understands. Spanish is the primary corpus
/// language, German the secondary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "unsupported")]
    Unsupported,
}

impl Language {
    /// Parse the language tag found in raw scraper output.
    ///
    /// The scraper historically wrote `E` (Spanish) and `A` (German); ISO
    /// codes are accepted too. A missing tag means the primary language.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_lowercase()).as_deref() {
            None | Some("") => Language::Spanish,
            Some("e") | Some("es") | Some("spa") | Some("spanish") => Language::Spanish,
            Some("a") | Some("de") | Some("deu") | Some("german") => Language::German,
            _ => Language::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Spanish => "es",
            Language::German => "de",
            Language::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One raw post as ingested from the scraper CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// None when the scraper wrote an empty cell.
    pub raw_text: Option<String>,
    pub author: String,
    pub timestamp: String,
    pub language: Language,
    /// Provenance marker carried from the raw row, if present.
    pub source: Option<String>,
}

/// A document after normalization, annotation and phrase detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedDocument {
    pub id: String,
    #[serde(rename = "user")]
    pub author: String,
    pub timestamp: String,
    #[serde(rename = "lang")]
    pub language: Language,
    #[serde(rename = "source")]
    pub source_tag: String,
    /// Original text, kept so the entity tagger can see casing.
    pub raw_text: String,
    /// Boilerplate stripped, lowercased, before lemmatization.
    pub raw_cleaned_text: String,
    /// Aliases, lemmas and collocations applied — the working text.
    pub normalized_text: String,
}

/// A document's topic or cluster label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub id: String,
    pub topic: i64,
    /// None when the grouping algorithm does not emit probabilities.
    pub probability: Option<f64>,
}

/// Ranked description of one topic or cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: i64,
    pub size: usize,
    /// Keywords in descending score order.
    pub keywords: Vec<String>,
    /// Keywords translated for display, when a translator is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords_translated: Option<Vec<String>>,
    /// The raw text of the member closest to the group centroid.
    pub representative: Option<String>,
}

/// Per-document sentiment and location output.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub id: String,
    /// Classifier label, e.g. POSITIVE / NEGATIVE / NEUTRAL.
    pub label: String,
    /// Signed score in [-1, 1].
    pub score: f64,
    pub locations: BTreeSet<String>,
    /// Projection onto the negative→positive seed axis, when embeddings exist.
    pub semaxis: Option<f64>,
}

/// Corpus-wide counts of mentions and hashtags (lowercased, without the marker).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionStats {
    pub mentions: Vec<(String, u32)>,
    pub hashtags: Vec<(String, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_scraper_tags() {
        assert_eq!(Language::from_tag(Some("E")), Language::Spanish);
        assert_eq!(Language::from_tag(Some("A")), Language::German);
        assert_eq!(Language::from_tag(Some(" de ")), Language::German);
        assert_eq!(Language::from_tag(None), Language::Spanish);
        assert_eq!(Language::from_tag(Some("fr")), Language::Unsupported);
    }

    #[test]
    fn test_language_round_trips_through_as_str() {
        for lang in [Language::Spanish, Language::German, Language::Unsupported] {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(json, format!("\"{}\"", lang.as_str()));
        }
    }
}
