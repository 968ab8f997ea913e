// Location entity tagging.
//
// The EntityTagger trait is the seam for a real NER model. RuleEntityTagger
// is the builtin: it takes runs of capitalized words that follow a locative
// preposition ("en Pantitlán", "bei Alexanderplatz"), allowing lowercase
// connectors inside a run ("Ciudad de México"). It needs the original
// casing, so it runs on the raw post text.

use crate::models::Language;

/// Trait for extracting location-class entity spans.
pub trait EntityTagger: Send + Sync {
    fn locations(&self, text: &str, language: Language) -> Vec<String>;
}

/// Tagger that never finds anything.
pub struct NoEntities;

impl EntityTagger for NoEntities {
    fn locations(&self, _text: &str, _language: Language) -> Vec<String> {
        Vec::new()
    }
}

const PREPOSITIONS_ES: &[&str] = &["en", "desde", "hasta", "hacia", "entre", "por", "rumbo"];
const PREPOSITIONS_DE: &[&str] = &["in", "im", "am", "an", "bei", "beim", "nach", "von", "vom", "zum", "zur", "ab", "bis"];
const CONNECTORS: &[&str] = &["de", "del", "la", "las", "los", "el", "y", "der", "die", "das", "am"];

#[derive(Debug, Default)]
pub struct RuleEntityTagger;

impl RuleEntityTagger {
    fn prepositions(language: Language) -> &'static [&'static str] {
        match language {
            Language::Spanish => PREPOSITIONS_ES,
            Language::German => PREPOSITIONS_DE,
            Language::Unsupported => &[],
        }
    }
}

fn strip_punct(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Punctuation at a word's end closes the current run.
fn ends_clause(word: &str) -> bool {
    word.ends_with(['.', ',', ';', ':', '!', '?', ')'])
}

impl EntityTagger for RuleEntityTagger {
    fn locations(&self, text: &str, language: Language) -> Vec<String> {
        let prepositions = Self::prepositions(language);
        if prepositions.is_empty() {
            return Vec::new();
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let mut found = Vec::new();
        let mut i = 0;

        while i < words.len() {
            let w = strip_punct(words[i]).to_lowercase();
            if !prepositions.contains(&w.as_str()) || ends_clause(words[i]) {
                i += 1;
                continue;
            }

            let mut span: Vec<&str> = Vec::new();
            let mut j = i + 1;
            while j < words.len() {
                let word = strip_punct(words[j]);
                if is_capitalized(word) {
                    span.push(word);
                } else if !span.is_empty()
                    && CONNECTORS.contains(&word)
                    && words.get(j + 1).is_some_and(|n| is_capitalized(strip_punct(n)))
                {
                    span.push(word);
                } else {
                    break;
                }
                if ends_clause(words[j]) {
                    j += 1;
                    break;
                }
                j += 1;
            }

            if !span.is_empty() {
                found.push(span.join(" "));
            }
            i = j.max(i + 1);
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalized_run_after_preposition() {
        let t = RuleEntityTagger;
        let locs = t.locations("Odio las estaciones sucias en Pantitlán.", Language::Spanish);
        assert_eq!(locs, vec!["Pantitlán".to_string()]);
    }

    #[test]
    fn test_connectors_inside_run() {
        let t = RuleEntityTagger;
        let locs = t.locations("Llegué a la Ciudad hasta Centro de Salud Norte hoy", Language::Spanish);
        assert_eq!(locs, vec!["Centro de Salud Norte".to_string()]);
    }

    #[test]
    fn test_german_prepositions() {
        let t = RuleEntityTagger;
        let locs = t.locations("Stau bei Alexanderplatz, wieder mal", Language::German);
        assert_eq!(locs, vec!["Alexanderplatz".to_string()]);
    }

    #[test]
    fn test_lowercase_after_preposition_is_ignored() {
        let t = RuleEntityTagger;
        assert!(t.locations("estoy en casa", Language::Spanish).is_empty());
        assert!(t.locations("en Pantitlán", Language::Unsupported).is_empty());
    }
}
