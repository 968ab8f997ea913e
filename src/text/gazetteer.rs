// Gazetteer — a fixed list of known place names.
//
// Used two ways: the scorer reports every name found as a substring of a
// post, and the annotator merges multi-word names ("indios verdes") into one
// token before stopword removal so they survive as a unit.

use std::collections::BTreeSet;
use std::path::Path;

use aho_corasick::AhoCorasick;
use anyhow::{Context, Result};
use tracing::debug;

/// Metro stations and landmarks the original analysis tracked.
pub const DEFAULT_PLACES: &[&str] = &[
    "Indios Verdes",
    "Pantitlán",
    "Zócalo",
    "Coyoacán",
    "Metro",
    "Bellas Artes",
    "Tacuba",
    "Centro Médico",
    "Revolución",
    "Insurgentes",
];

pub struct Gazetteer {
    /// Canonical spellings, indexed by pattern id.
    names: Vec<String>,
    /// Matcher over the lowercased names.
    matcher: AhoCorasick,
}

impl Gazetteer {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let names: Vec<String> = names
            .iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty() && seen.insert(n.to_lowercase()))
            .collect();

        let patterns: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let matcher = AhoCorasick::new(&patterns).context("Failed to build gazetteer matcher")?;

        Ok(Self { names, matcher })
    }

    /// Load a gazetteer file: one place per line, `#` starts a comment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read gazetteer {}", path.display()))?;
        let names: Vec<&str> = contents
            .lines()
            .map(|l| l.split('#').next().unwrap_or("").trim())
            .filter(|l| !l.is_empty())
            .collect();
        debug!(places = names.len(), path = %path.display(), "Loaded gazetteer");
        Self::new(&names)
    }

    /// Builtin list, or the file named by the configuration.
    pub fn from_config(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::new(DEFAULT_PLACES),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All gazetteer names occurring in `text` as case-insensitive substrings,
    /// reported in their canonical spelling.
    pub fn find(&self, text: &str) -> BTreeSet<String> {
        let lower = text.to_lowercase();
        self.matcher
            .find_overlapping_iter(&lower)
            .map(|m| self.names[m.pattern().as_usize()].clone())
            .collect()
    }

    /// Resolve a free-text query to a single place name.
    ///
    /// An exact (case-insensitive) match wins; otherwise the longest name
    /// contained in the query.
    pub fn lookup(&self, query: &str) -> Option<&str> {
        let q = query.trim().to_lowercase();
        if let Some(exact) = self.names.iter().find(|n| n.to_lowercase() == q) {
            return Some(exact);
        }
        self.matcher
            .find_overlapping_iter(&q)
            .map(|m| self.names[m.pattern().as_usize()].as_str())
            .max_by_key(|n| n.chars().count())
    }

    /// Lowercased names that span more than one word.
    pub fn multiword_names(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| n.split_whitespace().count() > 1)
            .map(|n| n.to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        let g = Gazetteer::new(DEFAULT_PLACES).unwrap();
        let found = g.find("odio las estaciones sucias en pantitlán");
        assert!(found.contains("Pantitlán"));
    }

    #[test]
    fn test_find_overlapping_names() {
        let g = Gazetteer::new(&["Centro", "Centro Médico"]).unwrap();
        let found = g.find("Centro Médico esta llenisimo");
        assert!(found.contains("Centro"));
        assert!(found.contains("Centro Médico"));
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let g = Gazetteer::new(&["Tacuba", "tacuba", " Tacuba "]).unwrap();
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_lookup_prefers_exact() {
        let g = Gazetteer::new(&["Metro", "Metro Balderas"]).unwrap();
        assert_eq!(g.lookup("metro"), Some("Metro"));
        assert_eq!(g.lookup("estación metro balderas"), Some("Metro Balderas"));
        assert_eq!(g.lookup("berlin"), None);
    }

    #[test]
    fn test_multiword_names() {
        let g = Gazetteer::new(DEFAULT_PLACES).unwrap();
        let multi = g.multiword_names();
        assert!(multi.contains(&"indios verdes".to_string()));
        assert!(!multi.contains(&"tacuba".to_string()));
    }
}
