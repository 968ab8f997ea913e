// Raw post cleaning.
//
// Scraped posts arrive with reply headers ("Juan @juan · 5h"), "Replying to"
// markers, links, mentions, hashtags and stray count lines. `clean_raw`
// strips all of that and reduces the text to a lowercase, single-spaced
// string over a fixed alphabet. The alias table then folds spelling variants
// of the same place into one canonical token.
//
// The cleaning is idempotent: running it on its own output changes nothing.
// The line-noise pass runs after the character filter and compares lines with
// their whitespace collapsed, so anything the regexes would catch on a second
// pass is already gone. A marker split over several lines only becomes one
// after the final collapse, so the collapsed result is checked once more.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Character class for the body of a mention or hashtag: ASCII word
/// characters plus Latin-1 letters (the multiplication and division signs
/// excluded).
const WORD_CLASS: &str = "[0-9A-Za-z_À-ÖØ-öø-ÿ]";

static REPLY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^.*?@\w+.*?\b\d+\s*[mhsMHS]\b").expect("valid reply header pattern")
});

static REPLYING_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)replying to\s*@\w+").expect("valid replying pattern"));

static REPLYING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^replying to$").expect("valid replying line pattern"));

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid URL pattern"));

static MENTION_OR_HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[@#]{WORD_CLASS}+")).expect("valid mention pattern")
});

/// The alias table used when none is configured.
pub fn default_aliases() -> Vec<(String, String)> {
    vec![("cdmx".to_string(), "ciudad_de_mexico".to_string())]
}

/// Whether a character survives the alphabet filter.
fn in_alphabet(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('À'..='ÿ').contains(&c) || c.is_whitespace()
}

/// A line that carries no content: only digits, or a bare "Replying to".
fn is_noise_line(line: &str) -> bool {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return false;
    }
    collapsed.chars().all(|c| c.is_ascii_digit()) || collapsed.eq_ignore_ascii_case("replying to")
}

/// Strip boilerplate from a raw post and reduce it to the cleaning alphabet.
///
/// Missing input yields an empty string.
pub fn clean_raw(raw: Option<&str>) -> String {
    let Some(text) = raw else {
        return String::new();
    };

    let text = REPLY_HEADER.replace(text, "");
    let text = REPLYING_INLINE.replace_all(&text, "");
    let text = REPLYING_LINE.replace_all(&text, "");
    let text = URL.replace_all(&text, "");
    let text = MENTION_OR_HASHTAG.replace_all(&text, "");

    let filtered: String = text
        .chars()
        .map(|c| if in_alphabet(c) { c } else { ' ' })
        .collect();

    let without_noise: Vec<&str> = filtered.split('\n').filter(|l| !is_noise_line(l)).collect();

    let collapsed = without_noise
        .join("\n")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if is_noise_line(&collapsed) {
        String::new()
    } else {
        collapsed
    }
}

/// Cleaning plus whole-word alias substitution.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Alias token sequences, longest first, with their canonical form.
    aliases: Vec<(Vec<String>, String)>,
}

/// Both outputs of a normalizer pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    /// Boilerplate stripped, before alias substitution.
    pub raw_cleaned: String,
    /// Aliases applied.
    pub aliased: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&default_aliases())
    }
}

impl Normalizer {
    pub fn new(aliases: &[(String, String)]) -> Self {
        let mut aliases: Vec<(Vec<String>, String)> = aliases
            .iter()
            .map(|(alias, canonical)| {
                let tokens = alias
                    .to_lowercase()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (tokens, canonical.clone())
            })
            .filter(|(tokens, _): &(Vec<String>, String)| !tokens.is_empty())
            .collect();
        // Multi-word aliases win over their single-word prefixes.
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { aliases }
    }

    /// Clean a raw post and apply the alias table.
    pub fn normalize(&self, raw: Option<&str>) -> NormalizedText {
        let raw_cleaned = clean_raw(raw);
        let aliased = self.apply_aliases(&raw_cleaned);
        NormalizedText {
            raw_cleaned,
            aliased,
        }
    }

    /// Replace whole-word alias matches with their canonical form.
    ///
    /// Matching is token-based on whitespace boundaries, so `cdmx` is replaced
    /// but `cdmxpolis` is left alone.
    pub fn apply_aliases(&self, text: &str) -> String {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut out: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut i = 0;

        'outer: while i < tokens.len() {
            for (alias, canonical) in &self.aliases {
                let end = i + alias.len();
                if end <= tokens.len()
                    && tokens[i..end]
                        .iter()
                        .zip(alias)
                        .all(|(t, a)| t.to_lowercase() == *a)
                {
                    out.push(canonical);
                    i = end;
                    continue 'outer;
                }
            }
            out.push(tokens[i]);
            i += 1;
        }

        out.join(" ")
    }
}
