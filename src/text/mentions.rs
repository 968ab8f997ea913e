// Mention and hashtag statistics over the raw corpus.
//
// The cleaner throws mentions and hashtags away, so they're counted from the
// raw text first. Every mention is kept, including the most frequent one.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::models::MentionStats;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("@([0-9A-Za-z_À-ÖØ-öø-ÿ]+)").expect("valid mention pattern"));

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("#([0-9A-Za-z_À-ÖØ-öø-ÿ]+)").expect("valid hashtag pattern"));

/// Count lowercased mentions and hashtags across all texts.
///
/// Results are sorted by count descending, then alphabetically.
pub fn count_mentions<'a>(texts: impl IntoIterator<Item = &'a str>) -> MentionStats {
    let mut mentions: HashMap<String, u32> = HashMap::new();
    let mut hashtags: HashMap<String, u32> = HashMap::new();

    for text in texts {
        for cap in MENTION.captures_iter(text) {
            *mentions.entry(cap[1].to_lowercase()).or_insert(0) += 1;
        }
        for cap in HASHTAG.captures_iter(text) {
            *hashtags.entry(cap[1].to_lowercase()).or_insert(0) += 1;
        }
    }

    MentionStats {
        mentions: ranked(mentions),
        hashtags: ranked(hashtags),
    }
}

fn ranked(counts: HashMap<String, u32>) -> Vec<(String, u32)> {
    let mut v: Vec<(String, u32)> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}
