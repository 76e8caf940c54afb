//! Keyword extraction for the recommendation pipeline: curated profile
//! keywords first, recent search history second, plus frequency-ranked
//! keywords pulled out of trend headlines.

use std::collections::{HashMap, HashSet};

use crate::models::account::SearchEntry;
use crate::recs::trends::TrendItem;

/// Total keyword cap per account.
pub const MAX_KEYWORDS: usize = 20;
/// History terms admitted when curated profile keywords exist, to avoid
/// diluting the curated signal.
const MAX_FROM_HISTORY_WITH_PROFILE: usize = 5;
/// Word-split tokens shorter than this are noise.
const MIN_TOKEN_LEN: usize = 3;
/// Trend keyword cap.
const MAX_TREND_KEYWORDS: usize = 6;

const STOP_WORDS: &[&str] = &[
    "the", "and", "to", "of", "in", "a", "for", "on", "with", "as", "is", "at", "by", "from",
    "or", "an", "that", "this",
];

pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Extracts up to `max_total` keywords, insertion-ordered and deduplicated
/// case-insensitively.
///
/// Priority 1: profile keywords, each added whole and then word-split
/// (significant tokens only) so multi-word keywords contribute both forms.
/// Priority 2: search history, walked most-recent-first; capped at 5 terms
/// when profile keywords exist, the full budget otherwise.
pub fn extract_account_keywords(
    profile_keywords: &[String],
    history: &[SearchEntry],
    max_total: usize,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result: Vec<String> = Vec::new();

    for keyword in profile_keywords {
        if result.len() >= max_total {
            break;
        }
        let normalized = normalize_keyword(keyword);
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        result.push(normalized.clone());

        for word in split_significant(&normalized) {
            if result.len() >= max_total {
                break;
            }
            if seen.insert(word.clone()) {
                result.push(word);
            }
        }
    }

    let max_from_history = if profile_keywords.is_empty() {
        max_total
    } else {
        MAX_FROM_HISTORY_WITH_PROFILE.min(max_total.saturating_sub(result.len()))
    };

    let mut added_from_history = 0;
    for entry in history.iter().rev() {
        if added_from_history >= max_from_history || result.len() >= max_total {
            break;
        }
        let normalized = normalize_keyword(&entry.term);
        if normalized.is_empty() || seen.contains(&normalized) {
            continue;
        }
        seen.insert(normalized.clone());
        result.push(normalized.clone());
        added_from_history += 1;

        for word in split_significant(&normalized) {
            if added_from_history >= max_from_history || result.len() >= max_total {
                break;
            }
            if seen.insert(word.clone()) {
                result.push(word);
                added_from_history += 1;
            }
        }
    }

    result
}

fn split_significant(term: &str) -> Vec<String> {
    term.split_whitespace()
        .filter(|w| w.len() > MIN_TOKEN_LEN - 1)
        .map(str::to_string)
        .collect()
}

/// Frequency-ranked keywords from trend headlines and summaries: lowercase,
/// split on non-word characters, drop short tokens and stop words, top 6.
/// Frequency ties break lexicographically so output is deterministic.
pub fn extract_trend_keywords(trends: &[TrendItem]) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();

    let text = trends
        .iter()
        .map(|t| format!("{} {}", t.headline, t.summary))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut freq: HashMap<String, usize> = HashMap::new();
    for word in text.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if word.len() > MIN_TOKEN_LEN && !stop.contains(word) {
            *freq.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(MAX_TREND_KEYWORDS)
        .map(|(w, _)| w)
        .collect()
}
