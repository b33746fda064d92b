//! Context-type heuristic for mention snippets.
//!
//! Counts surface cue words around a mention. A cue matches a whole token,
//! optionally followed by a common inflection ("recommended", "issues").
//! Positive cues preceded by a negator ("not recommend") count as negative.

use crate::domain::ContextType;

use super::normalize::normalize;

const POSITIVE_CUES: &[&str] = &[
    "recommend",
    "best",
    "excellent",
    "great",
    "good",
    "quality",
    "trusted",
    "reliable",
    "professional",
    "expert",
    "top",
    "popular",
    "leading",
    "premium",
];

const NEGATIVE_CUES: &[&str] = &[
    "avoid",
    "bad",
    "poor",
    "terrible",
    "worst",
    "problem",
    "issue",
    "complaint",
    "disappointing",
    "inferior",
];

const COMPARISON_CUES: &[&str] = &[
    "option",
    "alternative",
    "consider",
    "compare",
    "choice",
    "available",
    "include",
    "among",
    "such as",
];

const INFLECTIONS: &[&str] = &["", "s", "d", "ed", "ing", "ly", "ation"];

const NEGATORS: &[&str] = &["not", "no", "never", "don't", "doesn't", "isn't", "wouldn't", "without"];

fn token_matches(token: &str, cue: &str) -> bool {
    token
        .strip_prefix(cue)
        .is_some_and(|rest| INFLECTIONS.contains(&rest))
}

/// Whether the cue (possibly several words) starts at `tokens[i]`
fn cue_at(tokens: &[&str], i: usize, cue: &str) -> bool {
    let words: Vec<&str> = cue.split(' ').collect();
    if i + words.len() > tokens.len() {
        return false;
    }
    let last = words.len() - 1;
    words.iter().enumerate().all(|(k, word)| {
        if k == last {
            token_matches(tokens[i + k], word)
        } else {
            tokens[i + k] == *word
        }
    })
}

fn is_negated(tokens: &[&str], i: usize) -> bool {
    (1..=2).any(|k| i >= k && NEGATORS.contains(&tokens[i - k]))
}

/// Classify the text around a mention.
///
/// Each cue counts once no matter how often it repeats.
pub fn classify_context<S: AsRef<str>>(snippets: &[S]) -> ContextType {
    let joined = snippets
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");
    let normalized = normalize(&joined);
    let tokens: Vec<&str> = normalized.as_str().split(' ').filter(|t| !t.is_empty()).collect();

    let mut positive = 0;
    let mut negative = 0;
    let mut comparison = 0;

    for cue in POSITIVE_CUES {
        let hits: Vec<usize> = (0..tokens.len()).filter(|&i| cue_at(&tokens, i, cue)).collect();
        if hits.is_empty() {
            continue;
        }
        if hits.iter().all(|&i| is_negated(&tokens, i)) {
            negative += 1;
        } else {
            positive += 1;
        }
    }
    for cue in NEGATIVE_CUES {
        if (0..tokens.len()).any(|i| cue_at(&tokens, i, cue)) {
            negative += 1;
        }
    }
    for cue in COMPARISON_CUES {
        if (0..tokens.len()).any(|i| cue_at(&tokens, i, cue)) {
            comparison += 1;
        }
    }

    if positive > negative {
        ContextType::Recommended
    } else if negative > positive {
        ContextType::Negative
    } else if comparison > 0 {
        ContextType::Comparison
    } else {
        ContextType::Neutral
    }
}
