//! Entity name matching over normalized text.
//!
//! Rules are applied in priority order and a later rule never claims text
//! already covered by an earlier one:
//! 1. Exact: the normalized name as a contiguous token sequence
//! 2. Alias: each configured alias, same way
//! 3. Fuzzy: for names of two or more tokens, enough of the name's tokens
//!    inside a sliding window, in any order
//!
//! Matching works on whole tokens, so a name never matches inside a longer
//! word ("art" does not match "smart"). Two token shapes are looked into:
//! - a trailing possessive is ignored, so "acme" matches "acme's"
//! - a single-token name matches one label of a dotted token ("acme" in
//!   "acme.com"), and a dotted name matches a label suffix ("acme.com" in
//!   "www.acme.com")
//!
//! Hyphen compounds stay whole: "coca" does not match "coca-cola".

use serde::{Deserialize, Serialize};

use crate::domain::{Entity, MatchKind, MatchSpan};

use super::normalize::{name_tokens, NormalizedText, Token};

/// Words that cannot on their own make a fuzzy match
const WEAK_TOKENS: &[&str] = &[
    "a", "an", "and", "at", "by", "for", "in", "of", "on", "or", "the", "to", "with", "co",
    "company", "corp", "corporation", "group", "inc", "incorporated", "llc", "ltd", "limited",
    "plc", "pty",
];

/// Tuning for the fuzzy rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyParams {
    /// Fraction of name tokens that must appear in the window
    pub threshold: f64,
    /// Window length as a multiple of the name's token count
    pub window_factor: usize,
}

impl Default for FuzzyParams {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            window_factor: 2,
        }
    }
}

impl FuzzyParams {
    /// `ceil(n * threshold)`, at least one token and at most `n`
    pub fn required_tokens(&self, n: usize) -> usize {
        // Tolerance keeps e.g. 5 * 0.6 at exactly 3
        let required = (n as f64 * self.threshold - 1e-9).ceil();
        (required.max(1.0) as usize).min(n)
    }

    pub fn window_len(&self, n: usize) -> usize {
        self.window_factor.saturating_mul(n).max(n)
    }
}

/// Pre-tokenized names of one entity
#[derive(Debug, Clone)]
pub struct EntityPattern {
    name: String,
    name_tokens: Vec<String>,
    alias_tokens: Vec<Vec<String>>,
}

impl EntityPattern {
    pub fn new(entity: &Entity) -> Self {
        Self {
            name: entity.name().to_string(),
            name_tokens: name_tokens(entity.name()),
            alias_tokens: entity
                .aliases()
                .iter()
                .map(|alias| name_tokens(alias))
                .filter(|tokens| !tokens.is_empty())
                .collect(),
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.name
    }

    pub fn name_tokens(&self) -> &[String] {
        &self.name_tokens
    }
}

/// Find every span where `entity` is mentioned in `text`
pub fn find_matches(entity: &Entity, text: &NormalizedText, fuzzy: &FuzzyParams) -> Vec<MatchSpan> {
    find_pattern_matches(&EntityPattern::new(entity), text, fuzzy)
}

/// Same as [`find_matches`] with a pattern prepared ahead of time
pub fn find_pattern_matches(
    pattern: &EntityPattern,
    text: &NormalizedText,
    fuzzy: &FuzzyParams,
) -> Vec<MatchSpan> {
    let tokens = text.tokens();
    let mut spans = Vec::new();

    collect_sequence(&tokens, &pattern.name_tokens, MatchKind::Exact, text, &mut spans);
    for alias in &pattern.alias_tokens {
        collect_sequence(&tokens, alias, MatchKind::Alias, text, &mut spans);
    }
    if pattern.name_tokens.len() >= 2 {
        collect_fuzzy(&tokens, &pattern.name_tokens, fuzzy, text, &mut spans);
    }

    spans.sort_by_key(|s| (s.start, s.end));
    spans.dedup_by(|a, b| a.start == b.start && a.end == b.end);
    spans
}

fn make_span(text: &NormalizedText, start: usize, end: usize, match_kind: MatchKind) -> MatchSpan {
    MatchSpan {
        start,
        end,
        matched_text: text.as_str()[start..end].to_string(),
        match_kind,
    }
}

fn is_claimed(spans: &[MatchSpan], start: usize, end: usize) -> bool {
    spans.iter().any(|s| s.overlaps(start, end))
}

/// `token` without a trailing possessive clitic
fn strip_possessive(token: &str) -> &str {
    token.strip_suffix("'s").unwrap_or(token)
}

/// Byte range within `token` matched by `needle`.
///
/// `labels` enables dotted-label matching, used for single-token names.
fn token_match(token: &str, needle: &str, labels: bool) -> Option<(usize, usize)> {
    let base = strip_possessive(token);
    if token == needle || base == needle {
        return Some((0, needle.len()));
    }
    if !labels || !base.contains('.') {
        return None;
    }

    if needle.contains('.') {
        return base
            .strip_suffix(needle)
            .filter(|rest| rest.ends_with('.'))
            .map(|rest| (rest.len(), base.len()));
    }

    let mut offset = 0;
    for label in base.split('.') {
        if label == needle {
            return Some((offset, offset + label.len()));
        }
        offset += label.len() + 1;
    }
    None
}

/// Whole-token occurrences of `needle`, left to right, non-overlapping.
///
/// Only the last token may carry a possessive; dotted labels are searched
/// for single-token needles only.
fn collect_sequence(
    tokens: &[Token<'_>],
    needle: &[String],
    kind: MatchKind,
    text: &NormalizedText,
    spans: &mut Vec<MatchSpan>,
) {
    if needle.is_empty() || needle.len() > tokens.len() {
        return;
    }

    let mut i = 0;
    while i + needle.len() <= tokens.len() {
        let window = &tokens[i..i + needle.len()];
        if let Some((start, end)) = match_window(window, needle) {
            if !is_claimed(spans, start, end) {
                spans.push(make_span(text, start, end, kind));
                i += needle.len();
                continue;
            }
        }
        i += 1;
    }
}

/// Normalized byte range matched by `needle` over `window`, if every token matches
fn match_window(window: &[Token<'_>], needle: &[String]) -> Option<(usize, usize)> {
    let last = needle.len() - 1;
    for (t, n) in window[..last].iter().zip(needle) {
        if t.text != n {
            return None;
        }
    }

    let tail = &window[last];
    let (sub_start, sub_end) = token_match(tail.text, &needle[last], needle.len() == 1)?;
    let start = if last == 0 {
        tail.start + sub_start
    } else {
        window[0].start
    };
    Some((start, tail.start + sub_end))
}

/// Token-set overlap within a sliding window anchored on a name token
fn collect_fuzzy(
    tokens: &[Token<'_>],
    name: &[String],
    params: &FuzzyParams,
    text: &NormalizedText,
    spans: &mut Vec<MatchSpan>,
) {
    let n = name.len();
    let required = params.required_tokens(n);
    let window = params.window_len(n);

    let mut i = 0;
    while i < tokens.len() {
        if !name.iter().any(|t| t == strip_possessive(tokens[i].text)) {
            i += 1;
            continue;
        }

        let window_end = i.saturating_add(window).min(tokens.len());
        let mut used = vec![false; n];
        let mut matched = 0;
        let mut significant = false;
        let mut last = i;
        let mut end = tokens[i].end;

        for (offset, token) in tokens[i..window_end].iter().enumerate() {
            let base = strip_possessive(token.text);
            if let Some(k) = (0..n).find(|&k| !used[k] && name[k] == base) {
                used[k] = true;
                matched += 1;
                last = i + offset;
                end = token.start + base.len();
                if !WEAK_TOKENS.contains(&base) {
                    significant = true;
                }
                if matched == n {
                    break;
                }
            }
        }

        if matched >= required && significant {
            let start = tokens[i].start;
            if !is_claimed(spans, start, end) {
                spans.push(make_span(text, start, end, MatchKind::Fuzzy));
                i = last + 1;
                continue;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::normalize::normalize;

    fn matches(name: &str, aliases: &[&str], text: &str) -> Vec<MatchSpan> {
        let entity = Entity::new(name)
            .unwrap()
            .with_aliases(aliases.iter().copied())
            .unwrap();
        find_matches(&entity, &normalize(text), &FuzzyParams::default())
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let spans = matches("Acme", &[], "We recommend ACME for this.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
        assert_eq!(spans[0].matched_text, "acme");
        assert_eq!((spans[0].start, spans[0].end), (13, 17));
    }

    #[test]
    fn test_no_match_inside_longer_word() {
        assert!(matches("Art", &[], "This is a very smart solution.").is_empty());
        assert!(matches("Art", &[], "Artisan bakeries and party supplies").is_empty());

        let spans = matches("Art", &[], "Smart people like Art, truly.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].matched_text, "art");
    }

    #[test]
    fn test_hyphenated_name_is_one_token() {
        let spans = matches("Coca-Cola", &[], "I drink Coca-Cola daily.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].matched_text, "coca-cola");

        assert!(matches("Coca", &[], "I drink Coca-Cola daily.").is_empty());
    }

    #[test]
    fn test_apostrophe_name() {
        let spans = matches("O'Reilly", &[], "Parts from O\u{2019}Reilly are cheap.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
    }

    #[test]
    fn test_accented_text_matches_ascii_name() {
        let spans = matches("Cafe Roma", &[], "Try Café Roma downtown");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
    }

    #[test]
    fn test_multiple_exact_matches_ordered() {
        let spans = matches("Acme", &[], "Acme is good. I like acme. ACME!");
        assert_eq!(spans.len(), 3);
        assert!(spans.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_alias_match() {
        let spans = matches("Acme Widgets", &["acme.com"], "Order at acme.com today");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Alias);
        assert_eq!(spans[0].matched_text, "acme.com");
    }

    #[test]
    fn test_possessive_matches_name() {
        let spans = matches("Acme", &[], "Acme's widgets beat Acme\u{2019}s rivals.");
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.match_kind == MatchKind::Exact));
        assert!(spans.iter().all(|s| s.matched_text == "acme"));

        let spans = matches("Old Man Emu", &[], "Old Man Emu's kits");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
        assert_eq!(spans[0].matched_text, "old man emu");
    }

    #[test]
    fn test_dotted_label_matches_single_token_name() {
        let spans = matches("Acme", &[], "Order from acme.com today.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
        assert_eq!(spans[0].matched_text, "acme");
        assert_eq!((spans[0].start, spans[0].end), (11, 15));

        let spans = matches("Acme", &[], "Visit www.acme.com.au for details");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].matched_text, "acme");

        assert!(matches("Acme", &[], "Visit acmeshop.com instead").is_empty());
    }

    #[test]
    fn test_domain_alias_matches_subdomains() {
        for text in ["Go to www.acme.com now", "Go to shop.acme.com now"] {
            let spans = matches("Acme Widgets", &["acme.com"], text);
            assert_eq!(spans.len(), 1, "{}", text);
            assert_eq!(spans[0].match_kind, MatchKind::Alias);
            assert_eq!(spans[0].matched_text, "acme.com");
        }

        assert!(matches("Acme Widgets", &["acme.com"], "Go to notacme.com now").is_empty());
        assert!(matches("Acme Widgets", &["acme.com"], "Go to acme.com.evil.io now").is_empty());
    }

    #[test]
    fn test_hyphen_compound_not_split() {
        assert!(matches("Cola", &[], "Coca-Cola's new flavor").is_empty());
        let spans = matches("Coca-Cola", &[], "Coca-Cola's new flavor");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].matched_text, "coca-cola");
    }

    #[test]
    fn test_huge_window_factor_saturates() {
        let params = FuzzyParams {
            threshold: 0.6,
            window_factor: usize::MAX,
        };
        assert_eq!(params.window_len(3), usize::MAX);

        let entity = Entity::new("Old Man Emu").unwrap();
        let spans = find_matches(&entity, &normalize("old man"), &params);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_exact_wins_over_overlapping_alias() {
        // "acme widgets" alias overlaps the exact "acme" span and is not double-counted
        let spans = matches("Acme", &["Acme Widgets"], "Buy Acme Widgets now");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
        assert_eq!(spans[0].matched_text, "acme");
    }

    #[test]
    fn test_fuzzy_match_partial_name() {
        let spans = matches("Old Man Emu", &[], "Many people fit Old Man shocks.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Fuzzy);
        assert_eq!(spans[0].matched_text, "old man");
    }

    #[test]
    fn test_fuzzy_match_reordered_tokens() {
        let spans = matches("Pedders Suspension", &[], "For suspension, Pedders is the usual pick.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].match_kind, MatchKind::Fuzzy);
        assert_eq!(spans[0].matched_text, "suspension pedders");
    }

    #[test]
    fn test_fuzzy_requires_window() {
        // Tokens too far apart for a 2x window
        let spans = matches(
            "Pedders Suspension",
            &[],
            "Pedders has shops in many cities and their suspension work is fine",
        );
        assert!(spans.is_empty());
    }

    #[test]
    fn test_fuzzy_ignores_weak_tokens_alone() {
        let spans = matches("The Home Depot", &[], "Welcome to the home page");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].matched_text, "the home");

        let spans = matches("Globex Corporation Ltd", &[], "Any corporation ltd will do");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_single_token_never_fuzzy() {
        let spans = matches("Bilstein", &[], "Bilsteins are great");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_exact_preferred_over_fuzzy() {
        let spans = matches("Old Man Emu", &[], "Old Man Emu and later old man again");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
        assert_eq!(spans[1].match_kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_spans_never_overlap() {
        let spans = matches(
            "Tough Dog Suspension",
            &["Tough Dog"],
            "Tough Dog Suspension, tough dog, dog tough suspension",
        );
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        assert_eq!(spans[0].match_kind, MatchKind::Exact);
    }

    #[test]
    fn test_empty_text() {
        assert!(matches("Acme", &[], "").is_empty());
    }

    #[test]
    fn test_required_tokens() {
        let params = FuzzyParams::default();
        assert_eq!(params.required_tokens(2), 2);
        assert_eq!(params.required_tokens(3), 2);
        assert_eq!(params.required_tokens(5), 3);
        assert_eq!(params.window_len(3), 6);

        let loose = FuzzyParams {
            threshold: 0.1,
            window_factor: 0,
        };
        assert_eq!(loose.required_tokens(4), 1);
        assert_eq!(loose.window_len(4), 4);
    }
}
