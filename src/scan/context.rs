//! Position ranking and context extraction.
//!
//! Ranks order entities by their earliest mention, and snippets render a
//! window of the original (unnormalized) text around each mention.

use crate::domain::MatchSpan;

use super::normalize::NormalizedText;

/// Characters of context kept on each side of a mention
pub const DEFAULT_CONTEXT_WINDOW: usize = 50;

/// Rank and snippets for one entity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityContext {
    pub position_rank: Option<usize>,
    pub context_snippets: Vec<String>,
}

/// Compute rank and snippets for every entity.
///
/// `matches` holds one span list per entity in configuration order; the
/// result is index-aligned with it.
pub fn extract(
    matches: &[Vec<MatchSpan>],
    text: &NormalizedText,
    original: &str,
    window: usize,
) -> Vec<EntityContext> {
    position_ranks(matches)
        .into_iter()
        .zip(matches)
        .map(|(position_rank, spans)| EntityContext {
            position_rank,
            context_snippets: context_snippets(spans, text, original, window),
        })
        .collect()
}

/// 1-based rank of each entity's earliest span among all entities.
///
/// Entities without spans get `None`. Identical earliest offsets are
/// ordered by input position.
pub fn position_ranks(matches: &[Vec<MatchSpan>]) -> Vec<Option<usize>> {
    let mut firsts: Vec<(usize, usize)> = matches
        .iter()
        .enumerate()
        .filter_map(|(idx, spans)| spans.iter().map(|s| s.start).min().map(|start| (start, idx)))
        .collect();
    firsts.sort_unstable();

    let mut ranks = vec![None; matches.len()];
    for (rank, (_, idx)) in firsts.into_iter().enumerate() {
        ranks[idx] = Some(rank + 1);
    }
    ranks
}

/// Render context windows for `spans` from the original text.
///
/// Windows reach `window` characters past each side of a span, snap inward
/// to whitespace, and merge when they overlap.
pub fn context_snippets(
    spans: &[MatchSpan],
    text: &NormalizedText,
    original: &str,
    window: usize,
) -> Vec<String> {
    // (window_start, window_end, anchor_start, anchor_end) in original bytes
    let mut windows: Vec<(usize, usize, usize, usize)> = Vec::new();

    for span in spans {
        let Some((anchor_start, anchor_end)) = text.original_range(span.start, span.end) else {
            continue;
        };
        let start = chars_back(original, anchor_start, window);
        let end = chars_forward(original, anchor_end, window);

        match windows.last_mut() {
            Some(last) if start <= last.1 => {
                last.1 = last.1.max(end);
                last.3 = last.3.max(anchor_end);
            }
            _ => windows.push((start, end, anchor_start, anchor_end)),
        }
    }

    windows
        .into_iter()
        .map(|(start, end, anchor_start, anchor_end)| {
            let start = snap_start(original, start, anchor_start);
            let end = snap_end(original, end, anchor_end);
            render(original, start, end)
        })
        .collect()
}

/// Byte offset `n` characters before `pos`, clamped to 0
fn chars_back(original: &str, pos: usize, n: usize) -> usize {
    if n == 0 {
        return pos;
    }
    original[..pos]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(pos)
}

/// Byte offset `n` characters after `pos`, clamped to the text length
fn chars_forward(original: &str, pos: usize, n: usize) -> usize {
    original[pos..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| pos + i)
        .unwrap_or(original.len())
}

/// Whether `pos` falls between two non-whitespace characters
fn is_mid_word(original: &str, pos: usize) -> bool {
    let before = original[..pos].chars().next_back();
    let after = original[pos..].chars().next();
    matches!((before, after), (Some(b), Some(a)) if !b.is_whitespace() && !a.is_whitespace())
}

/// Move a cut start forward past the partial word, never past the anchor
fn snap_start(original: &str, start: usize, anchor_start: usize) -> usize {
    if !is_mid_word(original, start) {
        return start;
    }
    original[start..anchor_start]
        .find(char::is_whitespace)
        .map(|ws| start + ws)
        .unwrap_or(start)
}

/// Move a cut end back before the partial word, never before the anchor
fn snap_end(original: &str, end: usize, anchor_end: usize) -> usize {
    if !is_mid_word(original, end) {
        return end;
    }
    original[anchor_end..end]
        .rfind(char::is_whitespace)
        .map(|ws| anchor_end + ws)
        .unwrap_or(end)
}

fn render(original: &str, start: usize, end: usize) -> String {
    let body = original[start..end]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let prefix = if start > 0 { "..." } else { "" };
    let suffix = if end < original.len() { "..." } else { "" };

    format!("{}{}{}", prefix, body, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MatchKind;
    use crate::scan::normalize::normalize;

    fn span_of(text: &NormalizedText, needle: &str) -> MatchSpan {
        let start = text.as_str().find(needle).unwrap();
        MatchSpan {
            start,
            end: start + needle.len(),
            matched_text: needle.to_string(),
            match_kind: MatchKind::Exact,
        }
    }

    fn span_at(start: usize) -> MatchSpan {
        MatchSpan {
            start,
            end: start + 1,
            matched_text: "x".to_string(),
            match_kind: MatchKind::Exact,
        }
    }

    #[test]
    fn test_position_ranks_by_first_mention() {
        let matches = vec![vec![span_at(40)], vec![span_at(10), span_at(50)], vec![]];
        assert_eq!(position_ranks(&matches), vec![Some(2), Some(1), None]);
    }

    #[test]
    fn test_position_rank_ties_use_input_order() {
        let matches = vec![vec![span_at(5)], vec![span_at(5)]];
        assert_eq!(position_ranks(&matches), vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_position_ranks_empty() {
        assert!(position_ranks(&[]).is_empty());
        assert_eq!(position_ranks(&[vec![]]), vec![None]);
    }

    #[test]
    fn test_snippet_from_original_text() {
        let original = "Honestly,  ACME   makes the best widgets.";
        let text = normalize(original);
        let spans = vec![span_of(&text, "acme")];

        let snippets = context_snippets(&spans, &text, original, 100);
        assert_eq!(snippets, vec!["Honestly, ACME makes the best widgets.".to_string()]);
    }

    #[test]
    fn test_snippet_window_snaps_to_words() {
        let original = "alpha bravo charlie Acme delta echo foxtrot";
        let text = normalize(original);
        let spans = vec![span_of(&text, "acme")];

        // 10 chars either side cuts into "bravo" and "echo"
        let snippets = context_snippets(&spans, &text, original, 10);
        assert_eq!(snippets, vec!["...charlie Acme delta...".to_string()]);
    }

    #[test]
    fn test_close_spans_merge() {
        let original = "Acme is good and Acme is cheap.";
        let text = normalize(original);
        let first = span_of(&text, "acme");
        let second_start = text.as_str().rfind("acme").unwrap();
        let second = MatchSpan {
            start: second_start,
            end: second_start + 4,
            ..first.clone()
        };

        let snippets = context_snippets(&[first, second], &text, original, 20);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0], "Acme is good and Acme is cheap.");
    }

    #[test]
    fn test_distant_spans_stay_separate() {
        let filler = "word ".repeat(40);
        let original = format!("Acme {}Acme", filler);
        let text = normalize(&original);
        let first = span_of(&text, "acme");
        let second_start = text.as_str().rfind("acme").unwrap();
        let second = MatchSpan {
            start: second_start,
            end: second_start + 4,
            ..first.clone()
        };

        let snippets = context_snippets(&[first, second], &text, &original, 10);
        assert_eq!(snippets.len(), 2);
        assert!(snippets[0].starts_with("Acme"));
        assert!(snippets[1].ends_with("Acme"));
    }

    #[test]
    fn test_extract_aligns_with_input() {
        let original = "Globex first, then Acme.";
        let text = normalize(original);
        let matches = vec![vec![span_of(&text, "acme")], vec![span_of(&text, "globex")], vec![]];

        let contexts = extract(&matches, &text, original, DEFAULT_CONTEXT_WINDOW);
        assert_eq!(contexts.len(), 3);
        assert_eq!(contexts[0].position_rank, Some(2));
        assert_eq!(contexts[1].position_rank, Some(1));
        assert_eq!(contexts[2], EntityContext::default());
        assert_eq!(contexts[0].context_snippets, vec![original.to_string()]);
    }

    #[test]
    fn test_multibyte_window_is_char_safe() {
        let original = "ééééé Acme ééééé";
        let text = normalize(original);
        let spans = vec![span_of(&text, "acme")];
        let snippets = context_snippets(&spans, &text, original, 3);
        assert_eq!(snippets, vec!["...Acme...".to_string()]);
    }
}
