//! Text normalization for mention matching.
//!
//! Responses and entity names go through the same canonicalization so that
//! matching reduces to comparing token sequences:
//! - Unicode canonical decomposition with combining marks dropped ("Café" -> "cafe")
//! - Lowercasing
//! - Punctuation and whitespace runs collapsed to a single space
//! - Apostrophes, hyphens and periods kept only between two letters/digits,
//!   so "O'Reilly", "Coca-Cola" and "acme.com" stay single tokens
//!
//! Every byte of the normalized text maps back to the original character it
//! came from, so spans found in normalized text can be rendered from the
//! original.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalized text plus its offset map back to the original
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText {
    text: String,
    /// For each byte of `text`, the byte range of the originating character
    /// in the original string
    origin: Vec<(usize, usize)>,
}

/// A whitespace-delimited token of normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Map a normalized byte range back to a byte range of the original text.
    ///
    /// Returns `None` for empty or out-of-bounds ranges.
    pub fn original_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start >= end || end > self.origin.len() {
            return None;
        }
        Some((self.origin[start].0, self.origin[end - 1].1))
    }

    /// Split into tokens with their byte offsets
    pub fn tokens(&self) -> Vec<Token<'_>> {
        tokenize(&self.text)
    }
}

/// Split already-normalized text on single spaces
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    for piece in text.split(' ') {
        if !piece.is_empty() {
            tokens.push(Token {
                text: piece,
                start: offset,
                end: offset + piece.len(),
            });
        }
        offset += piece.len() + 1;
    }
    tokens
}

/// Characters kept inside a token when flanked by letters or digits
fn is_joiner(c: char) -> bool {
    matches!(
        c,
        '\'' | '\u{2019}' | '\u{02BC}' | '-' | '\u{2010}' | '\u{2011}' | '.'
    )
}

/// Canonical form of a kept joiner
fn canonical_joiner(c: char) -> char {
    match c {
        '\u{2019}' | '\u{02BC}' => '\'',
        '\u{2010}' | '\u{2011}' => '-',
        other => other,
    }
}

struct Builder {
    text: String,
    origin: Vec<(usize, usize)>,
    pending_space: Option<(usize, usize)>,
    pending_joiner: Option<(char, (usize, usize))>,
}

impl Builder {
    fn push(&mut self, c: char, source: (usize, usize)) {
        self.text.push(c);
        for _ in 0..c.len_utf8() {
            self.origin.push(source);
        }
    }

    fn last_is_word(&self) -> bool {
        self.text.chars().next_back().is_some_and(char::is_alphanumeric)
    }

    fn separator(&mut self, source: (usize, usize)) {
        self.pending_joiner = None;
        if !self.text.is_empty() && self.pending_space.is_none() {
            self.pending_space = Some(source);
        }
    }

    fn joiner(&mut self, c: char, source: (usize, usize)) {
        if self.pending_joiner.is_some() || self.pending_space.is_some() || !self.last_is_word() {
            // Doubled or leading joiners act as separators ("--", "'s" at a boundary)
            self.separator(source);
        } else {
            self.pending_joiner = Some((canonical_joiner(c), source));
        }
    }

    fn word(&mut self, c: char, source: (usize, usize)) {
        if let Some(space_source) = self.pending_space.take() {
            self.push(' ', space_source);
        }
        if let Some((joiner, joiner_source)) = self.pending_joiner.take() {
            self.push(joiner, joiner_source);
        }
        self.push(c, source);
    }
}

/// Normalize text for matching. Never fails; empty input yields empty output.
pub fn normalize(text: &str) -> NormalizedText {
    let mut builder = Builder {
        text: String::with_capacity(text.len()),
        origin: Vec::with_capacity(text.len()),
        pending_space: None,
        pending_joiner: None,
    };

    for (start, ch) in text.char_indices() {
        let source = (start, start + ch.len_utf8());

        for decomposed in std::iter::once(ch).nfd() {
            if is_combining_mark(decomposed) {
                continue;
            }
            for lowered in decomposed.to_lowercase() {
                if is_combining_mark(lowered) {
                    continue;
                }
                if lowered.is_alphanumeric() {
                    builder.word(lowered, source);
                } else if is_joiner(lowered) {
                    builder.joiner(lowered, source);
                } else {
                    builder.separator(source);
                }
            }
        }
    }

    NormalizedText {
        text: builder.text,
        origin: builder.origin,
    }
}

/// Normalize a name and return its tokens as owned strings
pub fn name_tokens(name: &str) -> Vec<String> {
    normalize(name)
        .as_str()
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
