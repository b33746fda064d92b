//! Markdown and citation cleanup for provider bodies.
//!
//! Providers answer in markdown. Emphasis markers and headings add noise to
//! context snippets, links hide the URL a domain match needs, and search
//! providers interleave citation markers with the prose.

use std::sync::LazyLock;

use regex::Regex;

use super::ResponseAdapter;

/// `[text](https://url)`
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").unwrap());

/// `# Heading` at line start
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());

/// `**bold**`, `__bold__`, `~~strike~~`, inline code ticks
static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|__|~~|`").unwrap());

/// Numeric citations: `[1]`, `[1][2]`, `[^3]`, `[1, 2]`
static NUMERIC_CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^?\d+(?:\s*,\s*\d+)*\]").unwrap());

/// Source markers such as `【4:0†source】`
static SOURCE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"【[^】]*】").unwrap());

/// Which citation style a provider emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationStyle {
    None,
    /// Bracketed numbers (Perplexity, Copilot)
    Numeric,
    /// Lenticular source markers (OpenAI)
    SourceMarkers,
}

/// Markdown cleanup with an optional citation pass
#[derive(Debug, Clone, Copy)]
pub struct MarkdownAdapter {
    name: &'static str,
    citations: CitationStyle,
}

impl MarkdownAdapter {
    pub const fn new(name: &'static str, citations: CitationStyle) -> Self {
        Self { name, citations }
    }
}

impl ResponseAdapter for MarkdownAdapter {
    fn name(&self) -> &str {
        self.name
    }

    fn clean(&self, body: &str) -> String {
        let text = match self.citations {
            CitationStyle::None => body.to_string(),
            CitationStyle::Numeric => NUMERIC_CITATION_RE.replace_all(body, "").into_owned(),
            CitationStyle::SourceMarkers => SOURCE_MARKER_RE.replace_all(body, "").into_owned(),
        };
        // Links before emphasis so "[**Acme**](url)" keeps its text
        let text = LINK_RE.replace_all(&text, "$1 ($2)");
        let text = HEADING_RE.replace_all(&text, "");
        EMPHASIS_RE.replace_all(&text, "").into_owned()
    }
}
