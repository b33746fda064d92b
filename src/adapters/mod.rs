//! Provider-specific response adapters.
//!
//! Each provider formats answers differently (markdown, citation markers,
//! source annotations). Adapters strip those quirks so the engine only ever
//! sees prose. They run before normalization; context snippets are rendered
//! from the cleaned text.

pub mod markdown;

use crate::domain::Provider;

pub use markdown::{CitationStyle, MarkdownAdapter};

/// Trait for provider body cleanup
pub trait ResponseAdapter: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Return the body with provider formatting removed
    fn clean(&self, body: &str) -> String;
}

static OPENAI: MarkdownAdapter = MarkdownAdapter::new("openai", CitationStyle::SourceMarkers);
static PERPLEXITY: MarkdownAdapter = MarkdownAdapter::new("perplexity", CitationStyle::Numeric);
static COPILOT: MarkdownAdapter = MarkdownAdapter::new("copilot", CitationStyle::Numeric);
static MARKDOWN: MarkdownAdapter = MarkdownAdapter::new("markdown", CitationStyle::None);

/// Adapter for a provider's response format
pub fn adapter_for(provider: Provider) -> &'static dyn ResponseAdapter {
    match provider {
        Provider::Openai => &OPENAI,
        Provider::Perplexity => &PERPLEXITY,
        Provider::Copilot => &COPILOT,
        Provider::Claude | Provider::Gemini | Provider::Unknown => &MARKDOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_selection() {
        assert_eq!(adapter_for(Provider::Perplexity).name(), "perplexity");
        assert_eq!(adapter_for(Provider::Openai).name(), "openai");
        assert_eq!(adapter_for(Provider::Claude).name(), "markdown");
        assert_eq!(adapter_for(Provider::Unknown).name(), "markdown");
    }

    #[test]
    fn test_perplexity_strips_citations() {
        let cleaned = adapter_for(Provider::Perplexity).clean("**Acme**[1] leads.");
        assert_eq!(cleaned, "Acme leads.");
    }
}
