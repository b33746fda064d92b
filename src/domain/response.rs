//! Raw provider responses as handed to the engine.
//!
//! Every provider-specific payload is unified into one `RawResponse`
//! shape before analysis.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// AI chat/search provider that produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[serde(alias = "chatgpt")]
    Openai,
    #[serde(alias = "anthropic")]
    Claude,
    Perplexity,
    Gemini,
    Copilot,
    #[serde(other)]
    Unknown,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Openai => "openai",
            Provider::Claude => "claude",
            Provider::Perplexity => "perplexity",
            Provider::Gemini => "gemini",
            Provider::Copilot => "copilot",
            Provider::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = std::convert::Infallible;

    /// Unrecognized names map to `Unknown` rather than failing
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "openai" | "chatgpt" => Provider::Openai,
            "claude" | "anthropic" => Provider::Claude,
            "perplexity" => Provider::Perplexity,
            "gemini" => Provider::Gemini,
            "copilot" => Provider::Copilot,
            _ => Provider::Unknown,
        })
    }
}

/// Audience a generated query was written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    #[serde(alias = "Consumer")]
    Consumer,
    #[serde(alias = "Business")]
    Business,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Consumer => "consumer",
            QueryType::Business => "business",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Deterministic response identifier (SHA256(provider, query, body, fetched_at)[0:16])
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(String);

impl ResponseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResponseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One provider answer to one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Provider that produced the answer
    pub provider: Provider,

    /// Query sent to the provider
    pub query_text: String,

    /// Consumer- or business-focused query
    pub query_type: QueryType,

    /// Response text; `None` when the fetch failed upstream
    pub body: Option<String>,

    /// When the response was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RawResponse {
    /// Create a response with a body, fetched now
    pub fn new(
        provider: Provider,
        query_text: impl Into<String>,
        query_type: QueryType,
        body: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            query_text: query_text.into(),
            query_type,
            body: Some(body.into()),
            fetched_at: Utc::now(),
        }
    }

    /// Override the fetch timestamp
    pub fn fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Compute the deterministic id of this response
    pub fn id(&self) -> ResponseId {
        let mut hasher = Sha256::new();
        hasher.update(self.provider.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.query_text.as_bytes());
        hasher.update([0u8]);
        if let Some(ref body) = self.body {
            hasher.update(body.as_bytes());
        }
        hasher.update([0u8]);
        hasher.update(self.fetched_at.to_rfc3339().as_bytes());

        let result = hasher.finalize();
        ResponseId(hex::encode(&result[..8]))
    }
}
