//! Entities tracked in provider responses.
//!
//! An entity is either the business under test or one of its competitors.
//! Entities are validated once, when built from configuration, and are
//! read-only afterwards.

use serde::Serialize;
use thiserror::Error;

/// A business or competitor searched for in response text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,
}

impl Entity {
    /// Create an entity with no aliases
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidEntity> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(InvalidEntity::EmptyName);
        }
        if !is_matchable(&name) {
            return Err(InvalidEntity::Unmatchable { name });
        }

        Ok(Self {
            name,
            aliases: Vec::new(),
        })
    }

    /// Add aliases, preserving order and skipping duplicates of the name
    /// or of earlier aliases (case-insensitive)
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Result<Self, InvalidEntity>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alias in aliases {
            let alias = alias.into().trim().to_string();
            if alias.is_empty() {
                return Err(InvalidEntity::EmptyAlias {
                    entity: self.name.clone(),
                });
            }
            if !is_matchable(&alias) {
                return Err(InvalidEntity::Unmatchable { name: alias });
            }
            self.push_alias(alias);
        }
        Ok(self)
    }

    /// Register the host of a website URL as an alias.
    ///
    /// `https://www.acme.com/about` contributes `acme.com`. A blank URL
    /// leaves the entity unchanged.
    pub fn with_url(mut self, url: &str) -> Self {
        if let Some(domain) = extract_domain(url) {
            self.push_alias(domain);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn push_alias(&mut self, alias: String) {
        let lowered = alias.to_lowercase();
        let duplicate = self.name.to_lowercase() == lowered
            || self.aliases.iter().any(|a| a.to_lowercase() == lowered);
        if !duplicate {
            self.aliases.push(alias);
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Entity construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEntity {
    #[error("Entity name is empty")]
    EmptyName,

    #[error("Entity '{entity}' has an empty alias")]
    EmptyAlias { entity: String },

    #[error("Entity name '{name}' contains no letters or digits")]
    Unmatchable { name: String },
}

/// Names made only of punctuation normalize to nothing and can never match
fn is_matchable(name: &str) -> bool {
    name.chars().any(char::is_alphanumeric)
}

/// Extract the bare host from a URL: scheme, `www.` and path are dropped
pub fn extract_domain(url: &str) -> Option<String> {
    let url = url.trim().to_lowercase();
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url.as_str());
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    let host = without_www
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.');

    if host.is_empty() || !is_matchable(host) {
        None
    } else {
        Some(host.to_string())
    }
}
