//! Competitor scanning.
//!
//! Each competitor is matched independently of the others; results keep
//! configuration order so reports render in a stable order.

use crate::domain::{CompetitorTally, Entity, MatchSpan};

use super::matcher::{find_pattern_matches, EntityPattern, FuzzyParams};
use super::normalize::NormalizedText;

/// Spans found for one competitor in one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitorHits {
    pub entity: String,
    pub spans: Vec<MatchSpan>,
}

impl CompetitorHits {
    /// Tally for a single response, given the rank computed over all entities
    pub fn tally(&self, position_rank: Option<usize>) -> CompetitorTally {
        CompetitorTally {
            entity: self.entity.clone(),
            mention_count: usize::from(!self.spans.is_empty()),
            span_count: self.spans.len(),
            avg_position: position_rank.map(|rank| rank as f64),
        }
    }
}

/// Prepared matcher for a fixed competitor list
#[derive(Debug, Clone)]
pub struct CompetitorScanner {
    patterns: Vec<EntityPattern>,
}

impl CompetitorScanner {
    pub fn new(competitors: &[Entity]) -> Self {
        Self {
            patterns: competitors.iter().map(EntityPattern::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Match every competitor, in configuration order
    pub fn scan(&self, text: &NormalizedText, fuzzy: &FuzzyParams) -> Vec<CompetitorHits> {
        self.patterns
            .iter()
            .map(|pattern| CompetitorHits {
                entity: pattern.entity_name().to_string(),
                spans: find_pattern_matches(pattern, text, fuzzy),
            })
            .collect()
    }
}

/// One-shot scan of `competitors` over `text`
pub fn scan_competitors(
    competitors: &[Entity],
    text: &NormalizedText,
    fuzzy: &FuzzyParams,
) -> Vec<CompetitorHits> {
    CompetitorScanner::new(competitors).scan(text, fuzzy)
}
