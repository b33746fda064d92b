//! Mention records and the values derived from them.
//!
//! A `MentionRecord` is created once per (entity, response) pair and never
//! mutated. Tallies and scores are derived from records and are recomputed,
//! never patched.

use serde::{Deserialize, Serialize};

use super::response::ResponseId;

/// Which matching rule produced a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Entity name as a whole-word token sequence
    Exact,
    /// A configured alias as a whole-word token sequence
    Alias,
    /// Token-set overlap within a sliding window
    Fuzzy,
}

/// A matched range of the normalized response text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    /// Byte offset into the normalized text (inclusive)
    pub start: usize,
    /// Byte offset into the normalized text (exclusive)
    pub end: usize,
    /// Normalized text covered by the span
    pub matched_text: String,
    /// Rule that fired
    pub match_kind: MatchKind,
}

impl MatchSpan {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Where the first mention falls within the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativePosition {
    /// First third of the text
    Beginning,
    /// Middle third
    Middle,
    /// Last third
    End,
}

impl RelativePosition {
    /// Bucket an offset by its fraction of the total length
    pub fn from_offset(offset: usize, len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let relative = offset as f64 / len as f64;
        Some(if relative < 1.0 / 3.0 {
            RelativePosition::Beginning
        } else if relative < 2.0 / 3.0 {
            RelativePosition::Middle
        } else {
            RelativePosition::End
        })
    }
}

/// Surface-keyword classification of the text around a mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Recommended,
    Negative,
    Comparison,
    Neutral,
}

/// Mention facts for one entity in one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
    /// Entity name
    pub entity: String,

    /// Response the record was computed from
    pub response_id: ResponseId,

    /// Non-overlapping spans ordered by start offset
    pub spans: Vec<MatchSpan>,

    /// 1-based order of first mention among all tracked entities; null iff no span
    pub position_rank: Option<usize>,

    /// Context windows rendered from the original text
    pub context_snippets: Vec<String>,

    /// Keyword classification of the snippets (null iff no span)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_type: Option<ContextType>,

    /// Location of the first span (null iff no span)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_position: Option<RelativePosition>,
}

impl MentionRecord {
    /// Record for an entity that was not found
    pub fn absent(entity: impl Into<String>, response_id: ResponseId) -> Self {
        Self {
            entity: entity.into(),
            response_id,
            spans: Vec::new(),
            position_rank: None,
            context_snippets: Vec::new(),
            context_type: None,
            relative_position: None,
        }
    }

    pub fn is_mentioned(&self) -> bool {
        !self.spans.is_empty()
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Start offset of the earliest span
    pub fn first_offset(&self) -> Option<usize> {
        self.spans.first().map(|s| s.start)
    }
}

/// Aggregate mention statistics for one competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorTally {
    /// Competitor name
    pub entity: String,

    /// Number of records with at least one span
    pub mention_count: usize,

    /// Total spans across all records
    pub span_count: usize,

    /// Mean position rank over records that have one
    pub avg_position: Option<f64>,
}

impl CompetitorTally {
    /// Fold every record belonging to `entity` into a tally
    pub fn from_records<'a, I>(entity: &str, records: I) -> Self
    where
        I: IntoIterator<Item = &'a MentionRecord>,
    {
        let mut mention_count = 0;
        let mut span_count = 0;
        let mut rank_sum = 0usize;
        let mut ranked = 0usize;

        for record in records.into_iter().filter(|r| r.entity == entity) {
            if record.is_mentioned() {
                mention_count += 1;
            }
            span_count += record.span_count();
            if let Some(rank) = record.position_rank {
                rank_sum += rank;
                ranked += 1;
            }
        }

        Self {
            entity: entity.to_string(),
            mention_count,
            span_count,
            avg_position: (ranked > 0).then(|| rank_sum as f64 / ranked as f64),
        }
    }
}

/// Bounded visibility metric for the business in one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityScore {
    pub response_id: ResponseId,

    pub business_mentioned: bool,

    /// Composite score in [0, 1]
    pub score: f64,

    /// 1.0 for first place down to 0.0 for last; null when not ranked
    pub rank_percentile: Option<f64>,
}
