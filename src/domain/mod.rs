//! Domain types for visibility analysis.
//!
//! - Entity: a business or competitor with its aliases
//! - Response: raw provider answers and their content-addressed ids
//! - Mention: match spans, per-entity records, tallies and scores

pub mod entity;
pub mod mention;
pub mod response;

pub use entity::{extract_domain, Entity, InvalidEntity};
pub use mention::{
    CompetitorTally, ContextType, MatchKind, MatchSpan, MentionRecord, RelativePosition,
    VisibilityScore,
};
pub use response::{Provider, QueryType, RawResponse, ResponseId};
