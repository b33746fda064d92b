//! Text scanning: normalization, name matching and context extraction.
//!
//! Everything here is a pure function of its inputs. The pipeline for one
//! response is:
//!
//! ```text
//! body -> normalize -> find_matches (business, each competitor)
//!      -> extract (ranks + snippets) -> classify_context
//! ```
//!
//! # Example
//!
//! ```
//! use aivis::domain::Entity;
//! use aivis::scan::{find_matches, normalize, FuzzyParams};
//!
//! let text = normalize("We recommend Acme for your needs.");
//! let acme = Entity::new("Acme").unwrap();
//! let spans = find_matches(&acme, &text, &FuzzyParams::default());
//! assert_eq!(spans.len(), 1);
//! ```

pub mod competitors;
pub mod context;
pub mod matcher;
pub mod normalize;
pub mod sentiment;

pub use competitors::{scan_competitors, CompetitorHits, CompetitorScanner};
pub use context::{context_snippets, extract, position_ranks, EntityContext, DEFAULT_CONTEXT_WINDOW};
pub use matcher::{find_matches, find_pattern_matches, EntityPattern, FuzzyParams};
pub use normalize::{normalize, tokenize, NormalizedText, Token};
pub use sentiment::classify_context;
