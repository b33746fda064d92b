//! aivis - AI search visibility analysis
//!
//! Measures how visible a business is in answers from AI providers:
//! whether it is mentioned, how early relative to its competitors, and how
//! often.
//!
//! # Architecture
//!
//! The engine is a pure function of its configuration and the response
//! text:
//! - Provider adapters strip formatting from each response body
//! - The normalizer folds case and accents while keeping an offset map
//! - Names and aliases are matched token by token, with a bounded fuzzy fallback
//! - Mentions are ranked by first appearance and scored on a 0..1 scale
//! - Batch statistics are computed once over the full set of analyses
//!
//! # Modules
//!
//! - `domain`: Data structures (Entity, RawResponse, MentionRecord)
//! - `scan`: Text normalization, matching and context extraction
//! - `core`: Analyzer, scoring and batch statistics
//! - `adapters`: Provider-specific body cleanup
//! - `ingest`: Loading responses from JSON, JSONL and text dumps
//! - `config`: YAML configuration
//! - `report`: JSON report and summary
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Analyze collected responses
//! aivis analyze responses/*.jsonl --output report.json
//!
//! # Analyze one response from stdin
//! cat answer.txt | aivis scan --provider perplexity --query "best widgets"
//!
//! # Show resolved configuration
//! aivis config
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod report;
pub mod scan;

// Re-export main types at crate root for convenience
pub use core::{Analyzer, BatchReport, BatchStats, ResponseAnalysis, ScanSettings};
pub use domain::{Entity, MentionRecord, Provider, QueryType, RawResponse, VisibilityScore};
pub use report::Report;
