//! Core analysis logic.
//!
//! This module contains:
//! - Settings: scan tuning with validated defaults
//! - Analyzer: per-response aggregation and scoring
//! - Scoring: the bounded visibility formula
//! - Batch: statistics over a set of analyses

pub mod analyzer;
pub mod batch;
pub mod scoring;
pub mod settings;

pub use analyzer::{Aggregation, AnalysisError, Analyzer, ResponseAnalysis};
pub use batch::{
    BatchReport, BatchStats, ProviderStat, QueryStat, QueryTypeStat, RateStat, SegmentStat,
    SkippedResponse,
};
pub use scoring::{rank_percentile, score};
pub use settings::{ScanSettings, SettingsError};
