//! Response ingestion.
//!
//! Loads provider responses collected elsewhere into `RawResponse` values:
//!
//! 1. **Files**: paths or glob patterns, expanded and sorted
//! 2. **Formats**: JSON Lines, JSON arrays, CSV, or the plain-text collection dump
//! 3. **Query types**: classified from the query when a record has none
//!
//! # Architecture
//!
//! ```text
//! files/globs → expand_inputs → load_responses → ParsedResponses
//!                                    ↓
//!                           QueryClassifier (missing query_type)
//! ```

pub mod query_type;
pub mod responses;

pub use query_type::{QueryClassifier, DEFAULT_NUM_CONSUMER};
pub use responses::{
    expand_inputs, load_all, load_responses, parse_csv, parse_json_array, parse_jsonl,
    parse_legacy_text,
    ParsedResponses, ResponseEntry,
};
