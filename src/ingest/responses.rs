//! Response loading.
//!
//! Supported inputs:
//! - `.jsonl`: one `ResponseEntry` per line
//! - `.json`: an array of `ResponseEntry`
//! - `.csv`: `Query ID,Query Text,Provider,Response Text` rows
//! - anything else: the plain-text dump written by the collection scripts
//!
//! A record that cannot be parsed is logged and counted as rejected; it
//! never aborts the load.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{Provider, QueryType, RawResponse};

use super::query_type::QueryClassifier;

/// `=== OPENAI RESPONSES ===`
static PROVIDER_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"===\s*(\w+)\s+RESPONSES\s*===").unwrap());

/// A line holding only `---`
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*---[ \t]*$").unwrap());

static QUERY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^QUERY\s+(\d+):").unwrap());

/// `RESPONSE 3 (openai):` or `RESPONSE 3:`
static RESPONSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^RESPONSE\s+(\d+)\s*(?:\([^)]*\))?:").unwrap());

/// One response record on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEntry {
    pub provider: Provider,

    #[serde(alias = "query")]
    pub query_text: String,

    /// Position in the generated query set (1-based)
    #[serde(default)]
    pub query_id: Option<u32>,

    /// Classified from the query when absent
    #[serde(default)]
    pub query_type: Option<QueryType>,

    /// `null` or missing when the provider call failed
    #[serde(default, alias = "response_text", alias = "response")]
    pub body: Option<String>,

    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ResponseEntry {
    /// Convert to a `RawResponse`, filling the query type and timestamp
    pub fn into_raw(self, classifier: &QueryClassifier, default_fetched_at: DateTime<Utc>) -> RawResponse {
        let query_type = self
            .query_type
            .unwrap_or_else(|| classifier.classify(&self.query_text, self.query_id));

        RawResponse {
            provider: self.provider,
            query_text: self.query_text,
            query_type,
            body: self.body,
            fetched_at: self.fetched_at.unwrap_or(default_fetched_at),
        }
    }
}

/// Responses loaded from one or more inputs
#[derive(Debug, Clone, Default)]
pub struct ParsedResponses {
    pub responses: Vec<RawResponse>,
    /// Records that could not be parsed
    pub rejected: usize,
}

impl ParsedResponses {
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    fn extend(&mut self, other: ParsedResponses) {
        self.responses.extend(other.responses);
        self.rejected += other.rejected;
    }
}

/// Parse JSON Lines content; blank lines are ignored
pub fn parse_jsonl(
    content: &str,
    classifier: &QueryClassifier,
    default_fetched_at: DateTime<Utc>,
) -> ParsedResponses {
    let mut parsed = ParsedResponses::default();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ResponseEntry>(line) {
            Ok(entry) => parsed
                .responses
                .push(entry.into_raw(classifier, default_fetched_at)),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Rejecting unparseable response record");
                parsed.rejected += 1;
            }
        }
    }

    parsed
}

/// Parse a JSON array of records.
///
/// Each element is decoded on its own so one bad record only rejects itself.
pub fn parse_json_array(
    content: &str,
    classifier: &QueryClassifier,
    default_fetched_at: DateTime<Utc>,
) -> Result<ParsedResponses> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(content).context("Expected a JSON array of response records")?;

    let mut parsed = ParsedResponses::default();
    for (idx, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<ResponseEntry>(value) {
            Ok(entry) => parsed
                .responses
                .push(entry.into_raw(classifier, default_fetched_at)),
            Err(e) => {
                warn!(index = idx, error = %e, "Rejecting unparseable response record");
                parsed.rejected += 1;
            }
        }
    }

    Ok(parsed)
}

/// Column headers of a responses CSV
const CSV_QUERY_ID: &str = "Query ID";
const CSV_QUERY_TEXT: &str = "Query Text";
const CSV_PROVIDER: &str = "Provider";
const CSV_RESPONSE_TEXT: &str = "Response Text";

/// Parse a responses CSV.
///
/// Columns are found by header name, so extra or reordered columns are
/// fine. An empty `Response Text` cell is a failed provider call. A row
/// without a provider or query text is rejected.
pub fn parse_csv(
    content: &str,
    classifier: &QueryClassifier,
    default_fetched_at: DateTime<Utc>,
) -> Result<ParsedResponses> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("Missing CSV column: {}", name))
    };
    let query_id_col = headers.iter().position(|h| h.trim() == CSV_QUERY_ID);
    let query_text_col = column(CSV_QUERY_TEXT)?;
    let provider_col = column(CSV_PROVIDER)?;
    let body_col = column(CSV_RESPONSE_TEXT)?;

    let mut parsed = ParsedResponses::default();
    for (idx, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(row = idx + 1, error = %e, "Rejecting unreadable CSV row");
                parsed.rejected += 1;
                continue;
            }
        };

        let field = |col: usize| row.get(col).map(str::trim).filter(|s| !s.is_empty());

        let (Some(provider), Some(query_text)) = (field(provider_col), field(query_text_col)) else {
            warn!(row = idx + 1, "Rejecting CSV row without provider or query text");
            parsed.rejected += 1;
            continue;
        };

        let query_id = match query_id_col.and_then(field) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(row = idx + 1, query_id = raw, error = %e, "Rejecting CSV row with bad query id");
                    parsed.rejected += 1;
                    continue;
                }
            },
            None => None,
        };

        let entry = ResponseEntry {
            provider: provider.parse().unwrap_or(Provider::Unknown),
            query_text: query_text.to_string(),
            query_id,
            query_type: None,
            body: row.get(body_col).filter(|b| !b.trim().is_empty()).map(str::to_string),
            fetched_at: None,
        };
        parsed
            .responses
            .push(entry.into_raw(classifier, default_fetched_at));
    }

    Ok(parsed)
}

/// Parse the plain-text dump.
///
/// Multi-provider dumps group blocks under `=== NAME RESPONSES ===`
/// headers; dumps without headers come from a single unnamed provider.
/// Blocks are separated by `---` lines and hold a `QUERY n:` line followed
/// by a `RESPONSE n:` body.
pub fn parse_legacy_text(
    content: &str,
    classifier: &QueryClassifier,
    default_fetched_at: DateTime<Utc>,
) -> ParsedResponses {
    let headers: Vec<_> = PROVIDER_HEADER_RE.captures_iter(content).collect();

    let sections: Vec<(Provider, &str)> = if headers.is_empty() {
        vec![(Provider::Unknown, content)]
    } else {
        headers
            .iter()
            .enumerate()
            .map(|(i, caps)| {
                let start = caps.get(0).map_or(0, |m| m.end());
                let end = headers
                    .get(i + 1)
                    .and_then(|next| next.get(0))
                    .map_or(content.len(), |m| m.start());
                let provider = caps[1].parse().unwrap_or(Provider::Unknown);
                (provider, &content[start..end])
            })
            .collect()
    };

    let mut parsed = ParsedResponses::default();
    for (provider, section) in sections {
        for block in SEPARATOR_RE.split(section) {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }
            match parse_block(block) {
                Some((query_id, query_text, body)) => {
                    let entry = ResponseEntry {
                        provider,
                        query_text,
                        query_id: Some(query_id),
                        query_type: None,
                        body: Some(body),
                        fetched_at: None,
                    };
                    parsed
                        .responses
                        .push(entry.into_raw(classifier, default_fetched_at));
                }
                None => {
                    warn!(provider = %provider, "Rejecting text block without QUERY/RESPONSE pair");
                    parsed.rejected += 1;
                }
            }
        }
    }

    parsed
}

/// Split one block into (query id, query text, response body)
fn parse_block(block: &str) -> Option<(u32, String, String)> {
    let query = QUERY_RE.captures(block)?;
    let query_match = query.get(0)?;
    let query_id: u32 = query[1].parse().ok()?;

    let response = RESPONSE_RE.captures_at(block, query_match.end())?;
    let response_match = response.get(0)?;

    let query_text = block[query_match.end()..response_match.start()].trim();
    let body_end = QUERY_RE
        .find_at(block, response_match.end())
        .map_or(block.len(), |m| m.start());
    let body = block[response_match.end()..body_end].trim();

    if query_text.is_empty() {
        return None;
    }
    Some((query_id, query_text.to_string(), body.to_string()))
}

/// Load one file, picking the format from its extension.
///
/// Records without a timestamp take the file's modification time so their
/// ids stay stable across runs.
pub fn load_responses(path: &Path, classifier: &QueryClassifier) -> Result<ParsedResponses> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read responses file: {}", path.display()))?;

    let default_fetched_at = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let parsed = match extension.as_deref() {
        Some("jsonl") => parse_jsonl(&content, classifier, default_fetched_at),
        Some("json") => parse_json_array(&content, classifier, default_fetched_at)
            .with_context(|| format!("Failed to parse responses file: {}", path.display()))?,
        Some("csv") => parse_csv(&content, classifier, default_fetched_at)
            .with_context(|| format!("Failed to parse responses file: {}", path.display()))?,
        _ => parse_legacy_text(&content, classifier, default_fetched_at),
    };

    debug!(
        path = %path.display(),
        responses = parsed.len(),
        rejected = parsed.rejected,
        "Loaded responses"
    );
    Ok(parsed)
}

/// Expand paths and glob patterns into a sorted, deduplicated file list
pub fn expand_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let input = input.as_ref();
        let literal = Path::new(input);
        if literal.is_file() {
            files.push(literal.to_path_buf());
            continue;
        }

        let mut matched = false;
        for entry in glob::glob(input).with_context(|| format!("Invalid input pattern: {}", input))? {
            let path = entry.with_context(|| format!("Failed to read match for: {}", input))?;
            if path.is_file() {
                files.push(path);
                matched = true;
            }
        }
        if !matched {
            anyhow::bail!("No response files match: {}", input);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Load every input, in sorted path order
pub fn load_all<S: AsRef<str>>(inputs: &[S], classifier: &QueryClassifier) -> Result<ParsedResponses> {
    let mut all = ParsedResponses::default();
    for path in expand_inputs(inputs)? {
        all.extend(load_responses(&path, classifier)?);
    }
    Ok(all)
}
