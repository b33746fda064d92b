//! Concurrent batch analysis tests.
//!
//! The CLI fans responses out to the blocking pool; these tests check that
//! the result matches the sequential path exactly.

use std::sync::Arc;

use aivis::cli::analyze_concurrently;
use aivis::core::{Analyzer, ScanSettings};
use aivis::domain::{Entity, Provider, QueryType, RawResponse};
use chrono::{Duration, TimeZone, Utc};

fn analyzer() -> Analyzer {
    Analyzer::new(
        Entity::new("Acme").unwrap(),
        vec![Entity::new("Globex").unwrap(), Entity::new("Initech").unwrap()],
        ScanSettings::default(),
    )
    .unwrap()
}

fn responses(count: usize) -> Vec<RawResponse> {
    let providers = [Provider::Openai, Provider::Claude, Provider::Perplexity, Provider::Gemini];
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    (0..count)
        .map(|i| {
            let body = match i % 3 {
                0 => format!("Answer {i}: Acme first, then Globex."),
                1 => format!("Answer {i}: Initech or Globex."),
                _ => format!("Answer {i}: Globex, and Acme is fine."),
            };
            let query_type = if i % 2 == 0 {
                QueryType::Consumer
            } else {
                QueryType::Business
            };
            RawResponse::new(providers[i % providers.len()], format!("query {}", i % 5), query_type, body)
                .fetched_at(base + Duration::minutes(i as i64))
        })
        .collect()
}

#[tokio::test]
async fn test_concurrent_matches_sequential() {
    let analyzer = Arc::new(analyzer());
    let input = responses(40);

    let sequential = analyzer.analyze_batch(&input);
    let concurrent = analyze_concurrently(Arc::clone(&analyzer), input, 0).await.unwrap();

    assert_eq!(concurrent, sequential);
}

#[tokio::test]
async fn test_concurrent_preserves_input_order() {
    let analyzer = Arc::new(analyzer());
    let input = responses(25);
    let expected: Vec<_> = input.iter().map(RawResponse::id).collect();

    let report = analyze_concurrently(analyzer, input, 0).await.unwrap();
    let actual: Vec<_> = report.analyses.iter().map(|a| a.response_id.clone()).collect();

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_failures_do_not_abort_batch() {
    let analyzer = Arc::new(analyzer());
    let mut input = responses(6);
    input[2].body = None;
    input[4].body = None;

    let report = analyze_concurrently(analyzer, input, 3).await.unwrap();

    assert_eq!(report.analyses.len(), 4);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.stats.analyzed, 4);
    assert_eq!(report.stats.unanalyzable, 5);
    assert_eq!(report.stats.total_responses, 9);
    assert!(report.skipped.iter().all(|s| s.reason.contains("missing")));
}

#[tokio::test]
async fn test_empty_batch() {
    let report = analyze_concurrently(Arc::new(analyzer()), Vec::new(), 0).await.unwrap();
    assert!(report.analyses.is_empty());
    assert_eq!(report.stats.overall.mention_rate, None);
}
