//! Serializable batch report.
//!
//! The report is the JSON document `aivis analyze` emits. It carries every
//! per-response analysis next to the batch statistics so downstream tools
//! never have to re-run the engine.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{BatchReport, BatchStats, RateStat, ResponseAnalysis, SkippedResponse};
use crate::domain::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub name: String,
    pub aliases: Vec<String>,
    pub competitors: Vec<String>,
}

/// Complete output of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub business: BusinessSummary,
    pub stats: BatchStats,
    pub responses: Vec<ResponseAnalysis>,
    pub skipped: Vec<SkippedResponse>,
}

impl Report {
    pub fn new(business: &Entity, competitors: &[Entity], batch: BatchReport) -> Self {
        Self {
            generated_at: Utc::now(),
            business: BusinessSummary {
                name: business.name().to_string(),
                aliases: business.aliases().to_vec(),
                competitors: competitors.iter().map(|c| c.name().to_string()).collect(),
            },
            stats: batch.stats,
            responses: batch.analyses,
            skipped: batch.skipped,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    /// Write the JSON report, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }

    /// Short human-readable summary
    pub fn summary_lines(&self) -> Vec<String> {
        let stats = &self.stats;
        let mut lines = vec![
            format!("Business: {}", self.business.name),
            format!(
                "Responses: {} analyzed, {} unanalyzable",
                stats.analyzed, stats.unanalyzable
            ),
            format!("Overall: {}", format_rate(&stats.overall)),
        ];

        for provider in &stats.by_provider {
            let mut line = format!("  {:<12} {}", provider.provider, format_rate(&provider.rate));
            if provider.unanalyzable > 0 {
                line.push_str(&format!(", {} unanalyzable", provider.unanalyzable));
            }
            lines.push(line);
        }
        for query_type in &stats.by_query_type {
            lines.push(format!("  {:<12} {}", query_type.query_type, format_rate(&query_type.rate)));
        }

        let mentioned: Vec<String> = stats
            .competitor_ranking
            .iter()
            .filter(|t| t.mention_count > 0)
            .map(|t| format!("{} ({})", t.entity, t.mention_count))
            .collect();
        if !mentioned.is_empty() {
            lines.push(format!("Competitors: {}", mentioned.join(", ")));
        }

        lines
    }
}

fn format_rate(rate: &RateStat) -> String {
    match (rate.mention_rate, rate.avg_score) {
        (Some(mention_rate), Some(avg_score)) => format!(
            "{}/{} mentioned ({:.1}%), avg score {:.2}",
            rate.mentioned,
            rate.responses,
            mention_rate * 100.0,
            avg_score
        ),
        _ => "no analyzed responses".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Analyzer, ScanSettings};
    use crate::domain::{Provider, QueryType, RawResponse};
    use tempfile::TempDir;

    fn report() -> Report {
        let business = Entity::new("Acme").unwrap();
        let competitors = vec![Entity::new("Globex").unwrap()];
        let analyzer =
            Analyzer::new(business.clone(), competitors.clone(), ScanSettings::default()).unwrap();
        let batch = analyzer.analyze_batch(&[
            RawResponse::new(Provider::Openai, "q", QueryType::Consumer, "Acme beats Globex"),
            RawResponse::new(Provider::Claude, "q", QueryType::Consumer, "Globex only"),
        ]);
        Report::new(&business, &competitors, batch)
    }

    #[test]
    fn test_summary() {
        let lines = report().summary_lines();
        assert_eq!(lines[0], "Business: Acme");
        assert_eq!(lines[1], "Responses: 2 analyzed, 0 unanalyzable");
        assert!(lines[2].starts_with("Overall: 1/2 mentioned (50.0%)"));
        assert_eq!(lines.last().unwrap(), "Competitors: Globex (2)");
    }

    #[test]
    fn test_summary_shows_provider_skips() {
        let business = Entity::new("Acme").unwrap();
        let analyzer = Analyzer::new(business.clone(), Vec::new(), ScanSettings::default()).unwrap();
        let mut failed = RawResponse::new(Provider::Perplexity, "q", QueryType::Consumer, "");
        failed.body = None;
        let batch = analyzer.analyze_batch(&[failed]);
        let lines = Report::new(&business, &[], batch).summary_lines();

        assert!(lines.contains(&"  perplexity   no analyzed responses, 1 unanalyzable".to_string()));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("report.json");
        let report = report();
        report.write_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["business"]["name"], "Acme");
        assert_eq!(value["stats"]["overall"]["mention_rate"], 0.5);
        assert_eq!(value["responses"][0]["business"]["position_rank"], 1);
        assert_eq!(value["responses"][1]["business"]["position_rank"], serde_json::Value::Null);
    }
}
