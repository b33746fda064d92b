//! Mention aggregation for single responses.
//!
//! The `Analyzer` holds the business entity, the competitor list and the
//! scan settings. It is immutable once built, so one instance can be shared
//! across threads and applied to any number of responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapters::adapter_for;
use crate::domain::{
    CompetitorTally, Entity, MatchSpan, MentionRecord, Provider, QueryType, RawResponse,
    RelativePosition, ResponseId, VisibilityScore,
};
use crate::scan::{
    classify_context, extract, find_pattern_matches, normalize, CompetitorScanner, EntityContext,
    EntityPattern,
};

use super::batch::{BatchReport, SkippedResponse};
use super::scoring::score;
use super::settings::{ScanSettings, SettingsError};

/// Per-response analysis errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Response {response_id} is malformed: {reason}")]
    MalformedResponse {
        response_id: ResponseId,
        reason: String,
    },
}

/// Mention records for one response
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Business record, present even when nothing matched
    pub business: MentionRecord,
    /// One record per competitor, in configuration order
    pub competitors: Vec<MentionRecord>,
    /// One tally per competitor, in configuration order
    pub tallies: Vec<CompetitorTally>,
}

/// Full result for one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    pub response_id: ResponseId,
    pub provider: Provider,
    pub query_type: QueryType,
    pub query_text: String,
    pub business: MentionRecord,
    pub competitors: Vec<MentionRecord>,
    pub tallies: Vec<CompetitorTally>,
    pub score: VisibilityScore,
}

/// Mention detection and scoring engine
#[derive(Debug, Clone)]
pub struct Analyzer {
    business: Entity,
    business_pattern: EntityPattern,
    competitors: Vec<Entity>,
    scanner: CompetitorScanner,
    settings: ScanSettings,
}

impl Analyzer {
    /// Build an analyzer.
    ///
    /// Competitors that repeat the business name or an earlier competitor
    /// are dropped with a warning.
    pub fn new(
        business: Entity,
        competitors: Vec<Entity>,
        settings: ScanSettings,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;

        let mut seen = vec![normalize(business.name()).as_str().to_string()];
        let mut kept = Vec::with_capacity(competitors.len());
        for competitor in competitors {
            let key = normalize(competitor.name()).as_str().to_string();
            if seen.contains(&key) {
                warn!(competitor = %competitor, "Ignoring duplicate competitor");
                continue;
            }
            seen.push(key);
            kept.push(competitor);
        }

        Ok(Self {
            business_pattern: EntityPattern::new(&business),
            scanner: CompetitorScanner::new(&kept),
            business,
            competitors: kept,
            settings,
        })
    }

    pub fn business(&self) -> &Entity {
        &self.business
    }

    pub fn competitors(&self) -> &[Entity] {
        &self.competitors
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Business plus competitors
    pub fn total_entities(&self) -> usize {
        1 + self.competitors.len()
    }

    /// Produce mention records and competitor tallies for one response
    pub fn aggregate(&self, response: &RawResponse) -> Result<Aggregation, AnalysisError> {
        let response_id = response.id();
        let body = response
            .body
            .as_deref()
            .ok_or_else(|| AnalysisError::MalformedResponse {
                response_id: response_id.clone(),
                reason: "response body is missing".to_string(),
            })?;

        let cleaned = adapter_for(response.provider).clean(body);
        let text = normalize(&cleaned);
        let fuzzy = self.settings.fuzzy();

        let business_spans = find_pattern_matches(&self.business_pattern, &text, &fuzzy);
        let hits = self.scanner.scan(&text, &fuzzy);

        // Business first: rank ties resolve in configuration order
        let all_spans: Vec<Vec<MatchSpan>> = std::iter::once(business_spans)
            .chain(hits.iter().map(|h| h.spans.clone()))
            .collect();
        let contexts = extract(&all_spans, &text, &cleaned, self.settings.context_window);

        let tallies: Vec<CompetitorTally> = hits
            .iter()
            .zip(&contexts[1..])
            .map(|(hit, context)| hit.tally(context.position_rank))
            .collect();

        let names = std::iter::once(self.business.name())
            .chain(self.competitors.iter().map(Entity::name));
        let mut records = names
            .zip(all_spans)
            .zip(contexts)
            .map(|((name, spans), context)| {
                build_record(name, &response_id, spans, context, text.len())
            });

        let business = records
            .next()
            .unwrap_or_else(|| MentionRecord::absent(self.business.name(), response_id.clone()));
        let competitors: Vec<MentionRecord> = records.collect();

        debug!(
            response_id = %response_id,
            provider = %response.provider,
            business_spans = business.span_count(),
            business_rank = ?business.position_rank,
            competitors_mentioned = competitors.iter().filter(|r| r.is_mentioned()).count(),
            "Aggregated response"
        );

        Ok(Aggregation {
            business,
            competitors,
            tallies,
        })
    }

    /// Aggregate and score one response
    pub fn analyze(&self, response: &RawResponse) -> Result<ResponseAnalysis, AnalysisError> {
        let aggregation = self.aggregate(response)?;
        let score = score(&aggregation.business, self.total_entities());

        Ok(ResponseAnalysis {
            response_id: aggregation.business.response_id.clone(),
            provider: response.provider,
            query_type: response.query_type,
            query_text: response.query_text.clone(),
            business: aggregation.business,
            competitors: aggregation.competitors,
            tallies: aggregation.tallies,
            score,
        })
    }

    /// Analyze a response, turning failures into a skip marker
    pub fn analyze_or_skip(&self, response: &RawResponse) -> Result<ResponseAnalysis, SkippedResponse> {
        self.analyze(response).map_err(|e| {
            warn!(
                provider = %response.provider,
                query = %response.query_text,
                error = %e,
                "Skipping unanalyzable response"
            );
            SkippedResponse::new(response, &e)
        })
    }

    /// Analyze every response in order.
    ///
    /// A failing response is reported as skipped and never aborts the batch.
    pub fn analyze_batch(&self, responses: &[RawResponse]) -> BatchReport {
        let outcomes = responses.iter().map(|r| self.analyze_or_skip(r)).collect();
        BatchReport::from_outcomes(self, outcomes, 0)
    }
}

fn build_record(
    entity: &str,
    response_id: &ResponseId,
    spans: Vec<MatchSpan>,
    context: EntityContext,
    text_len: usize,
) -> MentionRecord {
    let relative_position = spans
        .first()
        .and_then(|s| RelativePosition::from_offset(s.start, text_len));
    let context_type = (!spans.is_empty()).then(|| classify_context(&context.context_snippets));

    MentionRecord {
        entity: entity.to_string(),
        response_id: response_id.clone(),
        spans,
        position_rank: context.position_rank,
        context_snippets: context.context_snippets,
        context_type,
        relative_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContextType, MatchKind};

    fn analyzer(business: &str, competitors: &[&str]) -> Analyzer {
        Analyzer::new(
            Entity::new(business).unwrap(),
            competitors.iter().map(|c| Entity::new(*c).unwrap()).collect(),
            ScanSettings::default(),
        )
        .unwrap()
    }

    fn response(body: &str) -> RawResponse {
        RawResponse::new(Provider::Claude, "best widgets?", QueryType::Consumer, body)
    }

    #[test]
    fn test_business_record_always_present() {
        let analyzer = analyzer("Acme", &["Globex"]);
        let aggregation = analyzer.aggregate(&response("Nothing relevant here.")).unwrap();

        assert_eq!(aggregation.business.entity, "Acme");
        assert!(aggregation.business.spans.is_empty());
        assert_eq!(aggregation.business.position_rank, None);
        assert_eq!(aggregation.business.context_type, None);
        assert_eq!(aggregation.competitors.len(), 1);
        assert_eq!(aggregation.tallies[0].mention_count, 0);
    }

    #[test]
    fn test_ranks_across_business_and_competitors() {
        let analyzer = analyzer("Acme", &["Initech", "Globex"]);
        let aggregation = analyzer
            .aggregate(&response("Globex is fine, but we recommend Acme. Initech is last."))
            .unwrap();

        assert_eq!(aggregation.business.position_rank, Some(2));
        assert_eq!(aggregation.competitors[0].entity, "Initech");
        assert_eq!(aggregation.competitors[0].position_rank, Some(3));
        assert_eq!(aggregation.competitors[1].position_rank, Some(1));
        assert_eq!(aggregation.tallies[1].avg_position, Some(1.0));
    }

    #[test]
    fn test_missing_body_is_malformed() {
        let analyzer = analyzer("Acme", &[]);
        let mut r = response("x");
        r.body = None;

        let err = analyzer.aggregate(&r).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse { .. }));
    }

    #[test]
    fn test_empty_body_is_analyzable() {
        let analyzer = analyzer("Acme", &[]);
        let analysis = analyzer.analyze(&response("")).unwrap();
        assert!(!analysis.score.business_mentioned);
        assert_eq!(analysis.score.score, 0.0);
    }

    #[test]
    fn test_record_extras() {
        let analyzer = analyzer("Acme", &[]);
        let analysis = analyzer
            .analyze(&response("We recommend Acme, the best option around for most people."))
            .unwrap();

        assert_eq!(analysis.business.relative_position, Some(RelativePosition::Beginning));
        assert_eq!(analysis.business.context_type, Some(ContextType::Recommended));
        assert_eq!(analysis.business.spans[0].match_kind, MatchKind::Exact);
    }

    #[test]
    fn test_domain_alias_counts_as_mention() {
        let business = Entity::new("Acme Widgets").unwrap().with_url("https://www.acme.com");
        let analyzer = Analyzer::new(business, Vec::new(), ScanSettings::default()).unwrap();

        let analysis = analyzer.analyze(&response("Order from acme.com directly.")).unwrap();
        assert!(analysis.score.business_mentioned);
        assert_eq!(analysis.business.spans[0].match_kind, MatchKind::Alias);
    }

    #[test]
    fn test_www_domain_counts_as_mention() {
        let business = Entity::new("Acme Widgets").unwrap().with_url("https://www.acme.com");
        let analyzer = Analyzer::new(business, Vec::new(), ScanSettings::default()).unwrap();

        let analysis = analyzer.analyze(&response("Order from www.acme.com directly.")).unwrap();
        assert!(analysis.score.business_mentioned);
        assert_eq!(analysis.business.spans.len(), 1);
        assert_eq!(analysis.business.spans[0].match_kind, MatchKind::Alias);
        assert_eq!(analysis.business.spans[0].matched_text, "acme.com");
    }

    #[test]
    fn test_huge_window_factor_does_not_overflow() {
        let settings = ScanSettings {
            fuzzy_window_factor: usize::MAX,
            ..Default::default()
        };
        let analyzer = Analyzer::new(Entity::new("Old Man Emu").unwrap(), Vec::new(), settings).unwrap();

        let analysis = analyzer.analyze(&response("old man")).unwrap();
        assert!(analysis.score.business_mentioned);
        assert_eq!(analysis.business.spans[0].match_kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_provider_adapter_applied() {
        let analyzer = analyzer("Acme", &[]);
        let r = RawResponse::new(
            Provider::Perplexity,
            "q",
            QueryType::Business,
            "**Acme**[1] is popular.",
        );
        let analysis = analyzer.analyze(&r).unwrap();
        assert_eq!(analysis.business.context_snippets, vec!["Acme is popular.".to_string()]);
    }

    #[test]
    fn test_duplicate_competitors_dropped() {
        let analyzer = analyzer("Acme", &["Globex", "ACME", "globex", "Initech"]);
        let names: Vec<&str> = analyzer.competitors().iter().map(Entity::name).collect();
        assert_eq!(names, vec!["Globex", "Initech"]);
        assert_eq!(analyzer.total_entities(), 3);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = ScanSettings {
            fuzzy_threshold: 2.0,
            ..Default::default()
        };
        let result = Analyzer::new(Entity::new("Acme").unwrap(), Vec::new(), settings);
        assert!(result.is_err());
    }
}
