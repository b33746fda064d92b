//! Batch-level statistics.
//!
//! Statistics are derived from the full set of analyses in one pass and are
//! never patched: adding responses means building a new report.
//!
//! Mention rates use analyzed responses as the denominator. Responses that
//! could not be analyzed are counted separately in `unanalyzable`, overall
//! and per provider.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{CompetitorTally, Entity, MentionRecord, Provider, QueryType, RawResponse, ResponseId};

use super::analyzer::{AnalysisError, Analyzer, ResponseAnalysis};

/// Marker for a response that could not be analyzed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedResponse {
    pub response_id: ResponseId,
    pub provider: Provider,
    pub query_type: QueryType,
    pub query_text: String,
    pub reason: String,
}

impl SkippedResponse {
    pub fn new(response: &RawResponse, error: &AnalysisError) -> Self {
        Self {
            response_id: response.id(),
            provider: response.provider,
            query_type: response.query_type,
            query_text: response.query_text.clone(),
            reason: error.to_string(),
        }
    }
}

/// Mention rate over a group of analyzed responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateStat {
    /// Analyzed responses in the group
    pub responses: usize,
    /// Responses with at least one business span
    pub mentioned: usize,
    /// `mentioned / responses`; null for an empty group
    pub mention_rate: Option<f64>,
    /// Mean visibility score; null for an empty group
    pub avg_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct RateAccumulator {
    responses: usize,
    mentioned: usize,
    score_sum: f64,
}

impl RateAccumulator {
    fn add(&mut self, analysis: &ResponseAnalysis) {
        self.responses += 1;
        if analysis.score.business_mentioned {
            self.mentioned += 1;
        }
        self.score_sum += analysis.score.score;
    }

    fn finish(self) -> RateStat {
        let ratio = |value: f64| (self.responses > 0).then(|| value / self.responses as f64);
        RateStat {
            responses: self.responses,
            mentioned: self.mentioned,
            mention_rate: ratio(self.mentioned as f64),
            avg_score: ratio(self.score_sum),
        }
    }
}

/// Per-provider breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStat {
    pub provider: Provider,
    #[serde(flatten)]
    pub rate: RateStat,
    /// This provider's skipped responses, outside the rate denominator
    pub unanalyzable: usize,
    /// Competitor tallies over this provider's responses, configuration order
    pub competitors: Vec<CompetitorTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTypeStat {
    pub query_type: QueryType,
    #[serde(flatten)]
    pub rate: RateStat,
}

/// Breakdown keyed by (provider, query_type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStat {
    pub provider: Provider,
    pub query_type: QueryType,
    #[serde(flatten)]
    pub rate: RateStat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStat {
    pub query_text: String,
    #[serde(flatten)]
    pub rate: RateStat,
}

/// Aggregate statistics for a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Analyzed plus unanalyzable
    pub total_responses: usize,
    pub analyzed: usize,
    pub unanalyzable: usize,
    pub overall: RateStat,
    pub by_provider: Vec<ProviderStat>,
    pub by_query_type: Vec<QueryTypeStat>,
    pub by_provider_query_type: Vec<SegmentStat>,
    /// In first-seen order
    pub by_query: Vec<QueryStat>,
    /// Competitors by mention count, descending; ties keep configuration order
    pub competitor_ranking: Vec<CompetitorTally>,
}

impl BatchStats {
    /// Compute statistics over `analyses`.
    ///
    /// `skipped` and `rejected_inputs` are responses that never produced an
    /// analysis. Skipped responses are also counted under their provider;
    /// rejected inputs have no known provider.
    pub fn compute(
        analyses: &[ResponseAnalysis],
        skipped: &[SkippedResponse],
        rejected_inputs: usize,
        competitors: &[Entity],
    ) -> Self {
        let unanalyzable = skipped.len() + rejected_inputs;
        let mut skipped_by_provider: BTreeMap<Provider, usize> = BTreeMap::new();
        for skip in skipped {
            *skipped_by_provider.entry(skip.provider).or_default() += 1;
        }

        let mut overall = RateAccumulator::default();
        let mut by_provider: BTreeMap<Provider, RateAccumulator> = BTreeMap::new();
        let mut by_query_type: BTreeMap<QueryType, RateAccumulator> = BTreeMap::new();
        let mut by_segment: BTreeMap<(Provider, QueryType), RateAccumulator> = BTreeMap::new();
        let mut query_index: HashMap<&str, usize> = HashMap::new();
        let mut by_query: Vec<(&str, RateAccumulator)> = Vec::new();

        for analysis in analyses {
            overall.add(analysis);
            by_provider.entry(analysis.provider).or_default().add(analysis);
            by_query_type.entry(analysis.query_type).or_default().add(analysis);
            by_segment
                .entry((analysis.provider, analysis.query_type))
                .or_default()
                .add(analysis);

            let idx = *query_index
                .entry(analysis.query_text.as_str())
                .or_insert_with(|| {
                    by_query.push((analysis.query_text.as_str(), RateAccumulator::default()));
                    by_query.len() - 1
                });
            by_query[idx].1.add(analysis);
        }

        for provider in skipped_by_provider.keys() {
            by_provider.entry(*provider).or_default();
        }

        let by_provider = by_provider
            .into_iter()
            .map(|(provider, acc)| {
                let records = analyses
                    .iter()
                    .filter(|a| a.provider == provider)
                    .flat_map(|a| a.competitors.iter());
                ProviderStat {
                    provider,
                    rate: acc.finish(),
                    unanalyzable: skipped_by_provider.get(&provider).copied().unwrap_or(0),
                    competitors: tally_all(competitors, records),
                }
            })
            .collect();

        let mut competitor_ranking =
            tally_all(competitors, analyses.iter().flat_map(|a| a.competitors.iter()));
        competitor_ranking.sort_by(|a, b| b.mention_count.cmp(&a.mention_count));

        Self {
            total_responses: analyses.len() + unanalyzable,
            analyzed: analyses.len(),
            unanalyzable,
            overall: overall.finish(),
            by_provider,
            by_query_type: by_query_type
                .into_iter()
                .map(|(query_type, acc)| QueryTypeStat {
                    query_type,
                    rate: acc.finish(),
                })
                .collect(),
            by_provider_query_type: by_segment
                .into_iter()
                .map(|((provider, query_type), acc)| SegmentStat {
                    provider,
                    query_type,
                    rate: acc.finish(),
                })
                .collect(),
            by_query: by_query
                .into_iter()
                .map(|(query_text, acc)| QueryStat {
                    query_text: query_text.to_string(),
                    rate: acc.finish(),
                })
                .collect(),
            competitor_ranking,
        }
    }

    pub fn provider(&self, provider: Provider) -> Option<&ProviderStat> {
        self.by_provider.iter().find(|s| s.provider == provider)
    }

    pub fn query(&self, query_text: &str) -> Option<&QueryStat> {
        self.by_query.iter().find(|s| s.query_text == query_text)
    }

    pub fn query_type(&self, query_type: QueryType) -> Option<&QueryTypeStat> {
        self.by_query_type.iter().find(|s| s.query_type == query_type)
    }

    pub fn segment(&self, provider: Provider, query_type: QueryType) -> Option<&SegmentStat> {
        self.by_provider_query_type
            .iter()
            .find(|s| s.provider == provider && s.query_type == query_type)
    }
}

/// Fold records into one tally per competitor, configuration order
fn tally_all<'a, I>(competitors: &[Entity], records: I) -> Vec<CompetitorTally>
where
    I: Iterator<Item = &'a MentionRecord> + Clone,
{
    competitors
        .iter()
        .map(|c| CompetitorTally::from_records(c.name(), records.clone()))
        .collect()
}

/// Analyses, skip markers and statistics for one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub stats: BatchStats,
    pub analyses: Vec<ResponseAnalysis>,
    pub skipped: Vec<SkippedResponse>,
}

impl BatchReport {
    /// Split outcomes and compute statistics.
    ///
    /// `rejected_inputs` counts records that failed before becoming a
    /// `RawResponse` (e.g. unparseable ingest lines); they count as
    /// unanalyzable.
    pub fn from_outcomes(
        analyzer: &Analyzer,
        outcomes: Vec<Result<ResponseAnalysis, SkippedResponse>>,
        rejected_inputs: usize,
    ) -> Self {
        let mut analyses = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(analysis) => analyses.push(analysis),
                Err(skip) => skipped.push(skip),
            }
        }

        let stats = BatchStats::compute(&analyses, &skipped, rejected_inputs, analyzer.competitors());

        Self {
            stats,
            analyses,
            skipped,
        }
    }
}
