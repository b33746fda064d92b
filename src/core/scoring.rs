//! Visibility scoring.
//!
//! The score is additive and capped per component, so presence always
//! dominates, then position, then frequency:
//!
//! | Component | Value |
//! |-----------|-------|
//! | presence  | 0.4 if the business has any span |
//! | position  | 0.4 x rank percentile |
//! | frequency | 0.05 per span after the first, capped at 0.2 |

use crate::domain::{MentionRecord, VisibilityScore};

const PRESENCE_WEIGHT: f64 = 0.4;
const POSITION_WEIGHT: f64 = 0.4;
const FREQUENCY_STEP: f64 = 0.05;
const FREQUENCY_CAP: f64 = 0.2;

/// 1.0 for first place falling linearly to 0.0 for last place
pub fn rank_percentile(position_rank: Option<usize>, total_entities_considered: usize) -> Option<f64> {
    position_rank.map(|rank| {
        let steps = total_entities_considered.saturating_sub(1).max(1) as f64;
        let behind = rank.saturating_sub(1) as f64;
        (1.0 - behind / steps).clamp(0.0, 1.0)
    })
}

/// Score the business record of one response
pub fn score(record: &MentionRecord, total_entities_considered: usize) -> VisibilityScore {
    let mentioned = record.is_mentioned();
    let percentile = rank_percentile(record.position_rank, total_entities_considered);

    let presence = if mentioned { PRESENCE_WEIGHT } else { 0.0 };
    let position = percentile.map_or(0.0, |p| POSITION_WEIGHT * p);
    let frequency = match record.span_count() {
        0 => 0.0,
        n => (FREQUENCY_STEP * (n - 1) as f64).min(FREQUENCY_CAP),
    };

    VisibilityScore {
        response_id: record.response_id.clone(),
        business_mentioned: mentioned,
        score: (presence + position + frequency).clamp(0.0, 1.0),
        rank_percentile: percentile,
    }
}
