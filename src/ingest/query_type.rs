//! Query-type classification for records that arrive without one.
//!
//! Generated query sets put the consumer queries first, so a known query
//! number decides on its own. Otherwise the query text is checked for the
//! business name and business-oriented phrasing.

use crate::domain::QueryType;

/// Any one of these marks a business query
const STRONG_KEYWORDS: &[&str] = &[
    "fleet",
    "company",
    "business",
    "bulk pricing",
    "contractor",
    "logistics",
    "rental fleet",
    "mining",
    "construction company",
    "service agreements",
    "warranty support",
    "ongoing service",
    "scalable",
    "roi",
    "extended warranty",
    "refurbishment programs",
];

/// Two or more of these mark a business query
const WEAK_KEYWORDS: &[&str] = &[
    "review",
    "opinion",
    "think about",
    "better than",
    "compare",
    "vs",
    "versus",
    "service",
];

const OPINION_PHRASE: &str = "what do people think about";

/// Default number of consumer queries in a generated query set
pub const DEFAULT_NUM_CONSUMER: u32 = 5;

/// Classifies queries for one business
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    business_name: String,
    num_consumer: u32,
}

impl QueryClassifier {
    pub fn new(business_name: impl Into<String>, num_consumer: u32) -> Self {
        Self {
            business_name: business_name.into().to_lowercase(),
            num_consumer,
        }
    }

    /// Classify a query, preferring its position in the query set
    pub fn classify(&self, query: &str, query_id: Option<u32>) -> QueryType {
        if let Some(id) = query_id {
            return if id <= self.num_consumer {
                QueryType::Consumer
            } else {
                QueryType::Business
            };
        }

        let query = query.to_lowercase();
        if !self.business_name.is_empty() && query.contains(&self.business_name) {
            return QueryType::Business;
        }
        if STRONG_KEYWORDS.iter().any(|k| contains_phrase(&query, k)) {
            return QueryType::Business;
        }

        let weak = WEAK_KEYWORDS
            .iter()
            .filter(|k| contains_phrase(&query, k))
            .count();
        if weak >= 2 || query.contains(OPINION_PHRASE) {
            QueryType::Business
        } else {
            QueryType::Consumer
        }
    }
}

/// Whole-word phrase search so "roi" does not fire inside "android"
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> QueryClassifier {
        QueryClassifier::new("Acme Tires", DEFAULT_NUM_CONSUMER)
    }

    #[test]
    fn test_query_id_decides() {
        let c = classifier();
        assert_eq!(c.classify("fleet pricing", Some(1)), QueryType::Consumer);
        assert_eq!(c.classify("fleet pricing", Some(5)), QueryType::Consumer);
        assert_eq!(c.classify("best tires", Some(6)), QueryType::Business);
    }

    #[test]
    fn test_business_name_in_query() {
        assert_eq!(
            classifier().classify("Is ACME TIRES any good?", None),
            QueryType::Business
        );
    }

    #[test]
    fn test_strong_keyword() {
        let c = classifier();
        assert_eq!(c.classify("Tires for a delivery fleet", None), QueryType::Business);
        assert_eq!(c.classify("What is the ROI of premium tires?", None), QueryType::Business);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let c = classifier();
        assert_eq!(c.classify("Best android tire app", None), QueryType::Consumer);
        assert_eq!(c.classify("Cheap tires near me", None), QueryType::Consumer);
    }

    #[test]
    fn test_weak_keywords_need_two() {
        let c = classifier();
        assert_eq!(c.classify("Michelin review", None), QueryType::Consumer);
        assert_eq!(c.classify("Michelin vs Pirelli review", None), QueryType::Business);
        assert_eq!(
            c.classify("What do people think about Pirelli?", None),
            QueryType::Business
        );
    }
}
