//! Link relevance scoring.
//!
//! Classification walks an ordered table and stops at the first category
//! whose patterns match. Table order therefore decides ties; it is part of
//! the crawl's observable behaviour and must stay stable.

use crate::links::Link;
use crate::result::LinkCategory;
use serde::{Deserialize, Serialize};

/// One row of the content table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCategory {
    pub name: String,
    pub patterns: Vec<String>,
    pub base_score: f64,
}

impl ContentCategory {
    fn new(name: &str, patterns: &[&str], base_score: f64) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            base_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTables {
    pub content: Vec<ContentCategory>,
    pub low_priority: Vec<String>,
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            content: vec![
                ContentCategory::new(
                    "programs",
                    &[
                        "program",
                        "treatment",
                        "services",
                        "residential",
                        "outpatient",
                        "partial-hospitalization",
                        "levels-of-care",
                        "detox",
                    ],
                    0.90,
                ),
                ContentCategory::new(
                    "clinical",
                    &[
                        "clinical",
                        "therapy",
                        "therapies",
                        "modalities",
                        "evidence-based",
                        "psychiatr",
                        "medical",
                    ],
                    0.85,
                ),
                ContentCategory::new(
                    "approach",
                    &["approach", "philosophy", "methodology", "model-of-care"],
                    0.80,
                ),
                ContentCategory::new(
                    "about",
                    &["about", "who-we-are", "our-story", "our-mission", "history"],
                    0.75,
                ),
                ContentCategory::new(
                    "admissions",
                    &["admission", "intake", "enroll", "getting-started", "referral"],
                    0.85,
                ),
                ContentCategory::new(
                    "staff",
                    &["staff", "team", "leadership", "clinicians", "providers"],
                    0.70,
                ),
                ContentCategory::new(
                    "insurance",
                    &["insurance", "payment", "financing", "verify-benefits", "cost"],
                    0.80,
                ),
            ],
            low_priority: [
                "blog",
                "news",
                "events",
                "careers",
                "privacy",
                "terms",
                "contact",
                "resources",
                "testimonials",
                "gallery",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkScore {
    pub category: LinkCategory,
    pub link_type: String,
    pub value: f64,
}

pub const LOW_PRIORITY_SCORE: f64 = 0.3;
pub const UNKNOWN_SCORE: f64 = 0.5;
const TEXT_ONLY_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    tables: ScoringTables,
}

impl RelevanceScorer {
    pub fn new(tables: ScoringTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    pub fn score(&self, link: &Link) -> LinkScore {
        self.score_parts(
            link.url.as_str(),
            &link.anchor_text,
            link.title.as_deref().unwrap_or(""),
        )
    }

    /// Score from raw parts, for callers that have no parsed `Link` (page URLs, sitemap entries).
    pub fn score_parts(&self, url: &str, text: &str, title: &str) -> LinkScore {
        let url = url.to_lowercase();
        let text = format!("{} {}", text, title).to_lowercase();

        for category in &self.tables.content {
            let url_match = matches_any(&url, &category.patterns);
            if url_match || matches_any(&text, &category.patterns) {
                let value = if url_match {
                    category.base_score
                } else {
                    category.base_score * TEXT_ONLY_FACTOR
                };
                return LinkScore {
                    category: LinkCategory::Content,
                    link_type: category.name.clone(),
                    value: value.clamp(0.0, 1.0),
                };
            }
        }

        if matches_any(&url, &self.tables.low_priority) || matches_any(&text, &self.tables.low_priority) {
            return LinkScore {
                category: LinkCategory::Utility,
                link_type: "low-priority".to_string(),
                value: LOW_PRIORITY_SCORE,
            };
        }

        LinkScore {
            category: LinkCategory::Navigation,
            link_type: "unknown".to_string(),
            value: UNKNOWN_SCORE,
        }
    }
}

/// Substring match; a hyphenated pattern also matches its spaced spelling.
fn matches_any(haystack: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        haystack.contains(pattern.as_str())
            || (pattern.contains('-') && haystack.contains(&pattern.replace('-', " ")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn link(url: &str, text: &str) -> Link {
        Link {
            url: Url::parse(url).unwrap(),
            anchor_text: text.to_string(),
            title: None,
        }
    }

    #[test]
    fn test_program_url_scores_full_base() {
        let scorer = RelevanceScorer::default();
        let score = scorer.score(&link("https://clinic.test/programs/adhd", "ADHD Program"));

        assert_eq!(score.category, LinkCategory::Content);
        assert_eq!(score.link_type, "programs");
        assert_eq!(score.value, 0.9);
    }

    #[test]
    fn test_blog_is_low_priority_utility() {
        let scorer = RelevanceScorer::default();
        let score = scorer.score(&link("https://clinic.test/blog/2023/update", "Blog"));

        assert_eq!(score.category, LinkCategory::Utility);
        assert_eq!(score.link_type, "low-priority");
        assert_eq!(score.value, 0.3);
    }

    #[test]
    fn test_text_only_match_is_discounted() {
        let scorer = RelevanceScorer::default();
        let score = scorer.score(&link("https://clinic.test/page-12", "Meet our Team"));

        assert_eq!(score.link_type, "staff");
        assert!((score.value - 0.70 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_title_attribute_counts_as_text() {
        let scorer = RelevanceScorer::default();
        let mut l = link("https://clinic.test/p/17", "Learn more");
        l.title = Some("Insurance options".to_string());

        let score = scorer.score(&l);
        assert_eq!(score.link_type, "insurance");
        assert!((score.value - 0.64).abs() < 1e-9);
    }

    #[test]
    fn test_first_match_wins_over_higher_score() {
        // Both the approach and about rows match; approach is listed first.
        let scorer = RelevanceScorer::default();
        let score = scorer.score(&link("https://clinic.test/about/our-approach", "About"));
        assert_eq!(score.link_type, "approach");

        // A text-only match in an earlier row beats a URL match in a later row.
        let score = scorer.score(&link("https://clinic.test/admissions", "Our Treatment"));
        assert_eq!(score.link_type, "programs");
        assert!((score.value - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_link_is_unknown_navigation() {
        let scorer = RelevanceScorer::default();
        let score = scorer.score(&link("https://clinic.test/locations/denver", "Denver"));

        assert_eq!(score.category, LinkCategory::Navigation);
        assert_eq!(score.link_type, "unknown");
        assert_eq!(score.value, 0.5);
    }

    #[test]
    fn test_hyphenated_pattern_matches_spaced_text() {
        let scorer = RelevanceScorer::default();
        let score = scorer.score(&link("https://clinic.test/x", "Who we are"));
        assert_eq!(score.link_type, "about");
    }

    #[test]
    fn test_scoring_is_pure() {
        let scorer = RelevanceScorer::default();
        let l = link("https://clinic.test/clinical/dbt", "DBT");
        assert_eq!(scorer.score(&l), scorer.score(&l));
    }

    #[test]
    fn test_injected_tables_replace_defaults() {
        let tables = ScoringTables {
            content: vec![
                ContentCategory::new("staff", &["people"], 0.95),
                ContentCategory::new("programs", &["people"], 0.99),
            ],
            low_priority: vec![],
        };
        let scorer = RelevanceScorer::new(tables);

        let score = scorer.score(&link("https://clinic.test/people", "People"));
        assert_eq!(score.link_type, "staff");
        assert_eq!(score.value, 0.95);

        // Default table content no longer applies.
        let score = scorer.score(&link("https://clinic.test/blog", "Blog"));
        assert_eq!(score.category, LinkCategory::Navigation);
    }

    #[test]
    fn test_out_of_range_base_scores_are_clamped() {
        let tables = ScoringTables {
            content: vec![ContentCategory::new("programs", &["program"], 1.7)],
            low_priority: vec![],
        };
        let scorer = RelevanceScorer::new(tables);
        let score = scorer.score(&link("https://clinic.test/programs", "Programs"));
        assert_eq!(score.value, 1.0);
    }

    #[test]
    fn test_every_score_is_within_unit_interval() {
        let scorer = RelevanceScorer::default();
        let urls = [
            "https://clinic.test/",
            "https://clinic.test/programs",
            "https://clinic.test/therapy",
            "https://clinic.test/events",
            "https://clinic.test/staff",
            "https://clinic.test/?id=4",
        ];
        for url in urls {
            let value = scorer.score(&link(url, "")).value;
            assert!((0.0..=1.0).contains(&value), "{} scored {}", url, value);
        }
    }
}
