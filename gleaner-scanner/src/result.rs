use crate::structure::SiteStructure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Expected page categories a complete harvest should cover.
pub const EXPECTED_CATEGORIES: [&str; 7] = [
    "programs",
    "clinical",
    "about",
    "admissions",
    "staff",
    "approach",
    "insurance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    Content,
    Navigation,
    Utility,
    Unknown,
}

/// A link queued for fetching, with the score it was queued under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub url: String,
    pub category: LinkCategory,
    pub link_type: String,
    pub priority: f64,
    pub depth: usize,
}

/// Structured output of a `FieldExtractor`. `page_type` feeds the summary histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub page_type: String,
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub extracted_data: ExtractedFields,
    pub discovered_links: Vec<String>,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub pages_visited: usize,
    pub data_extracted: usize,
    pub page_type_counts: BTreeMap<String, usize>,
    pub coverage_percentage: f64,
    pub missing_categories: Vec<String>,
}

impl CrawlSummary {
    pub fn from_pages(pages: &[PageRecord], pages_visited: usize) -> Self {
        let mut page_type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for page in pages {
            *page_type_counts
                .entry(page.extracted_data.page_type.clone())
                .or_insert(0) += 1;
        }

        let missing_categories: Vec<String> = EXPECTED_CATEGORIES
            .iter()
            .filter(|category| !page_type_counts.contains_key(**category))
            .map(|category| category.to_string())
            .collect();
        let observed = EXPECTED_CATEGORIES.len() - missing_categories.len();

        Self {
            pages_visited,
            data_extracted: pages.len(),
            page_type_counts,
            coverage_percentage: observed as f64 / EXPECTED_CATEGORIES.len() as f64 * 100.0,
            missing_categories,
        }
    }
}

/// Everything a finished run hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCrawl {
    pub start_url: String,
    pub pages: Vec<PageRecord>,
    pub site_structure: SiteStructure,
    pub summary: CrawlSummary,
}
