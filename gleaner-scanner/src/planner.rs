use crate::result::{LinkCategory, ScoredCandidate};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MAX_PAGES: usize = 50;
pub const MIN_DEPTH: usize = 1;
pub const MAX_DEPTH: usize = 4;
pub const SITEMAP_TYPE: &str = "sitemap";

const MAX_CONTENT_SEEDS: usize = 20;
const NAVIGATION_FILL_BELOW: usize = 10;
const MAX_NAVIGATION_SEEDS: usize = 5;
const NAVIGATION_SEED_PRIORITY: f64 = 0.6;
const STRONG_NAVIGATION_PRIORITY: f64 = 0.7;

/// What the start page told us beyond its scored links.
#[derive(Debug, Clone, Default)]
pub struct StartSignals {
    /// Same-origin links found on the start page, before deduplication.
    pub total_links: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlPlan {
    pub queue: Vec<ScoredCandidate>,
    pub max_depth: usize,
    pub max_pages: usize,
}

#[derive(Debug, Clone)]
pub struct CrawlPlanner {
    max_pages: usize,
}

impl CrawlPlanner {
    pub fn new() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn create_plan(&self, candidates: Vec<ScoredCandidate>, signals: &StartSignals) -> CrawlPlan {
        let mut content = Vec::new();
        let mut navigation = Vec::new();
        let mut sitemap = None;
        for candidate in candidates {
            match candidate.category {
                LinkCategory::Content => content.push(candidate),
                LinkCategory::Navigation => navigation.push(candidate),
                LinkCategory::Utility if candidate.link_type == SITEMAP_TYPE => {
                    sitemap.get_or_insert(candidate);
                }
                LinkCategory::Utility | LinkCategory::Unknown => {}
            }
        }

        let max_depth = calculate_optimal_depth(
            sitemap.is_some(),
            content.len(),
            signals.total_links,
            &navigation,
        );

        sort_by_priority(&mut content);
        sort_by_priority(&mut navigation);

        let mut queue: Vec<ScoredCandidate> = content.into_iter().take(MAX_CONTENT_SEEDS).collect();
        let content_seeds = queue.len();
        if content_seeds < NAVIGATION_FILL_BELOW {
            queue.extend(
                navigation
                    .into_iter()
                    .filter(|c| c.priority > NAVIGATION_SEED_PRIORITY)
                    .take(MAX_NAVIGATION_SEEDS),
            );
        }

        // Sitemap is always expanded first.
        if let Some(sitemap) = sitemap {
            queue.insert(0, sitemap);
        }

        for candidate in &mut queue {
            candidate.depth = 1;
        }

        debug!(
            "Planned {} seeds ({} content), max depth {}",
            queue.len(),
            content_seeds,
            max_depth
        );

        CrawlPlan {
            queue,
            max_depth,
            max_pages: self.max_pages,
        }
    }
}

impl Default for CrawlPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable descending sort; equal priorities keep discovery order.
fn sort_by_priority(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));
}

/// Depth heuristic. The branches are checked in this order and the first
/// one that applies decides; later branches are never consulted.
pub fn calculate_optimal_depth(
    has_sitemap: bool,
    content_count: usize,
    total_links: usize,
    navigation: &[ScoredCandidate],
) -> usize {
    let strong_navigation = navigation
        .iter()
        .filter(|c| c.priority > STRONG_NAVIGATION_PRIORITY)
        .count();

    let depth = if has_sitemap {
        1
    } else if content_count > 10 {
        2
    } else if total_links < 20 || strong_navigation < 4 {
        3
    } else {
        2
    };

    depth.clamp(MIN_DEPTH, MAX_DEPTH)
}
