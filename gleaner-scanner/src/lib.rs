pub mod crawler;
pub mod error;
pub mod extractor;
pub mod links;
pub mod planner;
pub mod result;
pub mod scoring;
pub mod sitemap;
pub mod structure;

pub use crawler::{CrawlEvent, CrawlOptions, CrawlState, Crawler, DEFAULT_USER_AGENT, ProgressCallback};
pub use error::ScanError;
pub use extractor::{FieldExtractor, PageTypeExtractor};
pub use planner::{CrawlPlan, CrawlPlanner};
pub use result::{CrawlSummary, PageRecord, SiteCrawl};
pub use scoring::{RelevanceScorer, ScoringTables};
pub use structure::{SiteStructure, StructureAnalyzer, StructureTables};
