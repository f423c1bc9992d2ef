// Tests for report generation functionality

use chrono::Utc;
use gleaner_core::report::{
    ReportFormat, generate_json_report, generate_markdown_report, generate_report, generate_text_report,
    save_report,
};
use gleaner_scanner::result::{CrawlSummary, ExtractedFields, PageRecord};
use gleaner_scanner::structure::{
    ContentSection, Layout, NavEntry, Recommendation, SiteFingerprint, SiteStructure,
};
use gleaner_scanner::SiteCrawl;
use std::collections::BTreeMap;
use tempfile::NamedTempFile;

fn page(url: &str, page_type: &str, depth: usize) -> PageRecord {
    PageRecord {
        url: url.to_string(),
        fetched_at: Utc::now(),
        extracted_data: ExtractedFields {
            page_type: page_type.to_string(),
            fields: BTreeMap::new(),
        },
        discovered_links: Vec::new(),
        depth,
    }
}

fn sample_crawl() -> SiteCrawl {
    colored::control::set_override(false);

    let pages = vec![
        page("https://clinic.test/", "general", 0),
        page("https://clinic.test/programs", "programs", 1),
        page("https://clinic.test/programs/adhd", "programs", 2),
        page("https://clinic.test/about", "about", 1),
    ];
    let summary = CrawlSummary::from_pages(&pages, 6);

    let mut navigation_map = BTreeMap::new();
    navigation_map.insert(
        "programs".to_string(),
        vec![NavEntry {
            text: "Our Programs".to_string(),
            url: "https://clinic.test/programs".to_string(),
        }],
    );

    SiteCrawl {
        start_url: "https://clinic.test/".to_string(),
        pages,
        site_structure: SiteStructure {
            fingerprint: SiteFingerprint {
                cms: "wordpress".to_string(),
                url_pattern: "hierarchical".to_string(),
                layout: Layout::MultiPage,
                has_structured_data: true,
                has_sitemap: false,
            },
            navigation_map,
            content_sections: vec![ContentSection {
                section_key: "programs".to_string(),
                header_text: "Our Programs".to_string(),
                content: "Residential and outpatient care.".to_string(),
                confidence: 0.7,
            }],
            recommendations: vec![Recommendation::StructuredData, Recommendation::SectionBased],
        },
        summary,
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("markdown"), Some(ReportFormat::Markdown));
    assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert_eq!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("Json"), Some(ReportFormat::Json));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("csv").is_none());
    assert!(ReportFormat::from_str("pdf").is_none());
}

// ============================================================================
// Report Content Tests
// ============================================================================

#[test]
fn test_text_report_lists_summary_and_profile() {
    let report = generate_text_report(&sample_crawl());

    assert!(report.contains("GLEANER CRAWL REPORT"));
    assert!(report.contains("Start URL:    https://clinic.test/"));
    assert!(report.contains("Visited:      6"));
    assert!(report.contains("Extracted:    4"));
    assert!(report.contains("Coverage:     29%"));
    assert!(report.contains("clinical, admissions, staff, approach, insurance"));
    assert!(report.contains("CMS:             wordpress"));
    assert!(report.contains("Layout:          multi-page"));
    assert!(report.contains("Extract by heading-delimited content sections"));
}

#[test]
fn test_text_report_groups_pages_by_type() {
    let report = generate_text_report(&sample_crawl());

    assert!(report.contains("## programs\n  2 pages"));
    assert!(report.contains("## about\n  1 pages"));
    assert!(report.contains("d2 /programs/adhd"));
    assert!(report.contains("[programs] Our Programs"));
    assert!(report.contains("Our Programs /programs"));
}

#[test]
fn test_json_report_wraps_crawl() {
    let json = generate_json_report(&sample_crawl()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["report"]["metadata"]["generator"], "Gleaner");
    assert_eq!(value["report"]["crawl"]["start_url"], "https://clinic.test/");
    assert_eq!(value["report"]["crawl"]["summary"]["pages_visited"], 6);
    assert_eq!(value["report"]["crawl"]["pages"].as_array().map(Vec::len), Some(4));
    assert_eq!(
        value["report"]["crawl"]["site_structure"]["recommendations"][0],
        "structured-data"
    );
}

#[test]
fn test_markdown_report_sections() {
    let report = generate_markdown_report(&sample_crawl());

    assert!(report.starts_with("# Crawl report: https://clinic.test/"));
    assert!(report.contains("| Pages visited | 6 |"));
    assert!(report.contains("## Missing categories"));
    assert!(report.contains("- staff"));
    assert!(report.contains("### programs (2)"));
    assert!(report.contains("- [/programs/adhd](https://clinic.test/programs/adhd) (depth 2)"));
}

#[test]
fn test_generate_report_dispatches_on_format() {
    let crawl = sample_crawl();
    let json = generate_report(&crawl, ReportFormat::Json).unwrap();
    assert!(json.trim_start().starts_with('{'));

    let markdown = generate_report(&crawl, ReportFormat::Markdown).unwrap();
    assert!(markdown.starts_with("# Crawl report"));
}

#[test]
fn test_save_report_writes_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp_file = NamedTempFile::new()?;
    save_report("hello report", temp_file.path())?;

    assert_eq!(std::fs::read_to_string(temp_file.path())?, "hello report");
    Ok(())
}
