// Report generation from a finished site crawl

use crate::crawl::extract_url_path;
use anyhow::{Context, Result};
use colored::Colorize;
use gleaner_scanner::SiteCrawl;
use gleaner_scanner::result::PageRecord;
use gleaner_scanner::structure::{Layout, Recommendation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

pub fn generate_report(crawl: &SiteCrawl, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(crawl)),
        ReportFormat::Json => generate_json_report(crawl).context("Failed to serialize JSON report"),
        ReportFormat::Markdown => Ok(generate_markdown_report(crawl)),
    }
}

fn section(report: &mut String, title: &str) {
    report.push_str(&format!("{}\n{}\n{}\n\n", RULE, title.bright_white().bold(), RULE));
}

fn layout_name(layout: Layout) -> &'static str {
    match layout {
        Layout::SinglePage => "single-page",
        Layout::MultiPage => "multi-page",
    }
}

fn recommendation_text(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::StructuredData => "Use the page's structured data (JSON-LD / microdata)",
        Recommendation::SectionBased => "Extract by heading-delimited content sections",
        Recommendation::NavigationGuided => "Follow the site navigation to reach content",
        Recommendation::DynamicContentWarning => "Single-page layout: content may be rendered by scripts",
    }
}

/// Pages grouped by extracted page type, in type order.
fn pages_by_type(crawl: &SiteCrawl) -> BTreeMap<&str, Vec<&PageRecord>> {
    let mut by_type: BTreeMap<&str, Vec<&PageRecord>> = BTreeMap::new();
    for page in &crawl.pages {
        by_type
            .entry(page.extracted_data.page_type.as_str())
            .or_default()
            .push(page);
    }
    by_type
}

pub fn generate_text_report(crawl: &SiteCrawl) -> String {
    let summary = &crawl.summary;
    let fingerprint = &crawl.site_structure.fingerprint;
    let mut report = String::new();

    report.push_str(&format!("{}\n", RULE));
    report.push_str(&format!("{}\n", "                          GLEANER CRAWL REPORT".bright_white().bold()));
    report.push_str(&format!("{}\n\n", RULE));

    report.push_str(&format!("Start URL:    {}\n", crawl.start_url));
    report.push_str(&format!("Visited:      {}\n", summary.pages_visited));
    report.push_str(&format!("Extracted:    {}\n", summary.data_extracted));

    let coverage = format!("{:.0}%", summary.coverage_percentage);
    let coverage = if summary.coverage_percentage >= 75.0 {
        coverage.green()
    } else if summary.coverage_percentage >= 40.0 {
        coverage.yellow()
    } else {
        coverage.red()
    };
    report.push_str(&format!("Coverage:     {}\n", coverage));
    if summary.missing_categories.is_empty() {
        report.push_str("Missing:      none\n\n");
    } else {
        report.push_str(&format!(
            "Missing:      {}\n\n",
            summary.missing_categories.join(", ").yellow()
        ));
    }

    section(&mut report, "SITE PROFILE");
    report.push_str(&format!("  CMS:             {}\n", fingerprint.cms));
    report.push_str(&format!("  URL pattern:     {}\n", fingerprint.url_pattern));
    report.push_str(&format!("  Layout:          {}\n", layout_name(fingerprint.layout)));
    report.push_str(&format!("  Structured data: {}\n", yes_no(fingerprint.has_structured_data)));
    report.push_str(&format!("  Sitemap:         {}\n", yes_no(fingerprint.has_sitemap)));
    if !crawl.site_structure.recommendations.is_empty() {
        report.push_str("\n  Recommendations:\n");
        for recommendation in &crawl.site_structure.recommendations {
            report.push_str(&format!("    {} {}\n", "→".blue(), recommendation_text(*recommendation)));
        }
    }
    report.push('\n');

    if !crawl.site_structure.navigation_map.is_empty() {
        section(&mut report, "NAVIGATION");
        for (category, entries) in &crawl.site_structure.navigation_map {
            report.push_str(&format!("## {} ({})\n", category.cyan().bold(), entries.len()));
            for entry in entries {
                report.push_str(&format!("  {} {}\n", entry.text, extract_url_path(&entry.url).dimmed()));
            }
            report.push('\n');
        }
    }

    if !crawl.site_structure.content_sections.is_empty() {
        section(&mut report, "CONTENT SECTIONS");
        for content in &crawl.site_structure.content_sections {
            report.push_str(&format!(
                "  [{}] {} {}\n",
                content.section_key.cyan(),
                content.header_text,
                format!("(confidence {:.1})", content.confidence).dimmed()
            ));
        }
        report.push('\n');
    }

    section(&mut report, "PAGES BY TYPE");
    for (page_type, pages) in pages_by_type(crawl) {
        report.push_str(&format!("## {}\n", page_type.green().bold()));
        report.push_str(&format!("  {} pages\n\n", pages.len()));
        for page in pages {
            report.push_str(&format!(
                "  {} {}\n",
                format!("d{}", page.depth).dimmed(),
                extract_url_path(&page.url)
            ));
        }
        report.push('\n');
    }

    report.push_str(&format!("{}\n", RULE));
    report.push_str("Generated by Gleaner\n");
    report
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

pub fn generate_json_report(crawl: &SiteCrawl) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Gleaner",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "crawl": crawl
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(crawl: &SiteCrawl) -> String {
    let summary = &crawl.summary;
    let fingerprint = &crawl.site_structure.fingerprint;
    let mut report = String::new();

    report.push_str(&format!("# Crawl report: {}\n\n", crawl.start_url));
    report.push_str("| Metric | Value |\n|---|---|\n");
    report.push_str(&format!("| Pages visited | {} |\n", summary.pages_visited));
    report.push_str(&format!("| Pages extracted | {} |\n", summary.data_extracted));
    report.push_str(&format!("| Coverage | {:.0}% |\n", summary.coverage_percentage));
    report.push_str(&format!("| CMS | {} |\n", fingerprint.cms));
    report.push_str(&format!("| Layout | {} |\n", layout_name(fingerprint.layout)));
    report.push_str(&format!("| URL pattern | {} |\n\n", fingerprint.url_pattern));

    if !summary.missing_categories.is_empty() {
        report.push_str("## Missing categories\n\n");
        for category in &summary.missing_categories {
            report.push_str(&format!("- {}\n", category));
        }
        report.push('\n');
    }

    if !crawl.site_structure.recommendations.is_empty() {
        report.push_str("## Recommendations\n\n");
        for recommendation in &crawl.site_structure.recommendations {
            report.push_str(&format!("- {}\n", recommendation_text(*recommendation)));
        }
        report.push('\n');
    }

    report.push_str("## Pages\n\n");
    for (page_type, pages) in pages_by_type(crawl) {
        report.push_str(&format!("### {} ({})\n\n", page_type, pages.len()));
        for page in pages {
            report.push_str(&format!("- [{}]({}) (depth {})\n", extract_url_path(&page.url), page.url, page.depth));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
