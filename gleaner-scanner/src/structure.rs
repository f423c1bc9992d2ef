//! Structural analysis of a site's landing page.
//!
//! Produces a fingerprint of the site, a map of its navigation menu, the
//! content sections found under recognised headings, and a list of
//! extraction strategies that suit what was found. None of this rejects a
//! page; confidences are informational.

use crate::error::Result;
use crate::links::{LinkExtractor, visible_text};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static NAV_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"nav a[href], [role="navigation"] a[href]"#).unwrap());
static MAIN_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["main", r#"[role="main"]"#, "article", "#content", ".content", "#main", "body"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3").unwrap());
static LIST_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul, ol").unwrap());
static LD_JSON_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static FRAGMENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r##"a[href^="#"]"##).unwrap());
static SITEMAP_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel~="sitemap"][href]"#).unwrap());
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static LIST_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[-•*]|\d+[.)])\s+\S").unwrap());

const MAX_SECTION_SIBLINGS: usize = 5;
const SINGLE_PAGE_ANCHOR_THRESHOLD: usize = 5;
const SECTION_BASED_THRESHOLD: usize = 3;

/// A named, ordered list of patterns. Meaning of the patterns (substring or
/// regex) depends on the table the group sits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternGroup {
    pub name: String,
    pub patterns: Vec<String>,
}

impl PatternGroup {
    fn new(name: &str, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureTables {
    /// Substrings searched for in the raw markup.
    pub cms_indicators: Vec<PatternGroup>,
    /// Regexes matched against the page's path and query.
    pub url_shapes: Vec<PatternGroup>,
    /// Substrings matched against lowercased navigation link text.
    pub navigation: Vec<PatternGroup>,
    /// Regexes matched against normalised heading text.
    pub sections: Vec<PatternGroup>,
}

impl Default for StructureTables {
    fn default() -> Self {
        Self {
            cms_indicators: vec![
                PatternGroup::new("wordpress", &["wp-content", "wp-includes", "wp-json"]),
                PatternGroup::new(
                    "drupal",
                    &["drupal-settings-json", "data-drupal", "/sites/default/files", "drupal.js"],
                ),
                PatternGroup::new("joomla", &["/media/jui/", "/components/com_", "joomla"]),
                PatternGroup::new("squarespace", &["static1.squarespace", "squarespace.com", "sqs-block"]),
                PatternGroup::new("wix", &["wixstatic.com", "_wixcss", "wix.com"]),
                PatternGroup::new("webflow", &["data-wf-page", "webflow.js", "webflow.com"]),
                PatternGroup::new("shopify", &["cdn.shopify.com", "shopify.theme"]),
            ],
            url_shapes: vec![
                PatternGroup::new("standard", &[r"^/(?:[\w.-]+/?)?$"]),
                PatternGroup::new("hierarchical", &[r"^/[\w.-]+(?:/[\w.-]+)+/?$"]),
                PatternGroup::new("parameterized", &[r"\?.*\w+="]),
            ],
            navigation: vec![
                PatternGroup::new(
                    "primary",
                    &["home", "about", "programs", "services", "treatment", "admissions", "contact"],
                ),
                PatternGroup::new(
                    "secondary",
                    &["staff", "team", "insurance", "faq", "resources", "blog", "careers", "locations", "news"],
                ),
                PatternGroup::new(
                    "clinical",
                    &[
                        "therapy",
                        "clinical",
                        "approach",
                        "residential",
                        "outpatient",
                        "detox",
                        "levels of care",
                        "modalities",
                    ],
                ),
            ],
            sections: vec![
                PatternGroup::new("about", &[r"\b(about|who we are|our story|mission)\b"]),
                PatternGroup::new(
                    "clinical",
                    &[r"\b(clinical|therap(y|ies)|modalit(y|ies)|evidence[- ]based|treatment approach)\b"],
                ),
                PatternGroup::new("programs", &[r"\b(programs?|services|levels? of care|treatment options)\b"]),
                PatternGroup::new("admissions", &[r"\b(admissions?|intake|getting started|enroll(ment)?)\b"]),
                PatternGroup::new("insurance", &[r"\b(insurance|payment|financing|cost)\b"]),
                PatternGroup::new("contact", &[r"\b(contact|location|get in touch|call us)\b"]),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layout {
    SinglePage,
    MultiPage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteFingerprint {
    pub cms: String,
    pub url_pattern: String,
    pub layout: Layout,
    pub has_structured_data: bool,
    pub has_sitemap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEntry {
    pub text: String,
    pub url: String,
}

pub type NavigationMap = BTreeMap<String, Vec<NavEntry>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub section_key: String,
    pub header_text: String,
    pub content: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    StructuredData,
    SectionBased,
    NavigationGuided,
    /// Single-page layout: content may be loaded by scripts and missing from the markup.
    DynamicContentWarning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStructure {
    pub fingerprint: SiteFingerprint,
    pub navigation_map: NavigationMap,
    pub content_sections: Vec<ContentSection>,
    pub recommendations: Vec<Recommendation>,
}

struct CompiledGroup {
    name: String,
    regexes: Vec<Regex>,
}

impl CompiledGroup {
    fn compile(group: &PatternGroup) -> Result<Self> {
        let regexes = group
            .patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            name: group.name.clone(),
            regexes,
        })
    }

    fn is_match(&self, haystack: &str) -> bool {
        self.regexes.iter().any(|r| r.is_match(haystack))
    }
}

pub struct StructureAnalyzer {
    cms_indicators: Vec<PatternGroup>,
    navigation: Vec<PatternGroup>,
    url_shapes: Vec<CompiledGroup>,
    sections: Vec<CompiledGroup>,
}

impl StructureAnalyzer {
    /// Build an analyzer from pattern tables. Fails if a regex table entry does not compile.
    pub fn new(tables: StructureTables) -> Result<Self> {
        Ok(Self {
            url_shapes: tables
                .url_shapes
                .iter()
                .map(CompiledGroup::compile)
                .collect::<Result<_>>()?,
            sections: tables
                .sections
                .iter()
                .map(CompiledGroup::compile)
                .collect::<Result<_>>()?,
            cms_indicators: tables.cms_indicators,
            navigation: tables.navigation,
        })
    }

    pub fn analyze(&self, document: &Html, location: &Url) -> SiteStructure {
        let fingerprint = self.fingerprint(document, location);
        let navigation_map = self.map_navigation(document, location);
        let content_sections = self.identify_content_sections(document);
        let recommendations = recommend(&fingerprint, &navigation_map, &content_sections);

        debug!(
            "Analyzed {}: cms={}, layout={:?}, {} nav categories, {} sections",
            location,
            fingerprint.cms,
            fingerprint.layout,
            navigation_map.len(),
            content_sections.len()
        );

        SiteStructure {
            fingerprint,
            navigation_map,
            content_sections,
            recommendations,
        }
    }

    pub fn fingerprint(&self, document: &Html, location: &Url) -> SiteFingerprint {
        let markup = document.html().to_lowercase();
        let cms = self
            .cms_indicators
            .iter()
            .find(|family| family.patterns.iter().any(|p| markup.contains(p.as_str())))
            .map(|family| family.name.clone())
            .unwrap_or_else(|| "custom".to_string());

        let shape_target = match location.query() {
            Some(query) => format!("{}?{}", location.path(), query),
            None => location.path().to_string(),
        };
        let url_pattern = self
            .url_shapes
            .iter()
            .find(|shape| shape.is_match(&shape_target))
            .map(|shape| shape.name.clone())
            .unwrap_or_else(|| "standard".to_string());

        let fragment_anchors = document
            .select(&FRAGMENT_SELECTOR)
            .filter(|a| a.value().attr("href").is_some_and(|h| h.len() > 1))
            .count();
        let layout = if fragment_anchors > SINGLE_PAGE_ANCHOR_THRESHOLD {
            Layout::SinglePage
        } else {
            Layout::MultiPage
        };

        SiteFingerprint {
            cms,
            url_pattern,
            layout,
            has_structured_data: document.select(&LD_JSON_SELECTOR).next().is_some(),
            has_sitemap: Self::find_sitemap(document, location).is_some(),
        }
    }

    /// Locate a sitemap advertised by the page, either as `<link rel="sitemap">`
    /// or as an anchor pointing at a `*sitemap*.xml` document on the same host.
    pub fn find_sitemap(document: &Html, location: &Url) -> Option<Url> {
        let advertised = document
            .select(&SITEMAP_LINK_SELECTOR)
            .filter_map(|el| el.value().attr("href"));
        let linked = document.select(&ANCHOR_SELECTOR).filter_map(|el| {
            let href = el.value().attr("href")?;
            let lower = href.to_ascii_lowercase();
            (lower.contains("sitemap") && lower.ends_with(".xml")).then_some(href)
        });

        advertised
            .chain(linked)
            .filter_map(|href| LinkExtractor::resolve(location, href).ok().flatten())
            .find(|url| url.host_str() == location.host_str())
    }

    pub fn map_navigation(&self, document: &Html, location: &Url) -> NavigationMap {
        let mut map = NavigationMap::new();

        for anchor in document.select(&NAV_LINK_SELECTOR) {
            let text = visible_text(&anchor);
            let lower = text.to_lowercase();
            let Some(category) = self
                .navigation
                .iter()
                .find(|group| group.patterns.iter().any(|p| lower.contains(p.as_str())))
            else {
                continue;
            };

            let href = anchor.value().attr("href").unwrap_or_default();
            let url = location
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string());

            map.entry(category.name.clone())
                .or_default()
                .push(NavEntry { text, url });
        }

        map
    }

    pub fn identify_content_sections(&self, document: &Html) -> Vec<ContentSection> {
        let Some(container) = MAIN_SELECTORS
            .iter()
            .find_map(|selector| document.select(selector).next())
        else {
            return Vec::new();
        };

        let mut sections = Vec::new();
        for heading in container.select(&HEADING_SELECTOR) {
            let Some(level) = heading_level(&heading) else {
                continue;
            };
            let header_text = visible_text(&heading);
            let normalized = header_text.to_lowercase();

            let Some(section) = self.sections.iter().find(|s| s.is_match(&normalized)) else {
                continue;
            };

            let (content, has_list) = collect_section_content(&heading, level);
            sections.push(ContentSection {
                section_key: section.name.clone(),
                confidence: section_confidence(level, &content, has_list),
                header_text,
                content,
            });
        }

        sections
    }
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::new(StructureTables::default()).expect("Default structure tables must compile")
    }
}

fn heading_level(element: &ElementRef) -> Option<u8> {
    let name = element.value().name();
    let digit = name.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&digit).then_some(digit)
}

/// Text of the element siblings following `heading`, up to the next heading
/// of the same or a higher level. Also reports whether a list was seen.
fn collect_section_content(heading: &ElementRef, level: u8) -> (String, bool) {
    let mut parts = Vec::new();
    let mut has_list = false;

    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if heading_level(&sibling).is_some_and(|l| l <= level) {
            break;
        }
        if parts.len() == MAX_SECTION_SIBLINGS {
            break;
        }

        let name = sibling.value().name();
        if name == "ul" || name == "ol" || sibling.select(&LIST_SELECTOR).next().is_some() {
            has_list = true;
        }

        let text = visible_text(&sibling);
        if !text.is_empty() {
            parts.push(text);
        }
    }

    let content = parts.join("\n");
    has_list |= LIST_LINE.is_match(&content);
    (content, has_list)
}

/// Confidence in tenths, so the clamp lands exactly on 1.0.
fn section_confidence(level: u8, content: &str, has_list: bool) -> f64 {
    let mut tenths: u8 = 5;
    match level {
        1 => tenths += 2,
        2 => tenths += 1,
        _ => {}
    }

    let length = content.chars().count();
    if length > 100 {
        tenths += 1;
    }
    if length > 500 {
        tenths += 1;
    }
    if has_list {
        tenths += 1;
    }

    f64::from(tenths.min(10)) / 10.0
}

fn recommend(
    fingerprint: &SiteFingerprint,
    navigation_map: &NavigationMap,
    sections: &[ContentSection],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    if fingerprint.has_structured_data {
        recommendations.push(Recommendation::StructuredData);
    }
    if sections.len() > SECTION_BASED_THRESHOLD {
        recommendations.push(Recommendation::SectionBased);
    }
    if !navigation_map.is_empty() {
        recommendations.push(Recommendation::NavigationGuided);
    }
    if fingerprint.layout == Layout::SinglePage {
        recommendations.push(Recommendation::DynamicContentWarning);
    }
    recommendations
}
