use crate::links::visible_text;
use crate::result::{ExtractedFields, LinkCategory};
use crate::scoring::RelevanceScorer;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static DESCRIPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"][content]"#).unwrap());
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3").unwrap());

pub const GENERAL_PAGE_TYPE: &str = "general";

/// Turns a fetched page into structured fields. The crawler calls this once per
/// successfully fetched page and tallies `page_type` in its summary.
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, document: &Html, url: &Url) -> ExtractedFields;
}

/// Default extractor: classifies the page with the relevance tables and keeps
/// the title, meta description and headings.
#[derive(Debug, Clone, Default)]
pub struct PageTypeExtractor {
    scorer: RelevanceScorer,
}

impl PageTypeExtractor {
    pub fn new(scorer: RelevanceScorer) -> Self {
        Self { scorer }
    }
}

impl FieldExtractor for PageTypeExtractor {
    fn extract(&self, document: &Html, url: &Url) -> ExtractedFields {
        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|t| visible_text(&t))
            .unwrap_or_default();
        let headings: Vec<String> = document
            .select(&HEADING_SELECTOR)
            .map(|h| visible_text(&h))
            .filter(|h| !h.is_empty())
            .collect();

        let score = self.scorer.score_parts(
            url.as_str(),
            headings.first().map(String::as_str).unwrap_or(""),
            &title,
        );
        let page_type = match score.category {
            LinkCategory::Content => score.link_type,
            _ => GENERAL_PAGE_TYPE.to_string(),
        };

        let mut fields = BTreeMap::new();
        if !title.is_empty() {
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(description) = document
            .select(&DESCRIPTION_SELECTOR)
            .next()
            .and_then(|m| m.value().attr("content"))
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            fields.insert("description".to_string(), Value::String(description.to_string()));
        }
        if !headings.is_empty() {
            fields.insert(
                "headings".to_string(),
                Value::Array(headings.into_iter().map(Value::String).collect()),
            );
        }

        ExtractedFields { page_type, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, url: &str) -> ExtractedFields {
        PageTypeExtractor::default().extract(&Html::parse_document(html), &Url::parse(url).unwrap())
    }

    #[test]
    fn test_page_type_from_url() {
        let fields = extract(
            "<html><head><title>Welcome</title></head><body><h1>Hello</h1></body></html>",
            "https://clinic.test/insurance",
        );
        assert_eq!(fields.page_type, "insurance");
        assert_eq!(fields.fields["title"], Value::String("Welcome".to_string()));
    }

    #[test]
    fn test_page_type_from_heading_when_url_is_opaque() {
        let fields = extract(
            r#"<html><head><meta name="description" content=" Meet the people "></head>
               <body><h1>Our Clinical Team</h1><h2>Psychiatry</h2></body></html>"#,
            "https://clinic.test/p?id=4",
        );
        assert_eq!(fields.page_type, "clinical");
        assert_eq!(fields.fields["description"], Value::String("Meet the people".to_string()));
        assert_eq!(fields.fields["headings"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_non_content_pages_are_general() {
        let fields = extract("<html><body><h1>Latest posts</h1></body></html>", "https://clinic.test/blog");
        assert_eq!(fields.page_type, GENERAL_PAGE_TYPE);
        assert!(!fields.fields.contains_key("title"));
    }
}
