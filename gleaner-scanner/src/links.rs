use crate::error::{Result, ScanError};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// A same-origin, navigable link found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub url: Url,
    pub anchor_text: String,
    pub title: Option<String>,
}

pub struct LinkExtractor;

impl LinkExtractor {
    /// Extract every anchor that resolves to a page on the same host as `base`.
    pub fn extract(document: &Html, base: &Url) -> Vec<Link> {
        let Some(base_host) = base.host_str() else {
            return Vec::new();
        };

        let mut links = Vec::new();
        for element in document.select(&ANCHOR_SELECTOR) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            let url = match Self::resolve(base, href.trim()) {
                Ok(Some(url)) => url,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Dropping link: {}", e);
                    continue;
                }
            };

            if url.host_str() != Some(base_host) {
                debug!("Dropping cross-origin link {}", url);
                continue;
            }

            links.push(Link {
                url,
                anchor_text: visible_text(&element),
                title: element
                    .value()
                    .attr("title")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            });
        }

        debug!("Extracted {} same-origin links from {}", links.len(), base);
        links
    }

    /// Resolve `href` against `base`. `Ok(None)` means the href is not a navigable page
    /// (fragment, script or contact pseudo-URL).
    pub fn resolve(base: &Url, href: &str) -> Result<Option<Url>> {
        let lower = href.to_ascii_lowercase();
        if href.is_empty()
            || href.starts_with('#')
            || lower.starts_with("javascript:")
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || lower.starts_with("data:")
        {
            return Ok(None);
        }

        let mut url = base.join(href).map_err(|_| ScanError::MalformedUrl {
            href: href.to_string(),
            base: base.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Ok(None);
        }

        url.set_fragment(None);
        Ok(Some(url))
    }
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn visible_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, base: &str) -> Vec<Link> {
        let document = Html::parse_document(html);
        LinkExtractor::extract(&document, &Url::parse(base).unwrap())
    }

    #[test]
    fn test_relative_links_are_resolved() {
        let links = extract(
            r#"<a href="/programs/adhd">ADHD Program</a><a href="staff">Our Staff</a>"#,
            "https://clinic.test/about/",
        );

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url.as_str(), "https://clinic.test/programs/adhd");
        assert_eq!(links[0].anchor_text, "ADHD Program");
        assert_eq!(links[1].url.as_str(), "https://clinic.test/about/staff");
    }

    #[test]
    fn test_cross_origin_links_are_dropped() {
        let links = extract(
            r#"<a href="https://other.test/programs">Elsewhere</a>
               <a href="https://sub.clinic.test/programs">Subdomain</a>
               <a href="https://clinic.test/programs">Here</a>"#,
            "https://clinic.test/",
        );

        assert_eq!(links.len(), 1);
        assert!(links.iter().all(|l| l.url.host_str() == Some("clinic.test")));
    }

    #[test]
    fn test_non_navigable_hrefs_are_skipped() {
        let links = extract(
            r##"<a href="">Empty</a>
               <a href="#top">Top</a>
               <a href="javascript:void(0)">Script</a>
               <a href="JavaScript:open()">Script again</a>
               <a href="mailto:intake@clinic.test">Mail</a>
               <a href="tel:5551234">Call</a>
               <a href="/contact">Contact</a>"##,
            "https://clinic.test/",
        );

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url.path(), "/contact");
    }

    #[test]
    fn test_fragment_is_stripped_and_text_collapsed() {
        let links = extract(
            r#"<a href="/insurance#verify" title=" Verify coverage ">
                  Insurance
                  <span>&amp; Payment</span>
               </a>"#,
            "https://clinic.test/",
        );

        assert_eq!(links[0].url.as_str(), "https://clinic.test/insurance");
        assert_eq!(links[0].anchor_text, "Insurance & Payment");
        assert_eq!(links[0].title.as_deref(), Some("Verify coverage"));
    }

    #[test]
    fn test_unresolvable_href_is_dropped_silently() {
        let links = extract(
            r#"<a href="http://[broken">Broken</a><a href="/ok">Ok</a>"#,
            "https://clinic.test/",
        );
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_resolve_reports_malformed_url() {
        let base = Url::parse("https://clinic.test/").unwrap();
        let result = LinkExtractor::resolve(&base, "http://[broken");
        assert!(matches!(result, Err(ScanError::MalformedUrl { .. })));
    }
}
