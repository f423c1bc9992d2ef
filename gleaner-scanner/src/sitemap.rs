use crate::error::{Result, ScanError};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

static URLSET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<urlset\b").unwrap());
static URL_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<url\b[^>]*>(.*?)</url>").unwrap());
static LOC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").unwrap());
static PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<priority>\s*(.*?)\s*</priority>").unwrap());
static CHANGEFREQ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<changefreq>\s*(.*?)\s*</changefreq>").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    pub priority: Option<f64>,
    pub changefreq: Option<String>,
}

pub struct SitemapParser;

impl SitemapParser {
    /// Fetch and parse a sitemap. Never fails: any problem is logged and yields no entries.
    pub async fn fetch(client: &Client, url: &Url) -> Vec<SitemapEntry> {
        match Self::try_fetch(client, url).await {
            Ok(entries) => {
                debug!("Sitemap {} listed {} entries", url, entries.len());
                entries
            }
            Err(e) => {
                warn!("Ignoring sitemap: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_fetch(client: &Client, url: &Url) -> Result<Vec<SitemapEntry>> {
        let response = client.get(url.clone()).send().await?.error_for_status()?;
        let body = response.text().await?;
        Self::parse(&body).map_err(|reason| ScanError::SitemapParseFailed {
            url: url.to_string(),
            reason,
        })
    }

    /// Parse `<url>` entries out of a `<urlset>` document.
    pub fn parse(xml: &str) -> std::result::Result<Vec<SitemapEntry>, String> {
        if !URLSET.is_match(xml) {
            return Err("document has no <urlset> element".to_string());
        }

        let entries = URL_BLOCK
            .captures_iter(xml)
            .filter_map(|block| {
                let body = block.get(1)?.as_str();
                let loc = LOC.captures(body)?.get(1)?.as_str();
                if loc.is_empty() {
                    return None;
                }
                Some(SitemapEntry {
                    url: unescape(loc),
                    priority: capture(&PRIORITY, body)
                        .and_then(|p| p.parse::<f64>().ok())
                        .map(|p| p.clamp(0.0, 1.0)),
                    changefreq: capture(&CHANGEFREQ, body).map(String::from),
                })
            })
            .collect();

        Ok(entries)
    }
}

fn capture<'a>(regex: &Regex, haystack: &'a str) -> Option<&'a str> {
    regex
        .captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

fn unescape(value: &str) -> String {
    let value = value
        .strip_prefix("<![CDATA[")
        .and_then(|v| v.strip_suffix("]]>"))
        .unwrap_or(value);
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
