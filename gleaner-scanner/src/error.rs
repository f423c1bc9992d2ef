use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Start page {url} unreachable: {reason}")]
    StartPageUnreachable { url: String, reason: String },

    #[error("Fetch failed for {url}: {reason}")]
    PageFetchFailed { url: String, reason: String },

    #[error("Malformed URL '{href}' relative to {base}")]
    MalformedUrl { href: String, base: String },

    #[error("Sitemap {url} could not be parsed: {reason}")]
    SitemapParseFailed { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern table: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
