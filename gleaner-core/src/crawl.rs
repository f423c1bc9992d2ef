use crate::config::GleanerConfig;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use gleaner_scanner::{CrawlEvent, CrawlState, ProgressCallback, SiteCrawl};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Spinner text for a crawler event, or `None` when the event has nothing to show.
pub fn progress_message(event: &CrawlEvent) -> Option<String> {
    match event {
        CrawlEvent::StateChanged(CrawlState::AnalyzingStart) => Some("Analyzing start page...".to_string()),
        CrawlEvent::StateChanged(CrawlState::Planning) => Some("Planning crawl...".to_string()),
        CrawlEvent::StateChanged(CrawlState::Crawling) => Some("Crawling...".to_string()),
        CrawlEvent::StateChanged(_) => None,
        CrawlEvent::PageFetched {
            url,
            fetched,
            max_pages,
        } => Some(format!(
            "Crawling... {}/{} pages  {}",
            fetched,
            max_pages,
            extract_url_path(url)
        )),
        CrawlEvent::PageFailed { url, .. } => Some(format!("Skipped {}", extract_url_path(url))),
    }
}

/// Run one site crawl with the given configuration.
pub async fn execute_crawl(url: &str, config: &GleanerConfig, show_progress: bool) -> Result<SiteCrawl> {
    config.validate()?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let mut crawler = config.build_crawler()?;
    if let Some(ref pb) = progress_bar {
        let pb = pb.clone();
        let callback: ProgressCallback = Arc::new(move |event: CrawlEvent| {
            if let CrawlEvent::PageFailed { ref url, ref reason } = event {
                pb.println(format!("[!] {} ({})", url, reason));
            }
            if let Some(message) = progress_message(&event) {
                pb.set_message(message);
            }
        });
        crawler = crawler.with_progress_callback(callback);
    }

    let result = crawler
        .crawl_site(url, &config.crawl_options())
        .await
        .with_context(|| format!("Crawl of {} failed", url));

    if let Some(pb) = progress_bar {
        match result {
            Ok(ref crawl) => pb.finish_with_message(format!(
                "Crawl complete! {} pages extracted, {} URLs visited",
                crawl.summary.data_extracted, crawl.summary.pages_visited
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    result
}
