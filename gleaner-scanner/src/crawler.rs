use crate::error::{Result, ScanError};
use crate::extractor::{FieldExtractor, PageTypeExtractor};
use crate::links::LinkExtractor;
use crate::planner::{CrawlPlanner, DEFAULT_MAX_PAGES, MAX_DEPTH, MIN_DEPTH, SITEMAP_TYPE, StartSignals};
use crate::result::{CrawlSummary, LinkCategory, PageRecord, ScoredCandidate, SiteCrawl};
use crate::scoring::RelevanceScorer;
use crate::sitemap::{SitemapEntry, SitemapParser};
use crate::structure::{SiteStructure, StructureAnalyzer};
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Candidates below this score are never followed from a crawled page.
const DISCOVERY_THRESHOLD: f64 = 0.5;
/// At most this many new candidates are taken from a single page.
const DISCOVERY_LIMIT: usize = 10;
/// Sitemap protocol default for entries without a <priority>.
const SITEMAP_DEFAULT_PRIORITY: f64 = 0.5;

pub const DEFAULT_USER_AGENT: &str = "Gleaner/0.1 (https://github.com/trapdoorsec/gleaner)";

pub type ProgressCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlState {
    Idle,
    AnalyzingStart,
    Planning,
    Crawling,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    StateChanged(CrawlState),
    PageFetched {
        url: String,
        fetched: usize,
        max_pages: usize,
    },
    PageFailed {
        url: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlOptions {
    /// Overrides the planner's depth when set. Clamped to 1..=4.
    pub max_depth: Option<usize>,
    pub max_pages: usize,
    pub concurrent_fetches: usize,
    /// Applied before every request.
    pub request_delay: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_pages: DEFAULT_MAX_PAGES,
            concurrent_fetches: 3,
            request_delay: Duration::from_millis(300),
        }
    }
}

/// A fetched HTML body and the URL it was finally served from.
struct FetchedPage {
    url: Url,
    body: String,
}

enum FetchOutcome {
    Page(Result<FetchedPage>),
    Sitemap(Vec<SitemapEntry>),
}

struct StartAnalysis {
    structure: SiteStructure,
    candidates: Vec<ScoredCandidate>,
    total_links: usize,
    record: PageRecord,
}

pub struct Crawler {
    client: Client,
    scorer: RelevanceScorer,
    analyzer: StructureAnalyzer,
    extractor: Arc<dyn FieldExtractor>,
    progress_callback: Option<ProgressCallback>,
    state: CrawlState,
    visited: HashSet<String>,
    queued: HashSet<String>,
    queue: VecDeque<ScoredCandidate>,
    pages: Vec<PageRecord>,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self::with_http_settings(timeout_secs, DEFAULT_USER_AGENT)
    }

    pub fn with_http_settings(timeout_secs: u64, user_agent: &str) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self::with_client(client)
    }

    pub fn with_client(client: Client) -> Self {
        let scorer = RelevanceScorer::default();
        Self {
            client,
            extractor: Arc::new(PageTypeExtractor::new(scorer.clone())),
            scorer,
            analyzer: StructureAnalyzer::default(),
            progress_callback: None,
            state: CrawlState::Idle,
            visited: HashSet::new(),
            queued: HashSet::new(),
            queue: VecDeque::new(),
            pages: Vec::new(),
        }
    }

    /// Replace the scoring tables. The default extractor is rebuilt on the same tables.
    pub fn with_scorer(mut self, scorer: RelevanceScorer) -> Self {
        self.extractor = Arc::new(PageTypeExtractor::new(scorer.clone()));
        self.scorer = scorer;
        self
    }

    pub fn with_analyzer(mut self, analyzer: StructureAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_extractor<E: FieldExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn get_visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn get_results(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Crawl one site. The only error is a start page that cannot be fetched;
    /// failures on any later page are logged and leave a gap in `pages`.
    pub async fn crawl_site(&mut self, start_url: &str, options: &CrawlOptions) -> Result<SiteCrawl> {
        info!("Starting crawl of {}", start_url);
        self.reset();
        self.set_state(CrawlState::AnalyzingStart);

        let mut start = match Url::parse(start_url) {
            Ok(url) => url,
            Err(e) => {
                self.set_state(CrawlState::Failed);
                return Err(ScanError::InvalidUrl(format!("{}: {}", start_url, e)));
            }
        };

        start.set_fragment(None);

        self.visited.insert(start.to_string());
        let page = match fetch_page(&self.client, &start, options.request_delay).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Start page {} failed: {}", start, e);
                self.set_state(CrawlState::Failed);
                return Err(ScanError::StartPageUnreachable {
                    url: start.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        // Links resolve against wherever the start page redirected to.
        let base = page.url;
        if base != start {
            debug!("Start page {} redirected to {}", start, base);
            self.visited.insert(base.to_string());
        }

        let StartAnalysis {
            structure,
            candidates,
            total_links,
            mut record,
        } = self.analyze_start(&base, &page.body);

        self.set_state(CrawlState::Planning);
        let plan = CrawlPlanner::new()
            .with_max_pages(options.max_pages.max(1))
            .create_plan(candidates, &StartSignals { total_links });
        let max_depth = options
            .max_depth
            .map(|d| d.clamp(MIN_DEPTH, MAX_DEPTH))
            .unwrap_or(plan.max_depth);
        info!(
            "Plan for {}: {} seeds, max depth {}, max pages {}",
            start,
            plan.queue.len(),
            max_depth,
            plan.max_pages
        );

        // The start page was fetched for analysis; it is recorded from that
        // response instead of being queued and fetched a second time.
        record.discovered_links = plan.queue.iter().map(|c| c.url.clone()).collect();
        let start_record_url = record.url.clone();
        self.pages.push(record);
        let mut fetched = 1;
        self.report(CrawlEvent::PageFetched {
            url: start_record_url,
            fetched,
            max_pages: plan.max_pages,
        });

        for candidate in plan.queue {
            self.enqueue(candidate);
        }

        self.set_state(CrawlState::Crawling);
        let concurrency = options.concurrent_fetches.max(1);
        while fetched < plan.max_pages && !self.queue.is_empty() {
            let batch = self.next_batch(concurrency.min(plan.max_pages - fetched));
            if batch.is_empty() {
                break;
            }
            fetched += batch.iter().filter(|c| c.link_type != SITEMAP_TYPE).count();
            debug!("Dispatching batch of {} ({} fetched)", batch.len(), fetched);

            let client = &self.client;
            let delay = options.request_delay;
            let outcomes = join_all(batch.into_iter().map(|candidate| async move {
                let outcome = match Url::parse(&candidate.url) {
                    Ok(url) if candidate.link_type == SITEMAP_TYPE => {
                        pace(delay).await;
                        FetchOutcome::Sitemap(SitemapParser::fetch(client, &url).await)
                    }
                    Ok(url) => FetchOutcome::Page(fetch_page(client, &url, delay).await),
                    Err(e) => FetchOutcome::Page(Err(ScanError::InvalidUrl(e.to_string()))),
                };
                (candidate, outcome)
            }))
            .await;

            for (candidate, outcome) in outcomes {
                match outcome {
                    FetchOutcome::Page(Ok(page)) => {
                        self.record_page(candidate, page, max_depth);
                        self.report(CrawlEvent::PageFetched {
                            url: self.pages.last().map(|p| p.url.clone()).unwrap_or_default(),
                            fetched: self.pages.len(),
                            max_pages: plan.max_pages,
                        });
                    }
                    FetchOutcome::Page(Err(e)) => {
                        warn!("Skipping {}: {}", candidate.url, e);
                        self.report(CrawlEvent::PageFailed {
                            url: candidate.url,
                            reason: e.to_string(),
                        });
                    }
                    FetchOutcome::Sitemap(entries) => self.expand_sitemap(&base, entries),
                }
            }
        }

        let summary = CrawlSummary::from_pages(&self.pages, self.visited.len());
        self.set_state(CrawlState::Done);
        info!(
            "Crawl complete. Visited {} URLs, extracted {} pages, coverage {:.0}%",
            summary.pages_visited, summary.data_extracted, summary.coverage_percentage
        );

        Ok(SiteCrawl {
            start_url: start.to_string(),
            pages: self.pages.clone(),
            site_structure: structure,
            summary,
        })
    }

    fn reset(&mut self) {
        self.visited.clear();
        self.queued.clear();
        self.queue.clear();
        self.pages.clear();
        self.state = CrawlState::Idle;
    }

    fn set_state(&mut self, state: CrawlState) {
        debug!("Crawler state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.report(CrawlEvent::StateChanged(state));
    }

    fn report(&self, event: CrawlEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }

    fn analyze_start(&self, start: &Url, body: &str) -> StartAnalysis {
        let document = Html::parse_document(body);
        let links = LinkExtractor::extract(&document, start);
        let structure = self.analyzer.analyze(&document, start);

        let mut seen = HashSet::from([start.to_string()]);
        let mut candidates = Vec::new();
        if let Some(sitemap) = StructureAnalyzer::find_sitemap(&document, start) {
            debug!("Start page advertises sitemap {}", sitemap);
            seen.insert(sitemap.to_string());
            candidates.push(ScoredCandidate {
                url: sitemap.to_string(),
                category: LinkCategory::Utility,
                link_type: SITEMAP_TYPE.to_string(),
                priority: 1.0,
                depth: 1,
            });
        }

        for link in &links {
            if !seen.insert(link.url.to_string()) {
                continue;
            }
            let score = self.scorer.score(link);
            debug!("Scored {} as {:?}/{} ({:.2})", link.url, score.category, score.link_type, score.value);
            candidates.push(ScoredCandidate {
                url: link.url.to_string(),
                category: score.category,
                link_type: score.link_type,
                priority: score.value,
                depth: 1,
            });
        }

        let record = PageRecord {
            url: start.to_string(),
            fetched_at: Utc::now(),
            extracted_data: self.extractor.extract(&document, start),
            discovered_links: Vec::new(),
            depth: 0,
        };

        StartAnalysis {
            structure,
            candidates,
            total_links: links.len(),
            record,
        }
    }

    fn enqueue(&mut self, candidate: ScoredCandidate) {
        if self.visited.contains(&candidate.url) || !self.queued.insert(candidate.url.clone()) {
            return;
        }
        self.queue.push_back(candidate);
    }

    /// Pop up to `size` unvisited candidates, marking each visited before it is dispatched.
    fn next_batch(&mut self, size: usize) -> Vec<ScoredCandidate> {
        let mut batch = Vec::with_capacity(size);
        while batch.len() < size {
            let Some(candidate) = self.queue.pop_front() else {
                break;
            };
            if self.visited.insert(candidate.url.clone()) {
                batch.push(candidate);
            }
        }
        batch
    }

    fn record_page(&mut self, candidate: ScoredCandidate, page: FetchedPage, max_depth: usize) {
        if page.url.as_str() != candidate.url {
            self.visited.insert(page.url.to_string());
        }
        let discovered = {
            let document = Html::parse_document(&page.body);
            let extracted = self.extractor.extract(&document, &page.url);
            let discovered = if candidate.depth < max_depth {
                self.discover(&document, &page.url, candidate.depth, max_depth)
            } else {
                Vec::new()
            };
            self.pages.push(PageRecord {
                url: candidate.url,
                fetched_at: Utc::now(),
                extracted_data: extracted,
                discovered_links: discovered.iter().map(|c| c.url.clone()).collect(),
                depth: candidate.depth,
            });
            discovered
        };

        for next in discovered {
            self.enqueue(next);
        }
    }

    /// Follow-up candidates from a crawled page: scored, thresholded, decayed
    /// by the page's depth, and capped to the best few.
    fn discover(&self, document: &Html, url: &Url, depth: usize, max_depth: usize) -> Vec<ScoredCandidate> {
        let decay = 1.0 - depth as f64 / max_depth as f64;
        let mut seen = HashSet::new();

        let mut candidates: Vec<ScoredCandidate> = LinkExtractor::extract(document, url)
            .into_iter()
            .filter(|link| {
                let key = link.url.as_str();
                !self.visited.contains(key) && !self.queued.contains(key) && seen.insert(key.to_string())
            })
            .filter_map(|link| {
                let score = self.scorer.score(&link);
                (score.value >= DISCOVERY_THRESHOLD).then(|| ScoredCandidate {
                    url: link.url.to_string(),
                    category: score.category,
                    link_type: score.link_type,
                    priority: (score.value * decay).clamp(0.0, 1.0),
                    depth: depth + 1,
                })
            })
            .collect();

        candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        candidates.truncate(DISCOVERY_LIMIT);
        debug!("Discovered {} candidates on {}", candidates.len(), url);
        candidates
    }

    fn expand_sitemap(&mut self, start: &Url, entries: Vec<SitemapEntry>) {
        // Paired with the entry's own <priority>, which breaks score ties.
        let mut candidates: Vec<(ScoredCandidate, f64)> = entries
            .iter()
            .filter_map(|entry| {
                let url = Url::parse(&entry.url).ok()?;
                if url.host_str() != start.host_str() {
                    return None;
                }
                let score = self.scorer.score_parts(url.as_str(), "", "");
                let candidate = ScoredCandidate {
                    url: url.to_string(),
                    category: score.category,
                    link_type: score.link_type,
                    priority: score.value,
                    depth: 1,
                };
                (score.value >= DISCOVERY_THRESHOLD)
                    .then_some((candidate, entry.priority.unwrap_or(SITEMAP_DEFAULT_PRIORITY)))
            })
            .collect();

        candidates.sort_by(|(a, a_hint), (b, b_hint)| {
            b.priority
                .total_cmp(&a.priority)
                .then(b_hint.total_cmp(a_hint))
        });
        info!("Sitemap contributed {} candidates", candidates.len());
        for (candidate, _) in candidates {
            self.enqueue(candidate);
        }
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// The global inter-request delay.
async fn pace(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

async fn fetch_page(client: &Client, url: &Url, delay: Duration) -> Result<FetchedPage> {
    pace(delay).await;
    debug!("Fetching {}", url);

    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScanError::PageFetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", status),
        });
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_ascii_lowercase());
    if let Some(ref ct) = content_type
        && !ct.contains("html")
    {
        return Err(ScanError::PageFetchFailed {
            url: url.to_string(),
            reason: format!("not an HTML document ({})", ct),
        });
    }

    let final_url = response.url().clone();
    Ok(FetchedPage {
        url: final_url,
        body: response.text().await?,
    })
}
