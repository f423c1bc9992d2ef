use anyhow::{Context, Result, bail};
use gleaner_scanner::{
    CrawlOptions, Crawler, DEFAULT_USER_AGENT, RelevanceScorer, ScoringTables, StructureAnalyzer,
    StructureTables,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/gleaner/config.json";

/// Run configuration as stored on disk. Every field is optional in the file;
/// missing ones fall back to the crawler defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GleanerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    pub max_pages: usize,
    pub concurrent_fetches: usize,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringTables>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureTables>,
}

impl Default for GleanerConfig {
    fn default() -> Self {
        let options = CrawlOptions::default();
        Self {
            max_depth: options.max_depth,
            max_pages: options.max_pages,
            concurrent_fetches: options.concurrent_fetches,
            request_delay_ms: options.request_delay.as_millis() as u64,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            scoring: None,
            structure: None,
        }
    }
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_depth: Option<usize>,
    pub max_pages: Option<usize>,
    pub concurrent_fetches: Option<usize>,
    pub request_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// Expand a leading `~` the way the shell would.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl GleanerConfig {
    /// Load from `path`. A missing file is not an error and yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if self.concurrent_fetches == 0 {
            bail!("concurrent_fetches must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if overrides.max_depth.is_some() {
            self.max_depth = overrides.max_depth;
        }
        if let Some(max_pages) = overrides.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(concurrent_fetches) = overrides.concurrent_fetches {
            self.concurrent_fetches = concurrent_fetches;
        }
        if let Some(delay) = overrides.request_delay_ms {
            self.request_delay_ms = delay;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            concurrent_fetches: self.concurrent_fetches,
            request_delay: Duration::from_millis(self.request_delay_ms),
        }
    }

    pub fn scorer(&self) -> RelevanceScorer {
        RelevanceScorer::new(self.scoring.clone().unwrap_or_default())
    }

    pub fn analyzer(&self) -> Result<StructureAnalyzer> {
        StructureAnalyzer::new(self.structure.clone().unwrap_or_default())
            .context("Invalid structure tables in config")
    }

    /// A crawler wired with this config's HTTP settings and pattern tables.
    pub fn build_crawler(&self) -> Result<Crawler> {
        Ok(Crawler::with_http_settings(self.timeout_secs, &self.user_agent)
            .with_scorer(self.scorer())
            .with_analyzer(self.analyzer()?))
    }
}
