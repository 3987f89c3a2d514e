//! Scraper configuration loaded from an optional YAML file.
//!
//! Every key is optional; anything left out falls back to the values the
//! site has been scraped with so far.
//!
//! ```yaml
//! base_url: https://www.nhk.or.jp/minplus
//! page_delay_ms: 500
//! topic_delay_ms: 1000
//! comments_per_page: 10
//! categories: ["0026", "0014"]
//! ```

use crate::scrapers::comments::COMMENTS_PER_PAGE;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Site root; topic URLs are built as `{base_url}/{category}/comments/...`.
    pub base_url: String,
    pub user_agent: String,
    /// Pause between comment pages of one thread.
    pub page_delay_ms: u64,
    /// Pause between topics in a batch run.
    pub topic_delay_ms: u64,
    pub comments_per_page: usize,
    /// Categories scanned by `index` when none is given on the command line.
    pub categories: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.nhk.or.jp/minplus".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_delay_ms: 500,
            topic_delay_ms: 1000,
            comments_per_page: COMMENTS_PER_PAGE,
            categories: ["0026", "0014", "0011", "0006", "0029"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl ScraperConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn topic_delay(&self) -> Duration {
        Duration::from_millis(self.topic_delay_ms)
    }
}

/// Load the configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<ScraperConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(ScraperConfig::default());
    };

    let raw = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&raw)?;
    if config.comments_per_page == 0 {
        return Err("comments_per_page must be greater than zero".into());
    }
    info!(path, base_url = %config.base_url, "Loaded configuration");
    Ok(config)
}

fn parse_config(raw: &str) -> Result<ScraperConfig, serde_yaml::Error> {
    // An empty file is a valid "use the defaults" config.
    if raw.trim().is_empty() {
        return Ok(ScraperConfig::default());
    }
    serde_yaml::from_str(raw)
}
