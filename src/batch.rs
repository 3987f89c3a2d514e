//! Batch scraping of comment threads over a range of topic numbers.
//!
//! For every topic in `start..=end` the first comment page is requested at
//!
//! ```text
//! {base_url}/{category}/comments/{category}_{seq:03}/index.html
//! ```
//!
//! and the thread is written to `{output_dir}/{category}/{category}_{seq:03}.json`.
//! Topics that do not exist (404 or any other non-200) or have no comments
//! are skipped, transport and write failures are counted as errors, and the
//! run always continues with the next topic.

use crate::fetch::{FetchError, PageFetcher};
use crate::models::TopicId;
use crate::outputs::json::{COMMENTS_INDENT, write_json};
use crate::scrapers::comments::CommentScraper;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one topic of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicOutcome {
    Saved { comments: usize },
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NotFound,
    Status(u16),
    NoComments,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::Status(code) => write!(f, "HTTP {}", code),
            SkipReason::NoComments => write!(f, "no comments"),
        }
    }
}

/// Counters printed after a batch run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Comments written across all saved topics.
    pub comments: usize,
    /// `topic: reason` for every failed topic.
    pub errors: Vec<String>,
}

impl BatchSummary {
    fn record(&mut self, topic: &TopicId, outcome: TopicOutcome) {
        match outcome {
            TopicOutcome::Saved { comments } => {
                self.succeeded += 1;
                self.comments += comments;
            }
            TopicOutcome::Skipped(reason) => {
                debug!(%topic, %reason, "Skipped topic");
                self.skipped += 1;
            }
            TopicOutcome::Failed(reason) => {
                self.failed += 1;
                self.errors.push(format!("{}: {}", topic, reason));
            }
        }
    }
}

/// Scrapes the comment threads of a range of topics in one category.
#[derive(Debug)]
pub struct BatchScraper<'a, F> {
    pub scraper: &'a CommentScraper<F>,
    pub base_url: &'a str,
    pub category: &'a str,
    pub output_dir: &'a Path,
    pub topic_delay: Duration,
}

impl<F: PageFetcher> BatchScraper<'_, F> {
    /// Directory the thread files of this category are written to.
    pub fn category_dir(&self) -> PathBuf {
        self.output_dir.join(self.category)
    }

    #[instrument(level = "info", skip_all, fields(topic = %topic))]
    async fn scrape_topic(&self, topic: &TopicId) -> TopicOutcome {
        let url = topic.comments_url(self.base_url);
        info!(%url, "Processing topic");

        let comments = match self.scraper.scrape_all_comments(&url).await {
            Ok(comments) => comments,
            Err(e) if e.is_not_found() => {
                warn!("Page not found (404); skipping");
                return TopicOutcome::Skipped(SkipReason::NotFound);
            }
            Err(FetchError::Status(code)) => {
                warn!(status = code, "Unexpected HTTP status; skipping");
                return TopicOutcome::Skipped(SkipReason::Status(code));
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch comment thread");
                return TopicOutcome::Failed(e.to_string());
            }
        };

        if comments.is_empty() {
            warn!("No comments; skipping");
            return TopicOutcome::Skipped(SkipReason::NoComments);
        }

        let path = self.category_dir().join(format!("{}.json", topic));
        match write_json(&path, &comments, Some(COMMENTS_INDENT)).await {
            Ok(()) => {
                info!(path = %path.display(), count = comments.len(), "Saved comments");
                TopicOutcome::Saved {
                    comments: comments.len(),
                }
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write comments");
                TopicOutcome::Failed(e.to_string())
            }
        }
    }

    /// Scrape every topic in `range`, pausing between topics.
    #[instrument(level = "info", skip(self), fields(category = %self.category))]
    pub async fn run(&self, range: RangeInclusive<u32>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let end = *range.end();
        info!(
            first = %TopicId::new(self.category, *range.start()),
            last = %TopicId::new(self.category, end),
            output_dir = %self.category_dir().display(),
            "Starting comment batch"
        );

        for seq in range {
            let topic = TopicId::new(self.category, seq);
            let outcome = self.scrape_topic(&topic).await;
            summary.record(&topic, outcome);

            if seq < end {
                sleep(self.topic_delay).await;
            }
        }

        info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Comment batch finished"
        );
        summary
    }
}
