//! Page fetching over HTTP.
//!
//! Scrapers only ever need "give me the body of this URL", so the transport
//! sits behind the [`PageFetcher`] trait:
//! - [`HttpFetcher`]: The real implementation on top of `reqwest`
//! - Tests supply in-memory fetchers keyed by URL
//!
//! Any status other than 200 is surfaced as [`FetchError::Status`] so that
//! batch callers can treat a missing thread (404) differently from a broken
//! connection. There is no retry: a failed fetch is reported once and the
//! caller decides whether to skip.

use reqwest::{Client, StatusCode};
use std::error::Error;
use std::fmt;
use tracing::{debug, instrument};

/// Why a page could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The server answered with a non-success status code.
    Status(u16),
    /// The request or body read failed before a usable response arrived.
    Transport(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status(404))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Status(code) => write!(f, "HTTP {}", code),
            FetchError::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// Trait for fetching the HTML body of a page.
pub trait PageFetcher {
    /// Fetch `url` and return its body as text.
    ///
    /// # Errors
    ///
    /// [`FetchError::Status`] for any non-2xx answer, [`FetchError::Transport`]
    /// when no response could be read.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
///
/// The client carries a desktop browser User-Agent; the site serves a
/// reduced page to unknown agents.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher sending `user_agent` with every request.
    pub fn new(user_agent: &str) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

/// Only a plain 200 counts as a page; every other status is missing data.
fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        if let Err(e) = check_status(response.status()) {
            debug!(%url, error = %e, "Non-200 response");
            return Err(e);
        }
        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
