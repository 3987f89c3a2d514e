//! Data models for scraped articles, reader comments and merged documents.
//!
//! This module defines the records written to and read from disk:
//! - [`Article`]: Article body as scraped from a topic page
//! - [`Comment`]: A single reader comment from a comment thread
//! - [`MergedArticle`]: An article joined with its comment thread
//! - [`ArticleIndexEntry`]: One row of the generated `index.json`
//! - [`TopicId`]: The `{category}_{seq:03}` key pairing files on disk
//!
//! Field names match the JSON files consumed by the front end, so `Comment`
//! renames its label field to `type`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category used when a legacy `article_NNN` identifier carries none.
pub const DEFAULT_CATEGORY: &str = "0026";

/// An article as scraped from its topic page.
///
/// # Fields
///
/// * `title` - Headline, taken from the first non-empty heading or `<title>`
/// * `date` - Publication date as printed on the page, if one was found
/// * `url` - The page the article was scraped from
/// * `content` - Markdown-like body with `## ` headings and blank-line paragraphs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// A reader comment.
///
/// Every field is optional because the markup omits blocks freely. Absent
/// values are written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Comment {
    /// Category label such as "感想" or "体験談".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    /// Age bucket, e.g. "20代" or "19歳以下".
    pub age: Option<String>,
    /// "男性" or "女性".
    pub gender: Option<String>,
    pub date: Option<String>,
    pub content: Option<String>,
}

/// An article joined with its comment thread, written as `article_{seq}.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MergedArticle {
    pub title: String,
    pub date: Option<String>,
    pub url: String,
    pub content: String,
    pub comments: Vec<Comment>,
}

impl MergedArticle {
    pub fn new(article: Article, comments: Vec<Comment>) -> Self {
        Self {
            title: article.title,
            date: article.date,
            url: article.url,
            content: article.content,
            comments,
        }
    }
}

/// One entry of the article listing written by `index`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleIndexEntry {
    /// Topic identifier, e.g. `0026_054`.
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    pub url: String,
    pub comment_count: usize,
}

/// Identifier of an article and its comment thread.
///
/// A topic is a site category plus a sequence number, displayed with the
/// sequence zero-padded to three digits (`0026_054`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicId {
    pub category: String,
    pub seq: u32,
}

impl TopicId {
    pub fn new(category: impl Into<String>, seq: u32) -> Self {
        Self {
            category: category.into(),
            seq,
        }
    }

    /// URL of the first comment page for this topic under `base_url`.
    pub fn comments_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/comments/{}/index.html",
            base_url.trim_end_matches('/'),
            self.category,
            self
        )
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:03}", self.category, self.seq)
    }
}

/// Error returned when a string is not a recognised topic identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTopicIdError(String);

impl fmt::Display for ParseTopicIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid topic id: {}", self.0)
    }
}

impl std::error::Error for ParseTopicIdError {}

impl FromStr for TopicId {
    type Err = ParseTopicIdError;

    /// Accepts `0026_054` and the legacy `article_054`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTopicIdError(s.to_string());
        let (category, seq) = s.split_once('_').ok_or_else(err)?;
        let category = match category {
            "article" => DEFAULT_CATEGORY,
            c if c.len() == 4 && c.bytes().all(|b| b.is_ascii_digit()) => c,
            _ => return Err(err()),
        };
        if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let seq = seq.parse::<u32>().map_err(|_| err())?;
        Ok(TopicId::new(category, seq))
    }
}
