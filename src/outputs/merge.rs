//! Join scraped article bodies with their comment threads.
//!
//! Both inputs are keyed by the topic file name:
//!
//! ```text
//! articles_dir/0026/0026_001.json   ─┐
//! comments_dir/0026/0026_001.json   ─┴─> output_dir/0026/article_001.json
//! ```
//!
//! A topic without a comment file still gets a merged document with an empty
//! `comments` array.

use crate::models::{Article, Comment, MergedArticle};
use crate::outputs::json::{ARTICLE_INDENT, read_json, write_json};
use crate::utils::truncate_for_log;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Input and output directories of a merge run.
#[derive(Debug, Clone)]
pub struct MergePaths {
    pub articles_dir: PathBuf,
    pub comments_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Counters printed after a merge run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeSummary {
    pub merged: usize,
    pub failed: usize,
    pub output_dir: PathBuf,
}

/// Sequence part of an article file name (`0026_001.json` -> `001`).
pub fn article_seq<'a>(file_name: &'a str, category: &str) -> Option<&'a str> {
    file_name
        .strip_prefix(category)?
        .strip_prefix('_')?
        .strip_suffix(".json")
}

/// Article files of `category` under `dir`, sorted by name.
async fn list_article_files(dir: &Path, category: &str) -> Result<Vec<(String, PathBuf)>, Box<dyn Error>> {
    let mut files = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "Article directory does not exist");
            return Ok(files);
        }
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(seq) = article_seq(&name, category) {
            files.push((seq.to_string(), entry.path()));
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// Load the comment thread for `seq`, or an empty thread when no file exists.
async fn load_comments(comments_dir: &Path, category: &str, seq: &str) -> Result<Vec<Comment>, Box<dyn Error>> {
    let path = comments_dir.join(format!("{}_{}.json", category, seq));
    if !fs::try_exists(&path).await? {
        warn!(%seq, "No comment file; using an empty comment list");
        return Ok(Vec::new());
    }
    let comments: Vec<Comment> = read_json(&path).await?;
    info!(%seq, count = comments.len(), "Loaded comments");
    Ok(comments)
}

/// Merge one article file with its comments and write the result.
async fn merge_one(
    article_path: &Path,
    comments_dir: &Path,
    output_dir: &Path,
    category: &str,
    seq: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let article: Article = read_json(article_path).await?;
    let comments = load_comments(comments_dir, category, seq).await?;

    let output_path = output_dir.join(format!("article_{}.json", seq));
    let merged = MergedArticle::new(article, comments);
    write_json(&output_path, &merged, Some(ARTICLE_INDENT)).await?;

    info!(
        path = %output_path.display(),
        title = %truncate_for_log(&merged.title, 50),
        chars = merged.content.chars().count(),
        "Merged article"
    );
    Ok(output_path)
}

/// Merge every article of `category` with its comments.
///
/// Per-article failures are logged and counted; they never stop the run.
#[instrument(level = "info", skip(paths), fields(articles_dir = %paths.articles_dir.display()))]
pub async fn merge_articles_with_comments(
    paths: &MergePaths,
    category: &str,
) -> Result<MergeSummary, Box<dyn Error>> {
    let articles_dir = paths.articles_dir.join(category);
    let comments_dir = paths.comments_dir.join(category);
    let output_dir = paths.output_dir.join(category);
    fs::create_dir_all(&output_dir).await?;

    let files = list_article_files(&articles_dir, category).await?;
    info!(count = files.len(), comments_dir = %comments_dir.display(), "Found article files");

    let mut summary = MergeSummary {
        output_dir: output_dir.clone(),
        ..Default::default()
    };

    for (seq, path) in files {
        match merge_one(&path, &comments_dir, &output_dir, category, &seq).await {
            Ok(_) => summary.merged += 1,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to merge article");
                summary.failed += 1;
            }
        }
    }

    info!(merged = summary.merged, failed = summary.failed, "Merge finished");
    Ok(summary)
}
