//! Article listing for the reader front end.
//!
//! Scans the merged `article_NNN.json` files of each category and writes a
//! single `index.json` next to the category directories:
//!
//! ```text
//! output_dir/
//! ├── index.json
//! ├── 0026/
//! │   ├── article_001.json
//! │   └── article_002.json
//! └── 0014/
//!     └── article_001.json
//! ```
//!
//! Entries are ordered newest first by their `YYYY年M月D日` date. Articles
//! whose date is missing or unreadable go last.

use crate::models::{ArticleIndexEntry, MergedArticle, TopicId};
use crate::outputs::json::{COMMENTS_INDENT, read_json, write_json};
use crate::utils::parse_japanese_date;
use std::cmp::Reverse;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// File name of the generated listing.
pub const INDEX_FILE: &str = "index.json";

/// Topic of a merged article file (`article_007.json` -> `{category}_007`).
fn merged_topic(file_name: &str, category: &str) -> Option<TopicId> {
    let stem = file_name.strip_suffix(".json")?;
    let seq = stem.strip_prefix("article_")?;
    format!("{}_{}", category, seq).parse().ok()
}

/// Sort entries newest first; undated entries keep their relative order at the end.
pub fn sort_newest_first(entries: &mut [ArticleIndexEntry]) {
    entries.sort_by_key(|e| Reverse(e.date.as_deref().and_then(parse_japanese_date)));
}

async fn category_entries(dir: &Path, category: &str) -> Result<Vec<ArticleIndexEntry>, Box<dyn Error>> {
    let mut entries = Vec::new();
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "No merged articles for category");
            return Ok(entries);
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(topic) = merged_topic(&name, category) {
            files.push((topic, entry.path()));
        }
    }
    files.sort();

    for (topic, path) in files {
        match read_json::<MergedArticle>(&path).await {
            Ok(article) => entries.push(ArticleIndexEntry {
                id: topic.to_string(),
                title: article.title,
                date: article.date,
                url: article.url,
                comment_count: article.comments.len(),
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable article"),
        }
    }
    Ok(entries)
}

/// Build the listing for `categories` under `output_dir` and write `index.json`.
///
/// Returns the path of the written file and the number of entries.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_article_index(
    output_dir: &Path,
    categories: &[String],
) -> Result<(PathBuf, usize), Box<dyn Error>> {
    let mut entries = Vec::new();
    for category in categories {
        let found = category_entries(&output_dir.join(category), category).await?;
        info!(%category, count = found.len(), "Indexed category");
        entries.extend(found);
    }
    sort_newest_first(&mut entries);

    let path = output_dir.join(INDEX_FILE);
    write_json(&path, &entries, Some(COMMENTS_INDENT)).await?;
    info!(path = %path.display(), count = entries.len(), "Wrote article index");
    Ok((path, entries.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;

    fn entry(id: &str, date: Option<&str>) -> ArticleIndexEntry {
        ArticleIndexEntry {
            id: id.to_string(),
            title: String::new(),
            date: date.map(str::to_string),
            url: String::new(),
            comment_count: 0,
        }
    }

    fn merged(title: &str, date: &str, comments: usize) -> MergedArticle {
        MergedArticle {
            title: title.to_string(),
            date: Some(date.to_string()),
            url: format!("https://example.com/{}", title),
            content: "本文".to_string(),
            comments: vec![Comment::default(); comments],
        }
    }

    #[test]
    fn test_merged_topic() {
        assert_eq!(merged_topic("article_007.json", "0014"), Some(TopicId::new("0014", 7)));
        assert_eq!(merged_topic("0014_007.json", "0014"), None);
        assert_eq!(merged_topic("article_x.json", "0014"), None);
    }

    #[test]
    fn test_sort_newest_first() {
        let mut entries = vec![
            entry("a", Some("2024年1月5日")),
            entry("b", None),
            entry("c", Some("2025年9月1日")),
            entry("d", Some("日付不明")),
            entry("e", Some("2024年12月31日")),
        ];
        sort_newest_first(&mut entries);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "e", "a", "b", "d"]);
    }

    #[tokio::test]
    async fn test_write_article_index() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_json(root.join("0026/article_001.json"), &merged("古い", "2024年3月1日", 2), None)
            .await
            .unwrap();
        write_json(root.join("0014/article_002.json"), &merged("新しい", "2025年3月1日", 0), None)
            .await
            .unwrap();
        std::fs::write(root.join("0026/article_003.json"), "broken").unwrap();

        let categories = vec!["0026".to_string(), "0014".to_string(), "0029".to_string()];
        let (path, count) = write_article_index(root, &categories).await.unwrap();
        assert_eq!(count, 2);

        let entries: Vec<ArticleIndexEntry> = read_json(&path).await.unwrap();
        assert_eq!(entries[0].id, "0014_002");
        assert_eq!(entries[0].title, "新しい");
        assert_eq!(entries[1].id, "0026_001");
        assert_eq!(entries[1].comment_count, 2);
    }
}
