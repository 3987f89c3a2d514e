//! JSON persistence for articles, comment threads and merged documents.
//!
//! Files are UTF-8 with Japanese text written as-is (no `\u` escapes). The
//! indent is chosen per file kind: comment threads use two spaces, article
//! documents four, and compact output is used when no indent is asked for.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Indent used for comment thread files.
pub const COMMENTS_INDENT: usize = 2;
/// Indent used for article and merged article files.
pub const ARTICLE_INDENT: usize = 4;

/// Serialize `value`, pretty-printed with `indent` spaces when given.
pub fn to_json_string<T: Serialize + ?Sized>(
    value: &T,
    indent: Option<usize>,
) -> Result<String, serde_json::Error> {
    let Some(indent) = indent else {
        return serde_json::to_string(value);
    };

    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `value` to `path` as JSON, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn write_json<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
    indent: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let json = to_json_string(value, indent)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(path = %path.display(), "Wrote JSON file");
    Ok(())
}

/// Read and deserialize the JSON file at `path`.
pub async fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, Box<dyn Error>> {
    let raw = fs::read_to_string(path.as_ref()).await?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;

    fn comment() -> Comment {
        Comment {
            kind: Some("感想".to_string()),
            name: Some("匿名".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_compact_output_keeps_japanese() {
        let json = to_json_string(&vec![comment()], None).unwrap();
        assert!(json.starts_with(r#"[{"type":"感想","name":"匿名""#));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_indent_widths() {
        let two = to_json_string(&comment(), Some(COMMENTS_INDENT)).unwrap();
        assert!(two.contains("\n  \"type\": \"感想\""));

        let four = to_json_string(&comment(), Some(ARTICLE_INDENT)).unwrap();
        assert!(four.contains("\n    \"type\": \"感想\""));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/0026/0026_001.json");

        write_json(&path, &vec![comment()], Some(COMMENTS_INDENT))
            .await
            .unwrap();
        let back: Vec<Comment> = read_json(&path).await.unwrap();
        assert_eq!(back, vec![comment()]);
    }
}
