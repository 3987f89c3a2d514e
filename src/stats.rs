//! Summary statistics over a scraped comment thread.

use crate::models::Comment;
use itertools::Itertools;
use std::fmt;

/// Label used for comments lacking the counted field.
pub const UNKNOWN: &str = "不明";

/// Comment counts broken down by type, gender and age.
///
/// Each breakdown is sorted by count (descending), ties by label.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommentStats {
    pub total: usize,
    pub by_type: Vec<(String, usize)>,
    pub by_gender: Vec<(String, usize)>,
    pub by_age: Vec<(String, usize)>,
}

fn breakdown<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<(String, usize)> {
    values
        .map(|v| v.unwrap_or(UNKNOWN).to_string())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}

impl CommentStats {
    pub fn from_comments(comments: &[Comment]) -> Self {
        Self {
            total: comments.len(),
            by_type: breakdown(comments.iter().map(|c| c.kind.as_deref())),
            by_gender: breakdown(comments.iter().map(|c| c.gender.as_deref())),
            by_age: breakdown(comments.iter().map(|c| c.age.as_deref())),
        }
    }
}

impl fmt::Display for CommentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== 統計情報 ===")?;
        writeln!(f, "総コメント数: {}", self.total)?;
        for (heading, rows) in [
            ("コメントタイプ別", &self.by_type),
            ("性別", &self.by_gender),
            ("年齢", &self.by_age),
        ] {
            writeln!(f, "\n{}:", heading)?;
            for (label, count) in rows {
                writeln!(f, "  {}: {}件", label, count)?;
            }
        }
        Ok(())
    }
}
