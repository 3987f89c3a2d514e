//! JSON output: per-topic files, merged articles and the article index.
//!
//! # Submodules
//!
//! - [`json`]: Read/write helpers with the per-kind indent
//! - [`merge`]: Joins article files with comment files by topic
//! - [`index`]: Writes `index.json` listing every merged article
//!
//! # Output Structure
//!
//! ```text
//! articles/output/0026/0026_054.json          # article body (`article`)
//! comments_scraper/output/0026/0026_054.json  # comment thread (`comments-batch`)
//! articles/0026/article_054.json              # merged (`merge`)
//! articles/index.json                         # listing (`index`)
//! ```

pub mod index;
pub mod json;
pub mod merge;
