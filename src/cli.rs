//! Command-line interface definitions for the みんなでプラス scraper.
//!
//! This module defines the CLI subcommands and options using the `clap` crate.
//! Each subcommand is one step of the pipeline and can be run on its own.

use clap::{Parser, Subcommand};

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Comments of one thread, by URL or by topic id
/// minplus_scraper comments https://www.nhk.or.jp/minplus/0026/comments/0026_054/index.html --pretty
/// minplus_scraper comments 0026_054 -o 0026_054.json
///
/// # Comments of topics 1..=300 in category 0026
/// minplus_scraper comments-batch --start 1 --end 300 --category 0026
///
/// # Article body, then join with the comments
/// minplus_scraper article https://www.nhk.or.jp/minplus/0026/topic054.html -o articles/output/0026/0026_054.json
/// minplus_scraper merge --category 0026
/// minplus_scraper index
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape every comment page of one thread
    Comments {
        /// First comment page URL, or a topic id such as 0026_054
        target: String,

        /// Output file
        #[arg(short, long, default_value = "comments.json")]
        output: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Scrape the comment threads of a range of topics
    CommentsBatch {
        /// First topic number
        #[arg(long, default_value_t = 1)]
        start: u32,

        /// Last topic number (inclusive)
        #[arg(long, default_value_t = 300)]
        end: u32,

        /// Output directory; files go to <OUTPUT_DIR>/<CATEGORY>/
        #[arg(long, default_value = "output")]
        output_dir: String,

        /// Category id
        #[arg(long, default_value = "0026")]
        category: String,
    },

    /// Scrape the body of one article
    Article {
        /// Article page URL
        url: String,

        /// Output file
        #[arg(short, long, default_value = "article.json")]
        output: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Join article bodies with their comment threads
    Merge {
        /// Directory holding <CATEGORY>/<CATEGORY>_NNN.json article files
        #[arg(long, default_value = "articles/output")]
        articles_dir: String,

        /// Directory holding <CATEGORY>/<CATEGORY>_NNN.json comment files
        #[arg(long, default_value = "comments_scraper/output")]
        comments_dir: String,

        /// Output directory; files go to <OUTPUT_DIR>/<CATEGORY>/article_NNN.json
        #[arg(long, default_value = "articles")]
        output_dir: String,

        /// Category id
        #[arg(long, default_value = "0026")]
        category: String,
    },

    /// Write index.json listing every merged article, newest first
    Index {
        /// Directory holding the merged <CATEGORY>/article_NNN.json files
        #[arg(long, default_value = "articles")]
        output_dir: String,

        /// Categories to include (repeatable); defaults to the configured list
        #[arg(long = "category")]
        categories: Vec<String>,
    },
}
