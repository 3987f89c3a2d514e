//! # minplus_scraper
//!
//! Collects articles and reader comments from NHK みんなでプラス and turns
//! them into per-article JSON documents for the reader front end.
//!
//! ## Usage
//!
//! ```sh
//! minplus_scraper comments-batch --start 1 --end 300 --category 0026
//! minplus_scraper article <URL> -o articles/output/0026/0026_054.json --pretty
//! minplus_scraper merge --category 0026
//! minplus_scraper index
//! ```
//!
//! ## Architecture
//!
//! Each subcommand is one sequential step:
//! 1. **Comments**: Discover the pages of a thread and parse every comment
//! 2. **Article**: Parse the title, date and body of a topic page
//! 3. **Merge**: Join article and comment files by topic id
//! 4. **Index**: List merged articles newest first
//!
//! Requests are made one at a time with a fixed pause in between. Failed
//! items are logged and skipped; every command ends with a summary.

use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod batch;
mod cli;
mod config;
mod fetch;
mod models;
mod outputs;
mod scrapers;
mod stats;
mod utils;

use batch::BatchScraper;
use cli::{Cli, Command};
use config::{ScraperConfig, load_config};
use fetch::HttpFetcher;
use models::{Comment, TopicId};
use outputs::json::{ARTICLE_INDENT, COMMENTS_INDENT, write_json};
use outputs::merge::{MergePaths, merge_articles_with_comments};
use scrapers::comments::CommentScraper;
use stats::CommentStats;
use utils::ensure_writable_dir;

const RULE: &str = "============================================================";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = load_config(args.config.as_deref()).await?;

    match args.command {
        Command::Comments {
            target,
            output,
            pretty,
        } => run_comments(&config, &target, &output, pretty).await?,
        Command::CommentsBatch {
            start,
            end,
            output_dir,
            category,
        } => run_comments_batch(&config, start, end, &output_dir, &category).await?,
        Command::Article {
            url,
            output,
            pretty,
        } => run_article(&config, &url, &output, pretty).await?,
        Command::Merge {
            articles_dir,
            comments_dir,
            output_dir,
            category,
        } => {
            let paths = MergePaths {
                articles_dir: PathBuf::from(articles_dir),
                comments_dir: PathBuf::from(comments_dir),
                output_dir: PathBuf::from(output_dir),
            };
            run_merge(&paths, &category).await?
        }
        Command::Index {
            output_dir,
            categories,
        } => {
            let categories = if categories.is_empty() {
                config.categories.clone()
            } else {
                categories
            };
            run_index(Path::new(&output_dir), &categories).await?
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}

fn comment_scraper(config: &ScraperConfig) -> Result<CommentScraper<HttpFetcher>, Box<dyn Error>> {
    let fetcher = HttpFetcher::new(&config.user_agent)?;
    Ok(CommentScraper::new(
        fetcher,
        config.comments_per_page,
        config.page_delay(),
    ))
}

/// A topic id expands to its first comment page; anything else is taken as a URL.
fn resolve_comments_url(target: &str, base_url: &str) -> String {
    match target.parse::<TopicId>() {
        Ok(topic) => topic.comments_url(base_url),
        Err(_) => target.to_string(),
    }
}

#[instrument(level = "info", skip(config))]
async fn run_comments(
    config: &ScraperConfig,
    target: &str,
    output: &str,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    let url = resolve_comments_url(target, &config.base_url);
    info!(%url, "Starting comment scrape");

    let scraper = comment_scraper(config)?;
    let comments: Vec<Comment> = match scraper.scrape_all_comments(&url).await {
        Ok(comments) => comments,
        Err(e) => {
            error!(%url, error = %e, "Failed to fetch first comment page");
            Vec::new()
        }
    };

    let indent = pretty.then_some(COMMENTS_INDENT);
    write_json(output, &comments, indent).await?;

    println!("\n合計 {} 件のコメントを取得しました", comments.len());
    println!("コメントを {} に保存しました", output);
    if !comments.is_empty() {
        println!("\n{}", CommentStats::from_comments(&comments));
    }
    Ok(())
}

#[instrument(level = "info", skip(config))]
async fn run_comments_batch(
    config: &ScraperConfig,
    start: u32,
    end: u32,
    output_dir: &str,
    category: &str,
) -> Result<(), Box<dyn Error>> {
    if start > end {
        return Err(format!("--start ({}) must not be greater than --end ({})", start, end).into());
    }

    let scraper = comment_scraper(config)?;
    let batch = BatchScraper {
        scraper: &scraper,
        base_url: &config.base_url,
        category,
        output_dir: Path::new(output_dir),
        topic_delay: config.topic_delay(),
    };
    let category_dir = batch.category_dir();
    if let Err(e) = ensure_writable_dir(&category_dir.to_string_lossy()).await {
        error!(path = %category_dir.display(), error = %e, "Output directory is not writable");
        return Err(e);
    }

    let summary = batch.run(start..=end).await;

    println!("{}", RULE);
    println!("一括取得が完了しました");
    println!("{}", RULE);
    println!("カテゴリ: {}", category);
    println!("✅ 成功: {}件 (コメント {}件)", summary.succeeded, summary.comments);
    println!("⚠️  スキップ: {}件", summary.skipped);
    println!("❌ エラー: {}件", summary.failed);
    for line in &summary.errors {
        println!("   - {}", line);
    }
    println!("📁 出力先: {}/", category_dir.display());
    println!("{}", RULE);
    Ok(())
}

#[instrument(level = "info", skip(config))]
async fn run_article(
    config: &ScraperConfig,
    url: &str,
    output: &str,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let Some(article) = scrapers::article::scrape_article(&fetcher, url).await else {
        warn!(%url, "No article extracted; nothing written");
        println!("記事の取得に失敗しました");
        return Ok(());
    };

    let indent = pretty.then_some(ARTICLE_INDENT);
    write_json(output, &article, indent).await?;

    println!("✅ 記事データを取得しました");
    println!("  タイトル: {}", article.title);
    println!("  日付: {}", article.date.as_deref().unwrap_or("不明"));
    println!("  本文: {}文字", article.content.chars().count());
    println!("📄 記事を {} に保存しました", output);
    Ok(())
}

async fn run_merge(paths: &MergePaths, category: &str) -> Result<(), Box<dyn Error>> {
    let summary = merge_articles_with_comments(paths, category).await?;

    println!("{}", RULE);
    println!("マージが完了しました");
    println!("{}", RULE);
    println!("カテゴリ: {}", category);
    println!("✅ 成功: {}件", summary.merged);
    println!("❌ エラー: {}件", summary.failed);
    println!("📁 出力先: {}/", summary.output_dir.display());
    println!("{}", RULE);
    Ok(())
}

async fn run_index(output_dir: &Path, categories: &[String]) -> Result<(), Box<dyn Error>> {
    let (path, count) = outputs::index::write_article_index(output_dir, categories).await?;
    println!("📄 {} 件の記事を {} に一覧化しました", count, path.display());
    Ok(())
}
