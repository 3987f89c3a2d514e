//! Article body scraper for みんなでプラス topic pages.
//!
//! Topic pages have no stable article markup, so every field is read through
//! an ordered list of heuristics and the first one that yields text wins.
//!
//! # Title
//!
//! `<article>`'s first `<h1>`, then `<main>`'s, then the first `<h1>` on the
//! page, then `<title>` with the ` - NHK みんなでプラス` suffix cut off.
//!
//! # Date
//!
//! The first `<time>`, then a `YYYY年M月D日` date inside `<article>`, then one
//! inside the first block of `<main>`.
//!
//! # Content
//!
//! Headings, paragraphs and quotes under `<main>` (or `<article>`) rendered
//! as lightweight Markdown:
//!
//! ```text
//! ## 見出し
//!
//! 段落
//!
//! 段落
//! ```

use crate::fetch::PageFetcher;
use crate::models::Article;
use crate::scrapers::stripped_text;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{error, info, instrument, warn};

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}年\d{1,2}月\d{1,2}日").unwrap());

static ARTICLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static MAIN_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static H1_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static TIME_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static BLOCK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div, section, header").unwrap());
static CONTENT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, h3, h4, p, blockquote").unwrap());

/// Class names marking share buttons, related links and tag clouds.
const SKIP_CLASSES: [&str; 4] = ["share", "sns", "related", "tag"];
/// Navigation labels that show up as paragraphs inside `<main>`.
const SKIP_TEXTS: [&str; 3] = ["INDEX", "シェアする", "もっと見る"];

fn first<'a>(root: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    root.select(selector).next()
}

fn first_in_document<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.select(selector).next()
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Headline of the article.
pub fn get_title(document: &Html) -> Option<String> {
    let containers = [
        first_in_document(document, &ARTICLE_SEL),
        first_in_document(document, &MAIN_SEL),
        Some(document.root_element()),
    ];
    for container in containers.into_iter().flatten() {
        if let Some(title) = first(container, &H1_SEL).map(stripped_text).and_then(non_empty) {
            return Some(title);
        }
    }

    let title = stripped_text(first_in_document(document, &TITLE_SEL)?);
    let head = title.split(" - ").next().unwrap_or_default().trim();
    non_empty(head.to_string())
}

/// Publication date as printed on the page.
pub fn get_date(document: &Html) -> Option<String> {
    if let Some(time) = first_in_document(document, &TIME_SEL).map(stripped_text).and_then(non_empty) {
        return Some(time);
    }

    let find_date = |element: ElementRef<'_>| {
        let text = element.text().collect::<String>();
        DATE_RE.find(&text).map(|m| m.as_str().to_string())
    };

    if let Some(date) = first_in_document(document, &ARTICLE_SEL).and_then(find_date) {
        return Some(date);
    }

    first_in_document(document, &MAIN_SEL)
        .and_then(|main| first(main, &BLOCK_SEL))
        .and_then(find_date)
}

/// Article body rendered as lightweight Markdown.
pub fn get_content(document: &Html) -> Option<String> {
    let Some(container) = first_in_document(document, &MAIN_SEL)
        .or_else(|| first_in_document(document, &ARTICLE_SEL))
    else {
        warn!("No <main> or <article> container for article body");
        return None;
    };

    let mut parts = Vec::new();
    for element in container.select(&CONTENT_SEL) {
        if element
            .value()
            .classes()
            .any(|class| SKIP_CLASSES.contains(&class))
        {
            continue;
        }

        let text = stripped_text(element);
        if text.is_empty() || SKIP_TEXTS.contains(&text.as_str()) {
            continue;
        }

        match element.value().name() {
            "h2" | "h3" | "h4" => parts.push(format!("\n## {}\n", text)),
            "blockquote" => parts.push(format!("\n{}\n", text)),
            _ => parts.push(text),
        }
    }

    non_empty(parts.join("\n\n").trim().to_string())
}

/// Extract an [`Article`] from an already parsed page.
///
/// Returns `None` unless both a title and a body were found.
pub fn parse_article(document: &Html, url: &str) -> Option<Article> {
    let title = get_title(document)?;
    let content = get_content(document)?;
    Some(Article {
        title,
        date: get_date(document),
        url: url.to_string(),
        content,
    })
}

/// Fetch and parse the article at `url`.
///
/// Failures are logged and reported as `None`.
#[instrument(level = "info", skip(fetcher))]
pub async fn scrape_article<F: PageFetcher>(fetcher: &F, url: &str) -> Option<Article> {
    let body = match fetcher.fetch(url).await {
        Ok(body) => body,
        Err(e) => {
            error!(%url, error = %e, "Article fetch failed");
            return None;
        }
    };

    let article = parse_article(&Html::parse_document(&body), url);
    match &article {
        Some(a) => info!(title = %a.title, chars = a.content.chars().count(), "Parsed article"),
        None => warn!(%url, "Article page had no title or body"),
    }
    article
}
