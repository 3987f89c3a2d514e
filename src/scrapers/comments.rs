//! Comment thread scraper for みんなでプラス topic pages.
//!
//! Each topic has a comment thread split into pages of ten:
//!
//! ```text
//! https://www.nhk.or.jp/minplus/0026/comments/0026_054/index.html
//! https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0002.html
//! https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0003.html
//! ```
//!
//! # Page discovery
//!
//! The first page carries a heading such as `みんなのコメント（318件）`. The
//! total is divided by the page size (rounding up) and the remaining page
//! URLs are generated from the naming pattern above. When that heading is
//! missing, the pagination `<nav>` is scanned instead, which only yields the
//! pages that are linked from the first one. The count may be written in
//! ASCII or full-width digits; a total too large to be real is ignored the
//! same way a missing heading is.
//!
//! # Comment markup
//!
//! ```html
//! <dl class="c-comment">
//!   <dt>
//!     <div class="c-comment__label">体験談</div>
//!     <div class="c-comment__name">さくら</div>
//!     <div class="c-comment__meta">30代 女性</div>
//!     <div class="c-comment__date">2025年9月1日</div>
//!   </dt>
//!   <dd class="c-comment__body">...</dd>
//! </dl>
//! ```

use crate::fetch::{FetchError, PageFetcher};
use crate::models::Comment;
use crate::scrapers::{select_first_text, stripped_text};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Page size used by the site.
pub const COMMENTS_PER_PAGE: usize = 10;

static AGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+代|19歳以下|70歳以上)").unwrap());
static TOTAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"みんなのコメント[（(](\d+)件[)）]").unwrap());

static COMMENT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("dl.c-comment").unwrap());
static LABEL_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.c-comment__label").unwrap());
static NAME_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.c-comment__name").unwrap());
static META_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.c-comment__meta").unwrap());
static DATE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.c-comment__date").unwrap());
static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("dd.c-comment__body").unwrap());
static H2_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static NAV_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("nav").unwrap());
static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Split the commenter meta line into an age bucket and a gender.
///
/// ```ignore
/// assert_eq!(parse_age_gender("30代 女性"), (Some("30代".into()), Some("女性".into())));
/// ```
pub fn parse_age_gender(text: &str) -> (Option<String>, Option<String>) {
    let age = AGE_RE.find(text).map(|m| m.as_str().to_string());
    let gender = if text.contains("男性") {
        Some("男性".to_string())
    } else if text.contains("女性") {
        Some("女性".to_string())
    } else {
        None
    };
    (age, gender)
}

/// Parse one `<dl class="c-comment">` element.
///
/// Returns `None` for placeholder entries that have neither a name nor a body.
pub fn parse_comment(element: ElementRef<'_>) -> Option<Comment> {
    let kind = select_first_text(element, &LABEL_SEL);
    let name = select_first_text(element, &NAME_SEL);
    let (age, gender) = match select_first_text(element, &META_SEL) {
        Some(meta) => parse_age_gender(&meta),
        None => (None, None),
    };
    let date = select_first_text(element, &DATE_SEL);
    let content = select_first_text(element, &BODY_SEL);

    let blank = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
    if blank(&name) && blank(&content) {
        return None;
    }

    Some(Comment {
        kind,
        name,
        age,
        gender,
        date,
        content,
    })
}

/// All comments on one page, in document order.
pub fn parse_page_comments(document: &Html) -> Vec<Comment> {
    document
        .select(&COMMENT_SEL)
        .filter_map(parse_comment)
        .collect()
}

/// Upper bound on pages derived from the heading count. Larger totals are
/// treated as a corrupt heading.
const MAX_COMMENT_PAGES: usize = 10_000;

/// Value of an ASCII or full-width decimal digit.
fn digit_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        '０'..='９' => Some(c as u32 - '０' as u32),
        _ => None,
    }
}

/// Parse a run of ASCII or full-width digits, `None` on anything else or overflow.
fn parse_count(text: &str) -> Option<usize> {
    if text.is_empty() {
        return None;
    }
    text.chars().try_fold(0usize, |acc, c| {
        let digit = digit_value(c)?;
        acc.checked_mul(10)?.checked_add(digit as usize)
    })
}

/// Total comment count announced in the thread heading, or 0 when absent.
///
/// Returns `None` when the heading is present but its number does not fit.
fn heading_comment_count(document: &Html) -> Option<usize> {
    document
        .select(&H2_SEL)
        .find_map(|h2| {
            let text = h2.text().collect::<String>();
            TOTAL_RE
                .captures(&text)
                .map(|caps| parse_count(&caps[1]))
        })
        .unwrap_or(Some(0))
}

/// Total comment count announced in the thread heading, or 0 when absent.
pub fn total_comment_count(document: &Html) -> usize {
    heading_comment_count(document).unwrap_or(0)
}

/// Number of pages needed for `total` comments.
pub fn page_count(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page)
}

/// Derive every page URL of a thread from its first page.
///
/// `url` is the first page's address and is always the first entry.
pub fn pagination_urls(document: &Html, url: &str, per_page: usize) -> Vec<String> {
    match heading_comment_count(document) {
        Some(0) => {
            warn!(%url, "No comment total heading; falling back to visible pagination links");
        }
        Some(total) if page_count(total, per_page) <= MAX_COMMENT_PAGES => {
            let pages = page_count(total, per_page);
            info!(total_comments = total, total_pages = pages, "Computed comment pages");

            let base_path = url.replace("index.html", "");
            return std::iter::once(url.to_string())
                .chain((2..=pages).map(|n| format!("{}index{:04}.html", base_path, n)))
                .collect();
        }
        total => {
            warn!(
                %url,
                total_comments = ?total,
                max_pages = MAX_COMMENT_PAGES,
                "Implausible comment total; falling back to visible pagination links"
            );
        }
    }
    nav_pagination_urls(document, url)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| digit_value(c).is_some())
}

fn nav_pagination_urls(document: &Html, url: &str) -> Vec<String> {
    let pagination = document.select(&NAV_SEL).find(|nav| {
        nav.select(&ANCHOR_SEL)
            .any(|a| is_digits(&stripped_text(a)))
    });
    let Some(pagination) = pagination else {
        return vec![url.to_string()];
    };

    let base = Url::parse(url).ok();
    let mut urls = BTreeSet::new();
    urls.insert(url.to_string());

    for link in pagination.select(&ANCHOR_SEL) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href == "#" {
            continue;
        }
        let text = stripped_text(link);
        if !(is_digits(&text) || text == "次へ") {
            continue;
        }
        let resolved = match &base {
            Some(base) => match base.join(href) {
                Ok(joined) => joined.to_string(),
                Err(e) => {
                    debug!(%href, error = %e, "Skipping unresolvable pagination link");
                    continue;
                }
            },
            None => href.to_string(),
        };
        urls.insert(resolved);
    }

    urls.into_iter().collect()
}

/// Scrapes every page of a comment thread.
#[derive(Debug)]
pub struct CommentScraper<F> {
    fetcher: F,
    per_page: usize,
    page_delay: Duration,
}

impl<F: PageFetcher> CommentScraper<F> {
    pub fn new(fetcher: F, per_page: usize, page_delay: Duration) -> Self {
        Self {
            fetcher,
            per_page,
            page_delay,
        }
    }

    /// Fetch and parse one page; failures count as an empty page.
    #[instrument(level = "info", skip(self))]
    pub async fn get_page_comments(&self, url: &str) -> Vec<Comment> {
        match self.fetcher.fetch(url).await {
            Ok(body) => parse_page_comments(&Html::parse_document(&body)),
            Err(e) => {
                warn!(%url, error = %e, "Failed to fetch comment page");
                Vec::new()
            }
        }
    }

    /// Collect the comments of every page of the thread starting at `url`.
    ///
    /// Pages are requested one after another with the configured delay in
    /// between.
    ///
    /// # Errors
    ///
    /// Only a failure to fetch the first page is returned; later pages that
    /// fail are logged and contribute no comments.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape_all_comments(&self, url: &str) -> Result<Vec<Comment>, FetchError> {
        let first_body = self.fetcher.fetch(url).await?;

        // Html is not Send; keep it scoped so it never lives across an await.
        let (page_urls, mut all_comments) = {
            let document = Html::parse_document(&first_body);
            (
                pagination_urls(&document, url, self.per_page),
                parse_page_comments(&document),
            )
        };
        let total_pages = page_urls.len();
        info!(total_pages, "Pages to scrape");
        info!(page = 1, total_pages, count = all_comments.len(), "Scraped comment page");

        let rest: Vec<Vec<Comment>> = stream::iter(page_urls.iter().enumerate().skip(1))
            .then(|(i, page_url)| async move {
                sleep(self.page_delay).await;
                let comments = self.get_page_comments(page_url).await;
                info!(page = i + 1, total_pages, count = comments.len(), "Scraped comment page");
                comments
            })
            .collect()
            .await;

        all_comments.extend(rest.into_iter().flatten());
        info!(count = all_comments.len(), "Finished comment thread");
        Ok(all_comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StubFetcher;

    const FIRST: &str = "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index.html";

    fn comment_html(kind: &str, name: &str, meta: &str, body: &str) -> String {
        format!(
            r#"<dl class="c-comment">
                 <dt>
                   <div class="c-comment__label">{kind}</div>
                   <div class="c-comment__name">{name}</div>
                   <div class="c-comment__meta">{meta}</div>
                   <div class="c-comment__date">2025年9月1日</div>
                 </dt>
                 <dd class="c-comment__body">{body}</dd>
               </dl>"#
        )
    }

    fn page(heading: &str, comments: &[String]) -> String {
        format!(
            "<html><body><h2>{}</h2>{}</body></html>",
            heading,
            comments.join("\n")
        )
    }

    #[test]
    fn test_parse_age_gender() {
        assert_eq!(
            parse_age_gender("30代 女性"),
            (Some("30代".to_string()), Some("女性".to_string()))
        );
        assert_eq!(
            parse_age_gender("19歳以下男性"),
            (Some("19歳以下".to_string()), Some("男性".to_string()))
        );
        assert_eq!(parse_age_gender("70歳以上").0.as_deref(), Some("70歳以上"));
        assert_eq!(parse_age_gender("回答しない"), (None, None));
    }

    #[test]
    fn test_parse_comment_fragment() {
        let html = Html::parse_fragment(&comment_html(
            "体験談",
            " さくら ",
            "40代 / 女性",
            "<p>同じ経験が</p><p>あります。</p>",
        ));
        let dl = html.select(&COMMENT_SEL).next().unwrap();

        let comment = parse_comment(dl).unwrap();
        assert_eq!(
            comment,
            Comment {
                kind: Some("体験談".to_string()),
                name: Some("さくら".to_string()),
                age: Some("40代".to_string()),
                gender: Some("女性".to_string()),
                date: Some("2025年9月1日".to_string()),
                content: Some("同じ経験があります。".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_comment_missing_blocks() {
        let html = Html::parse_fragment(
            r#"<dl class="c-comment"><dt><div class="c-comment__name">匿名</div></dt></dl>"#,
        );
        let dl = html.select(&COMMENT_SEL).next().unwrap();

        let comment = parse_comment(dl).unwrap();
        assert_eq!(comment.name.as_deref(), Some("匿名"));
        assert_eq!(comment.kind, None);
        assert_eq!(comment.age, None);
        assert_eq!(comment.gender, None);
        assert_eq!(comment.content, None);
    }

    #[test]
    fn test_comment_without_name_or_body_is_dropped() {
        let html = Html::parse_fragment(&comment_html("感想", "", "20代 男性", "  "));
        let dl = html.select(&COMMENT_SEL).next().unwrap();
        assert_eq!(parse_comment(dl), None);

        let html = Html::parse_fragment(
            r#"<dl class="c-comment"><dt><div class="c-comment__label">感想</div></dt></dl>"#,
        );
        let dl = html.select(&COMMENT_SEL).next().unwrap();
        assert_eq!(parse_comment(dl), None);
    }

    #[test]
    fn test_parse_page_comments_keeps_order_and_drops_empty() {
        let document = Html::parse_document(&page(
            "みんなのコメント（3件）",
            &[
                comment_html("感想", "A", "20代 男性", "one"),
                comment_html("感想", "", "", ""),
                comment_html("悩み", "B", "30代 女性", "two"),
            ],
        ));

        let comments = parse_page_comments(&document);
        let names: Vec<_> = comments.iter().map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec![Some("A"), Some("B")]);
    }

    #[test]
    fn test_total_comment_count() {
        let document = Html::parse_document(&page("みんなのコメント（318件）", &[]));
        assert_eq!(total_comment_count(&document), 318);
        assert_eq!(page_count(318, COMMENTS_PER_PAGE), 32);

        let document = Html::parse_document(&page("みんなのコメント(7件)", &[]));
        assert_eq!(total_comment_count(&document), 7);

        let document = Html::parse_document(&page("みんなのコメント（３１８件）", &[]));
        assert_eq!(total_comment_count(&document), 318);

        let document = Html::parse_document(&page("関連記事", &[]));
        assert_eq!(total_comment_count(&document), 0);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("318"), Some(318));
        assert_eq!(parse_count("３１８"), Some(318));
        assert_eq!(parse_count("1８"), Some(18));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("½"), None);
        assert_eq!(parse_count("99999999999999999999999"), None);
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
    }

    #[test]
    fn test_pagination_urls_from_total() {
        let document = Html::parse_document(&page("みんなのコメント（318件）", &[]));
        let urls = pagination_urls(&document, FIRST, COMMENTS_PER_PAGE);

        assert_eq!(urls.len(), 32);
        assert_eq!(urls[0], FIRST);
        assert_eq!(
            urls[1],
            "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0002.html"
        );
        assert_eq!(
            urls[31],
            "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0032.html"
        );
    }

    #[test]
    fn test_pagination_urls_fallback_to_nav() {
        let document = Html::parse_document(
            r##"<html><body>
                 <nav><a href="/minplus/">トップ</a></nav>
                 <nav class="pager">
                   <a href="#">1</a>
                   <a href="index0003.html">3</a>
                   <a href="index0002.html">2</a>
                   <a href="index0002.html">次へ</a>
                   <a href="index0009.html">最後</a>
                 </nav>
               </body></html>"##,
        );

        let urls = pagination_urls(&document, FIRST, COMMENTS_PER_PAGE);
        assert_eq!(
            urls,
            vec![
                FIRST.to_string(),
                "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0002.html".to_string(),
                "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0003.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_pagination_urls_ignores_implausible_total() {
        for heading in [
            "みんなのコメント（18446744073709551615件）",
            "みんなのコメント（99999999999件）",
            "みんなのコメント（99999999999999999999999件）",
        ] {
            let document = Html::parse_document(&page(heading, &[]));
            assert_eq!(
                pagination_urls(&document, FIRST, COMMENTS_PER_PAGE),
                vec![FIRST.to_string()],
                "{heading}"
            );
        }

        let document = Html::parse_document(&page("みんなのコメント（100000件）", &[]));
        assert_eq!(
            pagination_urls(&document, FIRST, COMMENTS_PER_PAGE).len(),
            MAX_COMMENT_PAGES
        );
    }

    #[test]
    fn test_nav_digits_exclude_other_numerics() {
        let nav = |label: &str| {
            Html::parse_document(&format!(
                r#"<html><body><nav><a href="index0002.html">{label}</a></nav></body></html>"#
            ))
        };
        let second = "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0002.html";

        for label in ["½", "Ⅻ", "二"] {
            assert_eq!(
                pagination_urls(&nav(label), FIRST, COMMENTS_PER_PAGE),
                vec![FIRST.to_string()],
                "{label}"
            );
        }
        assert_eq!(
            pagination_urls(&nav("２"), FIRST, COMMENTS_PER_PAGE),
            vec![FIRST.to_string(), second.to_string()]
        );
        assert!(is_digits("12"));
        assert!(!is_digits(""));
    }

    #[test]
    fn test_pagination_urls_single_page_without_nav() {
        let document = Html::parse_document("<html><body><p>no comments</p></body></html>");
        assert_eq!(
            pagination_urls(&document, FIRST, COMMENTS_PER_PAGE),
            vec![FIRST.to_string()]
        );
    }

    #[tokio::test]
    async fn test_scrape_all_comments_walks_every_page() {
        let second = "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0002.html";
        let third = "https://www.nhk.or.jp/minplus/0026/comments/0026_054/index0003.html";
        let fetcher = StubFetcher::new()
            .page(
                FIRST,
                &page(
                    "みんなのコメント（21件）",
                    &[comment_html("感想", "A", "20代 男性", "page one")],
                ),
            )
            .page(second, &page("", &[comment_html("意見", "B", "50代 女性", "page two")]))
            .status(third, 500);

        let scraper = CommentScraper::new(fetcher, COMMENTS_PER_PAGE, Duration::ZERO);
        let comments = scraper.scrape_all_comments(FIRST).await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content.as_deref(), Some("page one"));
        assert_eq!(comments[1].kind.as_deref(), Some("意見"));
        assert_eq!(
            *scraper.fetcher.requested.borrow(),
            vec![FIRST.to_string(), second.to_string(), third.to_string()]
        );
    }

    #[tokio::test]
    async fn test_scrape_all_comments_reports_first_page_failure() {
        let scraper = CommentScraper::new(
            StubFetcher::new().status(FIRST, 404),
            COMMENTS_PER_PAGE,
            Duration::ZERO,
        );
        let err = scraper.scrape_all_comments(FIRST).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
