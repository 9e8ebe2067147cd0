//! # Article Feed
//!
//! Ingestion side of the engine. A feed yields article drafts from an
//! external source; [`NatureFeed`] scrapes a Nature subject listing (the
//! "Latest Research and Reviews" section) and the article pages it links
//! to. [`ingest_into`] drives any feed into the relational store, skipping
//! titles that are already stored.

use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use bunken_core::NewArticle;

use crate::error::{BunkenError, Result};
use crate::store::ArticleStore;

/// Base URL used to absolutize relative article links.
const BASE_URL: &str = "https://www.nature.com";

/// Listing section that carries research articles.
const SECTION_HEADING: &str = "Latest Research and Reviews";

/// Timeout for any single page fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("bunken/", env!("CARGO_PKG_VERSION"));

/// Article pages fetched per ingest run when the caller does not override.
pub const DEFAULT_FEED_LIMIT: usize = 20;

/// Yields article drafts from an external source.
pub trait ArticleFeed {
    /// Fetches the currently listed articles.
    fn ingest(&self) -> Result<Vec<NewArticle>>;
}

/// Outcome of an ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Drafts the feed yielded.
    pub fetched: usize,
    /// Drafts stored as new articles.
    pub inserted: usize,
    /// Drafts skipped (already stored, or blank title).
    pub skipped: usize,
}

/// Pulls `feed` once and stores every draft whose exact title is not
/// already present.
pub fn ingest_into(store: &mut ArticleStore, feed: &dyn ArticleFeed) -> Result<IngestReport> {
    let drafts = feed.ingest()?;
    let fetched = drafts.len();
    let mut inserted = 0;
    let mut skipped = 0;
    for draft in drafts {
        if !draft.has_title() || store.contains_title(&draft.title)? {
            skipped += 1;
            continue;
        }
        let id = store.insert_article(&draft)?;
        tracing::debug!(id, title = %draft.title, "article stored");
        inserted += 1;
    }
    tracing::info!(fetched, inserted, skipped, "ingest finished");
    Ok(IngestReport {
        fetched,
        inserted,
        skipped,
    })
}

struct FeedSelectors {
    section_heading: Selector,
    card_link: Selector,
    title: Selector,
    time: Selector,
    author: Selector,
    abstract_body: Selector,
}

impl FeedSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            section_heading: selector("h2.c-section-heading")?,
            card_link: selector("h3.c-card__title a")?,
            title: selector("h1.c-article-title")?,
            time: selector("time")?,
            author: selector(r#"ul.c-article-author-list a[data-test="author-name"]"#)?,
            abstract_body: selector("div.c-article-section__content")?,
        })
    }
}

fn selector(pattern: &str) -> Result<Selector> {
    Selector::parse(pattern)
        .map_err(|e| BunkenError::FeedParse(format!("invalid selector {pattern:?}: {e}")))
}

fn collect_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// Scrapes a Nature subject listing page and the article pages it links to.
pub struct NatureFeed {
    client: reqwest::blocking::Client,
    subject_url: String,
    selectors: FeedSelectors,
    whitespace: Regex,
    limit: usize,
}

impl NatureFeed {
    /// Creates a feed over one subject listing page, e.g.
    /// `https://www.nature.com/subjects/oncology`.
    pub fn new(subject_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            subject_url: subject_url.into(),
            selectors: FeedSelectors::new()?,
            whitespace: Regex::new(r"\s+")?,
            limit: DEFAULT_FEED_LIMIT,
        })
    }

    /// Caps the number of article pages fetched per run (minimum 1).
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    fn fetch_document(&self, url: &str) -> Result<Html> {
        tracing::debug!(url, "fetching page");
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(Html::parse_document(&body))
    }

    /// Article URLs under the "Latest Research and Reviews" heading, in
    /// listing order. The cards live in the sibling container that follows
    /// the heading, so cards of other sections are not picked up.
    fn latest_research_urls(&self, doc: &Html) -> Result<Vec<String>> {
        let heading = doc
            .select(&self.selectors.section_heading)
            .find(|h| collect_text(h).trim() == SECTION_HEADING)
            .ok_or_else(|| {
                BunkenError::FeedParse(format!("section {SECTION_HEADING:?} not found"))
            })?;
        let container = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .ok_or_else(|| {
                BunkenError::FeedParse("no content after the section heading".to_string())
            })?;
        let urls: Vec<String> = container
            .select(&self.selectors.card_link)
            .filter_map(|link| link.value().attr("href"))
            .map(|href| self.absolute_url(href))
            .collect();
        if urls.is_empty() {
            tracing::warn!(url = %self.subject_url, "listing section carries no article links");
        }
        Ok(urls)
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{BASE_URL}{href}")
        }
    }

    fn fetch_article(&self, url: &str) -> Result<NewArticle> {
        let doc = self.fetch_document(url)?;
        self.parse_article(&doc)
    }

    fn parse_article(&self, doc: &Html) -> Result<NewArticle> {
        let title = doc
            .select(&self.selectors.title)
            .next()
            .map(|el| self.clean(&collect_text(&el)))
            .ok_or_else(|| BunkenError::FeedParse("article title not found".to_string()))?;
        if title.is_empty() {
            return Err(BunkenError::FeedParse("article title is blank".to_string()));
        }

        let published_date = self.published_date(doc)?;

        let authors = doc
            .select(&self.selectors.author)
            .map(|el| self.clean(&collect_text(&el)))
            .filter(|author| !author.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let abstract_text = doc
            .select(&self.selectors.abstract_body)
            .next()
            .map(|el| self.clean(&collect_text(&el)))
            .unwrap_or_default();

        Ok(NewArticle::new(title, authors, published_date, abstract_text))
    }

    /// Publication date from the first `<time>` element: the machine-readable
    /// `datetime` attribute when present, otherwise the displayed text
    /// ("14 August 2026").
    fn published_date(&self, doc: &Html) -> Result<NaiveDate> {
        let time = doc
            .select(&self.selectors.time)
            .next()
            .ok_or_else(|| BunkenError::FeedParse("publication time not found".to_string()))?;
        if let Some(datetime) = time.value().attr("datetime") {
            if let Ok(date) = NaiveDate::parse_from_str(datetime, "%Y-%m-%d") {
                return Ok(date);
            }
        }
        let text = collect_text(&time);
        NaiveDate::parse_from_str(text.trim(), "%d %B %Y").map_err(|e| {
            BunkenError::FeedParse(format!("unparseable publication date {:?}: {e}", text.trim()))
        })
    }

    fn clean(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

impl ArticleFeed for NatureFeed {
    /// Fetches the subject listing, then each linked article page. A page
    /// that fails to fetch or parse is skipped with a warning; only listing
    /// failures abort the run.
    fn ingest(&self) -> Result<Vec<NewArticle>> {
        let listing = self.fetch_document(&self.subject_url)?;
        let urls = self.latest_research_urls(&listing)?;
        let mut drafts = Vec::new();
        for url in urls.into_iter().take(self.limit) {
            match self.fetch_article(&url) {
                Ok(draft) => drafts.push(draft),
                Err(e) => tracing::warn!(url = %url, error = %e, "skipping article page"),
            }
        }
        Ok(drafts)
    }
}
