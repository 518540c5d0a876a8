//! Job-posting scraper: turns a list of posting URLs into clean text blocks
//! for the prompt.
//!
//! Each URL is fetched independently and all fetches settle before the
//! caller proceeds. A posting that fails directly (error, challenge page,
//! client-rendered shell) is retried once through a reader proxy that
//! renders the page server-side. Per-URL failures are data, not errors:
//! the caller decides what an empty success list means.

pub mod fetcher;

use std::sync::Arc;

use scraper::{Html, Selector};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub use fetcher::{FetchError, HttpPageFetcher, PageFetcher};

/// A cleaned text extraction below this length is assumed to be a
/// client-rendered shell and sent through the reader proxy.
const MIN_CONTENT_CHARS: usize = 200;

/// One successfully scraped posting. `job_number` is 1-based submission
/// order, kept stable so the prompt and the debug payload agree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedJob {
    pub job_number: usize,
    pub url: String,
    pub content: String,
}

/// One posting that could not be scraped, with a human-readable reason.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedJob {
    pub job_number: usize,
    pub url: String,
    pub reason: String,
}

#[derive(Clone)]
pub struct JobScraper {
    fetcher: Arc<dyn PageFetcher>,
    reader_proxy_url: String,
    max_chars: usize,
}

impl JobScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, reader_proxy_url: String, max_chars: usize) -> Self {
        Self {
            fetcher,
            reader_proxy_url,
            max_chars,
        }
    }

    /// Scrapes every URL concurrently and waits for all of them to settle.
    /// Results come back partitioned and ordered by submission position.
    pub async fn scrape_all(&self, urls: &[&str]) -> (Vec<ScrapedJob>, Vec<FailedJob>) {
        let mut tasks = JoinSet::new();

        for (i, url) in urls.iter().enumerate() {
            let scraper = self.clone();
            let url = url.to_string();
            tasks.spawn(async move {
                let outcome = scraper.scrape_one(&url).await;
                (i, url, outcome)
            });
        }

        let mut scraped = Vec::new();
        let mut failed = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let Ok((i, url, outcome)) = joined else {
                continue;
            };
            match outcome {
                Ok(content) => {
                    info!(job = i + 1, url = %url, chars = content.len(), "Scraped job posting");
                    scraped.push(ScrapedJob {
                        job_number: i + 1,
                        url,
                        content,
                    });
                }
                Err(reason) => {
                    warn!(job = i + 1, url = %url, %reason, "Job posting scrape failed");
                    failed.push(FailedJob {
                        job_number: i + 1,
                        url,
                        reason,
                    });
                }
            }
        }

        scraped.sort_by_key(|j| j.job_number);
        failed.sort_by_key(|j| j.job_number);
        (scraped, failed)
    }

    /// Direct fetch, then a reader-proxy retry when the direct result is
    /// unusable. Returns clean, truncated posting text or a failure reason.
    async fn scrape_one(&self, url: &str) -> Result<String, String> {
        let direct_reason = match self.fetcher.fetch(url).await {
            Ok(body) => {
                let text = extract_text(&body);
                if !looks_like_challenge(&body) && text.len() >= MIN_CONTENT_CHARS {
                    return Ok(truncate(&text, self.max_chars));
                }
                "page served a bot challenge or no readable content".to_string()
            }
            Err(e) => e.to_string(),
        };

        // The reader proxy renders client-side pages and returns plain text.
        let proxy_url = format!("{}/{}", self.reader_proxy_url.trim_end_matches('/'), url);
        match self.fetcher.fetch(&proxy_url).await {
            Ok(body) => {
                let text = extract_text(&body);
                if text.len() >= MIN_CONTENT_CHARS {
                    Ok(truncate(&text, self.max_chars))
                } else {
                    Err(format!(
                        "{direct_reason}; reader proxy returned no readable content"
                    ))
                }
            }
            Err(proxy_err) => Err(format!("{direct_reason}; reader proxy failed: {proxy_err}")),
        }
    }
}

/// Reduces a fetched body to posting text. HTML goes through the selector
/// chain (most job boards put the posting under a description container);
/// anything else (reader-proxy output) is just whitespace-normalized.
fn extract_text(body: &str) -> String {
    if !body.trim_start().starts_with('<') {
        return clean_text(body);
    }

    let document = Html::parse_document(body);
    let selectors = [
        "[class*='description']",
        "[class*='job-details']",
        "main",
        "article",
        "body",
    ];

    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
                if text.len() >= MIN_CONTENT_CHARS {
                    return text;
                }
            }
        }
    }

    // Last resort: all text in the document.
    clean_text(&document.root_element().text().collect::<Vec<_>>().join(" "))
}

fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cloudflare and similar walls serve a small interstitial instead of the
/// posting. Detect the common markers so we retry through the proxy.
fn looks_like_challenge(body: &str) -> bool {
    const MARKERS: [&str; 4] = [
        "Just a moment...",
        "Enable JavaScript and cookies to continue",
        "Attention Required! | Cloudflare",
        "cf-chl-widget",
    ];
    MARKERS.iter().any(|m| body.contains(m))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
