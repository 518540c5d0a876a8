use crate::llm_client::GeminiClient;
use crate::scrape::JobScraper;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: GeminiClient,
    /// Job-posting scraper. Holds its page fetcher behind a trait object so
    /// tests can swap the network out.
    pub scraper: JobScraper,
}
