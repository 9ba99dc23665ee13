//! Career scraper: career index -> per-career description/requirements pages
//! -> one corpus file per career.
//!
//! Fetches are retried with exponential backoff on transport errors, 429 and
//! 5xx, up to `ScrapeConfig::max_attempts`.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;
use crate::ingest::html::{find_block, links_with_class, to_text};
use crate::ingest::{write_article, Article, ScrapeError};

/// Container of the career list on the index page and of the article body.
const CONTENT_BLOCK_CLASS: &str = "box_table";
const CAREER_LINK_CLASS: &str = "list-link";
const BASE_RETRY_DELAY: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A career listed on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerRecord {
    pub title: String,
    /// Summary page URL, query string removed.
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub found: usize,
    pub written: usize,
    pub failed: usize,
}

impl ScrapeError {
    fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Http(_) => true,
            ScrapeError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub struct CareerScraper {
    client: Client,
    config: ScrapeConfig,
    data_dir: PathBuf,
}

impl CareerScraper {
    pub fn new(config: ScrapeConfig, data_dir: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            config,
            data_dir: data_dir.into(),
        })
    }

    /// Scrapes every listed career and writes the corpus files.
    pub async fn run(&self) -> Result<ScrapeSummary, ScrapeError> {
        let records = self.scrape_careers().await?;
        info!("Found {} careers on {}", records.len(), self.config.career_url);

        let mut summary = ScrapeSummary {
            found: records.len(),
            ..Default::default()
        };

        for (i, record) in records.iter().enumerate() {
            let written = match self.scrape_article(record).await {
                Ok(article) => write_article(&self.data_dir, &article),
                Err(e) => Err(e),
            };
            match written {
                Ok(path) => {
                    summary.written += 1;
                    debug!("[{}/{}] wrote {}", i + 1, records.len(), path.display());
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!("[{}/{}] skipping '{}': {e}", i + 1, records.len(), record.title);
                }
            }
        }

        info!(
            "Scrape finished: {} written, {} failed, data in {}",
            summary.written,
            summary.failed,
            self.data_dir.display()
        );
        Ok(summary)
    }

    pub async fn scrape_careers(&self) -> Result<Vec<CareerRecord>, ScrapeError> {
        let html = self.fetch(&self.config.career_url).await?;
        parse_career_index(&html, &self.config.base_url)
    }

    pub async fn scrape_article(&self, record: &CareerRecord) -> Result<Article, ScrapeError> {
        let (description_url, requirements_url) = article_urls(&record.url);
        let description = parse_article(&self.fetch(&description_url).await?);
        let requirements = parse_article(&self.fetch(&requirements_url).await?);
        Ok(Article {
            title: record.title.clone(),
            description,
            requirements,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        retry_with_backoff(url, self.config.max_attempts, BASE_RETRY_DELAY, move || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScrapeError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.text().await?)
        })
        .await
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is reached. Delays: base, 2×base, 4×base, ...
pub async fn retry_with_backoff<T, F, Fut>(
    url: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = base_delay * 2u32.pow((attempt - 1).min(10));
            warn!(
                "Fetch of {url} failed (attempt {attempt}/{attempts}), retrying after {}ms: {last_error}",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => last_error = e.to_string(),
            Err(e) => return Err(e),
        }
    }

    Err(ScrapeError::RetriesExhausted {
        url: url.to_string(),
        attempts,
        last: last_error,
    })
}

/// Extracts `title → summary URL` records from the career index page.
/// Duplicate titles keep their first URL.
pub fn parse_career_index(html: &str, base_url: &str) -> Result<Vec<CareerRecord>, ScrapeError> {
    let block = find_block(html, "td", CONTENT_BLOCK_CLASS)
        .ok_or(ScrapeError::MissingBlock(CONTENT_BLOCK_CLASS))?;

    let mut records: Vec<CareerRecord> = Vec::new();
    for link in links_with_class(block, CAREER_LINK_CLASS) {
        if records.iter().any(|r| r.title == link.text) {
            continue;
        }
        let path = link.href.split('?').next().unwrap_or_default();
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", base_url.trim_end_matches('/'), path)
        };
        records.push(CareerRecord {
            title: link.text,
            url,
        });
    }
    Ok(records)
}

/// The description and requirements pages share the summary URL shape.
pub fn article_urls(summary_url: &str) -> (String, String) {
    (
        summary_url.replace("summary", "description"),
        summary_url.replace("summary", "requirements"),
    )
}

/// Plain text of the article body, or of the whole page if the block is missing.
pub fn parse_article(html: &str) -> String {
    find_block(html, "td", CONTENT_BLOCK_CLASS)
        .map(to_text)
        .unwrap_or_else(|| to_text(html))
}
