//! Ingestion: produces the corpus files the retrieval index reads.
//!
//! One text file per career: `<sanitized title>.txt` holding the description
//! section, a blank line, then the requirements section.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod html;
pub mod scraper;

pub use scraper::CareerScraper;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    #[error("Career index has no '{0}' block")]
    MissingBlock(&'static str),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A scraped career page pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub requirements: String,
}

impl Article {
    pub fn content(&self) -> String {
        format!("{}\n\n{}", self.description, self.requirements)
    }
}

/// Career titles can contain `/` ("Nurse/Midwife"), which would become a path.
pub fn sanitize_title(title: &str) -> String {
    title.trim().replace(['/', '\\'], " or ")
}

/// Writes one article into `dir`, creating the directory if needed.
pub fn write_article(dir: &Path, article: &Article) -> Result<PathBuf, ScrapeError> {
    std::fs::create_dir_all(dir).map_err(|source| ScrapeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("{}.txt", sanitize_title(&article.title)));
    std::fs::write(&path, article.content()).map_err(|source| ScrapeError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
