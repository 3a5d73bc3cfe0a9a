//! Extraction sources
//!
//! A source knows how to list the extraction units of a category and how to
//! turn one unit into a record. Strategies drive a source; they never parse
//! markup themselves.

pub mod blog;
pub mod category;

use async_trait::async_trait;
use quarry_core::domain::job::Record;

pub use blog::BlogSource;

/// One unit of extraction work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleLink {
    pub url: String,
}

impl ArticleLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Source error type
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("unparsable page {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl SourceError {
    /// Unrecoverable errors abort the whole run; the rest skip one unit
    pub fn is_fatal(&self) -> bool {
        match self {
            SourceError::Status { status, .. } => matches!(status, 401 | 403 | 429),
            SourceError::UnknownCategory(_) => true,
            SourceError::Http(_) | SourceError::Parse { .. } => false,
        }
    }
}

/// Where strategies get their units and records from
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// List every extraction unit of a category
    async fn discover(&self, category: &str) -> Result<Vec<ArticleLink>, SourceError>;

    /// Extract one unit; `Ok(None)` means the page held no article
    async fn extract(&self, link: &ArticleLink) -> Result<Option<Record>, SourceError>;
}
