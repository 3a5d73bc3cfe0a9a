//! Quarry HTTP Client
//!
//! A type-safe HTTP client for the Quarry orchestrator front door, shared by
//! the CLI and by anything else that submits scraping jobs.
//!
//! # Example
//!
//! ```no_run
//! use quarry_client::QuarryClient;
//! use quarry_core::domain::variant::Variant;
//! use quarry_core::dto::job::SubmitJob;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quarry_client::ClientError> {
//!     let client = QuarryClient::new("http://localhost:8000");
//!
//!     let ack = client.submit(SubmitJob {
//!         category: "Pymes".to_string(),
//!         variant: Variant::Bounded,
//!         webhook: None,
//!         email: None,
//!     }).await?;
//!
//!     let job = client
//!         .wait_for_completion(ack.job_id, Duration::from_secs(2), Duration::from_secs(600))
//!         .await?;
//!     println!("{} finished as {}", job.job_id, job.status);
//!     Ok(())
//! }
//! ```

mod catalog;
pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// HTTP client for the Quarry orchestrator API
///
/// Methods are grouped by concern:
/// - Job submission, status and waiting
/// - Queue snapshot
/// - Variant and category discovery
#[derive(Debug, Clone)]
pub struct QuarryClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

/// Error body produced by the front door
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    valid_categories: Vec<String>,
}

impl QuarryClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use quarry_client::QuarryClient;
    ///
    /// let client = QuarryClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    ///
    /// Error bodies of the front door are unpacked into [`ClientError::ApiError`].
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match serde_json::from_str::<ErrorBody>(&error_text) {
                Ok(body) => ClientError::ApiError {
                    status: status.as_u16(),
                    message: body.error,
                    valid_categories: body.valid_categories,
                },
                Err(_) => ClientError::api_error(status.as_u16(), error_text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
