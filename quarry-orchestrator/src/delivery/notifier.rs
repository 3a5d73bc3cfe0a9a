//! Completion notifiers

use std::time::Duration;

use async_trait::async_trait;
use quarry_core::dto::job::CompletionNotice;

/// Notify error type
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("receiver answered HTTP {0}")]
    Status(u16),
}

/// Delivers a completion notice to a target
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, target: &str, notice: &CompletionNotice) -> Result<(), NotifyError>;
}

/// POSTs the notice as JSON, once
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, target: &str, notice: &CompletionNotice) -> Result<(), NotifyError> {
        let response = self.client.post(target).json(notice).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        Ok(())
    }
}
