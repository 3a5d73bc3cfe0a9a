//! Execution strategies
//!
//! Three interchangeable engines that turn a category into records. Each job
//! gets a fresh instance from the [`StrategySelector`], so per-run state never
//! leaks between jobs of the same variant.

pub mod accumulator;
pub mod bounded;
pub mod concurrent;
pub mod selector;
pub mod sequential;

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use quarry_core::domain::job::Record;
use quarry_core::domain::variant::{UnsupportedVariant, Variant};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::source::{ArticleLink, ArticleSource, SourceError};

pub use accumulator::PartialResults;
pub use bounded::BoundedStrategy;
pub use concurrent::ConcurrentStrategy;
pub use selector::StrategySelector;
pub use sequential::SequentialStrategy;

/// Strategy error type
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedVariant),

    #[error("strategy panicked: {0}")]
    Panicked(String),
}

/// Tuning shared by every strategy instance
#[derive(Debug, Clone)]
pub struct StrategySettings {
    /// Worker count of the bounded pool
    pub pool_size: usize,

    /// In-flight cap of the concurrent strategy
    pub concurrency_cap: usize,

    /// How long a cancelled pool waits for in-flight units
    pub cancel_grace: Duration,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            pool_size: 5,
            concurrency_cap: 10,
            cancel_grace: Duration::from_millis(500),
        }
    }
}

/// A swappable execution engine
#[async_trait]
pub trait Strategy: Send + Sync {
    fn variant(&self) -> Variant;

    /// Extract every unit of `category`
    ///
    /// Must stop issuing new work promptly once `cancel` fires.
    async fn run(
        &self,
        category: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, StrategyError>;

    /// Records accumulated so far; never blocks, never fails
    fn partial(&self) -> Vec<Record>;
}

/// Discover units unless cancellation wins first
async fn discover(
    source: &dyn ArticleSource,
    category: &str,
    cancel: &CancellationToken,
) -> Result<Option<Vec<ArticleLink>>, StrategyError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(None),
        links = source.discover(category) => Ok(Some(links?)),
    }
}

/// Fold one unit outcome into the accumulator
///
/// Recoverable failures are logged and skipped, fatal ones bubble up.
fn record_outcome(
    results: &PartialResults,
    link: &ArticleLink,
    outcome: Result<Option<Record>, SourceError>,
) -> Result<(), StrategyError> {
    match outcome {
        Ok(Some(record)) => {
            results.push(record);
            Ok(())
        }
        Ok(None) => {
            tracing::debug!(url = %link.url, "No article on page");
            Ok(())
        }
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            tracing::warn!(url = %link.url, error = %e, "Skipping article");
            Ok(())
        }
    }
}

/// Turn a failed task join into a strategy error; aborted tasks are not failures
fn join_failure(err: JoinError) -> Option<StrategyError> {
    if err.is_panic() {
        Some(StrategyError::Panicked(panic_message(err.into_panic().as_ref())))
    } else {
        None
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
