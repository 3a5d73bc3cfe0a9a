//! Sequential strategy: one unit at a time

use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::domain::job::Record;
use quarry_core::domain::variant::Variant;
use tokio_util::sync::CancellationToken;

use super::{PartialResults, Strategy, StrategyError, discover, record_outcome};
use crate::source::ArticleSource;

pub struct SequentialStrategy {
    source: Arc<dyn ArticleSource>,
    results: PartialResults,
}

impl SequentialStrategy {
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        Self {
            source,
            results: PartialResults::new(),
        }
    }
}

#[async_trait]
impl Strategy for SequentialStrategy {
    fn variant(&self) -> Variant {
        Variant::Sequential
    }

    async fn run(
        &self,
        category: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, StrategyError> {
        let Some(links) = discover(self.source.as_ref(), category, &cancel).await? else {
            return Ok(self.results.snapshot());
        };
        tracing::debug!(category, units = links.len(), "Sequential run started");

        for link in &links {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.source.extract(link) => outcome,
            };
            record_outcome(&self.results, link, outcome)?;
        }

        Ok(self.results.snapshot())
    }

    fn partial(&self) -> Vec<Record> {
        self.results.snapshot()
    }
}
