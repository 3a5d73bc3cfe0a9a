//! Bounded strategy: a fixed-size worker pool
//!
//! Workers pull units from a shared queue. Cancellation stops the dispatch of
//! new units; in-flight units get `cancel_grace` to land before the pool is
//! aborted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use quarry_core::domain::job::Record;
use quarry_core::domain::variant::Variant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{PartialResults, Strategy, StrategyError, discover, join_failure, record_outcome};
use crate::source::{ArticleLink, ArticleSource};

pub struct BoundedStrategy {
    source: Arc<dyn ArticleSource>,
    results: PartialResults,
    pool_size: usize,
    grace: Duration,
}

impl BoundedStrategy {
    pub fn new(source: Arc<dyn ArticleSource>, pool_size: usize, grace: Duration) -> Self {
        Self {
            source,
            results: PartialResults::new(),
            pool_size: pool_size.max(1),
            grace,
        }
    }
}

type WorkQueue = Arc<Mutex<VecDeque<ArticleLink>>>;

async fn worker(
    source: Arc<dyn ArticleSource>,
    queue: WorkQueue,
    results: PartialResults,
    stop: CancellationToken,
) -> Result<(), StrategyError> {
    loop {
        if stop.is_cancelled() {
            return Ok(());
        }
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some(link) = next else {
            return Ok(());
        };

        let outcome = source.extract(&link).await;
        if stop.is_cancelled() {
            return Ok(());
        }
        if let Err(e) = record_outcome(&results, &link, outcome) {
            stop.cancel();
            return Err(e);
        }
    }
}

#[async_trait]
impl Strategy for BoundedStrategy {
    fn variant(&self) -> Variant {
        Variant::Bounded
    }

    async fn run(
        &self,
        category: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, StrategyError> {
        let Some(links) = discover(self.source.as_ref(), category, &cancel).await? else {
            return Ok(self.results.snapshot());
        };
        let workers_needed = self.pool_size.min(links.len());
        tracing::debug!(category, units = links.len(), workers = workers_needed, "Bounded run started");

        let queue: WorkQueue = Arc::new(Mutex::new(links.into()));
        let stop = cancel.child_token();
        let mut workers = JoinSet::new();
        for _ in 0..workers_needed {
            workers.spawn(worker(
                Arc::clone(&self.source),
                Arc::clone(&queue),
                self.results.clone(),
                stop.clone(),
            ));
        }

        let mut failure = None;
        loop {
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                joined = workers.join_next() => {
                    match joined {
                        None => break,
                        Some(Ok(Ok(()))) => {}
                        Some(Ok(Err(e))) => {
                            failure.get_or_insert(e);
                        }
                        Some(Err(e)) => {
                            if let Some(e) = join_failure(e) {
                                stop.cancel();
                                failure.get_or_insert(e);
                            }
                        }
                    }
                    false
                }
            };

            if cancelled {
                let drained = tokio::time::timeout(self.grace, async {
                    while workers.join_next().await.is_some() {}
                })
                .await;
                if drained.is_err() {
                    tracing::debug!(category, "Grace period over, aborting workers");
                }
                workers.abort_all();
                break;
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(self.results.snapshot()),
        }
    }

    fn partial(&self) -> Vec<Record> {
        self.results.snapshot()
    }
}
