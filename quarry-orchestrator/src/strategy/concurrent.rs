//! Concurrent strategy: one task per unit under an internal cap
//!
//! Every outstanding extraction selects on the stop token, so cancellation
//! reaches each of them individually.

use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::domain::job::Record;
use quarry_core::domain::variant::Variant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{PartialResults, Strategy, StrategyError, discover, join_failure, record_outcome};
use crate::source::{ArticleLink, ArticleSource};

pub struct ConcurrentStrategy {
    source: Arc<dyn ArticleSource>,
    results: PartialResults,
    cap: usize,
}

impl ConcurrentStrategy {
    pub fn new(source: Arc<dyn ArticleSource>, cap: usize) -> Self {
        Self {
            source,
            results: PartialResults::new(),
            cap: cap.max(1),
        }
    }
}

async fn fetch_one(
    source: Arc<dyn ArticleSource>,
    link: ArticleLink,
    gate: Arc<Semaphore>,
    results: PartialResults,
    stop: CancellationToken,
) -> Result<(), StrategyError> {
    let _permit = tokio::select! {
        biased;
        _ = stop.cancelled() => return Ok(()),
        permit = gate.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return Ok(()),
        },
    };

    let outcome = tokio::select! {
        biased;
        _ = stop.cancelled() => return Ok(()),
        outcome = source.extract(&link) => outcome,
    };

    record_outcome(&results, &link, outcome).inspect_err(|_| stop.cancel())
}

#[async_trait]
impl Strategy for ConcurrentStrategy {
    fn variant(&self) -> Variant {
        Variant::Concurrent
    }

    async fn run(
        &self,
        category: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, StrategyError> {
        let Some(links) = discover(self.source.as_ref(), category, &cancel).await? else {
            return Ok(self.results.snapshot());
        };
        tracing::debug!(category, units = links.len(), cap = self.cap, "Concurrent run started");

        let gate = Arc::new(Semaphore::new(self.cap));
        let stop = cancel.child_token();
        let mut tasks = JoinSet::new();
        for link in links {
            tasks.spawn(fetch_one(
                Arc::clone(&self.source),
                link,
                Arc::clone(&gate),
                self.results.clone(),
                stop.clone(),
            ));
        }

        let mut failure = None;
        loop {
            let finished = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                joined = tasks.join_next() => match joined {
                    None => true,
                    Some(Ok(Ok(()))) => false,
                    Some(Ok(Err(e))) => {
                        failure = Some(e);
                        true
                    }
                    Some(Err(e)) => match join_failure(e) {
                        Some(e) => {
                            failure = Some(e);
                            true
                        }
                        None => false,
                    },
                },
            };
            if finished {
                break;
            }
        }

        stop.cancel();
        tasks.abort_all();

        match failure {
            Some(e) => Err(e),
            None => Ok(self.results.snapshot()),
        }
    }

    fn partial(&self) -> Vec<Record> {
        self.results.snapshot()
    }
}
