//! Orchestrator assembly
//!
//! Wires registry, limiter, strategies, supervisor, dispatch and the
//! completion pipeline together. The process entry point owns the result and
//! passes the service handle to the HTTP layer; tests build as many isolated
//! instances as they like.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::delivery::{Notifier, ResultExporter};
use crate::repository::JobRegistry;
use crate::service::{
    CompletionPipeline, ConcurrencyLimiter, Dispatcher, JobProcessor, JobService,
    TimeoutSupervisor,
};
use crate::source::ArticleSource;
use crate::strategy::StrategySelector;

/// External collaborators the orchestrator drives
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn ArticleSource>,
    pub exporter: Arc<dyn ResultExporter>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct Orchestrator {
    service: Arc<JobService>,
    registry: Arc<JobRegistry>,
    limiter: Arc<ConcurrencyLimiter>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl Orchestrator {
    /// Build every component and start the variant workers
    pub fn start(config: &Config, collaborators: Collaborators) -> Self {
        let selector = StrategySelector::standard(collaborators.source, config.strategy_settings());
        Self::with_selector(config, selector, collaborators.exporter, collaborators.notifier)
    }

    /// Like [`Orchestrator::start`] with a custom strategy selector
    pub fn with_selector(
        config: &Config,
        selector: StrategySelector,
        exporter: Arc<dyn ResultExporter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let limiter = Arc::new(ConcurrencyLimiter::new());
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let variants = selector.variants();

        let supervisor = TimeoutSupervisor::new(config.supervisor_settings(), shutdown.clone());
        let processor = Arc::new(JobProcessor::new(
            Arc::clone(&registry),
            Arc::clone(&limiter),
            selector,
            supervisor,
        ));
        let completion = Arc::new(CompletionPipeline::new(
            exporter,
            notifier,
            config.retry_policy(),
        ));
        let dispatcher = Dispatcher::start(processor, completion, &tracker, shutdown.clone());

        let service = Arc::new(JobService::new(
            Arc::clone(&registry),
            dispatcher,
            config.categories.clone(),
            variants,
            config.default_contact.clone(),
        ));

        tracing::info!(
            max_duration = config.max_duration.as_secs_f64(),
            deadline = config.supervisor_settings().deadline().as_secs_f64(),
            pool_size = config.pool_size,
            concurrency_cap = config.concurrency_cap,
            "Orchestrator started"
        );

        Self {
            service,
            registry,
            limiter,
            tracker,
            shutdown,
        }
    }

    pub fn service(&self) -> Arc<JobService> {
        Arc::clone(&self.service)
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// Stop the workers, interrupt running jobs and wait for every
    /// outstanding completion pipeline
    pub async fn shutdown(self) {
        tracing::info!("Orchestrator shutting down");
        self.shutdown.cancel();
        self.limiter.close();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("Orchestrator stopped");
    }
}
