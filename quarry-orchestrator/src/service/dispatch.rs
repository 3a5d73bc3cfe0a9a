//! Worker-per-variant dispatch
//!
//! Submission hands the job id to its variant's channel and returns at once.
//! One worker task per variant drains the channel in order, processes each
//! job and then spawns its completion pipeline on the shared task tracker so
//! the next job of the variant is never held up by export or notification.

use std::collections::HashMap;
use std::sync::Arc;

use quarry_core::domain::variant::Variant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use super::completion::CompletionPipeline;
use super::processor::JobProcessor;

const SHUTTING_DOWN: &str = "Process shutting down before the job could run";

pub struct Dispatcher {
    senders: HashMap<Variant, mpsc::UnboundedSender<Uuid>>,
    processor: Arc<JobProcessor>,
}

impl Dispatcher {
    /// Spawn one worker per variant on `tracker`
    pub fn start(
        processor: Arc<JobProcessor>,
        completion: Arc<CompletionPipeline>,
        tracker: &TaskTracker,
        shutdown: CancellationToken,
    ) -> Self {
        let mut senders = HashMap::new();
        for variant in Variant::ALL {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(variant, tx);
            tracker.spawn(worker(
                variant,
                rx,
                Arc::clone(&processor),
                Arc::clone(&completion),
                tracker.clone(),
                shutdown.clone(),
            ));
        }

        Self { senders, processor }
    }

    /// Queue a submitted job for its variant's worker
    ///
    /// A job that cannot be handed over is finalized as `error` right away.
    pub fn dispatch(&self, id: Uuid, variant: Variant) {
        let sent = self
            .senders
            .get(&variant)
            .is_some_and(|tx| tx.send(id).is_ok());

        if !sent {
            if let Err(e) = self.processor.reject(id, SHUTTING_DOWN) {
                tracing::error!(job_id = %id, error = %e, "Failed to reject undispatched job");
            }
        }
    }
}

async fn worker(
    variant: Variant,
    mut rx: mpsc::UnboundedReceiver<Uuid>,
    processor: Arc<JobProcessor>,
    completion: Arc<CompletionPipeline>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
) {
    tracing::debug!(variant = %variant, "Variant worker started");

    loop {
        let id = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(id) => id,
                None => break,
            },
        };

        match processor.execute(id).await {
            Ok(job) => {
                let completion = Arc::clone(&completion);
                tracker.spawn(async move {
                    let report = completion.run(job).await;
                    tracing::debug!(?report, "Completion pipeline finished");
                });
            }
            Err(e) => tracing::error!(job_id = %id, error = %e, "Job processing failed"),
        }
    }

    // Anything still queued will never run
    rx.close();
    while let Ok(id) = rx.try_recv() {
        if let Err(e) = processor.reject(id, SHUTTING_DOWN) {
            tracing::error!(job_id = %id, error = %e, "Failed to reject queued job");
        }
    }

    tracing::debug!(variant = %variant, "Variant worker stopped");
}
