//! Job-related API endpoints

use std::time::Duration;

use quarry_core::dto::job::{JobView, SubmitAck, SubmitJob};
use quarry_core::dto::queue::QueueStatus;
use tokio::time::Instant;
use uuid::Uuid;

use crate::QuarryClient;
use crate::error::{ClientError, Result};

impl QuarryClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a new scraping job
    ///
    /// Returns as soon as the job is queued; use [`QuarryClient::job_status`]
    /// or [`QuarryClient::wait_for_completion`] to follow it.
    pub async fn submit(&self, req: SubmitJob) -> Result<SubmitAck> {
        let response = self
            .client
            .post(self.url("/scraping"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the current view of a job
    pub async fn job_status(&self, job_id: Uuid) -> Result<JobView> {
        let response = self
            .client
            .get(self.url(&format!("/scraping/status/{}", job_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Poll a job until it reaches a terminal state
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    /// * `poll_interval` - Pause between two status queries
    /// * `timeout` - Give up after this long with [`ClientError::Timeout`]
    pub async fn wait_for_completion(
        &self,
        job_id: Uuid,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<JobView> {
        let started = Instant::now();

        loop {
            let view = self.job_status(job_id).await?;
            if view.status.is_terminal() {
                return Ok(view);
            }

            if started.elapsed() >= timeout {
                return Err(ClientError::Timeout {
                    job_id,
                    status: view.status.to_string(),
                    waited_secs: started.elapsed().as_secs_f64(),
                });
            }

            tracing::debug!(job_id = %job_id, status = %view.status, "Job not finished yet");
            tokio::time::sleep(poll_interval).await;
        }
    }

    // =============================================================================
    // Queue
    // =============================================================================

    /// Snapshot of pending, processing and finished jobs
    pub async fn queue_status(&self) -> Result<QueueStatus> {
        let response = self
            .client
            .get(self.url("/scraping/queue/status"))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
