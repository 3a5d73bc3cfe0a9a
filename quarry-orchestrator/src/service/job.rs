//! Job Service
//!
//! Business logic behind the HTTP front door: validates submissions, creates
//! jobs and answers status queries from the registry.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use quarry_core::domain::job::Job;
use quarry_core::domain::variant::Variant;
use quarry_core::dto::catalog::{CategoryList, VariantInfo, VariantList};
use quarry_core::dto::job::{JobView, SubmitAck, SubmitJob};
use quarry_core::dto::queue::QueueStatus;
use uuid::Uuid;

use super::dispatch::Dispatcher;
use crate::repository::JobRegistry;
use crate::source::category::normalize;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("category '{category}' is not available")]
    InvalidCategory {
        category: String,
        valid: Vec<String>,
    },

    #[error("{0}")]
    Validation(String),
}

pub struct JobService {
    registry: Arc<JobRegistry>,
    dispatcher: Dispatcher,
    categories: Vec<String>,
    variants: Vec<Variant>,
    default_contact: Option<String>,
    /// Held across queueing and dispatch so the worker sees jobs in queue order
    submission: Mutex<()>,
}

impl JobService {
    pub fn new(
        registry: Arc<JobRegistry>,
        dispatcher: Dispatcher,
        categories: Vec<String>,
        variants: Vec<Variant>,
        default_contact: Option<String>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            categories,
            variants,
            default_contact,
            submission: Mutex::new(()),
        }
    }

    /// Validate a request, queue the job and hand it to its worker
    pub fn submit(&self, req: SubmitJob) -> Result<SubmitAck, JobError> {
        let category = self.canonical_category(&req.category)?;
        let webhook = req.webhook.as_deref().map(validate_webhook).transpose()?;
        let contact = match req.email.as_deref() {
            Some(email) => Some(validate_contact(email)?),
            None => self.default_contact.clone(),
        };

        let job = Job::new(category, req.variant, webhook, contact);
        let id = job.id;
        tracing::info!(
            job_id = %id,
            variant = %job.variant,
            category = %job.category,
            "Job submitted"
        );

        let _order = self
            .submission
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.registry.submit(job);
        self.dispatcher.dispatch(id, req.variant);

        Ok(SubmitAck::accepted(id))
    }

    /// Current view of one job
    pub fn get_job(&self, id: Uuid) -> Result<JobView, JobError> {
        let job = self.registry.lookup(id).ok_or(JobError::NotFound(id))?;
        Ok(JobView::from_job(&job, Utc::now()))
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.registry.snapshot(Utc::now())
    }

    pub fn variants(&self) -> VariantList {
        VariantList {
            variants: self
                .variants
                .iter()
                .map(|v| VariantInfo {
                    name: *v,
                    description: v.description().to_string(),
                })
                .collect(),
            default: Variant::default(),
        }
    }

    pub fn categories(&self) -> CategoryList {
        CategoryList {
            categories: self.categories.clone(),
        }
    }

    fn canonical_category(&self, requested: &str) -> Result<String, JobError> {
        let wanted = normalize(requested);
        self.categories
            .iter()
            .find(|c| normalize(c) == wanted)
            .cloned()
            .ok_or_else(|| {
                tracing::warn!(category = requested, "Submission with invalid category");
                let mut valid = self.categories.clone();
                valid.sort();
                JobError::InvalidCategory {
                    category: requested.to_string(),
                    valid,
                }
            })
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_webhook(raw: &str) -> Result<String, JobError> {
    let url = url::Url::parse(raw.trim())
        .map_err(|e| JobError::Validation(format!("Invalid webhook URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url.to_string()),
        _ => Err(JobError::Validation(format!(
            "Webhook must be an http(s) URL: {raw}"
        ))),
    }
}

fn validate_contact(raw: &str) -> Result<String, JobError> {
    let email = raw.trim();
    if looks_like_email(email) {
        Ok(email.to_string())
    } else {
        Err(JobError::Validation(format!("Invalid email address: {raw}")))
    }
}

/// Loose address check: one `@`, a non-empty local part and a dotted domain
pub fn looks_like_email(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("ana@example.com"));
        assert!(looks_like_email("a.b+c@mail.example.org"));
        assert!(!looks_like_email("ana@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ana@@example.com"));
        assert!(!looks_like_email("ana @example.com"));
        assert!(!looks_like_email("ana@example."));
        assert!(!looks_like_email("ana@.com"));
    }

    #[test]
    fn test_validate_webhook() {
        assert_eq!(
            validate_webhook("https://hooks.example.com/done").unwrap(),
            "https://hooks.example.com/done"
        );
        assert!(validate_webhook("ftp://example.com").is_err());
        assert!(validate_webhook("not a url").is_err());
        assert!(validate_webhook("mailto:ana@example.com").is_err());
    }

    #[test]
    fn test_validate_contact_trims() {
        assert_eq!(validate_contact(" ana@example.com ").unwrap(), "ana@example.com");
        assert!(matches!(
            validate_contact("nope"),
            Err(JobError::Validation(_))
        ));
    }

    mod ordering {
        use super::super::*;
        use crate::app::Orchestrator;
        use crate::config::Config;
        use crate::strategy::{Strategy, StrategyError, StrategySelector};
        use crate::testing::{RecordingExporter, RecordingNotifier};
        use async_trait::async_trait;
        use quarry_core::domain::job::Record;
        use std::time::Duration;
        use tokio_util::sync::CancellationToken;

        /// Notes the category of every run it is asked to do
        struct Ledger(Arc<Mutex<Vec<String>>>);

        #[async_trait]
        impl Strategy for Ledger {
            fn variant(&self) -> Variant {
                Variant::Sequential
            }

            async fn run(
                &self,
                category: &str,
                _cancel: CancellationToken,
            ) -> Result<Vec<Record>, StrategyError> {
                self.0.lock().unwrap().push(category.to_string());
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }

            fn partial(&self) -> Vec<Record> {
                Vec::new()
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_jobs_run_in_queue_order_under_concurrent_submission() {
            let categories: Vec<String> = (0..32).map(|i| format!("c{i}")).collect();
            let runs = Arc::new(Mutex::new(Vec::new()));
            let ledger = Arc::clone(&runs);
            let selector = StrategySelector::empty().register(
                Variant::Sequential,
                move || -> Arc<dyn Strategy> { Arc::new(Ledger(Arc::clone(&ledger))) },
            );
            let config = Config {
                categories: categories.clone(),
                ..Config::default()
            };
            let orchestrator = Orchestrator::with_selector(
                &config,
                selector,
                Arc::new(RecordingExporter::new()),
                Arc::new(RecordingNotifier::new()),
            );
            let service = orchestrator.service();

            std::thread::scope(|scope| {
                for chunk in categories.chunks(4) {
                    let service = &service;
                    scope.spawn(move || {
                        for category in chunk {
                            service
                                .submit(SubmitJob {
                                    category: category.clone(),
                                    variant: Variant::Sequential,
                                    webhook: None,
                                    email: None,
                                })
                                .unwrap();
                        }
                    });
                }
            });

            let queued: Vec<String> = service
                .queue_status()
                .pending
                .iter()
                .map(|j| j.category.clone())
                .collect();
            assert_eq!(queued.len(), 32);

            while service.queue_status().finished_count < 32 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }

            assert_eq!(*runs.lock().unwrap(), queued);
        }
    }
}
