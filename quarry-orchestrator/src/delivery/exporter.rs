//! Result exporters

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use quarry_core::domain::job::Job;
use quarry_core::dto::round_secs;
use serde_json::json;

use crate::source::category::file_slug;

/// Export error type
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("export rejected: {0}")]
    Rejected(String),
}

impl ExportError {
    /// Whether another attempt might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ExportError::Io(_))
    }
}

/// Stores a finished job's records and returns a reference to them
#[async_trait]
pub trait ResultExporter: Send + Sync {
    async fn export(&self, job: &Job) -> Result<String, ExportError>;
}

/// Writes one JSON document per job into a directory
pub struct JsonFileExporter {
    dir: PathBuf,
    base_url: Option<String>,
}

impl JsonFileExporter {
    pub fn new(dir: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url,
        }
    }

    fn file_name(job: &Job) -> String {
        let id = job.id.simple().to_string();
        format!(
            "quarry_{}_{}_{}_{}.json",
            job.variant,
            file_slug(&job.category),
            Utc::now().timestamp(),
            &id[..8]
        )
    }
}

#[async_trait]
impl ResultExporter for JsonFileExporter {
    async fn export(&self, job: &Job) -> Result<String, ExportError> {
        let document = json!({
            "metadata": {
                "job_id": job.id,
                "category": job.category,
                "variant": job.variant,
                "status": job.status,
                "record_count": job.records.len(),
                "duration": job.duration_secs.map(round_secs),
                "exported_at": Utc::now(),
            },
            "records": job.records,
        });
        let body = serde_json::to_vec_pretty(&document)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let name = Self::file_name(job);
        let path = self.dir.join(&name);
        tokio::fs::write(&path, body).await?;

        tracing::debug!(job_id = %job.id, path = %path.display(), "Results written");

        match &self.base_url {
            Some(base) => Ok(format!("{}/{}", base.trim_end_matches('/'), name)),
            None => {
                let absolute = tokio::fs::canonicalize(&path).await?;
                url::Url::from_file_path(&absolute)
                    .map(String::from)
                    .map_err(|_| ExportError::Rejected(format!("no file URL for {}", absolute.display())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::domain::job::{Completion, JobStatus, Record};
    use quarry_core::domain::variant::Variant;

    fn finished_job(records: usize) -> Job {
        let mut job = Job::new("Casos de exito", Variant::Bounded, None, Some("a@b.co".into()));
        job.start(Utc::now()).unwrap();
        job.finish(Completion {
            status: JobStatus::Completed,
            records: (0..records)
                .map(|i| {
                    let mut record = Record::new();
                    record.insert("title".into(), format!("article {i}").into());
                    record
                })
                .collect(),
            error: None,
            finished_at: Utc::now(),
            duration_secs: 1.234,
        })
        .unwrap();
        job
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quarry-{name}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_writes_document_with_base_url() {
        let dir = scratch_dir("export");
        let exporter = JsonFileExporter::new(&dir, Some("https://files.example.com/".into()));
        let job = finished_job(2);

        let link = exporter.export(&job).await.unwrap();
        assert!(link.starts_with("https://files.example.com/quarry_bounded_casos-de-exito_"));

        let name = link.rsplit('/').next().unwrap();
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.join(name)).unwrap()).unwrap();
        assert_eq!(written["metadata"]["record_count"], 2);
        assert_eq!(written["metadata"]["status"], "completed");
        assert_eq!(written["metadata"]["duration"], 1.23);
        assert_eq!(written["records"][1]["title"], "article 1");

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_file_url_without_base() {
        let dir = scratch_dir("export-file");
        let exporter = JsonFileExporter::new(&dir, None);

        let link = exporter.export(&finished_job(1)).await.unwrap();
        assert!(link.starts_with("file://"));
        assert!(link.ends_with(".json"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_transient_classification() {
        let io = ExportError::Io(std::io::Error::other("disk"));
        assert!(io.is_transient());
        let serialize = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!ExportError::Serialize(serialize).is_transient());
        assert!(!ExportError::Rejected("x".into()).is_transient());
    }
}
