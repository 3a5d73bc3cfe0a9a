//! ID resolver module
//!
//! Resolves job id prefixes to full UUIDs against the queue snapshot, so users
//! can type a short prefix instead of the whole id.

use anyhow::{Context, Result, anyhow};
use quarry_client::QuarryClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a job ID or prefix to a full UUID
///
/// A full UUID is returned as is, without a round trip. A prefix is matched
/// against every job in the queue snapshot.
///
/// # Errors
/// Returns an error if:
/// - No job matches the prefix
/// - Multiple jobs match the prefix (ambiguous)
/// - API call fails
pub async fn resolve_job_id(client: &QuarryClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    let prefix = match id_or_prefix {
        IdOrPrefix::Full(uuid) => return Ok(*uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let queue = client
        .queue_status()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    match_prefix(queue.all().map(|j| j.job_id), prefix)
}

fn match_prefix(ids: impl Iterator<Item = Uuid>, prefix: &str) -> Result<Uuid> {
    let matches: Vec<Uuid> = ids
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No job found with ID starting with '{}'", prefix)),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
