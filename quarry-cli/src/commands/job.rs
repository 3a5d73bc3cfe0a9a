//! Job command handlers
//!
//! Submitting jobs, showing one job and the queue snapshot.

use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;
use quarry_client::{ClientError, QuarryClient};
use quarry_core::domain::job::JobStatus;
use quarry_core::domain::variant::Variant;
use quarry_core::dto::job::{JobView, SubmitJob};
use quarry_core::dto::queue::JobSummary;

use crate::id_resolver::resolve_job_id;
use crate::types::IdOrPrefix;

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
const WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Submit a job, optionally waiting for it to finish
pub async fn submit(
    client: &QuarryClient,
    category: String,
    variant: Variant,
    webhook: Option<String>,
    email: Option<String>,
    wait: bool,
) -> Result<()> {
    let ack = client
        .submit(SubmitJob {
            category,
            variant,
            webhook,
            email,
        })
        .await
        .map_err(explain_rejection)?;

    println!("{}", "✓ Job queued".green());
    println!("  ID:      {}", ack.job_id.to_string().cyan());
    println!("  Variant: {}", variant);

    if wait {
        println!("{}", "Waiting for the job to finish...".dimmed());
        let job = client
            .wait_for_completion(ack.job_id, POLL_INTERVAL, WAIT_TIMEOUT)
            .await?;
        println!();
        print_job_details(&job, false);
    }

    Ok(())
}

/// Show one job by id or prefix
pub async fn status(client: &QuarryClient, id: &str, records: bool) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;
    let job = client
        .job_status(uuid)
        .await
        .with_context(|| format!("Failed to fetch job {}", uuid))?;

    print_job_details(&job, records);

    Ok(())
}

/// Show the queue snapshot
pub async fn queue(client: &QuarryClient) -> Result<()> {
    let queue = client
        .queue_status()
        .await
        .context("Failed to fetch queue status")?;

    println!(
        "{} pending, {} processing, {} finished",
        queue.pending_count.to_string().yellow(),
        queue.processing_count.to_string().cyan(),
        queue.finished_count.to_string().green()
    );

    for (title, jobs) in [
        ("Pending", &queue.pending),
        ("Processing", &queue.processing),
        ("Finished", &queue.finished),
    ] {
        if jobs.is_empty() {
            continue;
        }
        println!();
        println!("{}", format!("{title}:").bold());
        for job in jobs {
            print_job_summary(job);
        }
    }

    Ok(())
}

/// Turn an invalid-category rejection into a hint listing the valid ones
pub fn explain_rejection(err: ClientError) -> anyhow::Error {
    let valid = err.valid_categories();
    if valid.is_empty() {
        return err.into();
    }
    let hint = format!("Valid categories: {}", valid.join(", "));
    anyhow::Error::new(err).context(hint)
}

fn print_job_summary(job: &JobSummary) {
    let mut line = format!(
        "  {} {} {:<11} {:<10} {}",
        "▸".cyan(),
        job.job_id.to_string().dimmed(),
        colorize_status(job.status),
        job.variant.to_string(),
        job.category
    );
    if let Some(waiting) = job.waiting_time {
        line.push_str(&format!("  waiting {:.2}s", waiting));
    }
    if let Some(duration) = job.duration {
        line.push_str(&format!("  {:.2}s", duration));
    }
    if let Some(count) = job.record_count {
        line.push_str(&format!("  {} records", count));
    }
    println!("{}", line);
}

fn print_job_details(job: &JobView, with_records: bool) {
    println!("{}", "Job Details:".bold());
    println!("  ID:       {}", job.job_id.to_string().cyan());
    println!("  Status:   {}", colorize_status(job.status));
    println!("  Category: {}", job.category);
    println!("  Variant:  {}", job.variant);

    if let Some(email) = &job.email {
        println!("  Contact:  {}", email);
    }
    if let Some(duration) = job.duration {
        println!("  Duration: {:.2}s", duration);
    }
    if let Some(count) = job.record_count {
        println!("  Records:  {}", count);
    }
    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }

    if with_records {
        if let Some(records) = &job.records {
            println!("\n{}", "Records:".bold());
            match serde_json::to_string_pretty(records) {
                Ok(pretty) => println!("{}", pretty),
                Err(_) => println!("{:?}", records),
            }
        }
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let text = status.as_str();
    match status {
        JobStatus::Pending => text.yellow(),
        JobStatus::Processing => text.cyan(),
        JobStatus::Completed => text.green(),
        JobStatus::Partial => text.magenta(),
        JobStatus::Error => text.red(),
    }
}
