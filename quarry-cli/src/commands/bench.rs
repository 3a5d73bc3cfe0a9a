//! Variant benchmark
//!
//! Submits every variant against every category, one job at a time, and
//! prints how each combination fared.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;
use quarry_client::QuarryClient;
use quarry_core::domain::variant::Variant;
use quarry_core::dto::job::{JobView, SubmitJob};
use serde::Serialize;
use uuid::Uuid;

use super::job::POLL_INTERVAL;

pub struct BenchPlan {
    pub variants: Vec<Variant>,
    pub categories: Vec<String>,
    pub webhook: Option<String>,
    pub email: Option<String>,
    pub timeout: Duration,
}

/// One variant × category result
#[derive(Debug, Serialize)]
pub struct BenchRow {
    pub variant: Variant,
    pub category: String,
    pub job_id: Option<Uuid>,
    pub status: String,
    pub duration: Option<f64>,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BenchRow {
    fn from_view(view: &JobView) -> Self {
        BenchRow {
            variant: view.variant,
            category: view.category.clone(),
            job_id: Some(view.job_id),
            status: view.status.to_string(),
            duration: view.duration,
            records: view.record_count.unwrap_or(0),
            error: view.error.clone(),
        }
    }

    fn failed(variant: Variant, category: &str, status: &str, error: String) -> Self {
        BenchRow {
            variant,
            category: category.to_string(),
            job_id: None,
            status: status.to_string(),
            duration: None,
            records: 0,
            error: Some(error),
        }
    }
}

pub async fn run(client: &QuarryClient, plan: BenchPlan, output: Option<&Path>) -> Result<()> {
    let total = plan.variants.len() * plan.categories.len();
    let mut rows = Vec::with_capacity(total);

    for variant in &plan.variants {
        for category in &plan.categories {
            println!(
                "{} [{}/{}] {} × {}",
                "▸".cyan(),
                rows.len() + 1,
                total,
                variant,
                category
            );
            let row = run_one(client, &plan, *variant, category).await;
            println!("    {}", row.status);
            rows.push(row);
        }
    }

    println!();
    print_table(&rows);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&rows).context("Failed to serialize results")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        println!(
            "\n{} {}",
            "✓ Results written to".green(),
            path.display()
        );
    }

    Ok(())
}

async fn run_one(
    client: &QuarryClient,
    plan: &BenchPlan,
    variant: Variant,
    category: &str,
) -> BenchRow {
    let ack = match client
        .submit(SubmitJob {
            category: category.to_string(),
            variant,
            webhook: plan.webhook.clone(),
            email: plan.email.clone(),
        })
        .await
    {
        Ok(ack) => ack,
        Err(e) => return BenchRow::failed(variant, category, "rejected", e.to_string()),
    };

    match client
        .wait_for_completion(ack.job_id, POLL_INTERVAL, plan.timeout)
        .await
    {
        Ok(view) => BenchRow::from_view(&view),
        Err(e) => {
            let mut row = BenchRow::failed(variant, category, "unfinished", e.to_string());
            row.job_id = Some(ack.job_id);
            row
        }
    }
}

fn print_table(rows: &[BenchRow]) {
    println!(
        "{}",
        format!(
            "{:<12} {:<24} {:<11} {:>10} {:>8}",
            "VARIANT", "CATEGORY", "STATUS", "DURATION", "RECORDS"
        )
        .bold()
    );
    for row in rows {
        let status = match row.status.as_str() {
            "completed" => row.status.green(),
            "partial" => row.status.magenta(),
            "error" => row.status.red(),
            _ => row.status.yellow(),
        };
        let duration = row
            .duration
            .map(|d| format!("{:.2}s", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<24} {:<11} {:>10} {:>8}",
            row.variant.to_string(),
            row.category,
            status,
            duration,
            row.records
        );
    }
}
