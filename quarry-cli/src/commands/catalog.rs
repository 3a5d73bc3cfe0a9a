//! Discovery command handlers

use anyhow::{Context, Result};
use colored::*;
use quarry_client::QuarryClient;

pub async fn variants(client: &QuarryClient) -> Result<()> {
    let list = client
        .variants()
        .await
        .context("Failed to fetch variants")?;

    println!("{}", "Variants:".bold());
    for info in &list.variants {
        let marker = if info.name == list.default {
            " (default)".green()
        } else {
            "".normal()
        };
        println!(
            "  {} {:<12}{} {}",
            "▸".cyan(),
            info.name.to_string(),
            marker,
            info.description.dimmed()
        );
    }

    Ok(())
}

pub async fn categories(client: &QuarryClient) -> Result<()> {
    let list = client
        .categories()
        .await
        .context("Failed to fetch categories")?;

    println!("{}", "Categories:".bold());
    for category in &list.categories {
        println!("  {} {}", "▸".cyan(), category);
    }

    Ok(())
}
