//! Bucket CLI commands: create, list.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use catalog_types::bucket::{Bucket, BucketId};
use catalog_types::error::CatalogError;

use crate::cli::OutputMode;
use crate::state::AppState;

/// Resolve a bucket given either its id or its name.
pub async fn resolve_bucket(state: &AppState, id_or_name: &str) -> Result<BucketId, CatalogError> {
    if let Ok(id) = id_or_name.parse::<BucketId>() {
        return Ok(id);
    }
    state
        .bucket_service
        .list_buckets()
        .await?
        .into_iter()
        .find(|b| b.name == id_or_name)
        .map(|b| b.id)
        .ok_or(CatalogError::BucketNotFound)
}

pub async fn create_bucket(state: &AppState, name: &str, output: OutputMode) -> Result<()> {
    let bucket = state.bucket_service.create_bucket(name).await?;

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&bucket)?);
            return Ok(());
        }
        OutputMode::Quiet => return Ok(()),
        OutputMode::Styled => {}
    }

    println!();
    println!(
        "  {} Created bucket {}",
        style("✓").green().bold(),
        style(&bucket.name).cyan().bold()
    );
    println!("  {}  {}", style("Id:").bold(), bucket.id);
    println!();
    Ok(())
}

pub async fn list_buckets(state: &AppState, output: OutputMode) -> Result<()> {
    let buckets = state.bucket_service.list_buckets().await?;

    if output == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
        return Ok(());
    }

    if buckets.is_empty() {
        if output == OutputMode::Quiet {
            return Ok(());
        }
        println!();
        println!(
            "  {} No buckets found. Create one with: {}",
            style("i").blue().bold(),
            style("wfcat bucket create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    println!("{}", bucket_table(&buckets));
    Ok(())
}

fn bucket_table(buckets: &[Bucket]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Id").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for bucket in buckets {
        table.add_row(vec![
            Cell::new(&bucket.name).fg(Color::Cyan),
            Cell::new(bucket.id.to_string()),
            Cell::new(bucket.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    table
}
