//! Workflow CLI commands: push, list, show.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use catalog_types::page::{Page, PageRequest};
use catalog_types::workflow::{KeyValue, RevisionView, WorkflowId, WorkflowMetadata};

use crate::cli::bucket::resolve_bucket;
use crate::cli::OutputMode;
use crate::state::AppState;

fn parse_workflow_id(raw: &str) -> Result<WorkflowId> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a workflow id"))
}

pub async fn push(
    state: &AppState,
    bucket: &str,
    file: &Path,
    workflow: Option<&str>,
    output: OutputMode,
) -> Result<()> {
    let bucket_id = resolve_bucket(state, bucket).await?;
    let workflow_id = workflow.map(parse_workflow_id).transpose()?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let meta = state
        .revision_service
        .create_revision(&bucket_id, workflow_id.as_ref(), bytes)
        .await?;

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&meta)?);
            return Ok(());
        }
        OutputMode::Quiet => return Ok(()),
        OutputMode::Styled => {}
    }

    println!();
    println!(
        "  {} Stored {} revision {}",
        style("✓").green().bold(),
        style(&meta.name).cyan().bold(),
        style(meta.revision_number).bold()
    );
    println!("  {}  {}", style("Workflow:").bold(), meta.workflow_id);
    println!();
    Ok(())
}

pub async fn list(
    state: &AppState,
    bucket: &str,
    workflow: Option<&str>,
    offset: u64,
    limit: u64,
    output: OutputMode,
) -> Result<()> {
    let bucket_id = resolve_bucket(state, bucket).await?;
    let workflow_id = workflow.map(parse_workflow_id).transpose()?;

    let page = state
        .query_service
        .list_revisions(&bucket_id, workflow_id.as_ref(), PageRequest::new(offset, limit))
        .await?;

    if output == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.items.is_empty() {
        if output == OutputMode::Quiet {
            return Ok(());
        }
        println!();
        println!(
            "  {} No workflows found. Push one with: {}",
            style("i").blue().bold(),
            style("wfcat workflow push <bucket> <file>").yellow()
        );
        println!();
        return Ok(());
    }

    println!("{}", revision_table(&page));
    if output == OutputMode::Quiet {
        return Ok(());
    }
    println!(
        "  {}",
        style(format!(
            "Showing {}-{} of {}",
            page.offset + 1,
            page.offset + page.items.len() as u64,
            page.total
        ))
        .dim()
    );
    Ok(())
}

pub async fn show(
    state: &AppState,
    bucket: &str,
    workflow: &str,
    revision: Option<i64>,
    raw: bool,
    output: OutputMode,
) -> Result<()> {
    let bucket_id = resolve_bucket(state, bucket).await?;
    let workflow_id = parse_workflow_id(workflow)?;

    let view = state
        .query_service
        .get_revision(&bucket_id, &workflow_id, revision, raw)
        .await?;

    match view {
        RevisionView::Raw(doc) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&doc.bytes)?;
            stdout.flush()?;
        }
        RevisionView::Metadata(meta) if output == OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
        RevisionView::Metadata(meta) => print_metadata(&meta),
    }
    Ok(())
}

fn revision_table(page: &Page<WorkflowMetadata>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Project").fg(Color::White),
        Cell::new("Rev").fg(Color::White),
        Cell::new("Workflow").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for meta in &page.items {
        table.add_row(vec![
            Cell::new(&meta.name).fg(Color::Cyan),
            Cell::new(&meta.project_name),
            Cell::new(meta.revision_number),
            Cell::new(meta.workflow_id.to_string()),
            Cell::new(meta.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    table
}

fn print_entries(title: &str, entries: &[KeyValue]) {
    println!("  {}", style(format!("── {title} ──")).dim());
    if entries.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for kv in entries {
        println!("  {} = {}", style(&kv.key).bold(), kv.value);
    }
    println!();
}

fn print_metadata(meta: &WorkflowMetadata) {
    println!();
    println!(
        "  {} {}",
        style(&meta.name).cyan().bold(),
        style(format!("rev {}", meta.revision_number)).dim()
    );
    println!();
    println!("  {}  {}", style("Project:").bold(), meta.project_name);
    println!("  {} {}", style("Workflow:").bold(), meta.workflow_id);
    println!("  {}   {}", style("Bucket:").bold(), meta.bucket_id);
    println!("  {}  {}", style("Created:").bold(), meta.created_at.to_rfc3339());
    println!();
    print_entries("Generic information", &meta.generic_information);
    print_entries("Variables", &meta.variables);
}
