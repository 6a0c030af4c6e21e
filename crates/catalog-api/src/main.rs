//! Workflow catalog CLI and REST API entry point.
//!
//! Binary name: `wfcat`
//!
//! Parses CLI arguments, loads configuration, initializes database and
//! services, then dispatches to the command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use catalog_infra::config::{load_config, resolve_data_dir, LoadedConfig};
use catalog_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
use cli::{BucketCommand, Cli, Commands, WorkflowCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "wfcat", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let LoadedConfig { config, fallback } = load_config(&data_dir).await;

    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), &config.logging)
        .map_err(|e| anyhow::anyhow!(e))?;
    if let Some(reason) = fallback {
        tracing::warn!("{reason}");
    }

    let state = AppState::init(data_dir, config).await?;
    let result = run(cli, state).await;

    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    let output = cli.output_mode();
    match cli.command {
        Commands::Bucket { action } => match action {
            BucketCommand::Create { name } => {
                cli::bucket::create_bucket(&state, &name, output).await?;
            }
            BucketCommand::List => {
                cli::bucket::list_buckets(&state, output).await?;
            }
        },

        Commands::Workflow { action } => match action {
            WorkflowCommand::Push {
                bucket,
                file,
                workflow,
            } => {
                cli::workflow::push(&state, &bucket, &file, workflow.as_deref(), output).await?;
            }
            WorkflowCommand::List {
                bucket,
                workflow,
                offset,
                limit,
            } => {
                cli::workflow::list(&state, &bucket, workflow.as_deref(), offset, limit, output)
                    .await?;
            }
            WorkflowCommand::Show {
                bucket,
                workflow,
                revision,
                raw,
            } => {
                cli::workflow::show(&state, &bucket, &workflow, revision, raw, output).await?;
            }
        },

        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(%addr, data_dir = %state.data_dir.display(), "catalog API listening");
            if !cli.quiet {
                println!(
                    "  {} Workflow catalog listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
