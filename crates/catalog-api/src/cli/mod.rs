//! CLI command definitions for the `wfcat` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a noun-verb
//! pattern (e.g., `wfcat bucket create`, `wfcat workflow push`).

pub mod bucket;
pub mod workflow;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Catalog of versioned workflow definitions.
#[derive(Parser)]
#[command(name = "wfcat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress confirmations and hints. Listings and shown revisions are
    /// still printed.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// How command results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Pretty-printed JSON; wins over `--quiet`.
    Json,
    /// Requested data only, no confirmations or hints.
    Quiet,
    Styled,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Styled
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Host to bind to (defaults to `server.host` from config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to `server.port` from config.toml).
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Manage buckets.
    Bucket {
        #[command(subcommand)]
        action: BucketCommand,
    },

    /// Push, list and show workflow revisions.
    #[command(alias = "wf")]
    Workflow {
        #[command(subcommand)]
        action: WorkflowCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum BucketCommand {
    /// Create a bucket.
    Create {
        /// Unique bucket name.
        name: String,
    },

    /// List buckets.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Store an XML document as a new workflow, or as the next revision of one.
    Push {
        /// Bucket id or name.
        bucket: String,

        /// Path to the XML document.
        file: PathBuf,

        /// Existing workflow to append a revision to.
        #[arg(long, short)]
        workflow: Option<String>,
    },

    /// List the latest revision of every workflow, or one workflow's history.
    #[command(alias = "ls")]
    List {
        /// Bucket id or name.
        bucket: String,

        /// Show this workflow's revision history instead.
        #[arg(long, short)]
        workflow: Option<String>,

        /// Number of entries to skip.
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Maximum entries (0 = configured default).
        #[arg(long, default_value_t = 0)]
        limit: u64,
    },

    /// Show one revision (latest unless `--revision` is given).
    Show {
        /// Bucket id or name.
        bucket: String,

        /// Workflow id.
        workflow: String,

        /// Exact revision number.
        #[arg(long, short)]
        revision: Option<i64>,

        /// Write the stored XML document to stdout.
        #[arg(long)]
        raw: bool,
    },
}
