//! Command-line interface for Javelin.
//!
//! This module handles argument parsing only; scanning and querying are
//! delegated to the library APIs.

use clap::Parser;
use std::path::PathBuf;

/// Javelin: code-graph extractor for Java/Spring source trees.
#[derive(Parser, Debug)]
#[command(name = "javelin")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available Javelin commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Scan a source tree into a graph database.
    Scan {
        /// Root directory of the Java source tree.
        #[arg(short, long)]
        root: PathBuf,

        /// Path of the graph database file.
        #[arg(short, long)]
        db: PathBuf,

        /// Project label stored with every record.
        #[arg(short, long)]
        project: String,

        /// Use bounded-memory streaming mode with parallel parsing.
        #[arg(long)]
        streaming: bool,

        /// Parse worker count for streaming mode (0 = one per CPU).
        #[arg(long, default_value_t = 0)]
        workers: usize,

        /// Files per flush batch in streaming mode.
        #[arg(long, default_value_t = 100)]
        batch_size: usize,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print node and edge counts for an existing graph database.
    Stats {
        /// Path of the graph database file.
        #[arg(short, long)]
        db: PathBuf,

        /// Print the counts as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Parse command-line arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
