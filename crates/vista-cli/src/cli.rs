//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vista: exam layout composition and full data aggregation
#[derive(Parser)]
#[command(name = "vista")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every component type with its schema
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how fields are copied from one component type to another
    Mapping {
        /// Source component type (e.g., "keratometer")
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Target component type (e.g., "objective")
        #[arg(value_name = "TARGET")]
        target: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize the layout instances and records of an exam snapshot
    Status {
        /// Path to an exam snapshot file
        #[arg(value_name = "SNAPSHOT")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or regenerate the full data layout of an exam snapshot
    FullData {
        /// Path to an exam snapshot file
        #[arg(value_name = "SNAPSHOT")]
        file: PathBuf,

        /// Output path for the updated snapshot (default: overwrite SNAPSHOT)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
