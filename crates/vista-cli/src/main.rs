//! Vista CLI - exam layout composition and full data aggregation.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Catalog { json } => commands::catalog::run(json, cli.verbose),

        Commands::Mapping {
            source,
            target,
            json,
        } => commands::mapping::run(&source, &target, json, cli.verbose),

        Commands::Status { file, json } => commands::status::run(file, json, cli.verbose),

        Commands::FullData { file, output } => commands::full_data::run(file, output, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked by `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "vista=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
