//! API Schema Docs - Command-line tool for documenting endpoints with synthetic examples.
//!
//! The binary collects endpoint definitions from an endpoint registry or a directory of
//! endpoint files, resolves their JSON Schemas, generates example payloads and renders the
//! catalog grouped by tag. Given a single schema file it prints one example instead.
//!
//! # Usage
//!
//! ```bash
//! api-schema-docs [OPTIONS] <SOURCE>
//! ```
//!
//! # Examples
//!
//! Document a running registry as HTML:
//! ```bash
//! api-schema-docs http://localhost:8000 -o api.html
//! ```
//!
//! Document a directory of endpoint files as Markdown:
//! ```bash
//! api-schema-docs ./endpoints -f markdown -o API.md
//! ```
//!
//! Print an example for one schema:
//! ```bash
//! api-schema-docs ./schemas/order.json -f json
//! ```

use anyhow::Result;
use api_schema_docs::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // Parse once to read the verbose flag, validate after the logger is up
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("API Schema Docs starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("Documentation generation completed successfully");

    Ok(())
}
