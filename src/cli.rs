use crate::catalog::{CatalogOptions, EndpointCatalog};
use crate::endpoint::EndpointDefinition;
use crate::fetch::{HttpPageSource, LocalPageSource, DEFAULT_PAGE_SIZE};
use crate::generator::{ExampleGenerator, GeneratorOptions};
use crate::render::{
    render_example, write_to_file, DocumentRenderer, HtmlHighlighter, OutputFormat,
    PlainHighlighter,
};
use crate::resolver::dereference;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API Schema Docs - Generate endpoint documentation with synthetic examples from JSON Schemas
#[derive(Parser, Debug)]
#[command(name = "api-schema-docs")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Endpoint registry URL, directory of endpoint files, or a single schema file
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Kind of SOURCE (if not specified, auto-detect)
    #[arg(long = "source-kind", value_enum)]
    pub source_kind: Option<SourceKind>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "html")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Endpoints requested per page
    #[arg(short = 'l', long = "page-size", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Request timeout in seconds
    #[arg(long = "timeout", value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Upper bound on elements generated per array
    #[arg(long = "max-array-items", default_value_t = 3)]
    pub max_array_items: usize,

    /// Leave optional properties out of examples
    #[arg(long = "required-only")]
    pub required_only: bool,

    /// Republish the catalog after every page
    #[arg(long = "incremental")]
    pub incremental: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Where endpoints (or the schema) come from
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SourceKind {
    /// Endpoint registry reached over HTTP
    Url,
    /// Directory of endpoint definition files
    Directory,
    /// A single JSON or YAML schema file
    Schema,
}

impl SourceKind {
    /// Guess the kind of `source`, `None` when it is neither a URL nor an existing path
    pub fn detect(source: &str) -> Option<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            return Some(SourceKind::Url);
        }
        let path = Path::new(source);
        if path.is_dir() {
            Some(SourceKind::Directory)
        } else if path.is_file() {
            Some(SourceKind::Schema)
        } else {
            None
        }
    }
}

impl CliArgs {
    fn generator_options(&self) -> GeneratorOptions {
        let defaults = GeneratorOptions::default();
        GeneratorOptions {
            min_array_items: defaults.min_array_items.min(self.max_array_items),
            max_array_items: self.max_array_items,
            include_optional: !self.required_only,
            ..defaults
        }
    }
}

/// Validate and log already-parsed arguments; the source kind is resolved on return
pub fn parse_args_from_parsed(mut args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if args.page_size == 0 {
        anyhow::bail!("Page size must be at least 1");
    }
    if args.timeout == 0 {
        anyhow::bail!("Timeout must be at least 1 second");
    }

    let kind = match args.source_kind {
        Some(kind) => kind,
        None => SourceKind::detect(&args.source)
            .ok_or_else(|| anyhow::anyhow!("Source does not exist: {}", args.source))?,
    };
    match kind {
        SourceKind::Directory if !Path::new(&args.source).is_dir() => {
            anyhow::bail!("Source is not a directory: {}", args.source)
        }
        SourceKind::Schema if !Path::new(&args.source).is_file() => {
            anyhow::bail!("Source is not a file: {}", args.source)
        }
        _ => {}
    }
    args.source_kind = Some(kind);

    info!("Source: {} ({:?})", args.source, kind);
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if kind == SourceKind::Url {
        info!("Page size: {}, timeout: {}s", args.page_size, args.timeout);
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let kind = match args.source_kind {
        Some(kind) => kind,
        None => SourceKind::detect(&args.source)
            .ok_or_else(|| anyhow::anyhow!("Source does not exist: {}", args.source))?,
    };
    let generator = ExampleGenerator::new(args.generator_options());

    info!("Starting documentation generation...");
    let content = match kind {
        SourceKind::Schema => render_schema_file(Path::new(&args.source), &generator, args.output_format)?,
        SourceKind::Directory | SourceKind::Url => {
            let endpoints = load_catalog(&args, kind)?;
            if endpoints.is_empty() {
                log::warn!("No endpoints found at {}", args.source);
            }

            info!("Rendering {} endpoints as {:?}...", endpoints.len(), args.output_format);
            let content = DocumentRenderer::new(generator)
                .render(&endpoints, args.output_format)
                .context("Failed to render documentation")?;

            info!("Summary:");
            info!("  - Endpoints: {}", endpoints.len());
            info!(
                "  - Tags: {}",
                crate::catalog::distinct_tags(&endpoints).len()
            );
            content
        }
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote documentation to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    Ok(())
}

fn load_catalog(args: &CliArgs, kind: SourceKind) -> Result<Vec<EndpointDefinition>> {
    let catalog = EndpointCatalog::new(CatalogOptions {
        publish_each_page: args.incremental,
    });
    catalog
        .endpoints()
        .subscribe(|endpoints: &Vec<EndpointDefinition>| {
            debug!("Catalog now holds {} endpoints", endpoints.len())
        });
    catalog
        .tags()
        .subscribe(|tags: &Vec<String>| info!("Tags: {}", tags.join(", ")));

    let received = match kind {
        SourceKind::Url => {
            info!("Fetching endpoints from {}...", args.source);
            let source = HttpPageSource::new(&args.source, Duration::from_secs(args.timeout))?;
            catalog
                .load(source, args.page_size)
                .with_context(|| format!("Failed to fetch endpoints from {}", args.source))?
        }
        _ => {
            info!("Loading endpoint files from {}...", args.source);
            let source = LocalPageSource::from_directory(Path::new(&args.source))
                .with_context(|| format!("Failed to scan directory: {}", args.source))?;
            info!("Found {} endpoint definitions", source.len());
            if !source.warnings().is_empty() {
                log::warn!(
                    "{} problems while reading {}, see warnings above",
                    source.warnings().len(),
                    args.source
                );
            }
            catalog.load(source, args.page_size)?
        }
    };
    debug!("Received {} endpoints", received);

    let endpoints = catalog.endpoints().get();
    catalog.close();
    Ok(endpoints)
}

fn render_schema_file(
    path: &Path,
    generator: &ExampleGenerator,
    format: OutputFormat,
) -> Result<String> {
    info!("Reading schema from {}...", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    let schema: Value = if is_yaml {
        serde_yaml::from_str(&text).context("Failed to parse YAML schema")?
    } else {
        serde_json::from_str(&text).context("Failed to parse JSON schema")?
    };

    let rendered = match format {
        OutputFormat::Html => render_example(&schema, generator, &HtmlHighlighter)?,
        OutputFormat::Json => render_example(&schema, generator, &PlainHighlighter)?,
        OutputFormat::Markdown | OutputFormat::Yaml => {
            let example = generator.generate(&dereference(&schema)?);
            if format == OutputFormat::Yaml {
                serde_yaml::to_string(&example)?
            } else {
                format!("```json\n{}\n```", serde_json::to_string_pretty(&example)?)
            }
        }
    };
    info!("Generated example for {}", path.display());
    Ok(rendered)
}
