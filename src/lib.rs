//! API Schema Docs - Endpoint documentation with synthetic examples from JSON Schemas.
//!
//! This library resolves `$ref` references inside JSON Schema documents (cyclic ones
//! included), generates example values from the resolved schemas, and assembles a catalog
//! of endpoint definitions fetched page by page from an endpoint registry.
//!
//! # Architecture
//!
//! 1. [`schema`] - Parses a raw schema into an arena of nodes addressed by id
//! 2. [`resolver`] - Replaces every `$ref` with a link to its target node
//! 3. [`generator`] - Produces example values with a cycle guard
//! 4. [`observable`] - Single-slot publish/subscribe store
//! 5. [`endpoint`] - The endpoint definition model
//! 6. [`fetch`] - Paginated retrieval from HTTP or local sources
//! 7. [`scanner`] - Finds endpoint files in a directory tree
//! 8. [`catalog`] - Accumulates endpoints and publishes them with their tags
//! 9. [`render`] - Highlighted examples and catalog documents
//!
//! # Example Usage
//!
//! ```no_run
//! use api_schema_docs::{
//!     catalog::EndpointCatalog,
//!     fetch::{HttpPageSource, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT},
//!     generator::ExampleGenerator,
//!     render::{DocumentRenderer, OutputFormat},
//! };
//!
//! let catalog = EndpointCatalog::default();
//! catalog.tags().subscribe(|tags: &Vec<String>| println!("tags: {:?}", tags));
//!
//! let source = HttpPageSource::new("http://localhost:8000", DEFAULT_TIMEOUT).unwrap();
//! catalog.load(source, DEFAULT_PAGE_SIZE).unwrap();
//!
//! let renderer = DocumentRenderer::new(ExampleGenerator::default());
//! let markdown = renderer
//!     .render(&catalog.endpoints().get(), OutputFormat::Markdown)
//!     .unwrap();
//! println!("{}", markdown);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod catalog;
pub mod cli;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod observable;
pub mod render;
pub mod resolver;
pub mod scanner;
pub mod schema;
