//! Example rendering and documentation output.
//!
//! This module turns endpoint schemas into highlighted example snippets and renders a
//! whole endpoint catalog, grouped by tag, as HTML, Markdown, JSON or YAML.

use crate::endpoint::EndpointDefinition;
use crate::error::Result;
use crate::generator::ExampleGenerator;
use crate::resolver::dereference;
use anyhow::Context;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Turns source text into display markup
pub trait Highlighter {
    fn highlight(&self, code: &str, language: &str) -> String;
}

/// Leaves the text as it is
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> String {
        code.to_string()
    }
}

/// Wraps JSON in an escaped `<pre><code>` block with token spans.
///
/// Keys, strings, numbers and literals get the classes `key`, `string`, `number` and
/// `literal`. Text in any other language is escaped but not tokenised.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlHighlighter;

impl Highlighter for HtmlHighlighter {
    fn highlight(&self, code: &str, language: &str) -> String {
        let body = if language == "json" {
            highlight_json(code)
        } else {
            escape_html(code)
        };
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_html(language),
            body
        )
    }
}

fn highlight_json(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut out = String::with_capacity(code.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
            let token: String = chars[start..i].iter().collect();
            let is_key = chars[i..]
                .iter()
                .find(|c| !c.is_whitespace())
                .is_some_and(|&c| c == ':');
            push_span(&mut out, if is_key { "key" } else { "string" }, &token);
        } else if c == '-' || c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && matches!(chars[i], '0'..='9' | '-' | '+' | '.' | 'e' | 'E') {
                i += 1;
            }
            let token: String = chars[start..i].iter().collect();
            push_span(&mut out, "number", &token);
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let token: String = chars[start..i].iter().collect();
            push_span(&mut out, "literal", &token);
        } else {
            out.push_str(&escape_html(&c.to_string()));
            i += 1;
        }
    }

    out
}

fn push_span(out: &mut String, class: &str, token: &str) {
    let _ = write!(out, "<span class=\"{}\">{}</span>", class, escape_html(token));
}

/// Escape text for use in HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Resolve `schema`, generate an example for it, and highlight the compact JSON.
///
/// # Errors
///
/// Fails when the schema is malformed or holds a dangling reference.
pub fn render_example(
    schema: &Value,
    generator: &ExampleGenerator,
    highlighter: &dyn Highlighter,
) -> Result<String> {
    let document = dereference(schema)?;
    let example = generator.generate(&document);
    let json = serde_json::to_string(&example)?;
    Ok(highlighter.highlight(&json, "json"))
}

/// The example for one schema, or why there is none
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleOutcome {
    Example(Value),
    Unavailable(String),
}

impl ExampleOutcome {
    fn for_schema(
        schema: &Value,
        generator: &ExampleGenerator,
        route: &str,
        which: &str,
    ) -> Self {
        match dereference(schema) {
            Ok(document) => ExampleOutcome::Example(generator.generate(&document)),
            Err(e) => {
                warn!("No {} example for {}: {}", which, route, e);
                ExampleOutcome::Unavailable(e.to_string())
            }
        }
    }

    pub fn example(&self) -> Option<&Value> {
        match self {
            ExampleOutcome::Example(value) => Some(value),
            ExampleOutcome::Unavailable(_) => None,
        }
    }
}

/// Payload and return examples of one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointExamples {
    pub payload: ExampleOutcome,
    /// Absent when the endpoint returns nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<ExampleOutcome>,
}

impl EndpointExamples {
    /// Build both examples. A schema that cannot be resolved only affects its own example.
    pub fn for_endpoint(endpoint: &EndpointDefinition, generator: &ExampleGenerator) -> Self {
        let route = endpoint.route();
        let payload =
            ExampleOutcome::for_schema(&endpoint.payload_json_schema, generator, &route, "payload");
        let returns = endpoint
            .return_json_schema
            .as_ref()
            .map(|schema| ExampleOutcome::for_schema(schema, generator, &route, "return"));
        Self { payload, returns }
    }

    pub fn is_complete(&self) -> bool {
        self.payload.example().is_some()
            && self.returns.as_ref().map_or(true, |r| r.example().is_some())
    }
}

/// Output formats for a rendered catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Standalone HTML page
    Html,
    /// Markdown document
    Markdown,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

#[derive(Debug, Serialize)]
struct CatalogDocument<'a> {
    title: &'a str,
    tags: Vec<TagSection<'a>>,
}

#[derive(Debug, Serialize)]
struct TagSection<'a> {
    tag: &'a str,
    endpoints: Vec<EndpointEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct EndpointEntry<'a> {
    route: String,
    #[serde(flatten)]
    endpoint: &'a EndpointDefinition,
    examples: &'a EndpointExamples,
}

/// Renders a catalog of endpoints grouped by tag
#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    generator: ExampleGenerator,
    title: String,
}

impl DocumentRenderer {
    pub fn new(generator: ExampleGenerator) -> Self {
        Self {
            generator,
            title: "API Reference".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Render `endpoints` in `format`.
    ///
    /// Tags appear in first-seen order; an endpoint is listed under every tag it carries.
    pub fn render(&self, endpoints: &[EndpointDefinition], format: OutputFormat) -> Result<String> {
        debug!("Rendering {} endpoints as {:?}", endpoints.len(), format);
        let examples: Vec<EndpointExamples> = endpoints
            .iter()
            .map(|endpoint| EndpointExamples::for_endpoint(endpoint, &self.generator))
            .collect();
        let groups = group_by_tag(endpoints);

        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&self.document(
                endpoints, &examples, &groups,
            ))?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(&self.document(
                endpoints, &examples, &groups,
            ))?),
            OutputFormat::Markdown => self.markdown(endpoints, &examples, &groups),
            OutputFormat::Html => self.html(endpoints, &examples, &groups),
        }
    }

    fn document<'a>(
        &'a self,
        endpoints: &'a [EndpointDefinition],
        examples: &'a [EndpointExamples],
        groups: &'a IndexMap<&'a str, Vec<usize>>,
    ) -> CatalogDocument<'a> {
        CatalogDocument {
            title: &self.title,
            tags: groups
                .iter()
                .map(|(tag, indices)| TagSection {
                    tag,
                    endpoints: indices
                        .iter()
                        .map(|&i| EndpointEntry {
                            route: endpoints[i].route(),
                            endpoint: &endpoints[i],
                            examples: &examples[i],
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn markdown(
        &self,
        endpoints: &[EndpointDefinition],
        examples: &[EndpointExamples],
        groups: &IndexMap<&str, Vec<usize>>,
    ) -> Result<String> {
        let mut out = format!("# {}\n", self.title);

        for (tag, indices) in groups {
            out.push_str(&format!("\n## {}\n", tag));
            for &i in indices {
                let endpoint = &endpoints[i];
                out.push_str(&format!("\n### {}\n\n`{}`\n", heading(endpoint), endpoint.route()));
                if !endpoint.description.is_empty() {
                    out.push_str(&format!("\n{}\n", endpoint.description));
                }
                out.push_str(&markdown_example("Payload", &examples[i].payload)?);
                if let Some(returns) = &examples[i].returns {
                    out.push_str(&markdown_example("Returns", returns)?);
                }
            }
        }

        Ok(out)
    }

    fn html(
        &self,
        endpoints: &[EndpointDefinition],
        examples: &[EndpointExamples],
        groups: &IndexMap<&str, Vec<usize>>,
    ) -> Result<String> {
        let title = escape_html(&self.title);
        let mut out = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<h1>{}</h1>\n",
            title, title
        );

        for (tag, indices) in groups {
            out.push_str(&format!("<section>\n<h2>{}</h2>\n", escape_html(tag)));
            for &i in indices {
                let endpoint = &endpoints[i];
                out.push_str(&format!(
                    "<article>\n<h3>{}</h3>\n<p><code>{}</code></p>\n",
                    escape_html(heading(endpoint)),
                    escape_html(&endpoint.route())
                ));
                if !endpoint.description.is_empty() {
                    out.push_str(&format!("<p>{}</p>\n", escape_html(&endpoint.description)));
                }
                out.push_str(&html_example("Payload", &examples[i].payload)?);
                if let Some(returns) = &examples[i].returns {
                    out.push_str(&html_example("Returns", returns)?);
                }
                out.push_str("</article>\n");
            }
            out.push_str("</section>\n");
        }

        out.push_str("</body>\n</html>\n");
        Ok(out)
    }
}

/// Endpoint indices per display tag, tags in first-seen order
fn group_by_tag(endpoints: &[EndpointDefinition]) -> IndexMap<&str, Vec<usize>> {
    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (i, endpoint) in endpoints.iter().enumerate() {
        for tag in endpoint.display_tags() {
            groups.entry(tag).or_default().push(i);
        }
    }
    groups
}

fn heading(endpoint: &EndpointDefinition) -> &str {
    if endpoint.title.is_empty() {
        &endpoint.topic
    } else {
        &endpoint.title
    }
}

fn markdown_example(label: &str, outcome: &ExampleOutcome) -> Result<String> {
    Ok(match outcome {
        ExampleOutcome::Example(value) => format!(
            "\n**{}**\n\n```json\n{}\n```\n",
            label,
            serde_json::to_string_pretty(value)?
        ),
        ExampleOutcome::Unavailable(reason) => {
            format!("\n**{}**\n\n_Example unavailable: {}_\n", label, reason)
        }
    })
}

fn html_example(label: &str, outcome: &ExampleOutcome) -> Result<String> {
    Ok(match outcome {
        ExampleOutcome::Example(value) => format!(
            "<h4>{}</h4>\n{}\n",
            label,
            HtmlHighlighter.highlight(&serde_json::to_string(value)?, "json")
        ),
        ExampleOutcome::Unavailable(reason) => format!(
            "<h4>{}</h4>\n<p class=\"unavailable\">Example unavailable: {}</p>\n",
            label,
            escape_html(reason)
        ),
    })
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
/// Parent directories are created as needed.
pub fn write_to_file(content: &str, path: &Path) -> anyhow::Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
