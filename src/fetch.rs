//! Paginated retrieval of endpoint definitions.
//!
//! A [`PageSource`] answers one page request at a time; [`PaginatedFetch`] is the
//! pull-driven state machine that walks a source page by page until a short page
//! signals the end of the data.

use crate::endpoint::EndpointDefinition;
use crate::error::{Error, Result};
use crate::scanner::EndpointFileScanner;
use log::{debug, warn};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Path of the endpoint listing on the registry server
pub const ENDPOINTS_PATH: &str = "/api/v1/endpoint/get-many";

pub const DEFAULT_PAGE_SIZE: usize = 10;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A remote or local collection of endpoint definitions that can be read in pages
pub trait PageSource {
    /// Fetch at most `limit` endpoints starting at `offset`
    fn fetch_page(&mut self, limit: usize, offset: usize) -> Result<Vec<EndpointDefinition>>;
}

impl<S: PageSource + ?Sized> PageSource for &mut S {
    fn fetch_page(&mut self, limit: usize, offset: usize) -> Result<Vec<EndpointDefinition>> {
        (**self).fetch_page(limit, offset)
    }
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn fetch_page(&mut self, limit: usize, offset: usize) -> Result<Vec<EndpointDefinition>> {
        (**self).fetch_page(limit, offset)
    }
}

/// Endpoint registry reached over HTTP
pub struct HttpPageSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpPageSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn page_url(&self, limit: usize, offset: usize) -> String {
        format!(
            "{}{}?limit={}&offset={}",
            self.base_url, ENDPOINTS_PATH, limit, offset
        )
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&mut self, limit: usize, offset: usize) -> Result<Vec<EndpointDefinition>> {
        let url = self.page_url(limit, offset);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(Error::Transport(status_text));
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| Error::Decode {
            origin: url,
            message: e.to_string(),
        })
    }
}

/// Endpoints held in memory, typically loaded from a directory of JSON files
#[derive(Debug, Clone, Default)]
pub struct LocalPageSource {
    endpoints: Vec<EndpointDefinition>,
    warnings: Vec<String>,
}

impl LocalPageSource {
    pub fn from_endpoints(endpoints: Vec<EndpointDefinition>) -> Self {
        Self {
            endpoints,
            warnings: Vec::new(),
        }
    }

    /// Load every `*.json` file under `dir`. Each file holds one endpoint object or an
    /// array of them. Files that cannot be decoded are skipped with a warning.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let scan = EndpointFileScanner::new(dir.to_path_buf()).scan()?;
        let mut endpoints = Vec::new();
        let mut warnings = scan.warnings;

        for path in &scan.files {
            match read_endpoint_file(path) {
                Ok(found) => {
                    debug!("Loaded {} endpoints from {}", found.len(), path.display());
                    endpoints.extend(found);
                }
                Err(e) => {
                    let warning = format!("Skipping {}: {}", path.display(), e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(Self {
            endpoints,
            warnings,
        })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Problems met while loading: inaccessible paths and undecodable files
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl PageSource for LocalPageSource {
    fn fetch_page(&mut self, limit: usize, offset: usize) -> Result<Vec<EndpointDefinition>> {
        let start = offset.min(self.endpoints.len());
        let end = offset.saturating_add(limit).min(self.endpoints.len());
        Ok(self.endpoints[start..end].to_vec())
    }
}

fn read_endpoint_file(path: &Path) -> Result<Vec<EndpointDefinition>> {
    let content = std::fs::read_to_string(path)?;
    let decode = |e: serde_json::Error| Error::Decode {
        origin: path.display().to_string(),
        message: e.to_string(),
    };
    match serde_json::from_str::<Value>(&content).map_err(decode)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(decode))
            .collect(),
        single => Ok(vec![serde_json::from_value(single).map_err(decode)?]),
    }
}

/// Pull-driven page stream over a [`PageSource`].
///
/// Each call to [`next_page`](PaginatedFetch::next_page) issues exactly one request at
/// the current offset and advances the offset by the number of items received. The
/// stream ends after a page shorter than the page size; a full final page therefore costs
/// one extra (empty) request.
pub struct PaginatedFetch<S> {
    source: S,
    page_size: usize,
    offset: usize,
    done: bool,
}

impl<S: PageSource> PaginatedFetch<S> {
    pub fn new(source: S, page_size: usize) -> Result<Self> {
        Self::starting_at(source, page_size, 0)
    }

    pub fn starting_at(source: S, page_size: usize, offset: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidArgument("page size must be at least 1".to_string()));
        }
        Ok(Self {
            source,
            page_size,
            offset,
            done: false,
        })
    }

    /// Fetch the next page, `Ok(None)` once the stream is exhausted.
    ///
    /// A failed request ends the stream; it is not retried.
    pub fn next_page(&mut self) -> Result<Option<Vec<EndpointDefinition>>> {
        if self.done {
            return Ok(None);
        }

        let page = match self.source.fetch_page(self.page_size, self.offset) {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        debug!(
            "Received {} endpoints at offset {} (page size {})",
            page.len(),
            self.offset,
            self.page_size
        );

        if page.len() < self.page_size {
            self.done = true;
        } else if page.len() > self.page_size {
            // A source that ignores the limit would otherwise be read forever.
            warn!(
                "Source returned {} endpoints for a page of {}, treating it as the last page",
                page.len(),
                self.page_size
            );
            self.done = true;
        }
        self.offset += page.len();
        Ok(Some(page))
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: PageSource> Iterator for PaginatedFetch<S> {
    type Item = Result<Vec<EndpointDefinition>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    /// Serves scripted page sizes and records requested offsets
    struct ScriptedSource {
        pages: VecDeque<usize>,
        offsets: Vec<usize>,
    }

    impl ScriptedSource {
        fn new(pages: &[usize]) -> Self {
            Self {
                pages: pages.iter().copied().collect(),
                offsets: Vec::new(),
            }
        }
    }

    impl PageSource for ScriptedSource {
        fn fetch_page(&mut self, _limit: usize, offset: usize) -> Result<Vec<EndpointDefinition>> {
            self.offsets.push(offset);
            let count = self.pages.pop_front().unwrap_or(0);
            Ok((0..count)
                .map(|i| EndpointDefinition::new("c", format!("topic.{}", offset + i)))
                .collect())
        }
    }

    struct FailingSource;

    impl PageSource for FailingSource {
        fn fetch_page(&mut self, _limit: usize, _offset: usize) -> Result<Vec<EndpointDefinition>> {
            Err(Error::Transport("Service Unavailable".to_string()))
        }
    }

    #[test]
    fn test_short_page_ends_stream() {
        let mut fetch = PaginatedFetch::new(ScriptedSource::new(&[10, 10, 3]), 10).unwrap();

        let sizes: Vec<usize> = fetch.by_ref().map(|page| page.unwrap().len()).collect();

        assert_eq!(sizes, vec![10, 10, 3]);
        assert!(fetch.is_done());
        assert_eq!(fetch.offset(), 23);
        assert_eq!(fetch.into_source().offsets, vec![0, 10, 20]);
    }

    #[test]
    fn test_full_last_page_costs_one_empty_request() {
        let mut fetch = PaginatedFetch::new(ScriptedSource::new(&[10, 10]), 10).unwrap();

        let sizes: Vec<usize> = fetch.by_ref().map(|page| page.unwrap().len()).collect();

        assert_eq!(sizes, vec![10, 10, 0]);
        assert_eq!(fetch.into_source().offsets, vec![0, 10, 20]);
    }

    #[test]
    fn test_pages_are_pulled_one_at_a_time() {
        let mut fetch = PaginatedFetch::new(ScriptedSource::new(&[2, 2, 1]), 2).unwrap();

        assert_eq!(fetch.next_page().unwrap().unwrap().len(), 2);
        assert_eq!(fetch.offset(), 2);
        assert!(!fetch.is_done());
        // The consumer stops here; no further request is issued.
        assert_eq!(fetch.into_source().offsets, vec![0]);
    }

    #[test]
    fn test_oversized_page_ends_stream() {
        let mut fetch = PaginatedFetch::new(ScriptedSource::new(&[15, 15]), 10).unwrap();
        assert_eq!(fetch.next_page().unwrap().unwrap().len(), 15);
        assert!(fetch.next_page().unwrap().is_none());
    }

    #[test]
    fn test_failure_ends_stream() {
        let mut fetch = PaginatedFetch::new(FailingSource, 10).unwrap();
        assert!(matches!(fetch.next_page(), Err(Error::Transport(_))));
        assert!(fetch.next_page().unwrap().is_none());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        assert!(PaginatedFetch::new(LocalPageSource::default(), 0).is_err());
    }

    #[test]
    fn test_starting_offset() {
        let mut fetch = PaginatedFetch::starting_at(ScriptedSource::new(&[1]), 5, 40).unwrap();
        fetch.next_page().unwrap();
        assert_eq!(fetch.into_source().offsets, vec![40]);
    }

    #[test]
    fn test_local_source_pages() {
        let endpoints: Vec<_> = (0..5)
            .map(|i| EndpointDefinition::new("c", format!("t{}", i)))
            .collect();
        let mut source = LocalPageSource::from_endpoints(endpoints);

        assert_eq!(source.fetch_page(2, 0).unwrap().len(), 2);
        assert_eq!(source.fetch_page(2, 4).unwrap().len(), 1);
        assert!(source.fetch_page(2, 9).unwrap().is_empty());
    }

    #[test]
    fn test_local_source_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("one.json"),
            r#"{"channel": "c", "topic": "a", "tags": ["x"]}"#,
        )
        .unwrap();
        fs::write(
            root.join("many.json"),
            r#"[{"channel": "c", "topic": "b"}, {"channel": "c", "topic": "d"}]"#,
        )
        .unwrap();
        fs::write(root.join("broken.json"), "{not json").unwrap();

        let source = LocalPageSource::from_directory(root).unwrap();

        assert_eq!(source.len(), 3);
        assert_eq!(source.warnings().len(), 1);
        assert!(source.warnings()[0].contains("broken.json"));
    }

    #[test]
    fn test_page_url() {
        let source = HttpPageSource::new("http://localhost:8000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            source.page_url(10, 20),
            "http://localhost:8000/api/v1/endpoint/get-many?limit=10&offset=20"
        );
    }
}
