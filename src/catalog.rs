use crate::endpoint::EndpointDefinition;
use crate::error::Result;
use crate::fetch::{PageSource, PaginatedFetch};
use crate::observable::Observable;
use indexmap::IndexSet;
use log::{debug, info};
use std::rc::Rc;

/// Options for catalog loading
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Republish the endpoint list after every page instead of once at the end
    pub publish_each_page: bool,
}

/// Endpoint catalog - accumulates endpoint definitions and their tags.
///
/// The catalog publishes through two stores: the endpoint list, and the distinct tag
/// labels derived from it. Subscribers receive fresh snapshots and never share mutable
/// state with the catalog.
pub struct EndpointCatalog {
    endpoints: Rc<Observable<Vec<EndpointDefinition>>>,
    tags: Rc<Observable<Vec<String>>>,
    options: CatalogOptions,
}

impl Default for EndpointCatalog {
    fn default() -> Self {
        Self::new(CatalogOptions::default())
    }
}

impl EndpointCatalog {
    pub fn new(options: CatalogOptions) -> Self {
        Self {
            endpoints: Rc::new(Observable::new(Vec::new())),
            tags: Rc::new(Observable::new(Vec::new())),
            options,
        }
    }

    /// Handle on the endpoint store, for subscribing
    pub fn endpoints(&self) -> Rc<Observable<Vec<EndpointDefinition>>> {
        Rc::clone(&self.endpoints)
    }

    /// Handle on the tag store, for subscribing
    pub fn tags(&self) -> Rc<Observable<Vec<String>>> {
        Rc::clone(&self.tags)
    }

    /// Drain `source` from offset zero and publish what it holds.
    ///
    /// Received endpoints are appended to the current list in arrival order, without
    /// de-duplication. The endpoint store is published first, then the tag store.
    /// Returns the number of endpoints received by this load.
    ///
    /// # Errors
    ///
    /// A failed page request aborts the load. Unless per-page publishing is enabled,
    /// nothing from the aborted load is published.
    pub fn load<S: PageSource>(&self, source: S, page_size: usize) -> Result<usize> {
        let mut fetch = PaginatedFetch::new(source, page_size)?;
        let mut accumulated = self.endpoints.get();
        let mut received = 0;

        while let Some(page) = fetch.next_page()? {
            received += page.len();
            accumulated.extend(page);
            if self.options.publish_each_page {
                self.endpoints.set(accumulated.clone());
            }
        }
        info!(
            "Loaded {} endpoints ({} in catalog)",
            received,
            accumulated.len()
        );

        let tags = distinct_tags(&accumulated);
        debug!("Publishing {} endpoints and {} tags", accumulated.len(), tags.len());
        self.endpoints.set(accumulated);
        self.tags.set(tags);
        Ok(received)
    }

    /// Endpoints of the current snapshot carrying `tag`
    pub fn endpoints_with_tag(&self, tag: &str) -> Vec<EndpointDefinition> {
        self.endpoints.with(|endpoints| {
            endpoints
                .iter()
                .filter(|endpoint| endpoint.tags.iter().any(|t| t == tag))
                .cloned()
                .collect()
        })
    }

    /// Complete both stores; subscribers are notified and dropped
    pub fn close(&self) {
        self.endpoints.complete();
        self.tags.complete();
    }
}

/// Distinct tag labels across `endpoints`, in first-seen order
pub fn distinct_tags(endpoints: &[EndpointDefinition]) -> Vec<String> {
    endpoints
        .iter()
        .flat_map(|endpoint| endpoint.tags.iter().cloned())
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}
