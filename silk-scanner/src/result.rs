use crate::resource::WebResource;

/// Everything one successful crawl invocation produced.
///
/// A failed invocation yields a single error instead; partial results are
/// never returned.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Resources the pipeline kept, in depth-first pre-order.
    pub resources: Vec<WebResource>,
    pub fetched: usize,
    pub skipped_duplicates: usize,
    pub skipped_depth: usize,
}

impl CrawlOutcome {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn into_resources(self) -> Vec<WebResource> {
        self.resources
    }
}
