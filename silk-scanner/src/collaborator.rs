//! The three plug-in points of a crawl.
//!
//! A [`Downloader`] turns an address into a [`WebResource`], a [`Spider`]
//! decides what to follow and what to keep, and a [`Pipeline`] persists or
//! transforms the kept resources. Each is a narrow capability with a single
//! operation, injected into the [`Crawler`](crate::Crawler) at construction.

use crate::error::Result;
use crate::resource::WebResource;
use async_trait::async_trait;

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<WebResource>;
}

/// What a spider decided about a fetched resource.
#[derive(Debug, Default)]
pub struct Classification {
    /// Addresses to crawl next, in order.
    pub follow: Vec<String>,
    /// The resource to hand to the pipeline, if any.
    pub keep: Option<WebResource>,
}

impl Classification {
    pub fn new(follow: Vec<String>, keep: Option<WebResource>) -> Self {
        Self { follow, keep }
    }

    pub fn follow(follow: Vec<String>) -> Self {
        Self { follow, keep: None }
    }

    pub fn keep(resource: WebResource) -> Self {
        Self {
            follow: Vec::new(),
            keep: Some(resource),
        }
    }

    pub fn ignore() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait Spider: Send + Sync {
    async fn on_resource_fetched(&self, resource: WebResource) -> Result<Classification>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Returns the resource to report as crawl output, or `None` to drop it.
    async fn manage(&self, resource: WebResource) -> Result<Option<WebResource>>;
}
