use async_trait::async_trait;
use silk_scanner::error::Result;
use silk_scanner::{Classification, Spider, WebResource};
use tracing::debug;

/// Cross-domain following behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowMode {
    /// Never follow cross-domain links
    #[default]
    Disabled,
    /// Follow every link, whatever host it points at
    Auto,
}

/// Maps a site: keeps every fetched resource and follows links found on
/// markup pages.
#[derive(Debug, Clone, Default)]
pub struct SiteSpider {
    follow_mode: FollowMode,
}

impl SiteSpider {
    pub fn new(follow_mode: FollowMode) -> Self {
        Self { follow_mode }
    }
}

#[async_trait]
impl Spider for SiteSpider {
    async fn on_resource_fetched(&self, resource: WebResource) -> Result<Classification> {
        if !resource.is_markup_page() {
            return Ok(Classification::keep(resource));
        }

        let follow = match self.follow_mode {
            FollowMode::Disabled => resource.internal_links()?,
            FollowMode::Auto => resource.links()?,
        };
        debug!("{} links to follow from {}", follow.len(), resource.address());

        Ok(Classification::new(follow, Some(resource)))
    }
}

pub const DEFAULT_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Harvests images: follows the image sources of markup pages and keeps only
/// resources of an accepted image type.
#[derive(Debug, Clone)]
pub struct ImageSpider {
    accepted_content_types: Vec<String>,
}

impl Default for ImageSpider {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_TYPES.iter().map(|t| t.to_string()).collect())
    }
}

impl ImageSpider {
    pub fn new(accepted_content_types: Vec<String>) -> Self {
        Self {
            accepted_content_types,
        }
    }

    /// Parameters such as `; charset=...` are ignored.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.accepted_content_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}

#[async_trait]
impl Spider for ImageSpider {
    async fn on_resource_fetched(&self, resource: WebResource) -> Result<Classification> {
        if resource.is_markup_page() {
            let images = resource.images()?;
            debug!("{} contains {} images", resource.address(), images.len());
            return Ok(Classification::follow(images));
        }

        if self.accepts(resource.content_type()) {
            Ok(Classification::keep(resource))
        } else {
            debug!(
                "Ignoring {} ({})",
                resource.address(),
                resource.content_type()
            );
            Ok(Classification::ignore())
        }
    }
}
