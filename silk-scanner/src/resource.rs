use crate::canonical::{canonicalize, is_internal};
use crate::error::{Result, ScanError};
use scraper::{Html, Selector};
use std::fmt;
use std::sync::{LazyLock, OnceLock};
use tracing::{debug, warn};
use url::Url;

const MARKUP_CONTENT_TYPE: &str = "text/html";

static STYLESHEET_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[rel~="stylesheet"][href]"#).expect("stylesheet selector is valid")
});
static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("image selector is valid"));
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[src]").expect("script selector is valid"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// A link discovered on a page, already canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
    /// Same host as the page it was found on.
    pub internal: bool,
}

/// One fetched unit: its address, content type and raw bytes.
///
/// For HTML resources a structural view of the markup is built on first use
/// and cached until the content is replaced.
#[derive(Clone)]
pub struct WebResource {
    url: Url,
    content_type: String,
    raw_content: Vec<u8>,
    markup_view: OnceLock<MarkupView>,
}

/// Raw attribute values gathered from a single parse of the markup.
#[derive(Debug, Clone, Default)]
struct MarkupView {
    stylesheets: Vec<String>,
    images: Vec<String>,
    scripts: Vec<String>,
    anchors: Vec<String>,
}

impl MarkupView {
    fn parse(url: &Url, raw_content: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw_content).map_err(|source| {
            ScanError::MalformedMarkup {
                url: url.to_string(),
                source,
            }
        })?;

        debug!("Building markup view for {}", url);
        let document = Html::parse_document(text);
        let collect = |selector: &Selector, attribute: &str| -> Vec<String> {
            document
                .select(selector)
                .filter_map(|element| element.value().attr(attribute))
                .map(str::to_string)
                .collect()
        };

        Ok(Self {
            stylesheets: collect(&*STYLESHEET_SELECTOR, "href"),
            images: collect(&*IMAGE_SELECTOR, "src"),
            scripts: collect(&*SCRIPT_SELECTOR, "src"),
            anchors: collect(&*ANCHOR_SELECTOR, "href"),
        })
    }
}

impl WebResource {
    pub fn new(
        address: &str,
        content_type: impl Into<String>,
        raw_content: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let url = Url::parse(address).map_err(|source| ScanError::malformed_url(address, source))?;
        Ok(Self::from_url(url, content_type, raw_content))
    }

    pub fn from_url(
        url: Url,
        content_type: impl Into<String>,
        raw_content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            url,
            content_type: content_type.into(),
            raw_content: raw_content.into(),
            markup_view: OnceLock::new(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn address(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn raw_content(&self) -> &[u8] {
        &self.raw_content
    }

    pub fn is_markup_page(&self) -> bool {
        self.content_type.contains(MARKUP_CONTENT_TYPE)
    }

    /// Swap in new content. Any cached markup view is dropped with the old bytes.
    pub fn replace_content(&mut self, raw_content: impl Into<Vec<u8>>) {
        self.raw_content = raw_content.into();
        self.markup_view.take();
    }

    pub fn stylesheets(&self) -> Result<Vec<String>> {
        let view = self.markup_view("stylesheets")?;
        Ok(self.canonical_urls(&view.stylesheets))
    }

    pub fn images(&self) -> Result<Vec<String>> {
        let view = self.markup_view("images")?;
        Ok(self.canonical_urls(&view.images))
    }

    pub fn scripts(&self) -> Result<Vec<String>> {
        let view = self.markup_view("scripts")?;
        Ok(self.canonical_urls(&view.scripts))
    }

    pub fn links(&self) -> Result<Vec<String>> {
        let view = self.markup_view("links")?;
        Ok(self.canonical_urls(&view.anchors))
    }

    pub fn internal_links(&self) -> Result<Vec<String>> {
        Ok(self
            .extracted_links()?
            .into_iter()
            .filter(|link| link.internal)
            .map(|link| link.url)
            .collect())
    }

    pub fn extracted_links(&self) -> Result<Vec<ExtractedLink>> {
        let links = self.links()?;
        Ok(links
            .into_iter()
            .filter_map(|url| match is_internal(&url, &self.url) {
                Ok(internal) => Some(ExtractedLink { url, internal }),
                Err(e) => {
                    warn!("Skipping link {} on {}: {}", url, self.url, e);
                    None
                }
            })
            .collect())
    }

    fn markup_view(&self, operation: &'static str) -> Result<&MarkupView> {
        if !self.is_markup_page() {
            return Err(ScanError::InvalidUsage {
                operation,
                url: self.url.to_string(),
                content_type: self.content_type.clone(),
            });
        }

        if let Some(view) = self.markup_view.get() {
            return Ok(view);
        }

        let view = MarkupView::parse(&self.url, &self.raw_content)?;
        Ok(self.markup_view.get_or_init(|| view))
    }

    fn canonical_urls(&self, raw_values: &[String]) -> Vec<String> {
        raw_values
            .iter()
            .filter_map(|raw| match canonicalize(raw, &self.url) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Skipping link '{}' on {}: {}", raw, self.url, e);
                    None
                }
            })
            .collect()
    }
}

impl fmt::Debug for WebResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebResource")
            .field("url", &self.url.as_str())
            .field("content_type", &self.content_type)
            .field("content_length", &self.raw_content.len())
            .field("markup_view_cached", &self.markup_view.get().is_some())
            .finish()
    }
}
