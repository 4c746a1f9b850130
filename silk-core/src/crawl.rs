use crate::pipelines::{Passthrough, SaveToDirectory};
use crate::spiders::{FollowMode, ImageSpider, SiteSpider};
use indicatif::{ProgressBar, ProgressStyle};
use silk_scanner::error::Result;
use silk_scanner::{
    Crawler, CrawlOutcome, Downloader, ExtractedLink, HttpDownloader, Pipeline, Spider,
    WebResource,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Options for configuring a site crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub max_depth: usize,
    pub follow_mode: FollowMode,
    /// Fetch each address once per host crawl
    pub dedup: bool,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            follow_mode: FollowMode::Disabled,
            dedup: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_progress_bars: false,
        }
    }
}

/// Options for harvesting the images of a site
#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub url: String,
    pub output_dir: PathBuf,
    pub max_depth: usize,
    pub accepted_content_types: Option<Vec<String>>,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A start address whose crawl was aborted.
#[derive(Debug, Clone)]
pub struct HostFailure {
    pub url: String,
    pub error: String,
}

/// Combined outcome of crawling one or more start addresses.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    pub resources: Vec<WebResource>,
    pub fetched: usize,
    pub skipped_duplicates: usize,
    pub skipped_depth: usize,
    pub failures: Vec<HostFailure>,
}

impl CrawlSummary {
    fn absorb(&mut self, outcome: CrawlOutcome) {
        self.fetched += outcome.fetched;
        self.skipped_duplicates += outcome.skipped_duplicates;
        self.skipped_depth += outcome.skipped_depth;
        self.resources.extend(outcome.resources);
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

fn spinner(show: bool) -> Option<Arc<ProgressBar>> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Starting crawl...");
    Some(Arc::new(pb))
}

/// Crawler progress hook that ticks the spinner and counts fetches.
fn progress_hook(
    progress_bar: Option<Arc<ProgressBar>>,
    count: Arc<AtomicUsize>,
) -> silk_scanner::ProgressCallback {
    Arc::new(move |depth: usize, url: String| {
        let count = count.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref pb) = progress_bar {
            pb.set_message(format!(
                "Crawling... {} URLs fetched (depth {}: {})",
                count,
                depth,
                extract_url_path(&url)
            ));
            pb.tick();
        }
    })
}

/// Execute a site crawl with the given options.
///
/// Each start address is its own crawl invocation: one that aborts is
/// recorded in [`CrawlSummary::failures`] and the remaining ones still run.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary> {
    let downloader: Arc<dyn Downloader> =
        Arc::new(HttpDownloader::with_timeout(options.timeout_secs)?);
    execute_crawl_with(options, downloader, progress_callback).await
}

/// Like [`execute_crawl`], with a caller-supplied downloader.
pub async fn execute_crawl_with(
    options: CrawlOptions,
    downloader: Arc<dyn Downloader>,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary> {
    let CrawlOptions {
        urls,
        max_depth,
        follow_mode,
        dedup,
        show_progress_bars,
        ..
    } = options;

    let progress_bar = spinner(show_progress_bars);
    let fetched_count = Arc::new(AtomicUsize::new(0));

    let spider: Arc<dyn Spider> = Arc::new(SiteSpider::new(follow_mode));
    let pipeline: Arc<dyn Pipeline> = Arc::new(Passthrough);
    let crawler = Crawler::new(downloader, spider, pipeline)
        .with_max_depth(max_depth)
        .with_dedup(dedup)
        .with_progress_callback(progress_hook(progress_bar.clone(), fetched_count.clone()));

    let mut summary = CrawlSummary::default();
    for (idx, url_str) in urls.iter().enumerate() {
        if let Some(ref callback) = progress_callback
            && urls.len() > 1
        {
            callback(format!(
                "Crawling host {}/{}: {}",
                idx + 1,
                urls.len(),
                url_str
            ));
        }

        match crawler.crawl(url_str).await {
            Ok(outcome) => summary.absorb(outcome),
            Err(e) => {
                warn!("Crawl of {} aborted: {}", url_str, e);
                if let Some(ref callback) = progress_callback {
                    callback(format!("[!]  Failed to crawl {}: {}", url_str, e));
                }
                summary.failures.push(HostFailure {
                    url: url_str.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if let Some(ref pb) = progress_bar {
        let total = fetched_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs fetched", total));
    }

    Ok(summary)
}

/// Download every accepted image reachable from `options.url` into
/// `options.output_dir`. Returns the saved resources.
pub async fn execute_image_download(options: ImageOptions) -> Result<CrawlOutcome> {
    let downloader: Arc<dyn Downloader> =
        Arc::new(HttpDownloader::with_timeout(options.timeout_secs)?);
    execute_image_download_with(options, downloader).await
}

/// Like [`execute_image_download`], with a caller-supplied downloader.
pub async fn execute_image_download_with(
    options: ImageOptions,
    downloader: Arc<dyn Downloader>,
) -> Result<CrawlOutcome> {
    let ImageOptions {
        url,
        output_dir,
        max_depth,
        accepted_content_types,
        show_progress_bars,
        ..
    } = options;

    let spider = match accepted_content_types {
        Some(types) => ImageSpider::new(types),
        None => ImageSpider::default(),
    };
    let pipeline = SaveToDirectory::new(output_dir).keep_resources(true);

    let progress_bar = spinner(show_progress_bars);
    let fetched_count = Arc::new(AtomicUsize::new(0));
    let crawler = Crawler::new(downloader, Arc::new(spider), Arc::new(pipeline))
        .with_max_depth(max_depth)
        .with_dedup(true)
        .with_progress_callback(progress_hook(progress_bar.clone(), fetched_count.clone()));

    let result = crawler.crawl(&url).await;

    if let Some(ref pb) = progress_bar {
        match &result {
            Ok(outcome) => pb.finish_with_message(format!("Saved {} images", outcome.len())),
            Err(_) => pb.abandon_with_message("Image download aborted"),
        }
    }

    result
}

/// Fetch a single page and return the links found on it.
///
/// A resource that is not a markup page has no links.
pub async fn fetch_links(
    url: &str,
    internal_only: bool,
    timeout_secs: u64,
) -> Result<Vec<ExtractedLink>> {
    let downloader = HttpDownloader::with_timeout(timeout_secs)?;
    fetch_links_with(url, internal_only, &downloader).await
}

/// Like [`fetch_links`], with a caller-supplied downloader.
pub async fn fetch_links_with(
    url: &str,
    internal_only: bool,
    downloader: &dyn Downloader,
) -> Result<Vec<ExtractedLink>> {
    let resource = downloader.download(url).await?;
    if !resource.is_markup_page() {
        warn!(
            "{} is not a markup page ({}), no links to extract",
            resource.address(),
            resource.content_type()
        );
        return Ok(Vec::new());
    }

    let links = resource.extracted_links()?;
    Ok(links
        .into_iter()
        .filter(|link| !internal_only || link.internal)
        .collect())
}
