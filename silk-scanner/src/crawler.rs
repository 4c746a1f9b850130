use crate::collaborator::{Classification, Downloader, Pipeline, Spider};
use crate::error::{Result, ScanError};
use crate::result::CrawlOutcome;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Called with `(depth, url)` right before each fetch.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Shallowest depth an address was reached at, and what its spider asked to follow.
struct Visited {
    depth: usize,
    follow: Vec<String>,
}

/// Drives fetch → classify → persist → follow from a start address.
///
/// Pending addresses live on an explicit stack, so crawl depth never grows the
/// call stack. Children are pushed in reverse, which makes the visiting order
/// a depth-first pre-order: a resource is reported before any of its
/// descendants and siblings keep the order the spider gave them.
///
/// Any failure aborts the whole invocation and drops everything gathered so
/// far, completed sibling branches included.
pub struct Crawler {
    downloader: Arc<dyn Downloader>,
    spider: Arc<dyn Spider>,
    pipeline: Arc<dyn Pipeline>,
    max_depth: Option<usize>,
    dedup: bool,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(
        downloader: Arc<dyn Downloader>,
        spider: Arc<dyn Spider>,
        pipeline: Arc<dyn Pipeline>,
    ) -> Self {
        Self {
            downloader,
            spider,
            pipeline,
            max_depth: None,
            dedup: false,
            progress_callback: None,
        }
    }

    /// Do not fetch addresses more than `depth` hops away from the start.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Fetch each address at most once per invocation.
    ///
    /// Off by default: every path to an address fetches it again, and a link
    /// cycle is followed forever unless a max depth is set. With a max depth,
    /// reaching a visited address by a shorter path follows its links again
    /// from the new depth without fetching it a second time.
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub async fn crawl(&self, start_url: &str) -> Result<CrawlOutcome> {
        info!("Starting crawl of {}", start_url);

        Url::parse(start_url).map_err(|source| ScanError::malformed_url(start_url, source))?;

        let mut outcome = CrawlOutcome::default();
        let mut visited: HashMap<String, Visited> = HashMap::new();
        let mut pending: Vec<(String, usize)> = vec![(start_url.to_string(), 0)];

        while let Some((url, depth)) = pending.pop() {
            if let Some(max_depth) = self.max_depth
                && depth > max_depth
            {
                debug!("Skipping {}: depth {} exceeds {}", url, depth, max_depth);
                outcome.skipped_depth += 1;
                continue;
            }

            if self.dedup
                && let Some(seen) = visited.get_mut(&url)
            {
                debug!("Skipping {}: already visited", url);
                outcome.skipped_duplicates += 1;
                if self.max_depth.is_some() && depth < seen.depth {
                    debug!("Following links of {} again from depth {}", url, depth);
                    seen.depth = depth;
                    pending.extend(seen.follow.iter().rev().map(|next| (next.clone(), depth + 1)));
                }
                continue;
            }

            let follow = self.visit(&url, depth, &mut outcome).await?;
            pending.extend(follow.iter().rev().map(|next| (next.clone(), depth + 1)));
            if self.dedup {
                visited.insert(url, Visited { depth, follow });
            }
        }

        info!(
            "Crawl complete. Fetched {} resources, kept {}",
            outcome.fetched,
            outcome.resources.len()
        );
        Ok(outcome)
    }

    async fn visit(
        &self,
        url: &str,
        depth: usize,
        outcome: &mut CrawlOutcome,
    ) -> Result<Vec<String>> {
        if let Some(ref callback) = self.progress_callback {
            callback(depth, url.to_string());
        }

        debug!("Fetching {} (depth {})", url, depth);
        let resource = self
            .downloader
            .download(url)
            .await
            .map_err(|e| abort("fetch", url, e))?;
        outcome.fetched += 1;

        let Classification { follow, keep } = self
            .spider
            .on_resource_fetched(resource)
            .await
            .map_err(|e| abort("classify", url, e))?;
        debug!(
            "Spider on {}: {} to follow, keep = {}",
            url,
            follow.len(),
            keep.is_some()
        );

        if let Some(resource) = keep
            && let Some(resource) = self
                .pipeline
                .manage(resource)
                .await
                .map_err(|e| abort("persist", url, e))?
        {
            outcome.resources.push(resource);
        }

        Ok(follow)
    }
}

/// Logs the failing stage and hands the error back untouched.
fn abort(stage: &str, url: &str, err: ScanError) -> ScanError {
    if err.is_defect() {
        error!("Defect during {} of {}: {}", stage, url, err);
    } else {
        warn!("Crawl aborted during {} of {}: {}", stage, url, err);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resource::WebResource;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FnDownloader<F>(F);

    #[async_trait]
    impl<F> Downloader for FnDownloader<F>
    where
        F: Fn(&str) -> Result<WebResource> + Send + Sync,
    {
        async fn download(&self, url: &str) -> Result<WebResource> {
            (self.0)(url)
        }
    }

    struct FnSpider<F>(F);

    #[async_trait]
    impl<F> Spider for FnSpider<F>
    where
        F: Fn(WebResource) -> Result<Classification> + Send + Sync,
    {
        async fn on_resource_fetched(&self, resource: WebResource) -> Result<Classification> {
            (self.0)(resource)
        }
    }

    struct FnPipeline<F>(F);

    #[async_trait]
    impl<F> Pipeline for FnPipeline<F>
    where
        F: Fn(WebResource) -> Result<Option<WebResource>> + Send + Sync,
    {
        async fn manage(&self, resource: WebResource) -> Result<Option<WebResource>> {
            (self.0)(resource)
        }
    }

    fn working_downloader() -> Arc<dyn Downloader> {
        Arc::new(FnDownloader(|url: &str| {
            WebResource::new(url, "text/html", "Hello, World!")
        }))
    }

    fn failing_downloader() -> Arc<dyn Downloader> {
        Arc::new(FnDownloader(|url: &str| -> Result<WebResource> {
            Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: 500,
            })
        }))
    }

    fn keeping_spider() -> Arc<dyn Spider> {
        Arc::new(FnSpider(|resource: WebResource| -> Result<Classification> {
            Ok(Classification::keep(resource))
        }))
    }

    fn passthrough() -> Arc<dyn Pipeline> {
        Arc::new(FnPipeline(|resource: WebResource| -> Result<Option<WebResource>> {
            Ok(Some(resource))
        }))
    }

    /// Spider over a fixed link graph keyed by path; keeps everything.
    fn graph_spider(graph: &[(&str, &[&str])]) -> Arc<dyn Spider> {
        let graph: Vec<(String, Vec<String>)> = graph
            .iter()
            .map(|(path, children)| {
                (
                    path.to_string(),
                    children
                        .iter()
                        .map(|child| format!("https://example.com{}", child))
                        .collect(),
                )
            })
            .collect();

        Arc::new(FnSpider(move |resource: WebResource| -> Result<Classification> {
            let follow = graph
                .iter()
                .find(|(path, _)| path == resource.path())
                .map(|(_, children)| children.clone())
                .unwrap_or_default();
            Ok(Classification::new(follow, Some(resource)))
        }))
    }

    fn paths(outcome: &CrawlOutcome) -> Vec<&str> {
        outcome.resources.iter().map(|r| r.path()).collect()
    }

    #[tokio::test]
    async fn test_single_level_crawl() {
        let crawler = Crawler::new(working_downloader(), keeping_spider(), passthrough());

        let outcome = crawler.crawl("http://example.com").await.unwrap();

        assert_eq!(outcome.len(), 1);
        let resource = &outcome.resources[0];
        assert_eq!(resource.host(), "example.com");
        assert_eq!(resource.path(), "/");
        assert_eq!(resource.content_type(), "text/html");
        assert_eq!(resource.raw_content(), b"Hello, World!");
        assert_eq!(outcome.fetched, 1);
    }

    #[tokio::test]
    async fn test_follow_up_addresses_are_crawled() {
        let spider: Arc<dyn Spider> =
            Arc::new(FnSpider(|resource: WebResource| -> Result<Classification> {
                let mut follow = Vec::new();
                if resource.path() != "/example.html" {
                    follow.push("https://example.com/example.html".to_string());
                }
                Ok(Classification::new(follow, Some(resource)))
            }));
        let crawler = Crawler::new(working_downloader(), spider, passthrough());

        let outcome = crawler.crawl("http://example.com").await.unwrap();

        assert_eq!(paths(&outcome), vec!["/", "/example.html"]);
        assert_eq!(outcome.resources[1].host(), "example.com");
    }

    #[tokio::test]
    async fn test_pipeline_may_transform_content() {
        let pipeline: Arc<dyn Pipeline> = Arc::new(FnPipeline(
            |mut resource: WebResource| -> Result<Option<WebResource>> {
                resource.replace_content("Hello modified");
                Ok(Some(resource))
            },
        ));
        let crawler = Crawler::new(working_downloader(), keeping_spider(), pipeline);

        let outcome = crawler.crawl("http://example.com").await.unwrap();

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.resources[0].raw_content(), b"Hello modified");
    }

    #[tokio::test]
    async fn test_pipeline_may_drop_resource() {
        let pipeline: Arc<dyn Pipeline> =
            Arc::new(FnPipeline(|_: WebResource| -> Result<Option<WebResource>> {
                Ok(None)
            }));
        let crawler = Crawler::new(working_downloader(), keeping_spider(), pipeline);

        let outcome = crawler.crawl("http://example.com").await.unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.fetched, 1);
    }

    #[tokio::test]
    async fn test_ignoring_spider_skips_pipeline() {
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = calls.clone();
        let pipeline: Arc<dyn Pipeline> = Arc::new(FnPipeline(
            move |resource: WebResource| -> Result<Option<WebResource>> {
                *calls_clone.lock().unwrap() += 1;
                Ok(Some(resource))
            },
        ));
        let spider: Arc<dyn Spider> = Arc::new(FnSpider(|_: WebResource| -> Result<Classification> {
            Ok(Classification::ignore())
        }));
        let crawler = Crawler::new(working_downloader(), spider, pipeline);

        let outcome = crawler.crawl("http://example.com").await.unwrap();

        assert!(outcome.is_empty());
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failing_downloader() {
        let crawler = Crawler::new(failing_downloader(), keeping_spider(), passthrough());
        let err = crawler.crawl("http://example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FetchFailure);
    }

    #[tokio::test]
    async fn test_failing_spider() {
        let spider: Arc<dyn Spider> =
            Arc::new(FnSpider(|_: WebResource| -> Result<Classification> {
                Err(ScanError::collaborator("spider error"))
            }));
        let crawler = Crawler::new(working_downloader(), spider, passthrough());

        let err = crawler.crawl("http://example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CollaboratorFailure);
        assert_eq!(err.to_string(), "spider error");
    }

    #[tokio::test]
    async fn test_failing_pipeline() {
        let pipeline: Arc<dyn Pipeline> =
            Arc::new(FnPipeline(|_: WebResource| -> Result<Option<WebResource>> {
                Err(ScanError::collaborator("disk full"))
            }));
        let crawler = Crawler::new(working_downloader(), keeping_spider(), pipeline);

        let err = crawler.crawl("http://example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_deep_failure_discards_completed_siblings() {
        let spider = graph_spider(&[("/", &["/a", "/b"]), ("/b", &["/b/deep"])]);
        let managed = Arc::new(Mutex::new(Vec::new()));
        let managed_clone = managed.clone();
        let pipeline: Arc<dyn Pipeline> = Arc::new(FnPipeline(
            move |resource: WebResource| -> Result<Option<WebResource>> {
                if resource.path() == "/b/deep" {
                    return Err(ScanError::collaborator("cannot persist"));
                }
                managed_clone.lock().unwrap().push(resource.path().to_string());
                Ok(Some(resource))
            },
        ));
        let crawler = Crawler::new(working_downloader(), spider, pipeline);

        let result = crawler.crawl("https://example.com/").await;

        assert!(result.is_err());
        // Shallower resources were kept before the failing branch ran.
        assert_eq!(*managed.lock().unwrap(), vec!["/", "/a", "/b"]);
    }

    #[tokio::test]
    async fn test_results_are_depth_first_pre_order() {
        let spider = graph_spider(&[
            ("/", &["/a", "/b"]),
            ("/a", &["/a/1", "/a/2"]),
            ("/b", &["/b/1"]),
        ]);
        let crawler = Crawler::new(working_downloader(), spider, passthrough());

        let outcome = crawler.crawl("https://example.com/").await.unwrap();

        assert_eq!(paths(&outcome), vec!["/", "/a", "/a/1", "/a/2", "/b", "/b/1"]);
    }

    #[tokio::test]
    async fn test_without_dedup_every_path_is_fetched() {
        let spider = graph_spider(&[
            ("/", &["/a", "/b"]),
            ("/a", &["/shared"]),
            ("/b", &["/shared"]),
        ]);
        let crawler = Crawler::new(working_downloader(), spider, passthrough());

        let outcome = crawler.crawl("https://example.com/").await.unwrap();

        assert_eq!(paths(&outcome), vec!["/", "/a", "/shared", "/b", "/shared"]);
        assert_eq!(outcome.skipped_duplicates, 0);
    }

    #[tokio::test]
    async fn test_dedup_breaks_cycles() {
        let spider = graph_spider(&[("/", &["/a"]), ("/a", &["/"])]);
        let crawler = Crawler::new(working_downloader(), spider, passthrough()).with_dedup(true);

        let outcome = crawler.crawl("https://example.com/").await.unwrap();

        assert_eq!(paths(&outcome), vec!["/", "/a"]);
        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.skipped_duplicates, 1);
    }

    #[tokio::test]
    async fn test_max_depth_bounds_a_cycle() {
        let spider = graph_spider(&[("/", &["/a"]), ("/a", &["/"])]);
        let crawler = Crawler::new(working_downloader(), spider, passthrough()).with_max_depth(3);

        let outcome = crawler.crawl("https://example.com/").await.unwrap();

        assert_eq!(paths(&outcome), vec!["/", "/a", "/", "/a"]);
        assert_eq!(outcome.skipped_depth, 1);
    }

    #[tokio::test]
    async fn test_dedup_with_max_depth_reaches_page_by_shorter_path() {
        let spider = graph_spider(&[("/", &["/a", "/b"]), ("/a", &["/b"]), ("/b", &["/c"])]);
        let crawler = Crawler::new(working_downloader(), spider, passthrough())
            .with_dedup(true)
            .with_max_depth(2);

        let outcome = crawler.crawl("https://example.com/").await.unwrap();

        assert_eq!(paths(&outcome), vec!["/", "/a", "/b", "/c"]);
        assert_eq!(outcome.fetched, 4);
        assert_eq!(outcome.skipped_depth, 1);
        assert_eq!(outcome.skipped_duplicates, 1);
    }

    #[tokio::test]
    async fn test_dedup_with_max_depth_fetches_once_per_address() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();
        let downloader: Arc<dyn Downloader> = Arc::new(FnDownloader(move |url: &str| {
            calls_clone.lock().unwrap().push(url.to_string());
            WebResource::new(url, "text/html", "")
        }));
        let spider = graph_spider(&[
            ("/", &["/a", "/b"]),
            ("/a", &["/b"]),
            ("/b", &["/c"]),
            ("/c", &["/d"]),
        ]);
        let crawler = Crawler::new(downloader, spider, passthrough())
            .with_dedup(true)
            .with_max_depth(3);

        let outcome = crawler.crawl("https://example.com/").await.unwrap();

        assert_eq!(paths(&outcome), vec!["/", "/a", "/b", "/c", "/d"]);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls.iter().filter(|url| url.ends_with("/c")).count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_start_url() {
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = calls.clone();
        let downloader: Arc<dyn Downloader> = Arc::new(FnDownloader(move |url: &str| {
            *calls_clone.lock().unwrap() += 1;
            WebResource::new(url, "text/html", "")
        }));
        let crawler = Crawler::new(downloader, keeping_spider(), passthrough());

        let err = crawler.crawl("example.com").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedUrl);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_usage_surfaces_as_defect() {
        let downloader: Arc<dyn Downloader> = Arc::new(FnDownloader(|url: &str| {
            WebResource::new(url, "image/png", vec![0u8; 4])
        }));
        let spider: Arc<dyn Spider> =
            Arc::new(FnSpider(|resource: WebResource| -> Result<Classification> {
                let follow = resource.links()?;
                Ok(Classification::follow(follow))
            }));
        let crawler = Crawler::new(downloader, spider, passthrough());

        let err = crawler.crawl("https://example.com/logo.png").await.unwrap_err();

        assert!(err.is_defect());
    }

    #[tokio::test]
    async fn test_progress_callback_reports_depth() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let spider = graph_spider(&[("/", &["/a"]), ("/a", &["/a/b"])]);
        let crawler = Crawler::new(working_downloader(), spider, passthrough())
            .with_progress_callback(Arc::new(move |depth: usize, url: String| {
                seen_clone.lock().unwrap().push((depth, url));
            }));

        crawler.crawl("https://example.com/").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (0, "https://example.com/".to_string()),
                (1, "https://example.com/a".to_string()),
                (2, "https://example.com/a/b".to_string()),
            ]
        );
    }
}
