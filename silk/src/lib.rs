// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{emit_report, load_urls_from_file, load_urls_from_source, parse_url_line};

// Re-export crawl functionality from silk-core
pub use silk_core::crawl::{
    CrawlOptions, CrawlProgressCallback, CrawlSummary, ImageOptions, execute_crawl,
    execute_image_download, extract_url_path, fetch_links,
};
pub use silk_core::spiders::FollowMode;
