pub mod canonical;
pub mod collaborator;
pub mod crawler;
pub mod error;
pub mod http;
pub mod resource;
pub mod result;

pub use canonical::{canonicalize, is_internal};
pub use collaborator::{Classification, Downloader, Pipeline, Spider};
pub use crawler::{Crawler, ProgressCallback};
pub use error::{ErrorKind, ScanError};
pub use http::HttpDownloader;
pub use resource::{ExtractedLink, WebResource};
pub use result::CrawlOutcome;
