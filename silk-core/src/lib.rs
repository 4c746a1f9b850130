pub mod crawl;
pub mod pipelines;
pub mod report;
pub mod spiders;

pub use pipelines::{Passthrough, SaveToDirectory};
pub use spiders::{FollowMode, ImageSpider, SiteSpider};
