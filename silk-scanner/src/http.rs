use crate::collaborator::Downloader;
use crate::error::{Result, ScanError};
use crate::resource::WebResource;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_user_agent() -> String {
    format!("silk/{} (https://github.com/trapdoorsec/silk)", env!("CARGO_PKG_VERSION"))
}

/// Plain HTTP GET downloader backed by a pooled reqwest client.
///
/// Redirects are followed (up to five hops) and the resulting resource is
/// addressed by the final URL. Any status of 400 or above is a fetch failure.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_TIMEOUT_SECS, &default_user_agent())
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::with_options(timeout_secs, &default_user_agent())
    }

    pub fn with_options(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Reuse an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<WebResource> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScanError::fetch(url, e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| ScanError::fetch(url, e))?;
        debug!(
            "{} -> {} ({} bytes, '{}')",
            url,
            final_url,
            body.len(),
            content_type
        );

        Ok(WebResource::from_url(final_url, content_type, body.to_vec()))
    }
}
