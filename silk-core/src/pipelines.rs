use async_trait::async_trait;
use silk_scanner::error::Result;
use silk_scanner::{Pipeline, WebResource};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const FALLBACK_FILE_NAME: &str = "index";
const MAX_FILE_NAME_LEN: usize = 100;

/// Reports every kept resource as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl Pipeline for Passthrough {
    async fn manage(&self, resource: WebResource) -> Result<Option<WebResource>> {
        Ok(Some(resource))
    }
}

/// Writes each kept resource's raw content into a directory, named after the
/// last segment of its path. A later resource with the same name overwrites
/// the earlier file.
#[derive(Debug, Clone)]
pub struct SaveToDirectory {
    dir: PathBuf,
    keep: bool,
}

impl SaveToDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            keep: false,
        }
    }

    /// Also report saved resources as crawl output.
    pub fn keep_resources(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `resource` will be written.
    pub fn target_path(&self, resource: &WebResource) -> PathBuf {
        self.dir.join(file_name_for(resource))
    }
}

#[async_trait]
impl Pipeline for SaveToDirectory {
    async fn manage(&self, resource: WebResource) -> Result<Option<WebResource>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.target_path(&resource);
        debug!("Saving {} to {}", resource.address(), target.display());
        tokio::fs::write(&target, resource.raw_content()).await?;
        info!(
            "Saved {} ({} bytes)",
            target.display(),
            resource.raw_content().len()
        );

        Ok(self.keep.then_some(resource))
    }
}

fn file_name_for(resource: &WebResource) -> String {
    let last_segment = resource
        .url()
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    sanitize_file_name(last_segment)
}

/// Make a path segment safe to use as a file name.
pub fn sanitize_file_name(segment: &str) -> String {
    let mut name = segment.replace(
        ['/', '\\', ':', '?', '&', '=', '#', '%', '*', '"', '<', '>', '|'],
        "_",
    );

    if name.chars().all(|c| c == '.') {
        return FALLBACK_FILE_NAME.to_string();
    }

    if name.len() > MAX_FILE_NAME_LEN {
        let mut end = MAX_FILE_NAME_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}
