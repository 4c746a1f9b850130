// Report generation from crawl results

use crate::crawl::{CrawlSummary, HostFailure, extract_url_path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    pub url: String,
    pub host: String,
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEntry {
    pub url: String,
    pub error: String,
}

impl From<&HostFailure> for FailureEntry {
    fn from(failure: &HostFailure) -> Self {
        Self {
            url: failure.url.clone(),
            error: failure.error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub targets: Vec<String>,
    pub pages: Vec<PageEntry>,
    pub fetched: usize,
    pub skipped_duplicates: usize,
    pub skipped_depth: usize,
    pub failures: Vec<FailureEntry>,
}

impl ReportData {
    pub fn from_summary(targets: &[String], summary: &CrawlSummary) -> Self {
        let pages = summary
            .resources
            .iter()
            .map(|resource| PageEntry {
                url: resource.address().to_string(),
                host: resource.host().to_string(),
                path: extract_url_path(resource.address()),
                content_type: resource.content_type().to_string(),
                size: resource.raw_content().len(),
            })
            .collect();

        Self {
            targets: targets.to_vec(),
            pages,
            fetched: summary.fetched,
            skipped_duplicates: summary.skipped_duplicates,
            skipped_depth: summary.skipped_depth,
            failures: summary.failures.iter().map(FailureEntry::from).collect(),
        }
    }

    /// Pages grouped by host, hosts in name order, pages in crawl order.
    pub fn pages_by_host(&self) -> BTreeMap<&str, Vec<&PageEntry>> {
        let mut by_host: BTreeMap<&str, Vec<&PageEntry>> = BTreeMap::new();
        for page in &self.pages {
            by_host.entry(page.host.as_str()).or_default().push(page);
        }
        by_host
    }

    fn format_targets(&self) -> String {
        match self.targets.as_slice() {
            [] => "None".to_string(),
            [single] => single.clone(),
            many => format!("{} URLs", many.len()),
        }
    }
}

pub fn generate_report(
    data: &ReportData,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                           SILK CRAWL REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Targets:      {}\n", data.format_targets()));
    report.push_str(&format!("Pages Kept:   {}\n", data.pages.len()));
    report.push_str(&format!("Fetched:      {}\n", data.fetched));
    if data.skipped_duplicates > 0 {
        report.push_str(&format!("Revisits:     {} skipped\n", data.skipped_duplicates));
    }
    if data.skipped_depth > 0 {
        report.push_str(&format!("Too Deep:     {} skipped\n", data.skipped_depth));
    }
    report.push('\n');

    for (host, pages) in data.pages_by_host() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages found\n\n", pages.len()));

        for page in pages {
            let mut line = format!("  {}", page.path);
            // Only show MIME type if it's not plain HTML
            if !page.content_type.is_empty() && !page.content_type.starts_with("text/html") {
                line.push_str(&format!("  [{}]", page.content_type));
            }
            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    if !data.failures.is_empty() {
        report.push_str(RULE);
        report.push_str("\nFAILED TARGETS\n");
        report.push_str(RULE);
        report.push_str("\n\n");
        for failure in &data.failures {
            report.push_str(&format!("  ✗ {}\n    {}\n", failure.url, failure.error));
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push_str("\nGenerated by Silk\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Silk",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "targets": data.targets,
                "pages_kept": data.pages.len(),
                "fetched": data.fetched,
                "skipped_duplicates": data.skipped_duplicates,
                "skipped_depth": data.skipped_depth,
                "failed_targets": data.failures.len()
            },
            "pages": data.pages,
            "failures": data.failures
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("# Silk Crawl Report\n\n");
    report.push_str(&format!(
        "_Generated {}_\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("## Summary\n\n");
    report.push_str(&format!("- **Targets:** {}\n", data.format_targets()));
    report.push_str(&format!("- **Pages kept:** {}\n", data.pages.len()));
    report.push_str(&format!("- **Fetched:** {}\n", data.fetched));
    report.push_str(&format!("- **Skipped revisits:** {}\n", data.skipped_duplicates));
    report.push_str(&format!("- **Skipped (too deep):** {}\n\n", data.skipped_depth));

    for (host, pages) in data.pages_by_host() {
        report.push_str(&format!("## {}\n\n", host));
        report.push_str("| Path | Content Type | Size |\n");
        report.push_str("|------|--------------|------|\n");
        for page in pages {
            report.push_str(&format!(
                "| `{}` | {} | {} |\n",
                escape_markdown_cell(&page.path),
                escape_markdown_cell(&page.content_type),
                page.size
            ));
        }
        report.push('\n');
    }

    if !data.failures.is_empty() {
        report.push_str("## Failed targets\n\n");
        for failure in &data.failures {
            report.push_str(&format!("- `{}`: {}\n", failure.url, failure.error));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn escape_markdown_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
