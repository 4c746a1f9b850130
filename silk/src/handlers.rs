use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use silk_core::crawl::{
    CrawlOptions, CrawlSummary, ImageOptions, execute_crawl, execute_image_download,
    extract_url_path, fetch_links,
};
use silk_core::report::{ReportData, ReportFormat, generate_report, save_report};
use silk_core::spiders::FollowMode;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err(anyhow!("Either --url or --hosts-file must be provided"))
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let content = fs::read_to_string(&expanded)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    debug!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Bare hosts such as `localhost:8080` parse with a bogus scheme
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Status output goes to stderr; stdout carries only reports and listings.
pub fn print_banner() {
    eprintln!("{}", "silk".bright_cyan().bold());
    eprintln!(
        "{}",
        format!("a minimal pluggable web crawler, v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    eprintln!();
}

fn print_divider() {
    eprintln!("{}", "═".repeat(60).bright_blue().bold());
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Turn a finished crawl into report text and send it to a file or stdout.
pub fn emit_report(
    targets: &[String],
    summary: &CrawlSummary,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let data = ReportData::from_summary(targets, summary);
    let report = generate_report(&data, format).context("Failed to render report")?;

    match output {
        Some(path) => {
            let path = expand_path(&path.to_string_lossy());
            save_report(&report, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("{} Report saved to {}", "✓".green(), path.display());
        }
        None => print!("{}", report),
    }
    Ok(())
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let max_depth = *sub_matches.get_one::<usize>("max-depth").unwrap_or(&3);
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let revisit = sub_matches.get_flag("revisit");
    let auto_follow = sub_matches.get_flag("auto-follow");
    let output = sub_matches.get_one::<PathBuf>("output");
    let format_name = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let format = ReportFormat::from_str(format_name)
        .ok_or_else(|| anyhow!("Unknown report format '{}'", format_name))?;

    let urls = load_urls_from_source(url, hosts_file)?;

    let follow_mode = if auto_follow {
        FollowMode::Auto
    } else {
        FollowMode::Disabled
    };

    if !quiet {
        eprintln!("🕷️  Crawling {} host(s)", urls.len());
        eprintln!("Max depth: {}", max_depth);
        eprintln!("Revisits: {}", if revisit { "allowed" } else { "skipped" });
        let follow_mode_str = match follow_mode {
            FollowMode::Auto => "auto (follow all)",
            FollowMode::Disabled => "disabled (same domain only)",
        };
        eprintln!("Cross-domain: {}\n", follow_mode_str);
    }

    let options = CrawlOptions {
        urls: urls.clone(),
        max_depth,
        follow_mode,
        dedup: !revisit,
        timeout_secs,
        show_progress_bars: !quiet,
    };

    let progress_callback: Option<silk_core::crawl::CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            eprintln!("{}", msg);
        }))
    };

    let summary = execute_crawl(options, progress_callback)
        .await
        .context("Crawl failed")?;

    if summary.resources.is_empty() && summary.failures.len() == urls.len() {
        let first = summary
            .failures
            .first()
            .map(|f| f.error.clone())
            .unwrap_or_default();
        bail!("Every target failed to crawl: {}", first);
    }

    if !quiet {
        eprintln!("\n{} Crawl complete!\n", "✓".green());
    }

    emit_report(&urls, &summary, format, output.map(PathBuf::as_path))
}

pub async fn handle_images(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let url = sub_matches
        .get_one::<Url>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let dir = sub_matches
        .get_one::<String>("dir")
        .map(String::as_str)
        .unwrap_or("./images");
    let max_depth = *sub_matches.get_one::<usize>("max-depth").unwrap_or(&1);
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let accepted_content_types = sub_matches
        .get_many::<String>("type")
        .map(|types| types.cloned().collect::<Vec<_>>());

    let output_dir = expand_path(dir);
    if !quiet {
        eprintln!("🖼️  Downloading images from {}", url);
        eprintln!("Saving to: {}\n", output_dir.display());
    }

    let options = ImageOptions {
        url: url.as_str().to_string(),
        output_dir: output_dir.clone(),
        max_depth,
        accepted_content_types,
        timeout_secs,
        show_progress_bars: !quiet,
    };

    let outcome = execute_image_download(options)
        .await
        .with_context(|| format!("Image download from {} failed", url))?;

    for resource in &outcome.resources {
        println!("  {} {}", "✓".green(), extract_url_path(resource.address()));
    }
    if !quiet {
        print_divider();
        eprintln!(
            "{} images saved to {} ({} URLs fetched)",
            outcome.len(),
            output_dir.display(),
            outcome.fetched
        );
    }
    Ok(())
}

pub async fn handle_links(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let url = sub_matches
        .get_one::<Url>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let internal_only = sub_matches.get_flag("internal");
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);

    let links = fetch_links(url.as_str(), internal_only, timeout_secs)
        .await
        .with_context(|| format!("Failed to list links of {}", url))?;

    if links.is_empty() {
        if !quiet {
            eprintln!("No links found on {}", url);
        }
        return Ok(());
    }

    for link in &links {
        if quiet {
            println!("{}", link.url);
        } else if link.internal {
            println!("  {} {}", "→".green(), link.url);
        } else {
            println!("  {} {}", "↗".yellow(), link.url.dimmed());
        }
    }
    Ok(())
}
