use crate::commands::{DEFAULT_DEST, DEFAULT_URL_LIST};
use clap::ArgMatches;
use colored::Colorize;
use imgscout_core::album::{AlbumCrawlOptions, DEFAULT_BASE_URL, DEFAULT_MAX_DEPTH};
use imgscout_core::scrape::{ScrapeOptions, ScrapeProgressCallback};
use imgscout_core::{execute_album_crawl, execute_scrape, generate_album_report, generate_scrape_report};
use imgscout_scanner::ScanError;
use imgscout_scanner::fetcher::DEFAULT_TIMEOUT_SECS;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Flags shared by every subcommand
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub timeout_secs: u64,
}

impl OutputOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            quiet: matches.get_flag("quiet"),
            json: matches.get_flag("json"),
            timeout_secs: matches
                .get_one::<u64>("timeout")
                .copied()
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Load and normalize URLs from a file, one per line.
///
/// Blank lines are dropped. Lines that cannot be made into a URL are kept
/// as-is so that each still gets its own (failing) branch.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, ScanError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ScanError::ConfigError(format!("Failed to read URL list {}: {}", path.display(), e))
    })?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_url_line(line).unwrap_or_else(|| line.to_string()))
        .collect();

    info!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Like [`load_urls_from_file`], but a missing or unreadable list is logged
/// and treated as empty.
pub fn load_seed_urls(path: &Path) -> Vec<String> {
    match load_urls_from_file(path) {
        Ok(urls) => urls,
        Err(e) => {
            error!("Error loading URLs from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    warn!("'{}' is not a valid URL, using the line unchanged", line);
    None
}

/// Expand `~` and environment variables in a user supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

pub async fn handle_scrape(sub_matches: &ArgMatches) {
    let output = OutputOptions::from_matches(sub_matches);
    let url_list = expand_path(
        sub_matches
            .get_one::<String>("URLlist")
            .map(String::as_str)
            .unwrap_or(DEFAULT_URL_LIST),
    );
    let dest_dir = expand_path(
        sub_matches
            .get_one::<String>("dest")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DEST),
    );
    let grayscale = !sub_matches.get_flag("nc");

    let urls = load_seed_urls(&url_list);

    if !output.quiet && !output.json {
        println!("\n🖼️  Scraping {} URL(s)", urls.len());
        println!("Destination: {}", dest_dir.display());
        println!("Grayscale: {}\n", if grayscale { "on" } else { "off" });
    }

    let options = ScrapeOptions {
        urls,
        dest_dir,
        grayscale,
        timeout_secs: output.timeout_secs,
        show_progress_bars: !output.quiet && !output.json,
    };

    let progress_callback: ScrapeProgressCallback = Arc::new(|msg: String| {
        info!("{}", msg);
    });

    let summary = execute_scrape(options, Some(progress_callback)).await;

    if output.json {
        print_json(&summary);
    } else if !output.quiet {
        println!("\n{} Scrape complete!\n", "✓".green().bold());
        print!("{}", generate_scrape_report(&summary));
    }
}

pub async fn handle_albums(sub_matches: &ArgMatches) {
    let output = OutputOptions::from_matches(sub_matches);
    let base_url = match sub_matches.get_one::<Url>("base_url") {
        Some(url) => url.clone(),
        None => match Url::parse(DEFAULT_BASE_URL) {
            Ok(url) => url,
            Err(e) => {
                error!("Invalid default base URL: {}", e);
                return;
            }
        },
    };
    let dest_dir = expand_path(
        sub_matches
            .get_one::<String>("dest")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DEST),
    );
    let max_depth = sub_matches
        .get_one::<usize>("max-depth")
        .copied()
        .unwrap_or(DEFAULT_MAX_DEPTH);

    if !output.quiet && !output.json {
        println!("\n📚 Crawling albums from {}", base_url);
        println!("Destination: {}", dest_dir.display());
        println!("Max depth: {}\n", max_depth);
    }

    let mut options = AlbumCrawlOptions::new(base_url, dest_dir);
    options.max_depth = max_depth;
    options.timeout_secs = output.timeout_secs;
    options.show_progress_bars = !output.quiet && !output.json;

    let summary = execute_album_crawl(options).await;

    if output.json {
        print_json(&summary);
    } else if !output.quiet {
        println!("\n{} Album crawl complete!\n", "✓".green().bold());
        print!("{}", generate_album_report(&summary));
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Could not serialize summary: {}", e),
    }
}
