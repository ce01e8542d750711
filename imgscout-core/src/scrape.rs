use crate::progress::ProgressTracker;
use imgscout_scanner::extract::extract_image_urls;
use imgscout_scanner::fetcher::DEFAULT_TIMEOUT_SECS;
use imgscout_scanner::store::ensure_dir;
use imgscout_scanner::{Downloader, Fetcher, ImageOutcome, ScanError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Options for a flat scrape run
pub struct ScrapeOptions {
    pub urls: Vec<String>,
    pub dest_dir: PathBuf,
    pub grayscale: bool,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl ScrapeOptions {
    pub fn new(urls: Vec<String>, dest_dir: PathBuf) -> Self {
        Self {
            urls,
            dest_dir,
            grayscale: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting scrape progress
pub type ScrapeProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeSummary {
    /// One per seed URL, whether or not it succeeded.
    pub branches: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub images: Vec<ImageOutcome>,
}

impl ScrapeSummary {
    pub fn images_saved(&self) -> usize {
        self.images.iter().filter(|i| i.is_saved()).count()
    }

    pub fn images_failed(&self) -> usize {
        self.images.len() - self.images_saved()
    }
}

#[derive(Debug)]
struct BranchOutcome {
    page_fetched: bool,
    images: Vec<ImageOutcome>,
}

impl BranchOutcome {
    fn failed() -> Self {
        Self {
            page_fetched: false,
            images: Vec::new(),
        }
    }
}

/// Execute a flat scrape with the given options.
///
/// Never fails: every problem is logged and reflected in the summary.
pub async fn execute_scrape(
    options: ScrapeOptions,
    progress_callback: Option<ScrapeProgressCallback>,
) -> ScrapeSummary {
    let ScrapeOptions {
        urls,
        dest_dir,
        grayscale,
        timeout_secs,
        show_progress_bars,
    } = options;

    let fetcher = match Fetcher::with_timeout(timeout_secs) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Could not build HTTP client: {}", e);
            return ScrapeSummary::default();
        }
    };

    if let Some(ref callback) = progress_callback {
        callback(format!("Scraping {} URL(s) into {}", urls.len(), dest_dir.display()));
    }

    let tracker = ProgressTracker::new(show_progress_bars);
    let downloader = Downloader::new(fetcher)
        .with_grayscale(grayscale)
        .with_image_callback(tracker.image_callback());

    let summary = scrape_urls(&downloader, urls, &dest_dir).await;
    tracker.finish();
    summary
}

/// Run one independent task per seed URL and wait for all of them.
pub async fn scrape_urls(downloader: &Downloader, urls: Vec<String>, dest_dir: &Path) -> ScrapeSummary {
    let handles: Vec<_> = urls
        .into_iter()
        .map(|url| {
            let downloader = downloader.clone();
            let dest_dir = dest_dir.to_path_buf();
            tokio::spawn(async move { process_url(&downloader, &url, &dest_dir).await })
        })
        .collect();

    let mut summary = ScrapeSummary {
        branches: handles.len(),
        ..Default::default()
    };

    for handle in handles {
        match handle.await {
            Ok(branch) => {
                if branch.page_fetched {
                    summary.pages_fetched += 1;
                } else {
                    summary.pages_failed += 1;
                }
                summary.images.extend(branch.images);
            }
            Err(e) => {
                error!("Scrape task failed: {}", ScanError::from(e));
                summary.pages_failed += 1;
            }
        }
    }

    info!(
        "Scrape complete. {} branches, {} images saved",
        summary.branches,
        summary.images_saved()
    );
    summary
}

async fn process_url(downloader: &Downloader, raw_url: &str, dest_dir: &Path) -> BranchOutcome {
    info!("Processing URL: {}", raw_url);

    let url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(e) => {
            warn!("{}", ScanError::InvalidUrl(format!("{}: {}", raw_url, e)));
            return BranchOutcome::failed();
        }
    };

    let page = match downloader.fetcher().fetch_page(&url).await {
        Ok(page) => page,
        Err(e) => {
            warn!("No HTML content fetched for URL: {}: {}", url, e);
            return BranchOutcome::failed();
        }
    };

    if page.html.trim().is_empty() {
        warn!("No HTML content fetched for URL: {}", page.final_url);
        return BranchOutcome::failed();
    }

    let image_urls = extract_image_urls(&page.html, &page.final_url);

    if let Err(e) = ensure_dir(dest_dir).await {
        error!("Could not create {}: {}", dest_dir.display(), e);
        return BranchOutcome {
            page_fetched: true,
            images: Vec::new(),
        };
    }

    let images = downloader.download_all(image_urls, dest_dir).await;
    BranchOutcome {
        page_fetched: true,
        images,
    }
}
