use crate::progress::ProgressTracker;
use imgscout_scanner::extract::{build_page_result, extract_album_links};
use imgscout_scanner::fetcher::DEFAULT_TIMEOUT_SECS;
use imgscout_scanner::store::{album_dir_name, ensure_dir};
use imgscout_scanner::{AlbumLink, AlbumSelectors, Downloader, Fetcher, ImageOutcome, PageResult, ScanError};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://foto.scoutlocarno.ch/";
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// An album waiting in, or taken from, the traversal queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumNode {
    pub url: Url,
    pub title: String,
    /// Directory the album's own folder is created in.
    pub dest_dir: PathBuf,
    pub depth: usize,
}

impl AlbumNode {
    pub fn root(link: AlbumLink, dest_dir: &Path) -> Self {
        Self {
            url: link.url,
            title: link.title,
            dest_dir: dest_dir.to_path_buf(),
            depth: 0,
        }
    }

    fn child(&self, link: AlbumLink, album_dir: &Path) -> Self {
        Self {
            url: link.url,
            title: link.title,
            dest_dir: album_dir.to_path_buf(),
            depth: self.depth + 1,
        }
    }
}

/// An album that was dequeued and processed.
#[derive(Debug, Clone, Serialize)]
pub struct VisitedAlbum {
    pub url: String,
    pub title: String,
    pub depth: usize,
    pub dest_dir: PathBuf,
    pub pages: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AlbumCrawlSummary {
    pub albums: Vec<VisitedAlbum>,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub images: Vec<ImageOutcome>,
}

impl AlbumCrawlSummary {
    pub fn images_saved(&self) -> usize {
        self.images.iter().filter(|i| i.is_saved()).count()
    }

    pub fn images_failed(&self) -> usize {
        self.images.len() - self.images_saved()
    }

    pub fn merge(&mut self, other: AlbumCrawlSummary) {
        self.albums.extend(other.albums);
        self.pages_fetched += other.pages_fetched;
        self.pages_failed += other.pages_failed;
        self.images.extend(other.images);
    }
}

/// Result of the pagination loop for one album.
struct AlbumPages {
    /// Last page fetched successfully; `None` when even the first fetch failed.
    last_page: Option<PageResult>,
    pages_fetched: usize,
    pages_failed: usize,
    images: Vec<ImageOutcome>,
}

pub type AlbumCallback = Arc<dyn Fn(&VisitedAlbum) + Send + Sync>;

/// Album URLs already taken from a queue during one crawl.
pub type VisitedSet = Arc<Mutex<HashSet<String>>>;

/// Breadth-first crawler over a tree of paginated albums.
#[derive(Clone)]
pub struct AlbumCrawler {
    downloader: Downloader,
    selectors: Arc<AlbumSelectors>,
    max_depth: usize,
    album_callback: Option<AlbumCallback>,
}

impl AlbumCrawler {
    /// Album images are always stored as served, never converted.
    pub fn new(downloader: Downloader) -> Self {
        Self {
            downloader: downloader.with_grayscale(false),
            selectors: Arc::new(AlbumSelectors::default()),
            max_depth: DEFAULT_MAX_DEPTH,
            album_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_selectors(mut self, selectors: AlbumSelectors) -> Self {
        self.selectors = Arc::new(selectors);
        self
    }

    pub fn with_album_callback(mut self, callback: AlbumCallback) -> Self {
        self.album_callback = Some(callback);
        self
    }

    /// Root albums listed on the category page.
    pub async fn discover_albums(&self, base_url: &Url, dest_dir: &Path) -> Vec<AlbumNode> {
        let page = match self.downloader.fetcher().fetch_page(base_url).await {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to fetch category page {}: {}", base_url, e);
                return Vec::new();
            }
        };

        let roots: Vec<AlbumNode> =
            extract_album_links(&page.html, &page.final_url, &self.selectors.categories)
                .into_iter()
                .map(|link| AlbumNode::root(link, dest_dir))
                .collect();

        info!("Found {} root albums on {}", roots.len(), page.final_url);
        roots
    }

    /// Walk every root in its own task. All tasks share one visited set, so
    /// an album reachable from several roots is crawled only once.
    pub async fn crawl_roots(&self, roots: Vec<AlbumNode>) -> AlbumCrawlSummary {
        let visited: VisitedSet = Arc::new(Mutex::new(HashSet::new()));
        let handles: Vec<_> = roots
            .into_iter()
            .map(|root| {
                let crawler = self.clone();
                let visited = visited.clone();
                tokio::spawn(async move { crawler.walk_with_visited(vec![root], visited).await })
            })
            .collect();

        let mut summary = AlbumCrawlSummary::default();
        for handle in handles {
            match handle.await {
                Ok(walked) => summary.merge(walked),
                Err(e) => error!("Album task failed: {}", ScanError::from(e)),
            }
        }

        info!(
            "Album crawl complete. Visited {} albums, {} images saved",
            summary.albums.len(),
            summary.images_saved()
        );
        summary
    }

    /// Breadth-first traversal starting from `roots`.
    ///
    /// Duplicates may be queued; they are dropped when dequeued, so no album
    /// URL is fetched twice within one walk.
    pub async fn walk(&self, roots: Vec<AlbumNode>) -> AlbumCrawlSummary {
        self.walk_with_visited(roots, Arc::new(Mutex::new(HashSet::new())))
            .await
    }

    /// Same as [`walk`](Self::walk), checking albums against a visited set
    /// that other walks of the same crawl may also be filling.
    pub async fn walk_with_visited(
        &self,
        roots: Vec<AlbumNode>,
        visited: VisitedSet,
    ) -> AlbumCrawlSummary {
        let mut queue: VecDeque<AlbumNode> = roots.into();
        let mut summary = AlbumCrawlSummary::default();

        while let Some(node) = queue.pop_front() {
            if !visited.lock().await.insert(node.url.as_str().to_string()) {
                debug!("Skipping already visited album {}", node.url);
                continue;
            }

            let album_dir = node.dest_dir.join(album_dir_name(&node.title));
            if let Err(e) = ensure_dir(&album_dir).await {
                error!("Could not create {}: {}", album_dir.display(), e);
            }

            info!("Crawling album [depth {}]: {} ({})", node.depth, node.title, node.url);
            let pages = self.paginate(&node.url, &album_dir).await;

            let album = VisitedAlbum {
                url: node.url.to_string(),
                title: node.title.clone(),
                depth: node.depth,
                dest_dir: album_dir.clone(),
                pages: pages.pages_fetched,
            };
            if let Some(ref callback) = self.album_callback {
                callback(&album);
            }
            summary.albums.push(album);
            summary.pages_fetched += pages.pages_fetched;
            summary.pages_failed += pages.pages_failed;
            summary.images.extend(pages.images);

            if node.depth >= self.max_depth {
                debug!("Max depth {} reached at {}", self.max_depth, node.url);
                continue;
            }

            let Some(last_page) = pages.last_page else {
                warn!("No page fetched for {}, skipping sub-albums", node.url);
                continue;
            };

            let sub_albums =
                extract_album_links(&last_page.html, &last_page.url, &self.selectors.sub_albums);
            debug!("Queuing {} sub-albums of {}", sub_albums.len(), node.url);
            for link in sub_albums {
                queue.push_back(node.child(link, &album_dir));
            }
        }

        summary
    }

    /// Follow "next" links from `start`, downloading every page's images
    /// before moving on.
    async fn paginate(&self, start: &Url, album_dir: &Path) -> AlbumPages {
        let mut pages = AlbumPages {
            last_page: None,
            pages_fetched: 0,
            pages_failed: 0,
            images: Vec::new(),
        };
        let mut seen: HashSet<Url> = HashSet::new();
        let mut current = Some(start.clone());

        while let Some(page_url) = current.take() {
            if !seen.insert(page_url.clone()) {
                warn!("Pagination of {} loops back to {}, stopping", start, page_url);
                break;
            }

            let fetched = match self.downloader.fetcher().fetch_page(&page_url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Failed to fetch HTML from {}: {}", page_url, e);
                    pages.pages_failed += 1;
                    break;
                }
            };
            pages.pages_fetched += 1;

            let page = build_page_result(fetched, &self.selectors.next_page);
            let images = self
                .downloader
                .download_all(page.image_urls.clone(), album_dir)
                .await;
            pages.images.extend(images);

            current = page.next_page.clone();
            pages.last_page = Some(page);
        }

        pages
    }
}

/// Options for an album crawl run
pub struct AlbumCrawlOptions {
    pub base_url: Url,
    pub dest_dir: PathBuf,
    pub max_depth: usize,
    pub selectors: AlbumSelectors,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl AlbumCrawlOptions {
    pub fn new(base_url: Url, dest_dir: PathBuf) -> Self {
        Self {
            base_url,
            dest_dir,
            max_depth: DEFAULT_MAX_DEPTH,
            selectors: AlbumSelectors::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_progress_bars: false,
        }
    }
}

/// Discover the root albums on the category page and crawl them all.
pub async fn execute_album_crawl(options: AlbumCrawlOptions) -> AlbumCrawlSummary {
    let AlbumCrawlOptions {
        base_url,
        dest_dir,
        max_depth,
        selectors,
        timeout_secs,
        show_progress_bars,
    } = options;

    let fetcher = match Fetcher::with_timeout(timeout_secs) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Could not build HTTP client: {}", e);
            return AlbumCrawlSummary::default();
        }
    };

    let tracker = ProgressTracker::new(show_progress_bars);
    let album_tracker = tracker.clone();
    let downloader = Downloader::new(fetcher).with_image_callback(tracker.image_callback());

    let crawler = AlbumCrawler::new(downloader)
        .with_max_depth(max_depth)
        .with_selectors(selectors)
        .with_album_callback(Arc::new(move |album: &VisitedAlbum| {
            album_tracker.set_message(format!("Album done: {}", album.title));
        }));

    let roots = crawler.discover_albums(&base_url, &dest_dir).await;
    let summary = crawler.crawl_roots(roots).await;
    tracker.finish();
    summary
}
