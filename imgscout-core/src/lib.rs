pub mod album;
pub mod progress;
pub mod report;
pub mod scrape;

pub use album::{
    AlbumCrawlOptions, AlbumCrawlSummary, AlbumCrawler, AlbumNode, VisitedAlbum,
    execute_album_crawl,
};
pub use report::{generate_album_report, generate_scrape_report};
pub use scrape::{ScrapeOptions, ScrapeProgressCallback, ScrapeSummary, execute_scrape, scrape_urls};
