pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    expand_path,
    load_seed_urls,
    load_urls_from_file,
    parse_url_line,
};

// Re-export run entry points from imgscout-core
pub use imgscout_core::{
    AlbumCrawlOptions, ScrapeOptions, execute_album_crawl, execute_scrape,
    generate_album_report, generate_scrape_report,
};
