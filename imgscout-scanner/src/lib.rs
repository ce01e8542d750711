pub mod download;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod grayscale;
pub mod result;
pub mod store;

pub use download::{Downloader, ImageCallback};
pub use error::ScanError;
pub use extract::{AlbumLink, AlbumSelectors};
pub use fetcher::Fetcher;
pub use result::{FetchedPage, ImageOutcome, ImagePayload, PageResult};
