use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// What happened to a single image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOutcome {
    pub url: String,
    pub path: Option<PathBuf>,
    pub bytes_written: usize,
    pub grayscale: bool,
    pub error: Option<String>,
}

impl ImageOutcome {
    pub fn new(url: String, path: PathBuf, bytes_written: usize, grayscale: bool) -> Self {
        Self {
            url,
            path: Some(path),
            bytes_written,
            grayscale,
            error: None,
        }
    }

    pub fn with_error(url: String, error: String) -> Self {
        Self {
            url,
            path: None,
            bytes_written: 0,
            grayscale: false,
            error: Some(error),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.error.is_none() && self.path.is_some()
    }
}

/// HTML retrieved for a page, after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested_url: Url,
    pub final_url: Url,
    pub html: String,
}

/// One page of an album: its HTML plus what was found on it.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub url: Url,
    pub html: String,
    pub next_page: Option<Url>,
    pub image_urls: Vec<Url>,
}

/// Image bytes with the file name they will be stored under.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub content_type: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}
