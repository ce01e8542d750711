use crate::fetcher::Fetcher;
use crate::grayscale::grayscale_async;
use crate::result::ImageOutcome;
use crate::store::save_image;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Called once per image after it has been saved or given up on.
pub type ImageCallback = Arc<dyn Fn(&ImageOutcome) + Send + Sync>;

/// Fetch, optionally convert, and store images.
#[derive(Clone)]
pub struct Downloader {
    fetcher: Fetcher,
    grayscale: bool,
    image_callback: Option<ImageCallback>,
}

impl Downloader {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            grayscale: false,
            image_callback: None,
        }
    }

    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    pub fn with_image_callback(mut self, callback: ImageCallback) -> Self {
        self.image_callback = Some(callback);
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Download every image concurrently and wait for all of them.
    ///
    /// Failures are recorded in the returned outcomes, never propagated.
    pub async fn download_all(&self, image_urls: Vec<Url>, dest_dir: &Path) -> Vec<ImageOutcome> {
        let downloads = image_urls
            .into_iter()
            .map(|url| self.download_and_save(url, dest_dir));
        join_all(downloads).await
    }

    pub async fn download_and_save(&self, url: Url, dest_dir: &Path) -> ImageOutcome {
        let outcome = self.download_inner(url, dest_dir).await;
        if let Some(ref callback) = self.image_callback {
            callback(&outcome);
        }
        outcome
    }

    async fn download_inner(&self, url: Url, dest_dir: &Path) -> ImageOutcome {
        info!("Downloading image URL: {}", url);

        let payload = match self.fetcher.fetch_image(&url).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("No image data fetched for URL: {}: {}", url, e);
                return ImageOutcome::with_error(url.to_string(), e.to_string());
            }
        };

        let (bytes, converted) = if self.grayscale {
            match grayscale_async(payload.bytes).await {
                Ok(result) => (result.bytes, result.converted),
                Err(e) => {
                    error!("Grayscale task failed for {}: {}", url, e);
                    return ImageOutcome::with_error(url.to_string(), e.to_string());
                }
            }
        } else {
            (payload.bytes, false)
        };

        match save_image(dest_dir, &payload.file_name, &bytes).await {
            Ok(path) => ImageOutcome::new(url.to_string(), path, bytes.len(), converted),
            Err(e) => {
                error!(
                    "Error saving image to {}: {}",
                    dest_dir.join(&payload.file_name).display(),
                    e
                );
                ImageOutcome::with_error(url.to_string(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_image(server: &MockServer, route: &str, content_type: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", content_type)
                    .set_body_bytes(body.to_vec()),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_download_all_mixed_results() {
        let mock_server = MockServer::start().await;
        mount_image(&mock_server, "/one.bin", "image/png", b"one").await;
        mount_image(&mock_server, "/two", "image/gif", b"two").await;
        mount_image(&mock_server, "/page", "text/html", b"<html></html>").await;

        let tmp = TempDir::new().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let downloader = Downloader::new(Fetcher::new().unwrap()).with_image_callback(Arc::new(
            move |_outcome: &ImageOutcome| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            },
        ));

        let urls = ["/one.bin", "/two", "/page", "/missing"]
            .iter()
            .map(|p| Url::parse(&format!("{}{}", mock_server.uri(), p)).unwrap())
            .collect();

        let outcomes = downloader.download_all(urls, tmp.path()).await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes.iter().filter(|o| o.is_saved()).count(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 4);
        assert_eq!(std::fs::read(tmp.path().join("one.bin")).unwrap(), b"one");
        assert_eq!(std::fs::read(tmp.path().join("two.gif")).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_grayscale_falls_back_on_undecodable_image() {
        let mock_server = MockServer::start().await;
        mount_image(&mock_server, "/broken.png", "image/png", b"not really a png").await;

        let tmp = TempDir::new().unwrap();
        let downloader = Downloader::new(Fetcher::new().unwrap()).with_grayscale(true);
        let url = Url::parse(&format!("{}/broken.png", mock_server.uri())).unwrap();

        let outcome = downloader.download_and_save(url, tmp.path()).await;

        assert!(outcome.is_saved());
        assert!(!outcome.grayscale);
        assert_eq!(
            std::fs::read(tmp.path().join("broken.png")).unwrap(),
            b"not really a png"
        );
    }

    #[tokio::test]
    async fn test_save_failure_is_recorded() {
        let mock_server = MockServer::start().await;
        mount_image(&mock_server, "/a.png", "image/png", b"a").await;

        let tmp = TempDir::new().unwrap();
        let missing_dir = tmp.path().join("does-not-exist");
        let downloader = Downloader::new(Fetcher::new().unwrap());
        let url = Url::parse(&format!("{}/a.png", mock_server.uri())).unwrap();

        let outcome = downloader.download_and_save(url, &missing_dir).await;

        assert!(!outcome.is_saved());
        assert!(outcome.error.is_some());
    }
}
