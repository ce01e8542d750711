use crate::error::{Result, ScanError};
use crate::result::{FetchedPage, ImagePayload};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("imgscout/", env!("CARGO_PKG_VERSION"));
const SNIPPET_CHARS: usize = 100;

/// Build the HTTP client shared by every branch of a run.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(client)
}

/// Page and image retrieval over one shared client.
///
/// Cloning is cheap: the underlying connection pool is reference counted.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Ok(Self::from_client(build_client(timeout_secs)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// GET a page, following redirects, and return its HTML with the final URL.
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        if final_url != *url {
            info!("Redirected URL: {} -> {}", url, final_url);
        }

        let html = response.text().await?;
        info!("Successfully fetched URL: {}", final_url);

        Ok(FetchedPage {
            requested_url: url.clone(),
            final_url,
            html,
        })
    }

    /// GET an image. Anything that is not served as `image/*` is rejected.
    pub async fn fetch_image(&self, url: &Url) -> Result<ImagePayload> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();

        if !content_type.contains("image") {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(SNIPPET_CHARS).collect();
            warn!(
                "Non-image content type at {}: {}, content snippet: {}",
                url, content_type, snippet
            );
            return Err(ScanError::ContentTypeError {
                url: url.to_string(),
                content_type,
            });
        }

        let file_name = file_name_for(url, &content_type);
        let bytes = response.bytes().await?.to_vec();
        info!(
            "Successfully fetched image URL: {} with content type {}",
            url, content_type
        );

        Ok(ImagePayload {
            content_type,
            file_name,
            bytes,
        })
    }
}

/// Map an image content type to the extension used when a URL has none.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("jpeg") || content_type.contains("jpg") {
        Some(".jpg")
    } else if content_type.contains("png") {
        Some(".png")
    } else if content_type.contains("gif") {
        Some(".gif")
    } else if content_type.contains("bmp") {
        Some(".bmp")
    } else if content_type.contains("webp") {
        Some(".webp")
    } else {
        None
    }
}

/// File name for an image: the last path segment, with an extension
/// inferred from the content type when the segment lacks one.
pub fn file_name_for(url: &Url, content_type: &str) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");

    let mut name = segment.to_string();
    if Path::new(segment).extension().is_none()
        && let Some(ext) = extension_for_content_type(content_type)
    {
        name.push_str(ext);
        debug!("Added extension {} for {}", ext, url);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[test]
    fn test_extension_table() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some(".jpg"));
        assert_eq!(extension_for_content_type("image/jpg"), Some(".jpg"));
        assert_eq!(extension_for_content_type("image/png"), Some(".png"));
        assert_eq!(extension_for_content_type("image/gif"), Some(".gif"));
        assert_eq!(extension_for_content_type("image/bmp"), Some(".bmp"));
        assert_eq!(extension_for_content_type("image/webp"), Some(".webp"));
        assert_eq!(extension_for_content_type("image/svg+xml"), None);
    }

    #[test]
    fn test_file_name_appends_extension() {
        let url = Url::parse("http://example.com/media/photo").unwrap();
        assert_eq!(file_name_for(&url, "image/png"), "photo.png");
    }

    #[test]
    fn test_file_name_keeps_existing_extension() {
        let url = Url::parse("http://example.com/media/photo.jpg").unwrap();
        assert_eq!(file_name_for(&url, "image/png"), "photo.jpg");
    }

    #[test]
    fn test_file_name_ignores_query() {
        let url = Url::parse("http://example.com/thumb?id=4&size=2").unwrap();
        assert_eq!(file_name_for(&url, "image/gif"), "thumb.gif");
    }

    #[test]
    fn test_file_name_unknown_type_unchanged() {
        let url = Url::parse("http://example.com/media/vector").unwrap();
        assert_eq!(file_name_for(&url, "image/svg+xml"), "vector");
    }

    #[test]
    fn test_file_name_for_directory_url() {
        let url = Url::parse("http://example.com/").unwrap();
        assert_eq!(file_name_for(&url, "image/jpeg"), "image.jpg");
    }

    #[tokio::test]
    async fn test_fetch_page_follows_redirect() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body>moved</body></html>"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = Url::parse(&format!("{}/old", mock_server.uri())).unwrap();
        let page = fetcher.fetch_page(&url).await.unwrap();

        assert_eq!(page.final_url.path(), "/new");
        assert_eq!(page.requested_url, url);
        assert!(page.html.contains("moved"));
    }

    #[tokio::test]
    async fn test_fetch_page_404_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        let err = fetcher.fetch_page(&url).await.unwrap_err();

        assert!(matches!(err, ScanError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_image_infers_extension() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img/logo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = Url::parse(&format!("{}/img/logo", mock_server.uri())).unwrap();
        let payload = fetcher.fetch_image(&url).await.unwrap();

        assert_eq!(payload.file_name, "logo.png");
        assert_eq!(payload.content_type, "image/png");
        assert_eq!(payload.bytes, vec![1u8, 2, 3]);
    }

    #[tokio::test]
    async fn test_fetch_image_rejects_html() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/not-an-image"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html>nope</html>"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = Url::parse(&format!("{}/not-an-image", mock_server.uri())).unwrap();
        let err = fetcher.fetch_image(&url).await.unwrap_err();

        assert!(matches!(err, ScanError::ContentTypeError { .. }));
    }
}
