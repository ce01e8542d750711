use crate::error::{Result, ScanError};
use crate::result::{FetchedPage, PageResult};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_CATEGORY_SELECTOR: &str = "dl#mbCategories ul li a";
pub const DEFAULT_NEXT_PAGE_SELECTOR: &str = r#"span.navPrevNext a[rel="next"]"#;
pub const DEFAULT_SUB_ALBUM_SELECTOR: &str = "ul ul li a";

/// A navigation link to an album: absolute URL plus its visible title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumLink {
    pub url: Url,
    pub title: String,
}

/// CSS selectors describing the structure of an album site.
#[derive(Debug, Clone)]
pub struct AlbumSelectors {
    pub categories: Selector,
    pub next_page: Selector,
    pub sub_albums: Selector,
}

impl AlbumSelectors {
    pub fn new(categories: &str, next_page: &str, sub_albums: &str) -> Result<Self> {
        Ok(Self {
            categories: parse_selector(categories)?,
            next_page: parse_selector(next_page)?,
            sub_albums: parse_selector(sub_albums)?,
        })
    }
}

impl Default for AlbumSelectors {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORY_SELECTOR,
            DEFAULT_NEXT_PAGE_SELECTOR,
            DEFAULT_SUB_ALBUM_SELECTOR,
        )
        .expect("built-in selectors are valid")
    }
}

pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::ParseError(format!("selector '{}': {}", css, e)))
}

/// Every `<img src>` on the page, resolved against `base`.
pub fn extract_image_urls(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let img_selector = Selector::parse("img[src]").expect("static selector");

    let image_urls: Vec<Url> = document
        .select(&img_selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .filter_map(|src| base.join(src).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .collect();

    info!("Found {} image URLs on {}", image_urls.len(), base);
    image_urls
}

/// The first link matched by the pagination selector, if any.
pub fn find_next_page(html: &str, base: &Url, selector: &Selector) -> Option<Url> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| resolve_link(base, href))
}

/// Links matched by `selector`, with their trimmed text as title.
pub fn extract_album_links(html: &str, base: &Url, selector: &Selector) -> Vec<AlbumLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(url) = resolve_link(base, href)
        {
            let title = link_text(&element);
            debug!("Found album link: {} ({})", url, title);
            links.push(AlbumLink { url, title });
        }
    }

    links
}

/// Turn a fetched page into the record the pagination loop works with.
pub fn build_page_result(page: FetchedPage, next_selector: &Selector) -> PageResult {
    let image_urls = extract_image_urls(&page.html, &page.final_url);
    let next_page = find_next_page(&page.html, &page.final_url, next_selector);

    PageResult {
        url: page.final_url,
        html: page.html,
        next_page,
        image_urls,
    }
}

fn link_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    base.join(href).ok()
}
