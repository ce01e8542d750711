// Plain-text run summaries

use crate::album::AlbumCrawlSummary;
use crate::scrape::ScrapeSummary;
use imgscout_scanner::ImageOutcome;
use std::collections::BTreeMap;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n";

/// Generate a report for a flat scrape
pub fn generate_scrape_report(summary: &ScrapeSummary) -> String {
    let mut report = String::new();
    report.push_str(DIVIDER);
    report.push_str("# Summary:\n");
    report.push_str(&format!("  URLs processed: {}\n", summary.branches));
    report.push_str(&format!("  Pages fetched: {}\n", summary.pages_fetched));
    report.push_str(&format!("  Pages failed: {}\n", summary.pages_failed));
    push_image_counts(&mut report, &summary.images);
    push_failures(&mut report, &summary.images);
    report
}

/// Generate a report for an album crawl
pub fn generate_album_report(summary: &AlbumCrawlSummary) -> String {
    let mut report = String::new();
    report.push_str(DIVIDER);
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Albums visited: {}\n", summary.albums.len()));
    report.push_str(&format!("  Pages fetched: {}\n", summary.pages_fetched));
    report.push_str(&format!("  Pages failed: {}\n", summary.pages_failed));
    push_image_counts(&mut report, &summary.images);

    if !summary.albums.is_empty() {
        let mut by_depth: BTreeMap<usize, Vec<_>> = BTreeMap::new();
        for album in &summary.albums {
            by_depth.entry(album.depth).or_default().push(album);
        }

        report.push('\n');
        report.push_str(DIVIDER);
        for (depth, albums) in by_depth {
            report.push_str(&format!("## Depth {}\n", depth));
            for album in albums {
                report.push_str(&format!(
                    "  {} ({} page{}) -> {}\n",
                    album.title,
                    album.pages,
                    if album.pages == 1 { "" } else { "s" },
                    album.dest_dir.display()
                ));
            }
            report.push('\n');
        }
    }

    push_failures(&mut report, &summary.images);
    report
}

fn push_image_counts(report: &mut String, images: &[ImageOutcome]) {
    let saved = images.iter().filter(|i| i.is_saved()).count();
    let bytes: usize = images.iter().map(|i| i.bytes_written).sum();
    report.push_str(&format!("  Images saved: {}\n", saved));
    report.push_str(&format!("  Images failed: {}\n", images.len() - saved));
    report.push_str(&format!("  Bytes written: {}\n", bytes));
}

fn push_failures(report: &mut String, images: &[ImageOutcome]) {
    let failures: Vec<&ImageOutcome> = images.iter().filter(|i| !i.is_saved()).collect();
    if failures.is_empty() {
        return;
    }

    report.push_str("\n## Failed images\n");
    for failure in failures {
        report.push_str(&format!(
            "  {} \x1b[90m{}\x1b[0m\n",
            failure.url,
            failure.error.as_deref().unwrap_or("unknown error")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::VisitedAlbum;
    use std::path::PathBuf;

    fn saved(url: &str, bytes: usize) -> ImageOutcome {
        ImageOutcome::new(url.to_string(), PathBuf::from("/tmp/x"), bytes, true)
    }

    #[test]
    fn test_scrape_report() {
        let summary = ScrapeSummary {
            branches: 2,
            pages_fetched: 1,
            pages_failed: 1,
            images: vec![
                saved("http://a/1.png", 10),
                saved("http://a/2.png", 5),
                ImageOutcome::with_error("http://a/3.png".to_string(), "HTTP 404".to_string()),
            ],
        };

        let report = generate_scrape_report(&summary);

        assert!(report.contains("URLs processed: 2"));
        assert!(report.contains("Pages failed: 1"));
        assert!(report.contains("Images saved: 2"));
        assert!(report.contains("Images failed: 1"));
        assert!(report.contains("Bytes written: 15"));
        assert!(report.contains("http://a/3.png"));
        assert!(report.contains("HTTP 404"));
    }

    #[test]
    fn test_album_report_groups_by_depth() {
        let album = |title: &str, depth: usize, pages: usize| VisitedAlbum {
            url: format!("http://a/{}", title),
            title: title.to_string(),
            depth,
            dest_dir: PathBuf::from(format!("/out/{}", title)),
            pages,
        };

        let summary = AlbumCrawlSummary {
            albums: vec![album("Root", 0, 3), album("Child", 1, 1)],
            pages_fetched: 4,
            pages_failed: 0,
            images: vec![saved("http://a/1.jpg", 1)],
        };

        let report = generate_album_report(&summary);

        assert!(report.contains("Albums visited: 2"));
        assert!(report.contains("## Depth 0"));
        assert!(report.contains("Root (3 pages)"));
        assert!(report.contains("## Depth 1"));
        assert!(report.contains("Child (1 page)"));
        assert!(!report.contains("Failed images"));
    }
}
