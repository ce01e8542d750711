use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Create `dir` and any missing parents.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    debug!("Ensured directory {}", dir.display());
    Ok(())
}

/// Write image bytes to `dir/file_name`, replacing any existing file.
pub async fn save_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    info!("Successfully saved image to {}", path.display());
    Ok(path)
}

/// Directory name for an album title: every whitespace character and path
/// separator becomes an underscore.
pub fn album_dir_name(title: &str) -> String {
    let name: String = title
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();

    match name.as_str() {
        "" | "." | ".." => "album".to_string(),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_album_dir_name() {
        assert_eq!(album_dir_name("Summer Camp 2023"), "Summer_Camp_2023");
        assert_eq!(album_dir_name("  Lots   of\tspace "), "Lots___of_space");
        assert_eq!(album_dir_name("A  B"), "A__B");
        assert_ne!(album_dir_name("A  B"), album_dir_name("A B"));
        assert_eq!(album_dir_name("a/b\\c"), "a_b_c");
        assert_eq!(album_dir_name("   "), "album");
        assert_eq!(album_dir_name(".."), "album");
    }

    #[tokio::test]
    async fn test_ensure_dir_is_recursive_and_idempotent() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b").join("c");

        ensure_dir(&nested).await.unwrap();
        ensure_dir(&nested).await.unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_save_image() {
        let tmp = TempDir::new().unwrap();
        let path = save_image(tmp.path(), "pic.png", b"bytes").await.unwrap();

        assert_eq!(path, tmp.path().join("pic.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_save_image_missing_dir_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let result = save_image(&missing, "pic.png", b"bytes").await;

        assert!(matches!(result, Err(crate::ScanError::IoError(_))));
    }
}
