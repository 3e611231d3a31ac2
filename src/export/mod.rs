pub mod clipboard;

use std::path::{Path, PathBuf};

use humansize::{format_size, BINARY};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::core::error::AppResult;
use crate::core::models::RenderedImage;
use crate::utils::file::export_file_name;

pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard, PNG_MIME};

/// Attempts made to find a free file name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Writes the image to `directory` as `qr-code-<epoch-ms>.png`.
///
/// Returns `Ok(None)` when there is nothing to export.
pub async fn download(image: Option<&RenderedImage>, directory: &Path) -> AppResult<Option<PathBuf>> {
    let Some(image) = image else {
        return Ok(None);
    };

    tokio::fs::create_dir_all(directory).await?;
    let millis = chrono::Utc::now().timestamp_millis();

    let mut attempt = 0;
    loop {
        let path = directory.join(export_file_name(millis, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(mut file) => {
                file.write_all(&image.png).await?;
                file.flush().await?;
                info!("Saved {} ({})", path.display(), format_size(image.png.len(), BINARY));
                return Ok(Some(path));
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Places the PNG on the clipboard. Returns `Ok(false)` when there is nothing to copy.
pub async fn copy_to_clipboard<C: Clipboard>(image: Option<&RenderedImage>, clipboard: &C) -> AppResult<bool> {
    let Some(image) = image else {
        return Ok(false);
    };
    match clipboard.write_image(PNG_MIME, &image.png).await {
        Ok(()) => {
            info!("Copied QR code to clipboard ({})", format_size(image.png.len(), BINARY));
            Ok(true)
        }
        Err(e) => {
            warn!("Copy failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::core::models::{ErrorCorrection, GenerationRequest, StrokeColor};
    use std::future::Future;
    use tempfile::TempDir;

    fn sample_image() -> RenderedImage {
        RenderedImage {
            png: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
            dimension: 8,
            request: GenerationRequest::new("sample", StrokeColor::Black, None).unwrap(),
            error_correction: ErrorCorrection::M,
        }
    }

    struct DeniedClipboard;

    impl Clipboard for DeniedClipboard {
        fn write_image(&self, _mime: &str, _bytes: &[u8]) -> impl Future<Output = AppResult<()>> + Send {
            std::future::ready(Err(AppError::Clipboard("permission denied".into())))
        }
    }

    #[test]
    fn test_download_without_image_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let saved = tokio_test::block_on(download(None, temp_dir.path())).unwrap();
        assert!(saved.is_none());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_writes_png_with_timestamp_name() {
        let temp_dir = TempDir::new().unwrap();
        let image = sample_image();

        let path = download(Some(&image), temp_dir.path()).await.unwrap().unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("qr-code-"));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), image.png);
    }

    #[tokio::test]
    async fn test_download_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let image = sample_image();

        let first = download(Some(&image), temp_dir.path()).await.unwrap().unwrap();
        let second = download(Some(&image), temp_dir.path()).await.unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_copy_writes_png_mime() {
        let clipboard = MemoryClipboard::new();
        let image = sample_image();

        assert!(!copy_to_clipboard(None, &clipboard).await.unwrap());
        assert!(copy_to_clipboard(Some(&image), &clipboard).await.unwrap());

        let (mime, bytes) = clipboard.contents().unwrap();
        assert_eq!(mime, PNG_MIME);
        assert_eq!(bytes, image.png);
    }

    #[tokio::test]
    async fn test_copy_reports_clipboard_error() {
        let result = copy_to_clipboard(Some(&sample_image()), &DeniedClipboard).await;
        assert!(matches!(result, Err(AppError::Clipboard(_))));
    }
}
