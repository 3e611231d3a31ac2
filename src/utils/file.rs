use mime_guess::from_path;
use std::path::Path;

/// File name for an exported code: `qr-code-<epoch-ms>.png`, with a `-<n>`
/// suffix for the n-th retry within the same millisecond.
pub fn export_file_name(epoch_millis: i64, attempt: u32) -> String {
    if attempt == 0 {
        format!("qr-code-{}.png", epoch_millis)
    } else {
        format!("qr-code-{}-{}.png", epoch_millis, attempt)
    }
}

/// Whether the file extension suggests an image. Unknown extensions count as images.
pub fn looks_like_image(path: &Path) -> bool {
    match from_path(path).first() {
        Some(mime) => mime.type_() == mime_guess::mime::IMAGE,
        None => true,
    }
}
