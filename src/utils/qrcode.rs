use qrcode::render::unicode;
use qrcode::QrCode;

use crate::core::error::AppResult;
use crate::core::models::ErrorCorrection;

/// Renders a compact terminal preview of the code for `text`.
pub fn terminal_preview(text: &str, level: ErrorCorrection) -> AppResult<String> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), level.to_ec_level())?;
    let qr = code.render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build();

    let mut output = String::new();
    output.push('\n');
    output.push_str(&qr);
    output.push('\n');
    output.push_str(&format!("Encodes: {}\n", text));

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_contains_blocks_and_text() {
        let preview = terminal_preview("https://example.com", ErrorCorrection::M).unwrap();
        assert!(preview.contains('█') || preview.contains('▀') || preview.contains('▄'));
        assert!(preview.ends_with("Encodes: https://example.com\n"));
    }

    #[test]
    fn test_preview_reports_oversized_payload() {
        assert!(terminal_preview(&"z".repeat(4000), ErrorCorrection::H).is_err());
    }
}
