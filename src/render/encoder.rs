//! Adapter over the `qrcode` crate.
//!
//! The crate only produces a module matrix; this adapter rasterises it onto a
//! square RGBA surface of exactly `style.width` pixels, quiet zone included.

use image::{Rgba, RgbaImage};
use qrcode::{Color, QrCode};

use crate::core::error::{AppError, AppResult};
use crate::core::models::{parse_hex, StyleOptions};

/// Turns text into a filled raster.
///
/// Implementations must be deterministic and must report an unencodable
/// payload as [`AppError::Encoding`] rather than drawing a partial symbol.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, text: &str, style: &StyleOptions) -> AppResult<RgbaImage>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeEncoder;

impl QrEncoder for QrCodeEncoder {
    fn encode(&self, text: &str, style: &StyleOptions) -> AppResult<RgbaImage> {
        if style.width == 0 {
            return Err(AppError::Encoding("output width must be greater than zero".into()));
        }
        let dark = parse_hex(&style.color_dark)
            .ok_or_else(|| AppError::Encoding(format!("invalid dark color {}", style.color_dark)))?;
        let light = parse_hex(&style.color_light)
            .ok_or_else(|| AppError::Encoding(format!("invalid light color {}", style.color_light)))?;

        let code = QrCode::with_error_correction_level(text.as_bytes(), style.error_correction.to_ec_level())?;
        let modules = code.to_colors();
        let module_count = code.width();

        Ok(rasterize(&modules, module_count, style.width, style.margin, Rgba(dark), Rgba(light)))
    }
}

/// Samples the module grid onto a `width`×`width` surface.
///
/// The symbol plus `margin` quiet modules on each side is stretched across
/// the whole surface with a fractional scale, so the output size never
/// depends on the QR version.
fn rasterize(
    modules: &[Color],
    module_count: usize,
    width: u32,
    margin: u32,
    dark: Rgba<u8>,
    light: Rgba<u8>,
) -> RgbaImage {
    let total = (module_count + 2 * margin as usize) as f64;
    let scale = width as f64 / total;
    let scaled_margin = margin as f64 * scale;
    let limit = width as f64 - scaled_margin;

    // Every row shares the same column mapping.
    let column_of: Vec<Option<usize>> = (0..width)
        .map(|p| module_index(p as f64, scaled_margin, limit, scale, module_count))
        .collect();

    RgbaImage::from_fn(width, width, |x, y| {
        match (column_of[y as usize], column_of[x as usize]) {
            (Some(row), Some(col)) if modules[row * module_count + col] == Color::Dark => dark,
            _ => light,
        }
    })
}

fn module_index(p: f64, scaled_margin: f64, limit: f64, scale: f64, module_count: usize) -> Option<usize> {
    if p < scaled_margin || p >= limit {
        return None;
    }
    let index = ((p - scaled_margin) / scale).floor() as usize;
    Some(index.min(module_count - 1))
}
