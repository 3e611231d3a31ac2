//! Centered logo overlay with a rounded white backing plate.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::core::error::{AppError, AppResult};
use crate::core::models::LogoImage;

/// Logo side as a fraction of the canvas.
pub const LOGO_RATIO: f32 = 0.22;
/// Plate padding around the logo as a fraction of the canvas.
pub const PLATE_PADDING_RATIO: f32 = 0.03;
/// Plate corner radius as a fraction of the canvas.
pub const PLATE_RADIUS_RATIO: f32 = 0.06;

const PLATE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Placement of the logo and its plate for a given canvas size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoGeometry {
    pub logo_side: f32,
    pub x: f32,
    pub y: f32,
    pub padding: f32,
    pub radius: f32,
}

impl LogoGeometry {
    pub fn for_canvas(canvas_size: u32) -> Self {
        let size = canvas_size as f32;
        let logo_side = size * LOGO_RATIO;
        let offset = (size - logo_side) / 2.0;
        Self {
            logo_side,
            x: offset,
            y: offset,
            padding: size * PLATE_PADDING_RATIO,
            radius: size * PLATE_RADIUS_RATIO,
        }
    }

    /// Plate bounds as `(left, top, right, bottom)`.
    pub fn plate_bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.x - self.padding,
            self.y - self.padding,
            self.x + self.logo_side + self.padding,
            self.y + self.logo_side + self.padding,
        )
    }

    /// Whether the point lies on the rounded plate.
    pub fn plate_contains(&self, px: f32, py: f32) -> bool {
        let (left, top, right, bottom) = self.plate_bounds();
        if px < left || px > right || py < top || py > bottom {
            return false;
        }
        let radius = self.radius.min((right - left) / 2.0).min((bottom - top) / 2.0);
        let nearest_x = px.clamp(left + radius, right - radius);
        let nearest_y = py.clamp(top + radius, bottom - radius);
        let (dx, dy) = (px - nearest_x, py - nearest_y);
        dx * dx + dy * dy <= radius * radius
    }

    /// Integer pixel square the logo is drawn into: `(x, y, side)`.
    pub fn logo_pixels(&self) -> (u32, u32, u32) {
        (
            self.x.round() as u32,
            self.y.round() as u32,
            self.logo_side.round().max(1.0) as u32,
        )
    }
}

/// Draws `logo` centered on `raster`, on top of a white rounded plate.
///
/// The logo is decoded before anything is drawn, so a [`AppError::LogoLoad`]
/// leaves the raster untouched.
pub fn apply_logo(raster: &mut RgbaImage, logo: &LogoImage, canvas_size: u32) -> AppResult<()> {
    let decoded = image::load_from_memory(&logo.bytes)
        .map_err(|e| AppError::LogoLoad(format!("{}: {}", logo.name, e)))?
        .to_rgba8();

    let geometry = LogoGeometry::for_canvas(canvas_size);
    fill_plate(raster, &geometry);

    let (x, y, side) = geometry.logo_pixels();
    let scaled = imageops::resize(&decoded, side, side, FilterType::Triangle);
    imageops::overlay(raster, &scaled, x as i64, y as i64);

    debug!(
        logo = %logo.name,
        source = ?decoded.dimensions(),
        side,
        "Composited logo"
    );
    Ok(())
}

fn fill_plate(raster: &mut RgbaImage, geometry: &LogoGeometry) {
    let (left, top, right, bottom) = geometry.plate_bounds();
    let x_start = left.floor().max(0.0) as u32;
    let y_start = top.floor().max(0.0) as u32;
    let x_end = (right.ceil() as u32).min(raster.width());
    let y_end = (bottom.ceil() as u32).min(raster.height());

    for py in y_start..y_end {
        for px in x_start..x_end {
            // Sample at the pixel center.
            if geometry.plate_contains(px as f32 + 0.5, py as f32 + 0.5) {
                raster.put_pixel(px, py, PLATE_COLOR);
            }
        }
    }
}
