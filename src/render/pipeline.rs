use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use tracing::{debug, warn};

use crate::core::error::{AppError, AppResult};
use crate::core::models::{GenerationRequest, RenderedImage, StyleOptions};
use crate::render::compositor::apply_logo;
use crate::render::encoder::QrEncoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub size: u32,
    pub margin: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { size: 1024, margin: 2 }
    }
}

#[derive(Debug)]
pub struct RenderOutcome {
    pub image: RenderedImage,
    /// Set when the logo could not be decoded and the logo-less fallback was used.
    pub logo_error: Option<AppError>,
}

/// Runs one generation cycle: encode, optionally composite the logo, serialize to PNG.
pub fn render(
    encoder: &dyn QrEncoder,
    request: &GenerationRequest,
    settings: RenderSettings,
) -> AppResult<RenderOutcome> {
    let style = StyleOptions::for_request(request, settings.size, settings.margin);
    let mut raster = encoder.encode(&request.text, &style)?;

    if let Some(logo) = &request.logo {
        match apply_logo(&mut raster, logo, settings.size) {
            Ok(()) => {}
            Err(err @ AppError::LogoLoad(_)) => {
                warn!("Falling back to logo-less render: {}", err);
                let fallback = render(encoder, &request.without_logo(), settings)?;
                return Ok(RenderOutcome {
                    image: fallback.image,
                    logo_error: Some(err),
                });
            }
            Err(err) => return Err(err),
        }
    }

    let png = encode_png(&raster)?;
    debug!(
        text_len = request.text.len(),
        color = %request.color,
        ec = ?style.error_correction,
        bytes = png.len(),
        "Rendered QR image"
    );

    Ok(RenderOutcome {
        image: RenderedImage {
            png,
            dimension: settings.size,
            request: request.clone(),
            error_correction: style.error_correction,
        },
        logo_error: None,
    })
}

pub fn encode_png(raster: &RgbaImage) -> AppResult<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(raster.as_raw(), raster.width(), raster.height(), ColorType::Rgba8)
        .map_err(|e| AppError::Image(e.to_string()))?;
    Ok(png)
}
