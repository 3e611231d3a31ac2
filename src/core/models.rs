use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{AppError, AppResult};

/// Light module color. The backing plate behind a logo uses it too.
pub const LIGHT_HEX: &str = "#FFFFFF";

/// Dark-module color the user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrokeColor {
    #[default]
    Black,
    Blue,
    Red,
}

impl StrokeColor {
    pub fn hex(self) -> &'static str {
        match self {
            StrokeColor::Black => "#000000",
            StrokeColor::Blue => "#2563EB",
            StrokeColor::Red => "#DC2626",
        }
    }

    pub fn rgba(self) -> [u8; 4] {
        parse_hex(self.hex()).unwrap_or([0, 0, 0, 255])
    }
}

impl fmt::Display for StrokeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrokeColor::Black => "black",
            StrokeColor::Blue => "blue",
            StrokeColor::Red => "red",
        };
        f.write_str(name)
    }
}

impl FromStr for StrokeColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(StrokeColor::Black),
            "blue" => Ok(StrokeColor::Blue),
            "red" => Ok(StrokeColor::Red),
            other => Err(format!("unknown color '{}' (expected black, blue or red)", other)),
        }
    }
}

/// Parses `#RRGGBB` into an opaque RGBA quadruple.
pub fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?, 255])
}

/// Redundancy tier handed to the QR encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    H,
}

impl ErrorCorrection {
    pub fn to_ec_level(self) -> qrcode::EcLevel {
        match self {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }
}

/// A user-selected logo. Bytes are kept as-is and only decoded at render time.
#[derive(Clone, PartialEq, Eq)]
pub struct LogoImage {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl LogoImage {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            bytes: Arc::from(bytes),
        }
    }

    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("logo")
            .to_string();
        Ok(Self::from_bytes(name, bytes))
    }
}

impl fmt::Debug for LogoImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoImage")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Immutable snapshot of the input at the moment a generation cycle starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub text: String,
    pub color: StrokeColor,
    pub logo: Option<LogoImage>,
}

impl GenerationRequest {
    /// Returns `None` when the trimmed text is empty.
    pub fn new(text: &str, color: StrokeColor, logo: Option<LogoImage>) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            color,
            logo,
        })
    }

    pub fn without_logo(&self) -> Self {
        Self {
            logo: None,
            ..self.clone()
        }
    }
}

/// Options derived from a request and handed to the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOptions {
    pub width: u32,
    pub margin: u32,
    pub error_correction: ErrorCorrection,
    pub color_dark: String,
    pub color_light: String,
}

impl StyleOptions {
    pub fn for_request(request: &GenerationRequest, width: u32, margin: u32) -> Self {
        // A logo hides modules, so it needs the stronger redundancy tier.
        let error_correction = if request.logo.is_some() {
            ErrorCorrection::H
        } else {
            ErrorCorrection::M
        };
        Self {
            width,
            margin,
            error_correction,
            color_dark: request.color.hex().to_string(),
            color_light: LIGHT_HEX.to_string(),
        }
    }
}

/// The finished PNG. Consumers get shared read-only access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub dimension: u32,
    pub request: GenerationRequest,
    pub error_correction: ErrorCorrection,
}

impl RenderedImage {
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    pub fn decode(&self) -> AppResult<image::RgbaImage> {
        image::load_from_memory(&self.png)
            .map(|img| img.to_rgba8())
            .map_err(|e| AppError::Image(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    Idle,
    Pending,
    Rendering,
    Ready,
    Failed,
}

/// What the controller publishes after every transition.
#[derive(Debug, Clone)]
pub struct GenerationStatus {
    pub state: GenerationState,
    pub image: Option<Arc<RenderedImage>>,
    pub last_error: Option<String>,
    /// Sequence number of the latest input mutation.
    pub sequence: u64,
    /// Number of generation cycles started so far.
    pub cycles: u64,
}

impl Default for GenerationStatus {
    fn default() -> Self {
        Self {
            state: GenerationState::Idle,
            image: None,
            last_error: None,
            sequence: 0,
            cycles: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub state: GenerationState,
    pub text: Option<String>,
    pub color: Option<StrokeColor>,
    pub logo: Option<String>,
    pub error_correction: Option<ErrorCorrection>,
    pub dimension: Option<u32>,
    pub png_bytes: Option<usize>,
    pub last_error: Option<String>,
    pub cycles: u64,
}

impl From<&GenerationStatus> for StatusSummary {
    fn from(status: &GenerationStatus) -> Self {
        let image = status.image.as_deref();
        Self {
            state: status.state,
            text: image.map(|i| i.request.text.clone()),
            color: image.map(|i| i.request.color),
            logo: image.and_then(|i| i.request.logo.as_ref().map(|l| l.name.clone())),
            error_correction: image.map(|i| i.error_correction),
            dimension: image.map(|i| i.dimension),
            png_bytes: image.map(|i| i.png.len()),
            last_error: status.last_error.clone(),
            cycles: status.cycles,
        }
    }
}
