//! QR Studio - customizable QR code generator
//!
//! Renders text into a styled QR code PNG, optionally with a centered logo,
//! regenerating on a debounce as input changes, and exports the result to a
//! file or the clipboard.

pub mod cli;
pub mod core;
pub mod export;
pub mod render;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::{
    config::AppConfig,
    controller::GenerationController,
    error::{AppError, AppResult},
    models::{
        ErrorCorrection, GenerationRequest, GenerationState, GenerationStatus, LogoImage,
        RenderedImage, StrokeColor, StyleOptions,
    },
};

pub use crate::export::{copy_to_clipboard, download, Clipboard, MemoryClipboard, SystemClipboard};

pub use crate::render::{apply_logo, render, LogoGeometry, QrCodeEncoder, QrEncoder, RenderSettings};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
