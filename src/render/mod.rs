pub mod compositor;
pub mod encoder;
pub mod pipeline;

pub use compositor::{apply_logo, LogoGeometry};
pub use encoder::{QrCodeEncoder, QrEncoder};
pub use pipeline::{render, RenderOutcome, RenderSettings};
