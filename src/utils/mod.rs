pub mod file;
pub mod qrcode;
