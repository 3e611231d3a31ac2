use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Logo load error: {0}")]
    LogoLoad(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation controller is no longer running")]
    ControllerClosed,
}

impl From<qrcode::types::QrError> for AppError {
    fn from(err: qrcode::types::QrError) -> Self {
        AppError::Encoding(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_error_maps_to_encoding() {
        let err: AppError = qrcode::types::QrError::DataTooLong.into();
        assert!(matches!(err, AppError::Encoding(_)));
        assert!(err.to_string().starts_with("Encoding error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
