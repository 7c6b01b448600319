use thiserror::Error;

/// A local form-field violation. Never reaches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable explanation, suitable for inline display.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors from the photo compression pipeline.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image encode error: {0}")]
    Encode(String),

    #[error("Image could not be compressed under {target} bytes (best effort: {best})")]
    TargetUnreachable { target: usize, best: usize },
}
