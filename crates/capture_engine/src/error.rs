//! Error types for the capture engine

use export_model::{ModelError, RenderTarget};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Render target not found: {0}")]
    NotFound(RenderTarget),

    #[error("Capture has no area: {width}x{height}")]
    EmptyCapture { width: u32, height: u32 },

    #[error("Could not allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },

    #[error("Invalid capture scale: {0}")]
    InvalidScale(f32),

    #[error("Bitmap error: {0}")]
    Bitmap(#[from] ModelError),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Failure to load an embedded resource. These never abort a capture.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Unsupported resource location: {0}")]
    UnsupportedScheme(String),

    #[error("Malformed data URL")]
    InvalidDataUrl,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    Decode(String),
}
