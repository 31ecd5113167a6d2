//! Error types for model construction

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid page frame: {width_mm}mm x {height_mm}mm")]
    InvalidPageFrame { width_mm: f64, height_mm: f64 },

    #[error("Bitmap buffer has {actual} bytes, expected {expected} for {width}x{height}")]
    BitmapSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
