//! Error types for the paginator

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PaginateError {
    #[error("Cannot paginate a {width}x{height} bitmap")]
    DegenerateBitmap { width: u32, height: u32 },

    #[error("Invalid page frame: {width_mm}mm x {height_mm}mm")]
    InvalidPageFrame { width_mm: f64, height_mm: f64 },
}

pub type Result<T> = std::result::Result<T, PaginateError>;
