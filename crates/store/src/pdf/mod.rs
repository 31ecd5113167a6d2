//! PDF Export Module
//!
//! Turns a paginated capture into a multi-page PDF where every page shows a
//! band of one shared image.
//!
//! # Architecture
//!
//! - `objects`: PDF object model (Dictionary, Array, Stream, Reference)
//! - `document`: PDF document structure (Catalog, Pages, Info)
//! - `content`: Content stream generation (clip and image operators)
//! - `images`: Image XObject generation
//! - `options`: PDF export configuration
//! - `writer`: Object numbering, xref table and trailer
//! - `api`: Public API for PDF export

mod api;
mod content;
mod document;
mod images;
mod objects;
mod options;
mod writer;

pub use api::*;
pub use document::{pdf_date, PdfVersion};
pub use images::{ImageData, ImageFilter};
pub use options::*;

// Re-export error type
pub use writer::PdfError;
