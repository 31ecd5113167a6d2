//! Store - Document assembly, download sinks and settings
//!
//! This crate serializes paginated captures into PDF documents, hands the
//! finished artifacts to a download sink, and persists export settings.

mod error;
mod settings;
mod sink;
pub mod pdf;

pub use error::*;
pub use settings::*;
pub use sink::*;
