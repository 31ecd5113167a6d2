//! Export Service - the public entry point of the export pipeline
//!
//! Sequences capture, pagination, assembly and save for a render target,
//! guards targets against overlapping exports, and hosts the invoice page
//! with its automatic-download path.

mod auto_export;
mod error;
mod orchestrator;
pub mod page;

pub use auto_export::*;
pub use error::*;
pub use orchestrator::*;
