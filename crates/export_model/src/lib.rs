//! Export Model - Shared types for the invoice document export pipeline
//!
//! This crate holds the data that flows between the capture engine, the
//! paginator, the document assembler and the export orchestrator. It has no
//! behaviour beyond small invariants and conversions.

mod artifact;
mod bitmap;
mod error;
mod page;
mod state;
mod target;
mod tier;

pub use artifact::*;
pub use bitmap::*;
pub use error::*;
pub use page::*;
pub use state::*;
pub use target::*;
pub use tier::*;
