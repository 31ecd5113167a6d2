//! Invoice View - the printable invoice sheet
//!
//! This crate holds the invoice display model as the backend serves it,
//! the display formatters, and the layout that turns an invoice into a
//! capturable scene.

mod format;
mod layout;
mod model;
mod wrap;

pub use format::*;
pub use layout::*;
pub use model::*;
pub use wrap::*;
