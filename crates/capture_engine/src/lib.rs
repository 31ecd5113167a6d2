//! Capture Engine - Off-screen rendering of visual subtrees
//!
//! This crate turns a [`RenderTarget`](export_model::RenderTarget) into a
//! bitmap:
//! - [`Scene`]: the display list a page renders for a target
//! - [`RenderHost`] / [`SceneRegistry`]: where targets live, and the render
//!   pass signal used instead of settling delays
//! - [`CaptureEngine`]: rasterizes a scene with tiny-skia at a given scale
//! - [`ResourceLoader`] and [`FontBook`]: fail-soft image and font lookup

mod error;
mod fonts;
mod glyph;
mod host;
mod png;
mod raster;
mod resources;
mod scene;

pub use error::*;
pub use fonts::*;
pub use glyph::*;
pub use host::*;
pub use png::*;
pub use raster::*;
pub use resources::*;
pub use scene::*;
