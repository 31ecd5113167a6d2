//! Glyph outlines as tiny-skia paths

use rustybuzz::ttf_parser;
use tiny_skia::{Path, PathBuilder, Transform};

/// Receives ttf-parser outline commands in font units (y-up)
pub struct GlyphOutlineBuilder {
    builder: PathBuilder,
}

impl GlyphOutlineBuilder {
    pub fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
        }
    }

    pub fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl Default for GlyphOutlineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Outline of `glyph_id`, or `None` for blank glyphs such as spaces
pub fn glyph_path(face: &ttf_parser::Face<'_>, glyph_id: u16) -> Option<Path> {
    let mut builder = GlyphOutlineBuilder::new();
    face.outline_glyph(ttf_parser::GlyphId(glyph_id), &mut builder)?;
    builder.finish()
}

/// Maps font units to CSS px with the origin at (x, baseline), flipping y
pub fn glyph_transform(units_to_px: f32, x: f32, baseline: f32) -> Transform {
    Transform::from_row(units_to_px, 0.0, 0.0, -units_to_px, x, baseline)
}
