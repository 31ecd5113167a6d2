//! PDF Content Stream Generation
//!
//! Only the operators an image page needs:
//! - q/Q: save and restore graphics state
//! - cm: concatenate transformation matrix
//! - re, W, n: rectangular clip
//! - Do: paint an XObject

use super::objects::format_real;
use std::fmt::Write;

#[derive(Debug, Default)]
pub struct ContentStream {
    data: String,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// q
    pub fn save_state(&mut self) -> &mut Self {
        self.data.push_str("q\n");
        self
    }

    /// Q
    pub fn restore_state(&mut self) -> &mut Self {
        self.data.push_str("Q\n");
        self
    }

    /// cm
    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> &mut Self {
        self.op(&[a, b, c, d, e, f], "cm")
    }

    /// re
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.op(&[x, y, width, height], "re")
    }

    /// W
    pub fn clip(&mut self) -> &mut Self {
        self.data.push_str("W\n");
        self
    }

    /// n
    pub fn end_path(&mut self) -> &mut Self {
        self.data.push_str("n\n");
        self
    }

    /// Do
    pub fn draw_xobject(&mut self, name: &str) -> &mut Self {
        let _ = writeln!(self.data, "/{} Do", name);
        self
    }

    /// Clip to `width` x `height` and paint `image` with its top edge
    /// `top_offset` points below the top of the clip box. Negative offsets
    /// move the image up.
    pub fn clipped_image(
        &mut self,
        image: &str,
        page_width: f64,
        page_height: f64,
        image_width: f64,
        image_height: f64,
        top_offset: f64,
    ) -> &mut Self {
        let lower_left_y = page_height - top_offset - image_height;
        self.save_state()
            .rect(0.0, 0.0, page_width, page_height)
            .clip()
            .end_path()
            .transform(image_width, 0.0, 0.0, image_height, 0.0, lower_left_y)
            .draw_xobject(image)
            .restore_state()
    }

    fn op(&mut self, operands: &[f64], operator: &str) -> &mut Self {
        for value in operands {
            self.data.push_str(&format_real(*value));
            self.data.push(' ');
        }
        self.data.push_str(operator);
        self.data.push('\n');
        self
    }
}
