//! Rasterizer - paints a scene into an off-screen bitmap

use crate::error::{CaptureError, Result};
use crate::fonts::{shape_text, FontBook};
use crate::glyph::{glyph_path, glyph_transform};
use crate::host::RenderHost;
use crate::resources::{decode_image, ResourceLoader};
use crate::scene::{Color, ImageFit, ImageItem, RectItem, RuleItem, RuleStyle, Scene, SceneItem, TextRun};
use export_model::{Bitmap, CaptureResult, ImageEncoding, RenderTarget};
use std::sync::Arc;
use tiny_skia::{
    FillRule, FilterQuality, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash,
    Transform,
};

/// Scene capture with its font and resource collaborators
pub struct CaptureEngine {
    fonts: Arc<FontBook>,
    loader: Arc<dyn ResourceLoader>,
}

impl CaptureEngine {
    pub fn new(fonts: Arc<FontBook>, loader: Arc<dyn ResourceLoader>) -> Self {
        Self { fonts, loader }
    }

    pub fn fonts(&self) -> &Arc<FontBook> {
        &self.fonts
    }

    /// Capture `target` at `scale` device pixels per CSS pixel.
    ///
    /// The whole scene is painted, including content outside any viewport.
    pub fn capture(
        &self,
        host: &dyn RenderHost,
        target: &RenderTarget,
        scale: f32,
        encoding: ImageEncoding,
    ) -> Result<CaptureResult> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(CaptureError::InvalidScale(scale));
        }
        let scene = host
            .resolve(target)
            .ok_or_else(|| CaptureError::NotFound(target.clone()))?;

        let bitmap = self.rasterize(&scene, scale)?;
        tracing::debug!(
            %target,
            width = bitmap.width(),
            height = bitmap.height(),
            scale,
            "captured scene"
        );
        Ok(CaptureResult {
            bitmap,
            encoding,
            scale,
        })
    }

    /// Paint `scene` into a new bitmap
    pub fn rasterize(&self, scene: &Scene, scale: f32) -> Result<Bitmap> {
        let (width, height) = scene.device_size(scale);
        if width == 0 || height == 0 {
            return Err(CaptureError::EmptyCapture { width, height });
        }
        let mut pixmap =
            Pixmap::new(width, height).ok_or(CaptureError::SurfaceAllocation { width, height })?;

        pixmap.fill(tiny_skia::Color::WHITE);

        let transform = Transform::from_scale(scale, scale);
        let mut painter = Painter {
            pixmap: &mut pixmap,
            transform,
            fonts: &self.fonts,
            loader: self.loader.as_ref(),
            skipped_text: 0,
            skipped_images: 0,
        };

        if let Some(background) = scene.background {
            painter.fill(
                tiny_skia::Rect::from_xywh(0.0, 0.0, scene.width, scene.height),
                background,
            );
        }
        for item in &scene.items {
            painter.paint(item);
        }
        if painter.skipped_text > 0 || painter.skipped_images > 0 {
            tracing::warn!(
                text_runs = painter.skipped_text,
                images = painter.skipped_images,
                "capture omitted content"
            );
        }

        let rgba = pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        Ok(Bitmap::new(width, height, rgba)?)
    }
}

struct Painter<'a> {
    pixmap: &'a mut Pixmap,
    transform: Transform,
    fonts: &'a FontBook,
    loader: &'a dyn ResourceLoader,
    skipped_text: usize,
    skipped_images: usize,
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

impl Painter<'_> {
    fn paint(&mut self, item: &SceneItem) {
        match item {
            SceneItem::Rect(rect) => self.rect(rect),
            SceneItem::Rule(rule) => self.rule(rule),
            SceneItem::Text(run) => self.text(run),
            SceneItem::Image(image) => self.image(image),
        }
    }

    fn fill(&mut self, rect: Option<tiny_skia::Rect>, color: Color) {
        if let Some(rect) = rect {
            self.pixmap
                .fill_rect(rect, &paint_for(color), self.transform, None);
        }
    }

    fn rect(&mut self, item: &RectItem) {
        let b = item.bounds;
        if b.is_empty() {
            return;
        }
        self.fill(tiny_skia::Rect::from_xywh(b.x, b.y, b.width, b.height), item.fill);
    }

    fn rule(&mut self, item: &RuleItem) {
        if item.length <= 0.0 || item.thickness <= 0.0 {
            return;
        }
        match item.style {
            RuleStyle::Solid => self.fill(
                tiny_skia::Rect::from_xywh(item.x, item.y, item.length, item.thickness),
                item.color,
            ),
            RuleStyle::Dotted => {
                let mid = item.y + item.thickness / 2.0;
                let mut builder = PathBuilder::new();
                builder.move_to(item.x, mid);
                builder.line_to(item.x + item.length, mid);
                let Some(path) = builder.finish() else {
                    return;
                };
                let stroke = Stroke {
                    width: item.thickness,
                    line_cap: LineCap::Round,
                    dash: StrokeDash::new(vec![item.thickness, item.thickness * 2.0], 0.0),
                    ..Stroke::default()
                };
                self.pixmap
                    .stroke_path(&path, &paint_for(item.color), &stroke, self.transform, None);
            }
        }
    }

    fn text(&mut self, run: &TextRun) {
        if run.text.trim().is_empty() {
            return;
        }
        let Some(data) = self.fonts.face_for(&run.font) else {
            self.skipped_text += 1;
            return;
        };
        let Some(face) = data.face() else {
            self.skipped_text += 1;
            return;
        };

        let shaped = shape_text(&face, &run.text, run.font.size);
        let paint = paint_for(run.color);
        for glyph in &shaped.glyphs {
            let Some(path) = glyph_path(&face, glyph.glyph_id) else {
                continue;
            };
            let placement = glyph_transform(shaped.scale, run.x + glyph.x, run.baseline - glyph.y);
            self.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                placement.post_concat(self.transform),
                None,
            );
        }
    }

    fn image(&mut self, item: &ImageItem) {
        if item.bounds.is_empty() {
            return;
        }
        let decoded = self
            .loader
            .fetch(&item.source)
            .and_then(|bytes| decode_image(&bytes));
        let image = match decoded {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(source = %truncate_source(&item.source), error = %e, "omitting image");
                self.skipped_images += 1;
                return;
            }
        };

        let (sx, sy) = fit_scale(
            image.width() as f32,
            image.height() as f32,
            item.bounds.width,
            item.bounds.height,
            item.fit,
        );
        let placement = Transform::from_row(sx, 0.0, 0.0, sy, item.bounds.x, item.bounds.y);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            placement.post_concat(self.transform),
            None,
        );
    }
}

/// Scale factors mapping an image of `iw`x`ih` into a `bw`x`bh` box
fn fit_scale(iw: f32, ih: f32, bw: f32, bh: f32, fit: ImageFit) -> (f32, f32) {
    let sx = bw / iw;
    let sy = bh / ih;
    match fit {
        ImageFit::Fill => (sx, sy),
        ImageFit::Contain => {
            let s = sx.min(sy);
            (s, s)
        }
    }
}

/// data: URLs can be megabytes long; keep log lines readable
fn truncate_source(source: &str) -> String {
    const MAX: usize = 64;
    if source.len() <= MAX {
        return source.to_string();
    }
    let mut end = MAX;
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &source[..end])
}
