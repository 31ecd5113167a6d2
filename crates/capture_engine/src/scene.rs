//! Scene - Display list for a rendered visual subtree
//!
//! A scene is what the capture engine paints. Coordinates are CSS pixels
//! with the origin at the top-left corner of the subtree; the capture scale
//! maps them to device pixels.

use serde::{Deserialize, Serialize};

/// Slack below an integer pixel edge that still rounds down
const DEVICE_PIXEL_EPSILON: f64 = 1e-3;

/// RGBA colour with straight alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font request for a text run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Family name or a generic family (`sans-serif`, `serif`, `monospace`)
    pub family: String,
    /// Size in CSS pixels
    pub size: f32,
    #[serde(default)]
    pub weight: FontWeight,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            weight: FontWeight::Normal,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("sans-serif", 14.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStyle {
    #[default]
    Solid,
    Dotted,
}

/// A filled rectangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectItem {
    pub bounds: Rect,
    pub fill: Color,
}

/// A horizontal rule starting at (x, y)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleItem {
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub thickness: f32,
    pub color: Color,
    #[serde(default)]
    pub style: RuleStyle,
}

/// A single line of text positioned by its baseline origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub x: f32,
    pub baseline: f32,
    pub text: String,
    pub font: FontSpec,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Scale to fit inside the bounds keeping the aspect ratio, anchored top-left
    #[default]
    Contain,
    /// Stretch to the bounds
    Fill,
}

/// An embedded image fetched through a resource loader at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    /// URL, `data:` URL, `file:` URL or filesystem path
    pub source: String,
    pub bounds: Rect,
    #[serde(default)]
    pub fit: ImageFit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneItem {
    Rect(RectItem),
    Rule(RuleItem),
    Text(TextRun),
    Image(ImageItem),
}

/// A laid-out visual subtree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    /// Painted over the white base before any item
    pub background: Option<Color>,
    pub items: Vec<SceneItem>,
}

impl Scene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: None,
            items: Vec::new(),
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn push(&mut self, item: SceneItem) {
        self.items.push(item);
    }

    pub fn fill_rect(&mut self, bounds: Rect, color: Color) {
        self.push(SceneItem::Rect(RectItem {
            bounds,
            fill: color,
        }));
    }

    pub fn rule(&mut self, x: f32, y: f32, length: f32, thickness: f32, color: Color, style: RuleStyle) {
        self.push(SceneItem::Rule(RuleItem {
            x,
            y,
            length,
            thickness,
            color,
            style,
        }));
    }

    pub fn text(&mut self, x: f32, baseline: f32, text: impl Into<String>, font: FontSpec, color: Color) {
        self.push(SceneItem::Text(TextRun {
            x,
            baseline,
            text: text.into(),
            font,
            color,
        }));
    }

    pub fn image(&mut self, source: impl Into<String>, bounds: Rect, fit: ImageFit) {
        self.push(SceneItem::Image(ImageItem {
            source: source.into(),
            bounds,
            fit,
        }));
    }

    /// Pixel size of the bitmap this scene produces at `scale`
    pub fn device_size(&self, scale: f32) -> (u32, u32) {
        // f32 products such as 700 * 1.2 land just above the integer
        let px = |v: f32| {
            let exact = f64::from(v) * f64::from(scale);
            let scaled = (exact - DEVICE_PIXEL_EPSILON).ceil();
            if scaled.is_finite() && scaled > 0.0 {
                scaled.min(f64::from(u32::MAX)) as u32
            } else {
                0
            }
        };
        (px(self.width), px(self.height))
    }

    /// Number of items of each kind, for logging
    pub fn summary(&self) -> SceneSummary {
        let mut summary = SceneSummary::default();
        for item in &self.items {
            match item {
                SceneItem::Rect(_) => summary.rects += 1,
                SceneItem::Rule(_) => summary.rules += 1,
                SceneItem::Text(_) => summary.texts += 1,
                SceneItem::Image(_) => summary.images += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub rects: usize,
    pub rules: usize,
    pub texts: usize,
    pub images: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_size() {
        let scene = Scene::new(800.0, 1130.5);
        assert_eq!(scene.device_size(1.0), (800, 1131));
        assert_eq!(scene.device_size(2.0), (1600, 2261));
        assert_eq!(Scene::new(0.0, 100.0).device_size(2.0), (0, 200));
        assert_eq!(Scene::new(100.0, 100.0).device_size(0.0), (0, 0));
    }

    #[test]
    fn test_device_size_fractional_scale_has_no_extra_row() {
        assert_eq!(Scene::new(500.0, 700.0).device_size(1.2), (600, 840));
        assert_eq!(Scene::new(500.0, 700.0).device_size(1.1), (550, 770));
        assert_eq!(Scene::new(100.0, 10.5).device_size(1.2), (120, 13));
    }

    #[test]
    fn test_summary() {
        let mut scene = Scene::new(100.0, 100.0);
        scene.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        scene.text(0.0, 12.0, "hola", FontSpec::default(), Color::BLACK);
        scene.image("logo.png", Rect::new(0.0, 0.0, 10.0, 10.0), ImageFit::Contain);
        scene.rule(0.0, 20.0, 100.0, 1.0, Color::BLACK, RuleStyle::Dotted);
        let summary = scene.summary();
        assert_eq!(summary.rects, 1);
        assert_eq!(summary.texts, 1);
        assert_eq!(summary.images, 1);
        assert_eq!(summary.rules, 1);
    }

    #[test]
    fn test_scene_item_serialization() {
        let item = SceneItem::Rule(RuleItem {
            x: 0.0,
            y: 1.0,
            length: 2.0,
            thickness: 1.0,
            color: Color::BLACK,
            style: RuleStyle::Dotted,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "rule");
        assert_eq!(json["style"], "dotted");
        let back: SceneItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
