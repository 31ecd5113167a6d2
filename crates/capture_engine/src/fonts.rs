//! Font lookup and text measurement
//!
//! Faces come from an explicit font file when one is configured, otherwise
//! from font-kit system discovery. Lookups are cached per family and weight,
//! including misses, so a missing family is only searched for once.

use crate::scene::{FontSpec, FontWeight};
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties, Weight};
use font_kit::source::SystemSource;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Raw font file bytes plus the face index inside the file
#[derive(Debug, Clone)]
pub struct FontData {
    pub bytes: Arc<Vec<u8>>,
    pub index: u32,
}

impl FontData {
    /// Parse-check the data and wrap it. Returns `None` when the bytes are
    /// not a usable face.
    pub fn new(bytes: Arc<Vec<u8>>, index: u32) -> Option<Self> {
        rustybuzz::Face::from_slice(&bytes, index)?;
        Some(Self { bytes, index })
    }

    pub fn face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.bytes, self.index)
    }
}

/// A glyph placed relative to the run origin, in font units scaled to CSS px
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub glyph_id: u16,
    pub x: f32,
    pub y: f32,
}

/// Result of shaping one run
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedText {
    pub glyphs: Vec<PlacedGlyph>,
    pub width: f32,
    /// CSS px per font unit
    pub scale: f32,
}

/// Shape `text` at `size` CSS px with `face`
pub fn shape_text(face: &rustybuzz::Face<'_>, text: &str, size: f32) -> ShapedText {
    let units_per_em = face.units_per_em().max(1) as f32;
    let scale = size / units_per_em;

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    let output = rustybuzz::shape(face, &[], buffer);

    let mut glyphs = Vec::with_capacity(output.len());
    let mut pen = 0i32;
    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        glyphs.push(PlacedGlyph {
            glyph_id: info.glyph_id as u16,
            x: (pen + pos.x_offset) as f32 * scale,
            y: pos.y_offset as f32 * scale,
        });
        pen += pos.x_advance;
    }

    ShapedText {
        glyphs,
        width: pen as f32 * scale,
        scale,
    }
}

/// Width of a single-line string, used by layout code to wrap text
pub trait TextMeasure {
    fn measure(&self, text: &str, font: &FontSpec) -> f32;
}

/// Average-advance measure: every character is a fixed fraction of an em.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMeasure {
    pub regular_em: f32,
    pub bold_em: f32,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self {
            regular_em: 0.55,
            bold_em: 0.6,
        }
    }
}

impl TextMeasure for ApproxMeasure {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        let em = match font.weight {
            FontWeight::Normal => self.regular_em,
            FontWeight::Bold => self.bold_em,
        };
        text.chars().count() as f32 * font.size * em
    }
}

type FaceKey = (String, FontWeight);

/// Source of faces for text runs
#[derive(Default)]
pub struct FontBook {
    explicit: Option<FontData>,
    use_system: bool,
    cache: Mutex<HashMap<FaceKey, Option<FontData>>>,
}

impl FontBook {
    /// Resolve faces through system font discovery
    pub fn system() -> Self {
        Self {
            explicit: None,
            use_system: true,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A book with no faces: every text run is skipped
    pub fn empty() -> Self {
        Self::default()
    }

    /// Use the font file at `path` for every run
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let data = FontData::new(Arc::new(bytes), 0).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("not a usable font: {}", path.display()),
            )
        })?;
        Ok(Self {
            explicit: Some(data),
            use_system: false,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Face for `font`, or `None` when nothing suitable is available
    pub fn face_for(&self, font: &FontSpec) -> Option<FontData> {
        if let Some(explicit) = &self.explicit {
            return Some(explicit.clone());
        }
        if !self.use_system {
            return None;
        }

        let key = (font.family.to_lowercase(), font.weight);
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }

        let found = select_system_face(&font.family, font.weight);
        if found.is_none() {
            tracing::warn!(family = %font.family, "no system font available");
        }
        cache.insert(key, found.clone());
        found
    }
}

fn family_name(family: &str) -> FamilyName {
    match family.to_lowercase().as_str() {
        "sans-serif" => FamilyName::SansSerif,
        "serif" => FamilyName::Serif,
        "monospace" => FamilyName::Monospace,
        "cursive" => FamilyName::Cursive,
        "fantasy" => FamilyName::Fantasy,
        _ => FamilyName::Title(family.to_string()),
    }
}

fn select_system_face(family: &str, weight: FontWeight) -> Option<FontData> {
    let properties = Properties {
        weight: match weight {
            FontWeight::Bold => Weight::BOLD,
            FontWeight::Normal => Weight::NORMAL,
        },
        ..Default::default()
    };

    let source = SystemSource::new();
    let handle = source
        .select_best_match(&[family_name(family), FamilyName::SansSerif], &properties)
        .ok()?;

    let (bytes, index) = match handle {
        Handle::Path { path, font_index } => (Arc::new(std::fs::read(&path).ok()?), font_index),
        Handle::Memory { bytes, font_index } => (bytes, font_index),
    };
    FontData::new(bytes, index)
}

impl TextMeasure for FontBook {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        match self.face_for(font).as_ref().and_then(|d| d.face()) {
            Some(face) => shape_text(&face, text, font.size).width,
            None => ApproxMeasure::default().measure(text, font),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_measure() {
        let measure = ApproxMeasure::default();
        let font = FontSpec::new("sans-serif", 10.0);
        assert!((measure.measure("abcd", &font) - 22.0).abs() < 1e-4);
        assert!((measure.measure("abcd", &font.clone().bold()) - 24.0).abs() < 1e-4);
        assert_eq!(measure.measure("", &font), 0.0);
    }

    #[test]
    fn test_approx_measure_counts_chars_not_bytes() {
        let measure = ApproxMeasure::default();
        let font = FontSpec::new("sans-serif", 10.0);
        assert_eq!(measure.measure("Ítem", &font), measure.measure("Item", &font));
    }

    #[test]
    fn test_empty_book_has_no_faces() {
        let book = FontBook::empty();
        assert!(book.face_for(&FontSpec::default()).is_none());
        let font = FontSpec::new("sans-serif", 10.0);
        assert_eq!(book.measure("abcd", &font), ApproxMeasure::default().measure("abcd", &font));
    }

    #[test]
    fn test_from_file_rejects_non_fonts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = FontBook::from_file(&path).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_font_data_rejects_garbage() {
        assert!(FontData::new(Arc::new(vec![0u8; 16]), 0).is_none());
    }
}
