//! Physical page geometry and the pagination bundle

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// 1 in = 25.4 mm = 72 pt
pub const MM_PER_INCH: f64 = 25.4;
pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert millimetres to PDF points
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}

/// Physical page size in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFrame {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageFrame {
    pub const A4: PageFrame = PageFrame {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// Reject frames that cannot hold content
    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width_mm) && ok(self.height_mm) {
            Ok(())
        } else {
            Err(ModelError::InvalidPageFrame {
                width_mm: self.width_mm,
                height_mm: self.height_mm,
            })
        }
    }

    /// The frame as laid out for the given orientation.
    ///
    /// Landscape swaps the axes of the configured frame.
    pub fn oriented(&self, orientation: Orientation) -> PageFrame {
        match orientation {
            Orientation::Portrait => *self,
            Orientation::Landscape => PageFrame {
                width_mm: self.height_mm,
                height_mm: self.width_mm,
            },
        }
    }
}

impl Default for PageFrame {
    fn default() -> Self {
        Self::A4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Placement of the bitmap on one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSlice {
    /// Zero-based page index
    pub index: usize,
    /// Vertical offset of the bitmap's top edge from the page top, in mm.
    /// Zero on the first page and `-index * Ph` afterwards.
    pub offset_mm: f64,
}

/// Output of the paginator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub slices: Vec<PageSlice>,
    pub orientation: Orientation,
    /// Height of the bitmap once stretched to the page width
    pub scaled_height_mm: f64,
    pub frame: PageFrame,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.slices.len()
    }

    /// Length of bitmap visible on page `index`, in mm.
    ///
    /// Returns `None` for an index past the last page.
    pub fn visible_height_mm(&self, index: usize) -> Option<f64> {
        let slice = self.slices.get(index)?;
        let remaining = self.scaled_height_mm + slice.offset_mm;
        Some(remaining.clamp(0.0, self.frame.height_mm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_is_a4() {
        let frame = PageFrame::default();
        assert_eq!(frame.width_mm, 210.0);
        assert_eq!(frame.height_mm, 297.0);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_invalid_frames() {
        assert!(PageFrame::new(0.0, 297.0).validate().is_err());
        assert!(PageFrame::new(210.0, -1.0).validate().is_err());
        assert!(PageFrame::new(f64::NAN, 297.0).validate().is_err());
        assert!(PageFrame::new(f64::INFINITY, 297.0).validate().is_err());
    }

    #[test]
    fn test_mm_to_pt() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-9);
        assert!((mm_to_pt(PageFrame::A4.width_mm) - 595.2756).abs() < 1e-3);
        assert!((mm_to_pt(PageFrame::A4.height_mm) - 841.8898).abs() < 1e-3);
    }

    #[test]
    fn test_oriented_swaps_axes() {
        let landscape = PageFrame::A4.oriented(Orientation::Landscape);
        assert_eq!(landscape.width_mm, 297.0);
        assert_eq!(landscape.height_mm, 210.0);
        assert_eq!(PageFrame::A4.oriented(Orientation::Portrait), PageFrame::A4);
    }

    #[test]
    fn test_visible_height() {
        let pagination = Pagination {
            slices: vec![
                PageSlice { index: 0, offset_mm: 0.0 },
                PageSlice { index: 1, offset_mm: -297.0 },
            ],
            orientation: Orientation::Portrait,
            scaled_height_mm: 420.0,
            frame: PageFrame::A4,
        };
        assert_eq!(pagination.visible_height_mm(0), Some(297.0));
        assert_eq!(pagination.visible_height_mm(1), Some(123.0));
        assert_eq!(pagination.visible_height_mm(2), None);
    }

    #[test]
    fn test_frame_serialization() {
        let json = serde_json::to_string(&PageFrame::A4).unwrap();
        assert_eq!(json, r#"{"widthMm":210.0,"heightMm":297.0}"#);
    }
}
