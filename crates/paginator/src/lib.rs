//! Paginator - Bitmap to page slice computation
//!
//! Given the pixel size of a captured bitmap and a physical page frame, the
//! paginator stretches the bitmap to the page width and works out how many
//! pages are needed and where the bitmap sits on each of them. Offsets are in
//! millimetres relative to the page top; a negative offset pushes the bitmap
//! up so that the next band of rows becomes visible.
//!
//! The computation is pure: identical inputs always produce identical output.

mod error;

pub use error::*;

use export_model::{Orientation, PageFrame, PageSlice, Pagination};

/// Remainders smaller than this (in mm) do not open another page
pub const ROUNDING_TOLERANCE_MM: f64 = 1e-6;

/// Compute the page slices for a `width` x `height` pixel bitmap.
pub fn paginate(width: u32, height: u32, frame: PageFrame) -> Result<Pagination> {
    if width == 0 || height == 0 {
        return Err(PaginateError::DegenerateBitmap { width, height });
    }
    frame
        .validate()
        .map_err(|_| PaginateError::InvalidPageFrame {
            width_mm: frame.width_mm,
            height_mm: frame.height_mm,
        })?;

    let scaled_height_mm = height as f64 * frame.width_mm / width as f64;
    let page_height = frame.height_mm;

    let mut slices = vec![PageSlice {
        index: 0,
        offset_mm: 0.0,
    }];

    // Walk down the bitmap one page height at a time until nothing is left
    let mut height_left = scaled_height_mm - page_height;
    while height_left > ROUNDING_TOLERANCE_MM {
        let index = slices.len();
        slices.push(PageSlice {
            index,
            offset_mm: -(index as f64) * page_height,
        });
        height_left -= page_height;
    }

    let orientation = orientation_for(scaled_height_mm, frame);

    tracing::debug!(
        width,
        height,
        scaled_height_mm,
        pages = slices.len(),
        ?orientation,
        "paginated capture"
    );

    Ok(Pagination {
        slices,
        orientation,
        scaled_height_mm,
        frame,
    })
}

/// Orientation is decided once, against the unpaginated height: content
/// shorter than the page is wide is laid out landscape.
pub fn orientation_for(scaled_height_mm: f64, frame: PageFrame) -> Orientation {
    if frame.width_mm > scaled_height_mm {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn a4() -> PageFrame {
        PageFrame::A4
    }

    #[test]
    fn test_single_page_portrait() {
        let pagination = paginate(1000, 1400, a4()).unwrap();
        assert_eq!(pagination.page_count(), 1);
        assert_eq!(pagination.slices[0].offset_mm, 0.0);
        assert_eq!(pagination.orientation, Orientation::Portrait);
        assert!((pagination.scaled_height_mm - 294.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_pages() {
        let pagination = paginate(1000, 2000, a4()).unwrap();
        assert!((pagination.scaled_height_mm - 420.0).abs() < 1e-9);
        assert_eq!(pagination.page_count(), 2);
        assert_eq!(pagination.slices[0].offset_mm, 0.0);
        assert_eq!(pagination.slices[1].offset_mm, -297.0);
        assert_eq!(pagination.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_exact_page_height_is_one_page() {
        let frame = PageFrame::new(200.0, 300.0);
        let pagination = paginate(1000, 1500, frame).unwrap();
        assert_eq!(pagination.page_count(), 1);

        let pagination = paginate(1000, 3000, frame).unwrap();
        assert_eq!(pagination.page_count(), 2);
        assert_eq!(pagination.visible_height_mm(1), Some(300.0));
    }

    #[test]
    fn test_wide_bitmap_is_landscape() {
        let pagination = paginate(2000, 1000, a4()).unwrap();
        assert_eq!(pagination.page_count(), 1);
        assert_eq!(pagination.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_square_bitmap_is_portrait() {
        let pagination = paginate(800, 800, a4()).unwrap();
        assert_eq!(pagination.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_degenerate_bitmap() {
        assert_eq!(
            paginate(0, 100, a4()),
            Err(PaginateError::DegenerateBitmap {
                width: 0,
                height: 100
            })
        );
        assert!(matches!(
            paginate(100, 0, a4()),
            Err(PaginateError::DegenerateBitmap { .. })
        ));
    }

    #[test]
    fn test_invalid_frame() {
        let result = paginate(100, 100, PageFrame::new(0.0, 297.0));
        assert!(matches!(result, Err(PaginateError::InvalidPageFrame { .. })));
    }

    #[test]
    fn test_last_page_remainder() {
        let pagination = paginate(1000, 2000, a4()).unwrap();
        let last = pagination.visible_height_mm(1).unwrap();
        assert!((last - 123.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_page_count_is_ceiling(width in 1u32..4000, height in 1u32..40000) {
            let frame = a4();
            let pagination = paginate(width, height, frame).unwrap();
            let scaled = height as f64 * frame.width_mm / width as f64;
            let count = pagination.page_count();

            if scaled <= frame.height_mm {
                prop_assert_eq!(count, 1);
            } else {
                let expected = (scaled / frame.height_mm).ceil() as usize;
                // A remainder inside the tolerance may save one page
                prop_assert!(count == expected || count + 1 == expected);
                prop_assert!((count as f64) * frame.height_mm + ROUNDING_TOLERANCE_MM >= scaled);
                prop_assert!(((count - 1) as f64) * frame.height_mm < scaled);
            }
        }

        #[test]
        fn prop_offsets_are_contiguous(width in 1u32..4000, height in 1u32..40000) {
            let frame = a4();
            let pagination = paginate(width, height, frame).unwrap();
            for (i, slice) in pagination.slices.iter().enumerate() {
                prop_assert_eq!(slice.index, i);
                prop_assert_eq!(slice.offset_mm, -(i as f64) * frame.height_mm);
            }
        }

        #[test]
        fn prop_visible_heights_cover_bitmap(width in 1u32..4000, height in 1u32..40000) {
            let pagination = paginate(width, height, a4()).unwrap();
            let total: f64 = (0..pagination.page_count())
                .filter_map(|i| pagination.visible_height_mm(i))
                .sum();
            prop_assert!((total - pagination.scaled_height_mm).abs() < 1e-6 * pagination.page_count() as f64 + 1e-6);
        }

        #[test]
        fn prop_paginate_is_idempotent(width in 1u32..4000, height in 1u32..40000) {
            let first = paginate(width, height, a4()).unwrap();
            let second = paginate(width, height, a4()).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_landscape_iff_wider_than_tall(width in 1u32..4000, height in 1u32..4000) {
            let pagination = paginate(width, height, a4()).unwrap();
            let landscape = pagination.orientation == Orientation::Landscape;
            prop_assert_eq!(landscape, height < width);
        }
    }
}
