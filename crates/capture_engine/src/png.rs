//! PNG encoding of captures for diagnostics

use crate::error::{CaptureError, Result};
use export_model::CaptureResult;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

pub trait CapturePng {
    /// Encode the captured bitmap as PNG
    fn to_png(&self) -> Result<Vec<u8>>;
}

impl CapturePng for CaptureResult {
    fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                self.bitmap.rgba(),
                self.bitmap.width(),
                self.bitmap.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use export_model::{Bitmap, ImageEncoding};

    #[test]
    fn test_to_png() {
        let result = CaptureResult {
            bitmap: Bitmap::filled(3, 2, [0, 128, 0, 255]).unwrap(),
            encoding: ImageEncoding::Lossless,
            scale: 1.0,
        };
        let png = result.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [0, 128, 0, 255]);
    }
}
