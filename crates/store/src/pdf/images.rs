//! PDF Image Handling
//!
//! Turns a captured bitmap into an image XObject:
//! - lossless: 8-bit RGB samples, FlateDecode
//! - JPEG: baseline JPEG from the `image` encoder, DCTDecode

use super::objects::{PdfDictionary, PdfObject, PdfStream};
use super::writer::{PdfError, Result};
use export_model::{Bitmap, ImageEncoding};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    DCTDecode,
    FlateDecode,
}

impl ImageFilter {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ImageFilter::DCTDecode => "DCTDecode",
            ImageFilter::FlateDecode => "FlateDecode",
        }
    }
}

/// Encoded image samples ready to embed
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub filter: ImageFilter,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Encode `bitmap` as requested. Transparency is flattened onto white.
    pub fn encode(bitmap: &Bitmap, encoding: ImageEncoding) -> Result<Self> {
        let rgb = bitmap.to_rgb();
        let (filter, data) = match encoding {
            ImageEncoding::Lossless => (ImageFilter::FlateDecode, deflate(&rgb)?),
            ImageEncoding::Jpeg { quality } => (
                ImageFilter::DCTDecode,
                encode_jpeg(&rgb, bitmap.width(), bitmap.height(), quality)?,
            ),
        };
        Ok(Self {
            width: bitmap.width(),
            height: bitmap.height(),
            filter,
            data,
        })
    }

    pub fn to_xobject(self) -> PdfStream {
        let mut dict = PdfDictionary::typed("XObject");
        dict.insert("Subtype", PdfObject::name("Image"));
        dict.insert("Width", self.width);
        dict.insert("Height", self.height);
        dict.insert("BitsPerComponent", 8i64);
        dict.insert("ColorSpace", PdfObject::name("DeviceRGB"));
        dict.insert("Filter", PdfObject::name(self.filter.pdf_name()));
        PdfStream::encoded(dict, self.data)
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PdfError::Compression(e.to_string()))
}

fn encode_jpeg(rgb: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .write_image(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| PdfError::ImageEncoding(e.to_string()))?;
    Ok(out)
}
