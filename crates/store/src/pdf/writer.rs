//! PDF Writer
//!
//! Object numbering, the cross-reference table and the file trailer, plus
//! the document writer that lays out one shared image across pages.

use super::content::ContentStream;
use super::document::{create_catalog, create_pages, DocumentInfo, ImagePage, MediaBox, PdfVersion};
use super::images::ImageData;
use super::objects::{PdfDictionary, PdfObject, PdfSerializer, PdfStream};
use export_model::{mm_to_pt, Pagination};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Image encoding error: {0}")]
    ImageEncoding(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Low-level writer tracking byte offsets for the xref table
pub struct PdfWriter<W: Write> {
    writer: W,
    position: u64,
    offsets: Vec<(u32, u64)>,
    next_obj_num: u32,
    version: PdfVersion,
    compress: bool,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W, version: PdfVersion) -> Self {
        Self {
            writer,
            position: 0,
            offsets: Vec::new(),
            next_obj_num: 1,
            version,
            compress: true,
        }
    }

    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.position += data.len() as u64;
        Ok(())
    }

    pub fn allocate_object(&mut self) -> u32 {
        let num = self.next_obj_num;
        self.next_obj_num += 1;
        num
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.write_bytes(format!("%PDF-{}\n", self.version.as_str()).as_bytes())?;
        // Binary marker so transfer tools treat the file as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])
    }

    fn begin_object(&mut self, obj_num: u32) -> Result<()> {
        self.offsets.push((obj_num, self.position));
        self.write_bytes(format!("{} 0 obj\n", obj_num).as_bytes())
    }

    pub fn write_object(&mut self, obj_num: u32, object: &PdfObject) -> Result<()> {
        self.begin_object(obj_num)?;
        let mut serializer = PdfSerializer::new(Vec::new());
        serializer.write_object(object)?;
        self.write_bytes(&serializer.into_inner())?;
        self.write_bytes(b"\nendobj\n")
    }

    /// Write a stream, deflating it first when compression is on and the
    /// payload is not already encoded
    pub fn write_stream_object(&mut self, obj_num: u32, mut stream: PdfStream) -> Result<()> {
        if self.compress && !stream.encoded {
            stream = compress_stream(stream)?;
        }
        stream.dict.insert("Length", stream.data.len() as i64);

        self.begin_object(obj_num)?;
        let mut serializer = PdfSerializer::new(Vec::new());
        serializer.write_stream(&stream)?;
        self.write_bytes(&serializer.into_inner())?;
        self.write_bytes(b"\nendobj\n")
    }

    pub fn write_xref_and_trailer(&mut self, catalog_ref: u32, info_ref: u32) -> Result<()> {
        let xref_offset = self.position;
        let size = self.next_obj_num;

        let mut offsets = vec![None; size as usize];
        for (num, offset) in &self.offsets {
            offsets[*num as usize] = Some(*offset);
        }

        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for entry in offsets.iter().skip(1) {
            match entry {
                Some(offset) => table.push_str(&format!("{:010} 00000 n \n", offset)),
                None => table.push_str("0000000000 65535 f \n"),
            }
        }
        self.write_bytes(table.as_bytes())?;

        let mut trailer = PdfDictionary::new();
        trailer.insert("Size", size);
        trailer.insert("Root", PdfObject::Reference(catalog_ref));
        trailer.insert("Info", PdfObject::Reference(info_ref));

        let mut serializer = PdfSerializer::new(Vec::new());
        serializer.write_dictionary(&trailer)?;
        self.write_bytes(b"trailer\n")?;
        self.write_bytes(&serializer.into_inner())?;
        self.write_bytes(format!("\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes())
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn compress_stream(mut stream: PdfStream) -> Result<PdfStream> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&stream.data)
        .map_err(|e| PdfError::Compression(e.to_string()))?;
    stream.data = encoder
        .finish()
        .map_err(|e| PdfError::Compression(e.to_string()))?;
    stream.encoded = true;
    stream.dict.insert("Filter", PdfObject::name("FlateDecode"));
    Ok(stream)
}

/// Name of the shared image in every page's resources
pub const IMAGE_NAME: &str = "Im0";

/// Writes a document where every page shows a band of one image
pub struct ImageDocumentWriter {
    pub version: PdfVersion,
    pub compress: bool,
    pub info: DocumentInfo,
}

impl ImageDocumentWriter {
    pub fn write<W: Write>(&self, pagination: &Pagination, image: ImageData, writer: W) -> Result<W> {
        if pagination.slices.is_empty() {
            return Err(PdfError::InvalidDocument("No pages to export".to_string()));
        }

        let mut pdf = PdfWriter::new(writer, self.version);
        pdf.set_compression(self.compress);
        pdf.write_header()?;

        let catalog_ref = pdf.allocate_object();
        let pages_ref = pdf.allocate_object();
        let info_ref = pdf.allocate_object();
        let image_ref = pdf.allocate_object();
        let page_refs: Vec<(u32, u32)> = pagination
            .slices
            .iter()
            .map(|_| (pdf.allocate_object(), pdf.allocate_object()))
            .collect();

        pdf.write_object(catalog_ref, &create_catalog(pages_ref).into())?;
        let kids: Vec<u32> = page_refs.iter().map(|(page, _)| *page).collect();
        pdf.write_object(pages_ref, &create_pages(&kids).into())?;
        pdf.write_object(info_ref, &self.info.to_dictionary().into())?;
        pdf.write_stream_object(image_ref, image.to_xobject())?;

        let media_box = MediaBox::for_frame(pagination.frame, pagination.orientation);
        // The image always spans the configured page width
        let image_width = mm_to_pt(pagination.frame.width_mm);
        let image_height = mm_to_pt(pagination.scaled_height_mm);

        for (slice, (page_ref, content_ref)) in pagination.slices.iter().zip(&page_refs) {
            let mut content = ContentStream::new();
            content.clipped_image(
                IMAGE_NAME,
                media_box.width,
                media_box.height,
                image_width,
                image_height,
                mm_to_pt(slice.offset_mm),
            );
            pdf.write_stream_object(*content_ref, PdfStream::new(content.into_bytes()))?;

            let page = ImagePage {
                media_box,
                content_ref: *content_ref,
                image_name: IMAGE_NAME.to_string(),
                image_ref,
            };
            pdf.write_object(*page_ref, &page.to_dictionary(pages_ref).into())?;
        }

        pdf.write_xref_and_trailer(catalog_ref, info_ref)?;
        pdf.finish()
    }

    pub fn write_to_bytes(&self, pagination: &Pagination, image: ImageData) -> Result<Vec<u8>> {
        self.write(pagination, image, Vec::new())
    }
}
