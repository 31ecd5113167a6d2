//! PDF Document Structure
//!
//! Catalog, page tree, image pages and the info dictionary.

use super::objects::{PdfDictionary, PdfObject};
use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use export_model::{mm_to_pt, Orientation, PageFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfVersion {
    V1_4,
    #[default]
    V1_7,
}

impl PdfVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

/// Info dictionary contents
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
}

impl DocumentInfo {
    pub fn to_dictionary(&self) -> PdfDictionary {
        let mut dict = PdfDictionary::new();
        if let Some(title) = &self.title {
            dict.insert("Title", PdfObject::text(title));
        }
        if let Some(creator) = &self.creator {
            dict.insert("Creator", PdfObject::text(creator));
        }
        if let Some(producer) = &self.producer {
            dict.insert("Producer", PdfObject::text(producer));
        }
        if let Some(date) = &self.creation_date {
            dict.insert("CreationDate", PdfObject::text(&pdf_date(date)));
        }
        dict
    }
}

/// Format a timestamp as a PDF date string, `D:YYYYMMDDHHmmSS+HH'mm'`
pub fn pdf_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let offset_secs = date.offset().fix().local_minus_utc();
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let minutes = offset_secs.abs() / 60;
    format!(
        "D:{}{}{:02}'{:02}'",
        date.format("%Y%m%d%H%M%S"),
        sign,
        minutes / 60,
        minutes % 60
    )
}

/// Page box in points, origin at lower-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub width: f64,
    pub height: f64,
}

impl MediaBox {
    /// Box for `frame` laid out in `orientation`
    pub fn for_frame(frame: PageFrame, orientation: Orientation) -> Self {
        let oriented = frame.oriented(orientation);
        Self {
            width: mm_to_pt(oriented.width_mm),
            height: mm_to_pt(oriented.height_mm),
        }
    }

    pub fn to_array(&self) -> PdfObject {
        PdfObject::reals(&[0.0, 0.0, self.width, self.height])
    }
}

/// A page that paints one shared image XObject
#[derive(Debug, Clone)]
pub struct ImagePage {
    pub media_box: MediaBox,
    pub content_ref: u32,
    pub image_name: String,
    pub image_ref: u32,
}

impl ImagePage {
    pub fn to_dictionary(&self, parent_ref: u32) -> PdfDictionary {
        let mut xobjects = PdfDictionary::new();
        xobjects.insert(self.image_name.clone(), PdfObject::Reference(self.image_ref));

        let mut resources = PdfDictionary::new();
        resources.insert("XObject", xobjects);
        resources.insert(
            "ProcSet",
            PdfObject::Array(vec![PdfObject::name("PDF"), PdfObject::name("ImageC")]),
        );

        let mut dict = PdfDictionary::typed("Page");
        dict.insert("Parent", PdfObject::Reference(parent_ref));
        dict.insert("MediaBox", self.media_box.to_array());
        dict.insert("Resources", resources);
        dict.insert("Contents", PdfObject::Reference(self.content_ref));
        dict
    }
}

pub fn create_catalog(pages_ref: u32) -> PdfDictionary {
    let mut dict = PdfDictionary::typed("Catalog");
    dict.insert("Pages", PdfObject::Reference(pages_ref));
    dict
}

/// Page tree root
pub fn create_pages(page_refs: &[u32]) -> PdfDictionary {
    let mut dict = PdfDictionary::typed("Pages");
    dict.insert(
        "Kids",
        PdfObject::Array(page_refs.iter().map(|r| PdfObject::Reference(*r)).collect()),
    );
    dict.insert("Count", page_refs.len() as i64);
    dict
}
