//! PDF Export Public API

use super::document::DocumentInfo;
use super::images::ImageData;
use super::options::PdfExportOptions;
use super::writer::{ImageDocumentWriter, PdfError, Result};
use export_model::{CaptureResult, ExportArtifact, Pagination};
use std::path::Path;

/// Build the document for a paginated capture.
///
/// The whole file is produced in memory; on error nothing is returned, so a
/// partial artifact can never reach a download sink.
pub fn assemble(
    pagination: &Pagination,
    capture: &CaptureResult,
    options: &PdfExportOptions,
    file_name: &str,
) -> Result<ExportArtifact> {
    pagination
        .frame
        .validate()
        .map_err(|e| PdfError::InvalidDocument(e.to_string()))?;
    if file_name.trim().is_empty() {
        return Err(PdfError::InvalidDocument("Empty file name".to_string()));
    }

    let image = ImageData::encode(&capture.bitmap, capture.encoding)?;
    let image_bytes = image.data.len();

    let info = DocumentInfo {
        title: Some(options.title.clone().unwrap_or_else(|| file_stem(file_name))),
        creator: options.creator.clone(),
        producer: Some(options.producer.clone()),
        creation_date: Some(
            options
                .creation_date
                .unwrap_or_else(|| chrono::Local::now().fixed_offset()),
        ),
    };
    let writer = ImageDocumentWriter {
        version: options.pdf_version.into(),
        compress: options.compress,
        info,
    };
    let bytes = writer.write_to_bytes(pagination, image)?;

    tracing::debug!(
        file_name,
        pages = pagination.page_count(),
        image_bytes,
        total_bytes = bytes.len(),
        "assembled document"
    );
    Ok(ExportArtifact::pdf(file_name, bytes))
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}
