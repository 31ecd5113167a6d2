//! Export error taxonomy

use capture_engine::CaptureError;
use export_model::RenderTarget;
use paginator::PaginateError;
use std::time::Duration;
use store::pdf::PdfError;
use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Render target not found: {0}")]
    TargetNotFound(RenderTarget),

    #[error("Capture has no area: {width}x{height}")]
    EmptyCapture { width: u32, height: u32 },

    #[error("Failed to serialize document: {0}")]
    SerializationFailure(#[from] PdfError),

    #[error("Failed to save artifact: {0}")]
    HostSaveFailure(#[from] StoreError),

    #[error("Invalid page frame: {width_mm}mm x {height_mm}mm")]
    InvalidPageFrame { width_mm: f64, height_mm: f64 },

    #[error("Render did not complete within {0:?}")]
    RenderTimeout(Duration),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;

impl From<CaptureError> for ExportError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::NotFound(target) => ExportError::TargetNotFound(target),
            CaptureError::EmptyCapture { width, height } => {
                ExportError::EmptyCapture { width, height }
            }
            other => ExportError::CaptureFailed(other.to_string()),
        }
    }
}

impl From<PaginateError> for ExportError {
    fn from(err: PaginateError) -> Self {
        match err {
            PaginateError::DegenerateBitmap { width, height } => {
                ExportError::EmptyCapture { width, height }
            }
            PaginateError::InvalidPageFrame {
                width_mm,
                height_mm,
            } => ExportError::InvalidPageFrame {
                width_mm,
                height_mm,
            },
        }
    }
}

impl From<export_model::ModelError> for ExportError {
    fn from(err: export_model::ModelError) -> Self {
        match err {
            export_model::ModelError::InvalidPageFrame {
                width_mm,
                height_mm,
            } => ExportError::InvalidPageFrame {
                width_mm,
                height_mm,
            },
            other => ExportError::CaptureFailed(other.to_string()),
        }
    }
}

impl ExportError {
    /// The one message shown to the user for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::TargetNotFound(_) => {
                "No se pudo encontrar el elemento para generar el PDF."
            }
            ExportError::EmptyCapture { .. } => {
                "No se pudo generar el PDF porque el contenido visual no tiene dimensiones."
            }
            _ => "Error al generar el PDF. Consulte la consola para más detalles.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_errors_map_to_taxonomy() {
        let target = RenderTarget::new("invoice-pdf-content");
        assert!(matches!(
            ExportError::from(CaptureError::NotFound(target.clone())),
            ExportError::TargetNotFound(t) if t == target
        ));
        assert!(matches!(
            ExportError::from(CaptureError::EmptyCapture { width: 0, height: 10 }),
            ExportError::EmptyCapture { width: 0, height: 10 }
        ));
        assert!(matches!(
            ExportError::from(CaptureError::SurfaceAllocation { width: 1, height: 1 }),
            ExportError::CaptureFailed(_)
        ));
    }

    #[test]
    fn test_paginate_errors_map_to_taxonomy() {
        assert!(matches!(
            ExportError::from(PaginateError::DegenerateBitmap { width: 5, height: 0 }),
            ExportError::EmptyCapture { .. }
        ));
        assert!(matches!(
            ExportError::from(PaginateError::InvalidPageFrame {
                width_mm: 0.0,
                height_mm: 297.0
            }),
            ExportError::InvalidPageFrame { .. }
        ));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ExportError::TargetNotFound(RenderTarget::new("x")).user_message(),
            "No se pudo encontrar el elemento para generar el PDF."
        );
        assert_eq!(
            ExportError::EmptyCapture { width: 0, height: 0 }.user_message(),
            "No se pudo generar el PDF porque el contenido visual no tiene dimensiones."
        );
        assert_eq!(
            ExportError::RenderTimeout(Duration::from_secs(10)).user_message(),
            "Error al generar el PDF. Consulte la consola para más detalles."
        );
    }
}
