//! Export Orchestrator
//!
//! Runs capture, pagination, assembly and save for one target. Each target
//! has its own [`ExportState`]; a request for a target that is already
//! exporting is answered with [`ExportOutcome::AlreadyInFlight`].

use crate::error::{ExportError, Result};
use capture_engine::{CaptureEngine, RenderHost};
use export_model::{
    ArtifactDescriptor, ExportState, FidelityTier, Orientation, PageFrame, RenderTarget,
    DEFAULT_JPEG_QUALITY,
};
use perf::{ExportOutcomeKind, Stage, StageTimer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use store::pdf::{assemble, PdfExportOptions};
use store::{DownloadSink, ExportSettings};
use tracing::Instrument;
use uuid::Uuid;

/// Run-wide export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub page_frame: PageFrame,
    pub high_scale: f32,
    pub low_scale: f32,
    pub jpeg_quality: u8,
    pub pdf: PdfExportOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_frame: PageFrame::A4,
            high_scale: FidelityTier::High.default_scale(),
            low_scale: FidelityTier::Low.default_scale(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            pdf: PdfExportOptions::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self {
            page_frame: settings.page_frame,
            high_scale: settings.scale_for(FidelityTier::High),
            low_scale: settings.scale_for(FidelityTier::Low),
            jpeg_quality: settings.jpeg_quality,
            pdf: PdfExportOptions::default()
                .with_producer(settings.producer.clone())
                .with_compression(settings.compress),
        }
    }

    pub fn scale_for(&self, tier: FidelityTier) -> f32 {
        match tier {
            FidelityTier::High => self.high_scale,
            FidelityTier::Low => self.low_scale,
        }
    }
}

/// What a finished export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub export_id: Uuid,
    pub tier: FidelityTier,
    pub pages: usize,
    pub orientation: Orientation,
    pub artifact: ArtifactDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Exported(ExportReport),
    /// The target was already exporting; nothing was produced
    AlreadyInFlight,
}

impl ExportOutcome {
    pub fn report(&self) -> Option<&ExportReport> {
        match self {
            ExportOutcome::Exported(report) => Some(report),
            ExportOutcome::AlreadyInFlight => None,
        }
    }
}

/// Final file name: tier suffix before the extension, `.pdf` ensured.
///
/// `("Cuenta de Cobro-7 ACME.pdf", Low)` gives
/// `"Cuenta de Cobro-7 ACME-Web.pdf"`.
pub fn output_file_name(base: &str, tier: FidelityTier) -> String {
    let base = base.trim();
    let stem = match base.len().checked_sub(4) {
        Some(split) if base.is_char_boundary(split) && base[split..].eq_ignore_ascii_case(".pdf") => {
            &base[..split]
        }
        _ => base,
    };
    format!("{}{}.pdf", stem, tier.file_suffix())
}

/// Public entry point of the export pipeline
pub struct ExportOrchestrator<S> {
    host: Arc<dyn RenderHost>,
    engine: Arc<CaptureEngine>,
    sink: Arc<S>,
    config: ExportConfig,
    states: Mutex<HashMap<RenderTarget, ExportState>>,
}

impl<S: DownloadSink> ExportOrchestrator<S> {
    pub fn new(
        host: Arc<dyn RenderHost>,
        engine: Arc<CaptureEngine>,
        sink: Arc<S>,
        config: ExportConfig,
    ) -> Self {
        Self {
            host,
            engine,
            sink,
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn host(&self) -> &Arc<dyn RenderHost> {
        &self.host
    }

    pub fn engine(&self) -> &Arc<CaptureEngine> {
        &self.engine
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Current state of `target`
    pub fn state(&self, target: &RenderTarget) -> ExportState {
        self.with_states(|states| states.get(target).copied().unwrap_or_default())
    }

    pub fn is_in_flight(&self, target: &RenderTarget) -> bool {
        self.state(target).is_in_flight()
    }

    fn with_states<R>(&self, f: impl FnOnce(&mut HashMap<RenderTarget, ExportState>) -> R) -> R {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut states)
    }

    /// Enter `Capturing` unless an export is already running
    fn try_begin(&self, target: &RenderTarget) -> bool {
        self.with_states(|states| {
            let state = states.entry(target.clone()).or_default();
            if state.accepts_new_export() {
                *state = ExportState::Capturing;
                true
            } else {
                false
            }
        })
    }

    fn transition(&self, target: &RenderTarget, next: ExportState) {
        self.with_states(|states| {
            let state = states.entry(target.clone()).or_default();
            if state.can_transition_to(next) {
                *state = next;
            } else {
                tracing::warn!(%target, from = %state, to = %next, "ignored state transition");
            }
        });
    }

    /// Export `target` as a PDF named after `file_name`.
    ///
    /// Failures are logged and returned; the target ends in `Failed` and no
    /// artifact is saved.
    pub async fn export_document(
        &self,
        target: &RenderTarget,
        file_name: &str,
        tier: FidelityTier,
    ) -> Result<ExportOutcome> {
        if !self.try_begin(target) {
            tracing::debug!(%target, "export already in flight");
            record_outcome(ExportOutcomeKind::Skipped, 0, 0);
            return Ok(ExportOutcome::AlreadyInFlight);
        }

        let export_id = Uuid::new_v4();
        let span = tracing::info_span!("export", %target, %tier, %export_id);
        let result = self
            .run(target, file_name, tier, export_id)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match result {
            Ok(report) => {
                self.transition(target, ExportState::Done);
                record_outcome(
                    ExportOutcomeKind::Completed,
                    report.pages,
                    report.artifact.byte_len,
                );
                tracing::info!(
                    file = %report.artifact.name,
                    pages = report.pages,
                    bytes = report.artifact.byte_len,
                    "export complete"
                );
                Ok(ExportOutcome::Exported(report))
            }
            Err(e) => {
                self.transition(target, ExportState::Failed);
                record_outcome(ExportOutcomeKind::Failed, 0, 0);
                tracing::error!(error = %e, message = e.user_message(), "export failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        target: &RenderTarget,
        file_name: &str,
        tier: FidelityTier,
        export_id: Uuid,
    ) -> Result<ExportReport> {
        let _total = StageTimer::new(Stage::Export);
        tokio::task::yield_now().await;

        if target.is_blank() {
            return Err(ExportError::TargetNotFound(target.clone()));
        }
        self.config.page_frame.validate()?;

        let scale = self.config.scale_for(tier);
        let encoding = tier.encoding(self.config.jpeg_quality);
        let capture = {
            let _timer = StageTimer::new(Stage::Capture);
            self.engine.capture(self.host.as_ref(), target, scale, encoding)?
        };
        tracing::debug!(
            width = capture.width(),
            height = capture.height(),
            scale,
            "capture stage done"
        );
        self.transition(target, ExportState::Paginating);
        tokio::task::yield_now().await;

        let pagination = {
            let _timer = StageTimer::new(Stage::Paginate);
            paginator::paginate(capture.width(), capture.height(), self.config.page_frame)?
        };
        tracing::debug!(
            pages = pagination.page_count(),
            orientation = ?pagination.orientation,
            scaled_height_mm = pagination.scaled_height_mm,
            "paginate stage done"
        );
        self.transition(target, ExportState::Assembling);
        tokio::task::yield_now().await;

        let name = output_file_name(file_name, tier);
        let artifact = {
            let _timer = StageTimer::new(Stage::Assemble);
            assemble(&pagination, &capture, &self.config.pdf, &name)?
        };
        drop(capture);
        tracing::debug!(bytes = artifact.len(), "assemble stage done");
        tokio::task::yield_now().await;

        let descriptor = {
            let _timer = StageTimer::new(Stage::Save);
            self.sink.save(artifact).await?
        };

        Ok(ExportReport {
            export_id,
            tier,
            pages: pagination.page_count(),
            orientation: pagination.orientation,
            artifact: descriptor,
        })
    }
}

fn record_outcome(outcome: ExportOutcomeKind, pages: usize, bytes: usize) {
    if let Ok(mut metrics) = perf::global_metrics().lock() {
        metrics.record_outcome(outcome, pages, bytes);
    }
}
