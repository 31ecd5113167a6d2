//! Wiring of settings, fonts, page and sink for one CLI run

use anyhow::Context;
use capture_engine::{CaptureEngine, CapturePng, FileResourceLoader, FontBook, SceneRegistry};
use export_model::FidelityTier;
use export_service::page::{InvoicePage, JsonDirectorySource, PageSession};
use export_service::{ExportConfig, ExportError, ExportOrchestrator, ExportOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::{DirectorySink, ExportSettings, SettingsManager};

pub struct AppOptions {
    pub data_dir: PathBuf,
    /// Defaults to the data directory
    pub config_dir: Option<PathBuf>,
    /// Overrides `outputDir` from the settings file
    pub output_dir: Option<PathBuf>,
}

pub struct App {
    settings: ExportSettings,
    page: InvoicePage<JsonDirectorySource, DirectorySink>,
}

impl App {
    pub async fn build(options: AppOptions) -> anyhow::Result<Self> {
        let config_dir = options
            .config_dir
            .clone()
            .unwrap_or_else(|| options.data_dir.clone());
        let manager = SettingsManager::new(&config_dir);
        let mut settings = manager
            .load()
            .await
            .with_context(|| format!("loading {}", manager.settings_path().display()))?;
        if let Some(out) = options.output_dir {
            settings.output_dir = out;
        }
        tracing::info!(
            config = %config_dir.display(),
            output = %settings.output_dir.display(),
            "settings loaded"
        );

        tokio::fs::create_dir_all(&settings.output_dir)
            .await
            .with_context(|| format!("creating {}", settings.output_dir.display()))?;

        let fonts = match &settings.font_path {
            Some(path) => FontBook::from_file(path)
                .with_context(|| format!("loading font {}", path.display()))?,
            None => FontBook::system(),
        };
        let loader = FileResourceLoader::with_base_dir(options.data_dir.clone());
        let engine = Arc::new(CaptureEngine::new(Arc::new(fonts), Arc::new(loader)));

        let registry = Arc::new(SceneRegistry::new());
        let orchestrator = Arc::new(ExportOrchestrator::new(
            registry.clone(),
            engine,
            Arc::new(DirectorySink::new(settings.output_dir.clone())),
            ExportConfig::from_settings(&settings),
        ));
        let page = InvoicePage::new(
            JsonDirectorySource::new(options.data_dir),
            registry,
            orchestrator,
            settings.render_ready_timeout(),
        );

        Ok(Self { settings, page })
    }

    /// Export one invoice at `tier`. Errors carry the user-facing message.
    pub async fn export(
        &self,
        invoice_id: &str,
        tier: FidelityTier,
        dump_capture: Option<&Path>,
    ) -> Result<(), String> {
        let session = self.open_session(&format!("/invoices/{}/pdf", invoice_id)).await?;
        let result = self.export_session(&session, tier, dump_capture).await;
        self.page.close();
        result
    }

    async fn export_session(
        &self,
        session: &PageSession,
        tier: FidelityTier,
        dump_capture: Option<&Path>,
    ) -> Result<(), String> {
        if let Some(path) = dump_capture {
            self.dump_capture(tier, path).map_err(|e| format!("{e:#}"))?;
        }

        let outcome = self
            .page
            .export(session, tier)
            .await
            .map_err(|e| e.user_message().to_string())?;
        print_outcome(&outcome);
        Ok(())
    }

    /// Open a page location and run its automatic download, if requested
    pub async fn open(&self, location: &str) -> Result<(), String> {
        let session = self.open_session(location).await?;
        let result = if session.trigger.is_requested() {
            self.page
                .auto_export(&session)
                .await
                .map(|outcome| {
                    if let Some(outcome) = outcome {
                        print_outcome(&outcome);
                    }
                })
                .map_err(|e| e.user_message().to_string())
        } else {
            println!("{} (sin descarga automática)", session.file_name);
            Ok(())
        };
        self.page.close();
        result
    }

    async fn open_session(&self, location: &str) -> Result<PageSession, String> {
        self.page
            .open(location)
            .await
            .map_err(|e| e.user_message().to_string())
    }

    fn dump_capture(&self, tier: FidelityTier, path: &Path) -> anyhow::Result<()> {
        let orchestrator = self.page.orchestrator();
        let capture = orchestrator.engine().capture(
            orchestrator.host().as_ref(),
            self.page.target(),
            self.settings.scale_for(tier),
            tier.encoding(self.settings.jpeg_quality),
        )
        .map_err(|e| anyhow::anyhow!(ExportError::from(e).user_message()))?;
        let png = capture.to_png().context("encoding capture as PNG")?;
        std::fs::write(path, png)
            .with_context(|| format!("writing capture to {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            width = capture.width(),
            height = capture.height(),
            "capture written"
        );
        Ok(())
    }
}

fn print_outcome(outcome: &ExportOutcome) {
    match outcome {
        ExportOutcome::Exported(report) => {
            let location = report
                .artifact
                .location
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| report.artifact.name.clone());
            println!(
                "{} ({} página(s), {} bytes)",
                location, report.pages, report.artifact.byte_len
            );
        }
        ExportOutcome::AlreadyInFlight => {
            println!("Exportación en curso, solicitud ignorada");
        }
    }
}

pub fn print_metrics() {
    let metrics = perf::global_metrics()
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let summary = metrics.summary();
    match summary.to_json() {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", summary),
    }
}
