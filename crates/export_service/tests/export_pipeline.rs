//! End-to-end export scenarios

use capture_engine::{CaptureEngine, Color, FileResourceLoader, FontBook, Rect, Scene, SceneRegistry};
use export_model::{ExportState, FidelityTier, Orientation, RenderTarget};
use export_service::page::{InvoicePage, JsonDirectorySource, PageError};
use export_service::{
    AutoExportTrigger, ExportConfig, ExportError, ExportOrchestrator, ExportOutcome,
    NavigationQuery, PageReadiness,
};
use std::sync::Arc;
use std::time::Duration;
use store::{DirectorySink, DownloadSink, MemorySink};
use tempfile::TempDir;

fn engine() -> Arc<CaptureEngine> {
    Arc::new(CaptureEngine::new(
        Arc::new(FontBook::empty()),
        Arc::new(FileResourceLoader::new()),
    ))
}

fn orchestrator<S: DownloadSink>(registry: &Arc<SceneRegistry>, sink: S) -> ExportOrchestrator<S> {
    ExportOrchestrator::new(
        registry.clone(),
        engine(),
        Arc::new(sink),
        ExportConfig::default(),
    )
}

/// A sheet of `width` x `height` CSS pixels with a header band
fn sheet(width: f32, height: f32) -> Scene {
    let mut scene = Scene::new(width, height).with_background(Color::WHITE);
    scene.fill_rect(Rect::new(0.0, 0.0, width, 40.0), Color::rgb(30, 64, 175));
    scene
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

#[tokio::test]
async fn single_page_portrait_export() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    // 1000x1400 device pixels at the high tier
    registry.attach(&target, sheet(500.0, 700.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let outcome = orchestrator
        .export_document(&target, "Cuenta de Cobro-1 ACME.pdf", FidelityTier::High)
        .await
        .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.pages, 1);
    assert_eq!(report.orientation, Orientation::Portrait);

    let artifacts = orchestrator.sink().artifacts();
    assert_eq!(artifacts.len(), 1);
    let pdf = &artifacts[0].bytes;
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(contains(pdf, "/Count 1"));
    assert!(contains(pdf, "/Filter /FlateDecode"));
    assert!(contains(pdf, "/Width 1000"));
    assert!(contains(pdf, "/Height 1400"));
}

#[tokio::test]
async fn tall_capture_spans_two_pages() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    // 1000x2000 device pixels: 420mm at A4 width
    registry.attach(&target, sheet(500.0, 1000.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let outcome = orchestrator
        .export_document(&target, "largo.pdf", FidelityTier::High)
        .await
        .unwrap();

    assert_eq!(outcome.report().unwrap().pages, 2);
    let pdf = &orchestrator.sink().artifacts()[0].bytes;
    assert!(contains(pdf, "/Count 2"));
    // One image shared by both pages
    assert_eq!(
        pdf.windows(b"/Subtype /Image".len())
            .filter(|w| *w == b"/Subtype /Image")
            .count(),
        1
    );
}

#[tokio::test]
async fn wide_capture_is_landscape() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("wide");
    registry.attach(&target, sheet(1000.0, 300.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let outcome = orchestrator
        .export_document(&target, "ancho.pdf", FidelityTier::High)
        .await
        .unwrap();

    assert_eq!(outcome.report().unwrap().orientation, Orientation::Landscape);
    let pdf = &orchestrator.sink().artifacts()[0].bytes;
    assert!(contains(pdf, "/MediaBox [0 0 841.8898 595.2756]"));
}

#[tokio::test]
async fn low_tier_embeds_jpeg_with_web_suffix() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(500.0, 700.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let outcome = orchestrator
        .export_document(&target, "Cuenta de Cobro-1 ACME.pdf", FidelityTier::Low)
        .await
        .unwrap();

    assert_eq!(
        outcome.report().unwrap().artifact.name,
        "Cuenta de Cobro-1 ACME-Web.pdf"
    );
    let pdf = &orchestrator.sink().artifacts()[0].bytes;
    assert!(contains(pdf, "/Filter /DCTDecode"));
    // Scale 1.0 for the low tier
    assert!(contains(pdf, "/Width 500"));
}

#[tokio::test]
async fn rapid_second_export_is_a_no_op() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(500.0, 700.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let (first, second) = tokio::join!(
        orchestrator.export_document(&target, "a.pdf", FidelityTier::High),
        orchestrator.export_document(&target, "a.pdf", FidelityTier::High),
    );

    assert!(matches!(first.unwrap(), ExportOutcome::Exported(_)));
    assert_eq!(second.unwrap(), ExportOutcome::AlreadyInFlight);
    assert_eq!(orchestrator.sink().len(), 1);
    assert_eq!(orchestrator.state(&target), ExportState::Done);
}

#[tokio::test]
async fn different_targets_export_independently() {
    let registry = Arc::new(SceneRegistry::new());
    let a = RenderTarget::new("a");
    let b = RenderTarget::new("b");
    registry.attach(&a, sheet(200.0, 200.0));
    registry.attach(&b, sheet(200.0, 200.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let (first, second) = tokio::join!(
        orchestrator.export_document(&a, "a.pdf", FidelityTier::Low),
        orchestrator.export_document(&b, "b.pdf", FidelityTier::Low),
    );

    assert!(first.unwrap().report().is_some());
    assert!(second.unwrap().report().is_some());
    assert_eq!(orchestrator.sink().len(), 2);
}

#[tokio::test]
async fn detached_target_fails_without_artifact() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(500.0, 700.0));
    registry.detach(&target);
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let result = orchestrator
        .export_document(&target, "a.pdf", FidelityTier::High)
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, ExportError::TargetNotFound(_)));
    assert_eq!(
        err.user_message(),
        "No se pudo encontrar el elemento para generar el PDF."
    );
    assert!(orchestrator.sink().is_empty());
    assert_eq!(orchestrator.state(&target), ExportState::Failed);
}

#[tokio::test]
async fn zero_height_scene_is_empty_capture() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("empty");
    registry.attach(&target, Scene::new(500.0, 0.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let result = orchestrator
        .export_document(&target, "a.pdf", FidelityTier::High)
        .await;

    assert!(matches!(result, Err(ExportError::EmptyCapture { .. })));
    assert!(orchestrator.sink().is_empty());
}

#[tokio::test]
async fn failed_save_leaves_no_file() {
    let out = TempDir::new().unwrap();
    // A directory where the document should go makes the save fail
    std::fs::create_dir(out.path().join("a.pdf")).unwrap();

    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(100.0, 140.0));
    let orchestrator = orchestrator(&registry, DirectorySink::new(out.path()));

    let result = orchestrator
        .export_document(&target, "a.pdf", FidelityTier::High)
        .await;

    assert!(matches!(result, Err(ExportError::HostSaveFailure(_))));
    let entries: Vec<_> = std::fs::read_dir(out.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert!(out.path().join("a.pdf").is_dir());
    assert_eq!(orchestrator.state(&target), ExportState::Failed);
}

#[tokio::test(start_paused = true)]
async fn auto_export_waits_for_render_and_fires_once() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(100.0, 140.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());
    let trigger = AutoExportTrigger::new(
        &NavigationQuery::parse("download=true"),
        Duration::from_secs(10),
    );

    let painter = {
        let registry = registry.clone();
        let target = target.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            registry.present(&target)
        }
    };
    let (outcome, pass) = tokio::join!(
        trigger.fire(PageReadiness::loaded(), &orchestrator, &target, "a.pdf"),
        painter,
    );

    assert_eq!(pass, Some(1));
    let outcome = outcome.unwrap().unwrap();
    assert_eq!(outcome.report().unwrap().tier, FidelityTier::High);
    assert!(trigger.has_fired());

    // Inputs still satisfied: no second export
    let again = trigger
        .fire(PageReadiness::loaded(), &orchestrator, &target, "a.pdf")
        .await
        .unwrap();
    assert!(again.is_none());
    assert_eq!(orchestrator.sink().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn auto_export_times_out_without_render() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(100.0, 140.0));
    let orchestrator = orchestrator(&registry, MemorySink::new());
    let trigger = AutoExportTrigger::new(&NavigationQuery { download: true }, Duration::from_secs(10));

    let result = trigger
        .fire(PageReadiness::loaded(), &orchestrator, &target, "a.pdf")
        .await;

    assert!(matches!(result, Err(ExportError::RenderTimeout(_))));
    assert!(orchestrator.sink().is_empty());
}

#[tokio::test]
async fn auto_export_not_requested_or_not_ready() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(100.0, 140.0));
    registry.present(&target);
    let orchestrator = orchestrator(&registry, MemorySink::new());

    let idle = AutoExportTrigger::new(&NavigationQuery::parse("download=false"), Duration::from_secs(1));
    let result = idle
        .fire(PageReadiness::loaded(), &orchestrator, &target, "a.pdf")
        .await
        .unwrap();
    assert!(result.is_none());

    let armed = AutoExportTrigger::new(&NavigationQuery { download: true }, Duration::from_secs(1));
    let loading = PageReadiness {
        loading: true,
        ..PageReadiness::loaded()
    };
    assert!(armed
        .fire(loading, &orchestrator, &target, "a.pdf")
        .await
        .unwrap()
        .is_none());
    // Still armed once the page is ready
    assert!(!armed.has_fired());
    assert!(armed
        .fire(PageReadiness::loaded(), &orchestrator, &target, "a.pdf")
        .await
        .unwrap()
        .is_some());
    assert_eq!(orchestrator.sink().len(), 1);
}

#[tokio::test]
async fn auto_export_defers_while_manual_export_runs() {
    let registry = Arc::new(SceneRegistry::new());
    let target = RenderTarget::new("invoice-pdf-content");
    registry.attach(&target, sheet(100.0, 140.0));
    registry.present(&target);
    let orchestrator = orchestrator(&registry, MemorySink::new());
    let trigger = AutoExportTrigger::new(&NavigationQuery { download: true }, Duration::from_secs(1));

    let (manual, auto) = tokio::join!(
        orchestrator.export_document(&target, "manual.pdf", FidelityTier::Low),
        trigger.fire(PageReadiness::loaded(), &orchestrator, &target, "auto.pdf"),
    );

    assert!(manual.unwrap().report().is_some());
    assert!(auto.unwrap().is_none());
    assert!(!trigger.has_fired());
    assert_eq!(orchestrator.sink().len(), 1);
}

fn write_backend(root: &std::path::Path) {
    std::fs::create_dir_all(root.join("invoices")).unwrap();
    std::fs::create_dir_all(root.join("clients")).unwrap();
    std::fs::write(
        root.join("invoices/1.json"),
        r#"{
            "id": "1",
            "invoiceNumber": "0042",
            "date": "2025-11-20",
            "clientId": "c1",
            "lineItems": [
                { "id": "l1", "description": "Desarrollo", "quantity": 10, "unit": "HORAS", "unitPrice": 12000 }
            ]
        }"#,
    )
    .unwrap();
    std::fs::write(
        root.join("clients/c1.json"),
        r#"{ "id": "c1", "nitOrCc": "900.1", "name": "ACME SAS", "city": "Cali", "phone": "1", "address": "Cra 1" }"#,
    )
    .unwrap();
}

#[tokio::test]
async fn invoice_page_auto_downloads_once() {
    let backend = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_backend(backend.path());

    let registry = Arc::new(SceneRegistry::new());
    let orchestrator = Arc::new(orchestrator(&registry, DirectorySink::new(out.path())));
    let page = InvoicePage::new(
        JsonDirectorySource::new(backend.path()),
        registry.clone(),
        orchestrator.clone(),
        Duration::from_secs(10),
    );

    let session = page.open("/invoices/1/pdf?download=true").await.unwrap();
    assert_eq!(session.file_name, "Cuenta de Cobro-0042 ACME SAS.pdf");
    // No settings.json: placeholder sender profile
    assert_eq!(session.loaded.sender.signature_name, "Nombre del Firmante");

    let outcome = page.auto_export(&session).await.unwrap().unwrap();
    let location = outcome.report().unwrap().artifact.location.clone().unwrap();
    assert!(std::fs::read(&location).unwrap().starts_with(b"%PDF-"));

    assert!(page.auto_export(&session).await.unwrap().is_none());

    let manual = page.export(&session, FidelityTier::Low).await.unwrap();
    assert_eq!(
        manual.report().unwrap().artifact.name,
        "Cuenta de Cobro-0042 ACME SAS-Web.pdf"
    );
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 2);

    page.close();
    let closed = page.export(&session, FidelityTier::High).await;
    assert!(matches!(closed, Err(ExportError::TargetNotFound(_))));
}

#[tokio::test]
async fn invoice_page_reports_missing_invoice() {
    let backend = TempDir::new().unwrap();
    let registry = Arc::new(SceneRegistry::new());
    let orchestrator = Arc::new(orchestrator(&registry, MemorySink::new()));
    let page = InvoicePage::new(
        JsonDirectorySource::new(backend.path()),
        registry,
        orchestrator,
        Duration::from_secs(10),
    );

    let err = page.open("/invoices/99/pdf").await.unwrap_err();
    assert_eq!(err.user_message(), "Factura no encontrada.");

    let err = page.open("/").await.unwrap_err();
    assert_eq!(err.user_message(), "Falta el ID de la factura.");
}

#[tokio::test]
async fn invoice_page_without_client_shows_no_sheet_and_exports_nothing() {
    let backend = TempDir::new().unwrap();
    std::fs::create_dir_all(backend.path().join("invoices")).unwrap();
    std::fs::write(
        backend.path().join("invoices/5.json"),
        r#"{ "id": "5", "invoiceNumber": "5", "date": "2025-03-01", "clientId": "gone" }"#,
    )
    .unwrap();

    let registry = Arc::new(SceneRegistry::new());
    let orchestrator = Arc::new(orchestrator(&registry, MemorySink::new()));
    let page = InvoicePage::new(
        JsonDirectorySource::new(backend.path()),
        registry.clone(),
        orchestrator.clone(),
        Duration::from_secs(10),
    );

    let err = page.open("/invoices/5/pdf?download=true").await.unwrap_err();
    assert!(matches!(err, PageError::ClientUnavailable(ref id) if id == "5"));
    assert_eq!(
        err.user_message(),
        "Datos de factura o cliente no disponibles. Verifique que la factura y el cliente asociado existan."
    );
    assert!(!registry.is_attached(page.target()));

    let result = orchestrator
        .export_document(page.target(), "Cuenta de Cobro-5 Cliente.pdf", FidelityTier::High)
        .await;
    assert!(matches!(result, Err(ExportError::TargetNotFound(_))));
    assert!(orchestrator.sink().is_empty());
}

#[tokio::test]
async fn invoice_page_falls_back_to_embedded_client() {
    let backend = TempDir::new().unwrap();
    std::fs::create_dir_all(backend.path().join("invoices")).unwrap();
    std::fs::write(
        backend.path().join("invoices/6.json"),
        r#"{
            "id": "6",
            "invoiceNumber": "6",
            "date": "2025-03-01",
            "clientId": "gone",
            "client": { "id": "gone", "name": "Panadería Sol" }
        }"#,
    )
    .unwrap();

    let registry = Arc::new(SceneRegistry::new());
    let orchestrator = Arc::new(orchestrator(&registry, MemorySink::new()));
    let page = InvoicePage::new(
        JsonDirectorySource::new(backend.path()),
        registry,
        orchestrator,
        Duration::from_secs(10),
    );

    let session = page.open("/invoices/6/pdf").await.unwrap();
    assert_eq!(session.loaded.client.name, "Panadería Sol");
    assert_eq!(session.file_name, "Cuenta de Cobro-6 Panadería Sol.pdf");
}
