//! invoice-export - Export invoices to PDF from the command line

mod app;

use app::{App, AppOptions};
use clap::{Parser, Subcommand};
use export_model::FidelityTier;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "invoice-export")]
#[command(version, about = "Export invoices to PDF", long_about = None)]
#[command(after_help = "EXAMPLES:
    invoice-export export --data ./data --invoice 42            Print-quality PDF
    invoice-export export --data ./data --invoice 42 --tier low Email-weight PDF
    invoice-export open --data ./data \"/invoices/42/pdf?download=true\"")]
struct Cli {
    /// Directory holding invoices/, clients/ and settings.json
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    data: PathBuf,

    /// Directory holding export-settings.json
    #[arg(long, global = true, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Write PDFs here instead of the configured output directory
    #[arg(long, global = true, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Print stage timings and export counters when done
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export one invoice
    Export {
        /// Invoice id
        #[arg(long, value_name = "ID")]
        invoice: String,

        /// Fidelity tier: high (print) or low (web)
        #[arg(long, default_value = "high")]
        tier: FidelityTier,

        /// Also write the raw capture as a PNG
        #[arg(long, value_name = "FILE")]
        dump_capture: Option<PathBuf>,
    },
    /// Open an invoice page location, downloading when it asks for it
    Open {
        /// Page location, e.g. /invoices/42/pdf?download=true
        #[arg(value_name = "LOCATION")]
        location: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let options = AppOptions {
        data_dir: cli.data,
        config_dir: cli.config,
        output_dir: cli.out,
    };
    let app = match App::build(options).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Export {
            invoice,
            tier,
            dump_capture,
        } => app.export(&invoice, tier, dump_capture.as_deref()).await,
        Command::Open { location } => app.open(&location).await,
    };

    if cli.metrics {
        app::print_metrics();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
