//! Kit Rental QR Scanner CLI

mod navigator;

use clap::{Parser, Subcommand, ValueEnum};
use kit_client::{ClientConfig, HttpRequestDirectory};
use kit_core::source::StaticDirectory;
use kit_core::{RequestDirectory, ScanMode, ScanOutcome, ScanWorkflow, ScannedPayload};
use navigator::PrintNavigator;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "kit-scan")]
#[command(about = "Rental request QR approval and return tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Client configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Approval,
    Return,
}

impl From<ModeArg> for ScanMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Approval => ScanMode::Approval,
            ModeArg::Return => ScanMode::Return,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Kit,
    Component,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse scanned QR text and print the payload
    Parse {
        /// File holding the scanned text (defaults to stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run a scanned QR code through the approval or return workflow
    Scan {
        /// Workflow mode
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// File holding the scanned text (defaults to stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Match against a JSON request list instead of the backend
        #[arg(long)]
        requests: Option<PathBuf>,
    },

    /// Render the QR text for a rental request
    Encode {
        /// Kind of rental
        #[arg(short, long, value_enum, default_value = "kit")]
        kind: KindArg,

        /// Borrower account id
        #[arg(short, long)]
        borrower: String,

        /// Kit or component id
        #[arg(short, long)]
        item: String,

        /// Kit or component display name
        #[arg(short, long)]
        name: Option<String>,

        /// Request status
        #[arg(short, long)]
        status: Option<String>,

        /// Request type (kit rentals only)
        #[arg(long)]
        request_type: Option<String>,
    },

    /// List the candidate pool the backend returns
    Requests {
        /// Only approved requests (the return pool)
        #[arg(long)]
        approved: bool,

        /// Fetch a single request by id
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    match cli.command {
        Commands::Parse { file } => {
            cmd_parse(file.as_deref());
        }
        Commands::Scan { mode, file, requests } => {
            cmd_scan(cli.config.as_deref(), mode.into(), file.as_deref(), requests.as_deref()).await;
        }
        Commands::Encode { kind, borrower, item, name, status, request_type } => {
            cmd_encode(kind, borrower, item, name, status, request_type);
        }
        Commands::Requests { approved, id } => {
            cmd_requests(cli.config.as_deref(), approved, id).await;
        }
    }
}

fn cmd_parse(file: Option<&Path>) {
    let text = read_scan_text(file);

    match kit_core::parse(&text) {
        Some(payload) => print_json(&payload),
        None => {
            let alert = kit_core::Alert::invalid_qr(&text);
            error!("{}", alert);
            std::process::exit(1);
        }
    }
}

async fn cmd_scan(config: Option<&Path>, mode: ScanMode, file: Option<&Path>, requests: Option<&Path>) {
    let text = read_scan_text(file);

    let directory: Box<dyn RequestDirectory> = match requests {
        Some(path) => Box::new(load_static_directory(path)),
        None => Box::new(http_directory(config)),
    };

    let mut workflow = ScanWorkflow::new();
    workflow.start(mode);
    info!("Scanning in {} mode (session {})", mode, workflow.session().id);

    let mut navigator = PrintNavigator::stdout();
    match workflow.handle_scan(&text, directory.as_ref(), &mut navigator).await {
        ScanOutcome::Routed(route) => {
            info!("Opened {} for request {}", route.name(), route.request_id());
        }
        ScanOutcome::Failed(alert) => {
            error!("{}", alert);
            std::process::exit(1);
        }
        ScanOutcome::Ignored | ScanOutcome::Discarded => {
            error!("Scan was not processed");
            std::process::exit(1);
        }
    }
}

fn cmd_encode(
    kind: KindArg,
    borrower: String,
    item: String,
    name: Option<String>,
    status: Option<String>,
    request_type: Option<String>,
) {
    let mut payload = match kind {
        KindArg::Kit => {
            let mut payload = ScannedPayload::kit(borrower, item);
            payload.kit_name = name;
            payload.request_type = request_type;
            payload
        }
        KindArg::Component => {
            let mut payload = ScannedPayload::component(borrower, item);
            payload.component_name = name;
            payload
        }
    };
    payload.status = status;

    // Only emit text the scanner side will accept
    let text = payload.to_qr_text();
    if kit_core::parse(&text).is_none() {
        error!("Borrower and item ids must not be empty");
        std::process::exit(1);
    }
    println!("{}", text);
}

async fn cmd_requests(config: Option<&Path>, approved: bool, id: Option<String>) {
    let directory = http_directory(config);

    if let Some(id) = id {
        match directory.get_request(&id).await {
            Ok(record) => print_json(&record),
            Err(e) => {
                error!("Failed to fetch request {}: {}", id, e);
                std::process::exit(1);
            }
        }
        return;
    }

    let result = if approved {
        directory.fetch_approved_requests().await
    } else {
        directory.fetch_requests().await
    };

    match result {
        Ok(records) => {
            info!("{} requests", records.len());
            print_json(&records);
        }
        Err(e) => {
            error!("Failed to list requests: {}", e);
            std::process::exit(1);
        }
    }
}

fn read_scan_text(file: Option<&Path>) -> String {
    let result = match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map(|_| buf)
        }
    };

    match result {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to read scanned text: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_static_directory(path: &Path) -> StaticDirectory {
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| StaticDirectory::from_json(&json).map_err(|e| e.to_string()));

    match loaded {
        Ok(directory) => directory,
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn http_directory(config: Option<&Path>) -> HttpRequestDirectory {
    let config = match config {
        Some(path) => ClientConfig::from_file(path),
        None => Ok(ClientConfig::default()),
    };

    match config.and_then(HttpRequestDirectory::new) {
        Ok(directory) => directory,
        Err(e) => {
            error!("Invalid client configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            std::process::exit(1);
        }
    }
}
