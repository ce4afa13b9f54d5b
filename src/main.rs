use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use sop_indexer::{
    config,
    extraction::LayoutFileOpener,
    logging,
    pipeline::{IndexOptions, IndexingService, PageWindow},
    store::{MemoryStore, SqliteStore},
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "sop-indexer",
    about = "Index SOP service-standard PDFs into a record store"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index PDF files, or every PDF under the given directories.
    Index {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        scan: ScanArgs,
        /// Remove records written by an earlier run of the same document first.
        #[arg(long)]
        replace: bool,
        /// SQLite database file; overrides SOP_DATABASE_PATH.
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Scan one PDF without touching the database and print its records.
    Inspect {
        pdf: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// First page to scan (1-based, inclusive).
    #[arg(long)]
    start_page: Option<usize>,
    /// Last page to scan (1-based, inclusive).
    #[arg(long)]
    end_page: Option<usize>,
    /// Prefix of generated record codes.
    #[arg(long)]
    code_prefix: Option<String>,
}

impl ScanArgs {
    fn apply(self, options: &mut IndexOptions) -> Result<()> {
        if self.start_page.is_some() || self.end_page.is_some() {
            let start = self.start_page.unwrap_or(options.window.start());
            let end = self.end_page.or(options.window.end());
            options.window = PageWindow::new(start, end)?;
        }
        if let Some(prefix) = self.code_prefix {
            options.code_prefix = prefix;
        }
        Ok(())
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    // Loaded before tracing so RUST_LOG and the log file path may come from `.env`.
    dotenvy::dotenv().ok();
    // Inspect output is meant to be read, so only problems reach stderr.
    logging::init_tracing(match cli.command {
        Command::Index { .. } => "info",
        Command::Inspect { .. } => "warn",
    });
    let config = config::init_config().context("failed to load configuration")?;
    let mut options = IndexOptions::from_config(config)?;

    match cli.command {
        Command::Index {
            paths,
            scan,
            replace,
            database,
        } => {
            scan.apply(&mut options)?;
            options.replace = replace;
            let database = config.database_path_or(database)?;
            index(&paths, &database, options)
        }
        Command::Inspect { pdf, scan } => {
            scan.apply(&mut options)?;
            inspect(&pdf, options)
        }
    }
}

fn index(paths: &[PathBuf], database: &Path, options: IndexOptions) -> Result<()> {
    let documents = collect_documents(paths);
    if documents.is_empty() {
        bail!("no PDF documents found");
    }
    let store = SqliteStore::open(database)
        .with_context(|| format!("failed to open database {}", database.display()))?;
    tracing::info!(
        documents = documents.len(),
        database = %database.display(),
        "Starting batch"
    );

    let mut service = IndexingService::new(Box::new(LayoutFileOpener), store, options);
    let reports = service.index_batch(&documents);
    let failed = reports.iter().filter(|report| !report.succeeded()).count();
    let summary = json!({
        "documents": reports,
        "metrics": service.metrics_snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if failed > 0 {
        bail!("{failed} of {} documents failed", reports.len());
    }
    Ok(())
}

fn inspect(pdf: &Path, options: IndexOptions) -> Result<()> {
    let mut service =
        IndexingService::new(Box::new(LayoutFileOpener), MemoryStore::new(), options);
    let report = service.index_document(pdf);
    let store = service.into_store();
    let output = json!({
        "report": &report,
        "records": store.records(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !report.succeeded() {
        bail!(
            "scan of {} failed: {}",
            pdf.display(),
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Expand directories into the PDFs below them, sorted by path; files pass through as given.
fn collect_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut documents = Vec::new();
    for path in paths {
        if !path.is_dir() {
            documents.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && is_pdf(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        tracing::debug!(directory = %path.display(), found = found.len(), "Expanded directory");
        documents.extend(found);
    }
    documents
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
