//! CLI binary for pdfconverter.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConverterConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdfconverter::{
    ConversionProgressCallback, Converter, ConverterConfig, Direction, JobPhase, JobStatus,
    ProgressCallback, RecentFile, ARTIFACT_FOLDER_NAME,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one spinner whose message follows the job through
/// its stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(prefix: &'static str, message: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix(prefix);
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_phase(&self, job_id: &str, phase: JobPhase) {
        let msg = match phase {
            JobPhase::Created => format!("Job {job_id} created"),
            JobPhase::Uploading => "Uploading…".to_string(),
            JobPhase::Processing => "Processing…".to_string(),
            JobPhase::Finished => "Downloading…".to_string(),
            JobPhase::Error | JobPhase::Timeout => {
                self.bar.finish_and_clear();
                return;
            }
        };
        self.bar.set_prefix("Converting");
        self.bar.set_message(msg);
    }

    fn on_poll(&self, _job_id: &str, attempt: u32, max_attempts: u32, status: JobStatus) {
        self.bar
            .set_message(format!("Processing… {}", dim(&format!("{status} ({attempt}/{max_attempts})"))));
    }

    fn on_upload_complete(&self, _job_id: &str, bytes: u64) {
        self.bar
            .println(format!("  {} Uploaded {}", green("✓"), dim(&format!("{bytes} bytes"))));
    }

    fn on_image_encoded(&self, index: usize, total: usize) {
        self.bar.set_prefix("Assembling");
        self.bar.set_message(format!("image {}/{}", index + 1, total));
    }

    fn on_saved(&self, file: &RecentFile) {
        self.bar.finish_and_clear();
        eprintln!("{} Saved {}", green("✔"), bold(&file.uri.display().to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Two photos into one PDF
  pdfconverter images scan1.jpg scan2.png

  # PDF to Word through the remote service
  pdfconverter convert report.pdf pdf-to-word

  # Word (docx or doc) to PDF
  pdfconverter convert letter.docx word-to-pdf

  # Recent files as JSON
  pdfconverter --json list

  # Every page of a PDF as PNG
  pdfconverter pages report.pdf -o ./pages

ENVIRONMENT VARIABLES:
  CLOUDCONVERT_API_KEY    Bearer token for the conversion service
  CLOUDCONVERT_API_URL    Override the service base URL
  PDFCONVERTER_HOME       Parent directory of the artifact folder
  PDFIUM_LIB_PATH         Path to an existing libpdfium (pages command)
"#;

/// Photos to PDF, and PDF <-> Word through a remote conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "pdfconverter",
    version,
    about = "Turn photos into a PDF and convert PDF <-> DOCX",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Bearer token for the conversion service.
    #[arg(long, env = "CLOUDCONVERT_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Base URL of the conversion service.
    #[arg(long, env = "CLOUDCONVERT_API_URL", global = true)]
    api_url: Option<String>,

    /// Directory holding the artifact folder.
    #[arg(long, env = "PDFCONVERTER_HOME", global = true)]
    home: Option<PathBuf>,

    /// Delay between job status checks, in milliseconds.
    #[arg(long, env = "PDFCONVERTER_POLL_INTERVAL_MS", default_value_t = 6000, global = true)]
    poll_interval_ms: u64,

    /// Status checks before a job is considered timed out.
    #[arg(long, env = "PDFCONVERTER_MAX_POLL_ATTEMPTS", default_value_t = 20, global = true)]
    max_poll_attempts: u32,

    /// HTML to PDF engine invoked as `<program> <input.html> <output.pdf>`.
    #[arg(long, env = "PDFCONVERTER_RASTERIZER", default_value = "wkhtmltopdf", global = true)]
    rasterizer: String,

    /// Extra argument placed before the file paths; repeat for several.
    #[arg(long = "rasterizer-arg", default_value = "--quiet", allow_hyphen_values = true, global = true)]
    rasterizer_args: Vec<String>,

    /// Images read concurrently during assembly.
    #[arg(short, long, env = "PDFCONVERTER_CONCURRENCY", default_value_t = 4, global = true)]
    concurrency: usize,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH", global = true)]
    pdfium_lib: Option<PathBuf>,

    /// Output structured JSON.
    #[arg(long, env = "PDFCONVERTER_JSON", global = true)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDFCONVERTER_NO_PROGRESS", global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFCONVERTER_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFCONVERTER_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble images into one PDF, one page per image, in order.
    Images {
        /// Image paths or URIs.
        #[arg(required = true)]
        uris: Vec<String>,
    },
    /// Convert a document through the remote service.
    Convert {
        /// Document path or URI.
        uri: String,
        /// Conversion direction.
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    /// List files in the artifact folder, newest first.
    List,
    /// Delete a file from the artifact folder by name.
    Delete { name: String },
    /// Print the path and MIME type of a stored file.
    Share { name: String },
    /// Render every page of a PDF to PNG.
    Pages {
        /// PDF path or URI.
        uri: String,
        /// Output directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Only print the page count.
        #[arg(long)]
        count: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DirectionArg {
    PdfToWord,
    WordToPdf,
}

impl From<DirectionArg> for Direction {
    fn from(v: DirectionArg) -> Self {
        match v {
            DirectionArg::PdfToWord => Direction::PdfToWord,
            DirectionArg::WordToPdf => Direction::WordToPdf,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would fight the spinner, so they are shown only without it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = match spinner_start(&cli.command) {
        Some((prefix, message)) if show_progress => {
            Some(CliProgressCallback::new(prefix, message) as Arc<dyn ConversionProgressCallback>)
        }
        _ => None,
    };

    let config = build_config(&cli, progress_cb)?;
    let converter = Converter::new(config).context("Failed to initialise converter")?;

    match &cli.command {
        Command::Images { uris } => {
            let file = converter
                .convert_images_to_pdf(uris.as_slice())
                .await
                .context("Image assembly failed")?;
            print_file(&cli, &file)?;
        }
        Command::Convert { uri, direction } => {
            let file = converter
                .convert_document(uri, (*direction).into())
                .await
                .context("Conversion failed")?;
            print_file(&cli, &file)?;
        }
        Command::List => {
            let files = converter.list_recent_files().await;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&files).context("Failed to serialise file list")?
                );
            } else if files.is_empty() {
                if !cli.quiet {
                    eprintln!("No files in {}", converter.store().root().display());
                }
            } else {
                for f in &files {
                    println!(
                        "{:<40}  {:>10}  {}",
                        f.name,
                        f.size.map(|s| s.to_string()).unwrap_or_else(|| "?".into()),
                        f.created_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                    );
                }
            }
        }
        Command::Delete { name } => {
            let file = find_file(&converter, name).await?;
            converter
                .delete_file(&file)
                .await
                .with_context(|| format!("Failed to delete '{name}'"))?;
            if !cli.quiet {
                eprintln!("{} Deleted {}", green("✔"), bold(name));
            }
        }
        Command::Share { name } => {
            let file = find_file(&converter, name).await?;
            let target = converter
                .share_file(&file)
                .await
                .with_context(|| format!("Cannot share '{name}'"))?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&target).context("Failed to serialise share target")?
                );
            } else {
                println!("{}\t{}", target.path.display(), target.mime_type);
            }
        }
        Command::Pages { uri, output, count } => {
            if *count {
                let n = converter
                    .pdf_page_count(uri)
                    .await
                    .context("Failed to open PDF")?;
                println!("{n}");
                return Ok(());
            }
            let pages = converter
                .export_pdf_pages(uri, output)
                .await
                .context("Page export failed")?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&pages).context("Failed to serialise page list")?
                );
            } else {
                for p in &pages {
                    println!("{}", p.display());
                }
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ConverterConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder()
        .poll_interval_ms(cli.poll_interval_ms)
        .max_poll_attempts(cli.max_poll_attempts)
        .concurrency(cli.concurrency)
        .rasterizer(cli.rasterizer.clone(), cli.rasterizer_args.clone());

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = cli.api_url {
        builder = builder.api_base_url(url.clone());
    }
    if let Some(ref home) = cli.home {
        builder = builder.artifact_dir(home.join(ARTIFACT_FOLDER_NAME));
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Spinner prefix and first message for commands that report progress.
fn spinner_start(command: &Command) -> Option<(&'static str, &'static str)> {
    match command {
        Command::Images { .. } => Some(("Assembling", "Reading images…")),
        Command::Convert { .. } => Some(("Converting", "Creating job…")),
        Command::List | Command::Delete { .. } | Command::Share { .. } | Command::Pages { .. } => None,
    }
}

async fn find_file(converter: &Converter, name: &str) -> Result<RecentFile> {
    converter
        .list_recent_files()
        .await
        .into_iter()
        .find(|f| f.name == name)
        .with_context(|| format!("No file named '{name}' in {}", converter.store().root().display()))
}

fn print_file(cli: &Cli, file: &RecentFile) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(file).context("Failed to serialise result")?
        );
    } else {
        println!("{}", file.uri.display());
    }
    Ok(())
}
