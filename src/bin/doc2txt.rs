//! CLI binary for edgequake-doc2txt.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig`, runs one batch and prints the summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2txt::pipeline::raster::bind_pdfium;
use edgequake_doc2txt::{
    BatchSummary, DocumentPipeline, DocumentState, PipelineConfig, PipelineProgressCallback,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar over documents, one log line per document and
/// one per failed page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Listing input directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} document(s)…"))
        ));
    }

    fn on_document_start(&self, document: &str, _index: usize, _total_documents: usize) {
        self.bar.set_message(document.to_string());
    }

    fn on_page_recognized(&self, document: &str, page_num: usize, total_pages: usize) {
        self.bar
            .set_message(format!("{document}  page {page_num}/{total_pages}"));
    }

    fn on_page_error(&self, document: &str, page_num: usize, total_pages: usize, error: &str) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} {} page {:>3}/{:<3}  {}",
            red("✗"),
            document,
            page_num,
            total_pages,
            red(&msg),
        ));
    }

    fn on_document_complete(&self, document: &str, recognized_pages: usize, total_pages: usize) {
        let mark = if recognized_pages == total_pages && total_pages > 0 {
            green("✓")
        } else {
            yellow("⚠")
        };
        self.bar.println(format!(
            "  {} {:<40}  {}",
            mark,
            document,
            dim(&format!("{recognized_pages}/{total_pages} pages")),
        ));
        self.bar.inc(1);
    }

    fn on_document_skipped(&self, document: &str, reason: &str) {
        self.bar.println(format!(
            "  {} {:<40}  {}",
            dim("–"),
            document,
            dim(reason)
        ));
    }

    fn on_batch_complete(&self, completed: usize, failed: usize) {
        self.bar.finish_and_clear();
        let page_errors = self.page_errors.load(Ordering::SeqCst);

        if failed == 0 && page_errors == 0 {
            eprintln!(
                "{} {} document(s) converted",
                green("✔"),
                bold(&completed.to_string())
            );
        } else {
            eprintln!(
                "{} {} document(s) converted  ({} failed, {} page error(s))",
                if completed == 0 { red("✘") } else { cyan("⚠") },
                bold(&completed.to_string()),
                red(&failed.to_string()),
                red(&page_errors.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process ./input into ./output using ./temp_images for page images
  doc2txt

  # Custom directories and a lower rendering resolution
  doc2txt --input scans --output text --dpi 200

  # German OCR, keep page images for inspection
  doc2txt --lang deu --keep-images

  # Run Tesseract inside a container that mounts temp_images and output
  # at /app/temp_images and /app/output
  doc2txt --docker-container tesseract-runner

  # Same, with the directories mounted elsewhere
  doc2txt --docker-container ocr --container-temp-dir /work/img --container-output-dir /work/txt

  # Machine-readable summary
  doc2txt --json > summary.json

SUPPORTED INPUTS:
  .pdf             rasterised page by page with pdfium
  .docx            converted to PDF with LibreOffice, then rasterised
  .png .jpg .jpeg  OCR'd as a single page
  Anything else is skipped.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH  Path to libpdfium (otherwise ./ and the system path are searched)
  RUST_LOG         Override log filtering (e.g. RUST_LOG=edgequake_doc2txt=debug)

REQUIREMENTS:
  tesseract  with the language pack passed to --lang
  soffice    only needed for .docx inputs
  libpdfium  only needed for .pdf and .docx inputs
"#;

/// Batch OCR of PDF, DOCX and image files into plain text.
#[derive(Parser, Debug)]
#[command(
    name = "doc2txt",
    version,
    about = "Batch OCR of PDF, DOCX and image files into cleaned plain text",
    long_about = "Convert every PDF, DOCX, PNG and JPEG file in an input directory into one \
cleaned plain-text file per document. Pages are rendered to images, recognised with \
Tesseract, cleaned of timestamp and bullet noise, and merged in page order.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory scanned for source documents.
    #[arg(long, env = "DOC2TXT_INPUT", default_value = "input")]
    input: PathBuf,

    /// Directory receiving one .txt per document.
    #[arg(short, long, env = "DOC2TXT_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Directory for transient page images.
    #[arg(long, env = "DOC2TXT_TEMP", default_value = "temp_images")]
    temp: PathBuf,

    /// Rendering DPI for PDF and DOCX pages (72–600).
    #[arg(long, env = "DOC2TXT_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Tesseract language (e.g. eng, deu, eng+fra).
    #[arg(long, env = "DOC2TXT_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract executable.
    #[arg(long, env = "DOC2TXT_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// LibreOffice executable used for DOCX conversion.
    #[arg(long, env = "DOC2TXT_SOFFICE", default_value = "soffice")]
    soffice: String,

    /// Run Tesseract through `docker exec` in this container.
    #[arg(
        long,
        env = "DOC2TXT_DOCKER_CONTAINER",
        long_help = "Run Tesseract through `docker exec <container>` instead of locally.\n\
          The container must mount the temp and output directories at\n\
          --container-temp-dir and --container-output-dir."
    )]
    docker_container: Option<String>,

    /// Mount point of the temp directory inside the container.
    #[arg(long, env = "DOC2TXT_CONTAINER_TEMP_DIR", default_value = "/app/temp_images")]
    container_temp_dir: PathBuf,

    /// Mount point of the output directory inside the container.
    #[arg(long, env = "DOC2TXT_CONTAINER_OUTPUT_DIR", default_value = "/app/output")]
    container_output_dir: PathBuf,

    /// Leave page images in the temp directory.
    #[arg(long, env = "DOC2TXT_KEEP_IMAGES")]
    keep_images: bool,

    /// Print the batch summary as JSON on stdout.
    #[arg(long, env = "DOC2TXT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2TXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2TXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2TXT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── PDF engine check ─────────────────────────────────────────────────
    // Only PDF and DOCX inputs need pdfium, so a missing library is a
    // warning here; each affected document reports its own render failure.
    if let Err(e) = bind_pdfium() {
        if !cli.quiet {
            eprintln!("{} {}", yellow("⚠"), e.to_string().trim_end());
        }
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let pipeline = DocumentPipeline::new(config);
    tracing::debug!(
        "Configuration: {}",
        serde_json::to_string(pipeline.config()).unwrap_or_default()
    );

    // ── Run batch ────────────────────────────────────────────────────────
    let summary = pipeline
        .run()
        .await
        .context("Batch failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        print_summary(&summary);
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .temp_dir(&cli.temp)
        .dpi(cli.dpi)
        .language(&cli.lang)
        .tesseract_bin(&cli.tesseract)
        .soffice_bin(&cli.soffice)
        .keep_page_images(cli.keep_images);

    if let Some(ref container) = cli.docker_container {
        builder = builder
            .docker_container(container)
            .container_dirs(&cli.container_temp_dir, &cli.container_output_dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Plain-text summary used when the progress bar is off.
fn print_summary(summary: &BatchSummary) {
    for report in &summary.documents {
        let mark = match report.state {
            DocumentState::Complete => green("✓"),
            DocumentState::Partial => yellow("⚠"),
            _ => red("✗"),
        };
        let pages = match report.expected_pages {
            Some(expected) => format!("{}/{} pages", report.recognized_pages, expected),
            None => format!("{} pages", report.recognized_pages),
        };
        eprintln!("  {} {:<40}  {}", mark, report.file_name, dim(&pages));
        for e in &report.errors {
            eprintln!("      {}", dim(&e.to_string()));
        }
    }
    eprintln!(
        "Processed {} document(s) in {}ms: {} complete, {} partial, {} failed",
        summary.documents.len(),
        summary.total_duration_ms,
        summary.completed,
        summary.partial,
        summary.failed
    );
}
