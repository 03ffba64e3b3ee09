//! # edgequake-doc2txt
//!
//! Batch OCR for scanned documents: every PDF, DOCX and image in an input
//! directory becomes one cleaned plain-text file in an output directory.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input/report.pdf
//!  │
//!  ├─ 1. Input     classify by extension (pdf, docx, png, jpg, jpeg)
//!  ├─ 2. Render    pdfium at 300 DPI → report_page{N}.png
//!  │               (DOCX goes through LibreOffice → PDF first)
//!  ├─ 3. Sequence  order page images by their page number
//!  ├─ 4. OCR       one Tesseract call per page → raw text
//!  ├─ 5. Clean     drop timestamps / file:// lines, strip bullets
//!  └─ 6. Merge     output/report.txt
//! ```
//!
//! A page that fails to render or recognise is left out of the merged text
//! and recorded on the document's [`DocumentReport`]; the batch carries on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2txt::{run_batch, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .input_dir("scans")
//!         .output_dir("text")
//!         .build()?;
//!     let summary = run_batch(config).await?;
//!     eprintln!("{} complete, {} partial, {} failed",
//!         summary.completed, summary.partial, summary.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## External Programs
//!
//! | Concern | Default | Trait |
//! |---------|---------|-------|
//! | PDF rasterisation | pdfium shared library | [`PdfRasterizer`] |
//! | DOCX → PDF | `soffice` | [`DocumentConverter`] |
//! | OCR | `tesseract` (optionally via `docker exec`) | [`PageRecognizer`] |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2txt` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, DEFAULT_DPI, DEFAULT_LANGUAGE};
pub use convert::{run_batch, run_batch_sync, DocumentPipeline};
pub use error::{DocumentError, PipelineError};
pub use output::{BatchSummary, DocumentReport, DocumentState};
pub use pipeline::input::{DocumentKind, InputDocument};
pub use pipeline::ocr::{PageRecognizer, TesseractRecognizer};
pub use pipeline::office::{DocumentConverter, LibreOfficeConverter};
pub use pipeline::postprocess::clean_ocr_text;
pub use pipeline::raster::{PageSink, PdfRasterizer, PdfiumRasterizer};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
