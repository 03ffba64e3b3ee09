//! Batch orchestration: input directory in, one cleaned `.txt` per document out.
//!
//! [`DocumentPipeline`] walks each document through
//! `Rendering → Recognizing → Merging → Complete | Partial | Failed`.
//! Everything is sequential: one document at a time, one page at a time,
//! one OCR call at a time. No failure below the batch level stops the batch;
//! a page that could not be rendered or recognised is simply absent from the
//! merged text and listed on the document's [`DocumentReport`].

use crate::config::{file_stem, PipelineConfig};
use crate::error::{DocumentError, PipelineError};
use crate::output::{BatchSummary, DocumentReport, DocumentState};
use crate::pipeline::input::{self, InputDocument};
use crate::pipeline::ocr::{PageRecognizer, TesseractRecognizer};
use crate::pipeline::office::{DocumentConverter, LibreOfficeConverter};
use crate::pipeline::postprocess::clean_ocr_text;
use crate::pipeline::raster::{PdfRasterizer, PdfiumRasterizer};
use crate::pipeline::render::PageRenderer;
use crate::pipeline::sequence::order_pages;
use crate::progress::ProgressCallback;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the document-to-text pipeline over one input directory.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2txt::{DocumentPipeline, PipelineConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = DocumentPipeline::new(PipelineConfig::default());
/// let summary = pipeline.run().await?;
/// println!("{} documents complete", summary.completed);
/// # Ok(())
/// # }
/// ```
pub struct DocumentPipeline {
    config: PipelineConfig,
    rasterizer: Arc<dyn PdfRasterizer>,
    converter: Arc<dyn DocumentConverter>,
    recognizer: Arc<dyn PageRecognizer>,
}

impl DocumentPipeline {
    /// Pipeline with the default collaborators: pdfium, LibreOffice and
    /// Tesseract, configured from `config`.
    pub fn new(config: PipelineConfig) -> Self {
        let converter = Arc::new(LibreOfficeConverter::new(&config.soffice_bin));
        let recognizer = Arc::new(TesseractRecognizer::from_config(&config));
        Self {
            config,
            rasterizer: Arc::new(PdfiumRasterizer::new()),
            converter,
            recognizer,
        }
    }

    /// Replace the OCR engine.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn PageRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Replace the DOCX → PDF converter.
    pub fn with_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Replace the PDF rasteriser.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PdfRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Create the input, output and temp roots if absent. Idempotent.
    pub fn prepare_directories(&self) -> Result<(), PipelineError> {
        for dir in [
            &self.config.input_dir,
            &self.config.output_dir,
            &self.config.temp_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|source| {
                PipelineError::DirectoryCreateFailed {
                    path: dir.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Process every file in the input directory.
    ///
    /// # Errors
    /// Returns `Err(PipelineError)` only when the directory roots cannot be
    /// created or the input directory cannot be listed. Per-document
    /// failures are reported in the returned [`BatchSummary`].
    pub async fn run(&self) -> Result<BatchSummary, PipelineError> {
        let start = Instant::now();
        self.prepare_directories()?;

        let discovery = input::discover(&self.config.input_dir)?;
        let total = discovery.documents.len();
        let mut summary = BatchSummary::default();

        if total == 0 {
            warn!("No input files found in {}", self.config.input_dir.display());
        }
        if let Some(cb) = self.progress() {
            cb.on_batch_start(total);
        }

        for (path, error) in discovery.rejected {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            summary.push(self.skip(&name, error));
        }

        for (i, document) in discovery.documents.iter().enumerate() {
            if let Some(cb) = self.progress() {
                cb.on_document_start(&document.file_name, i + 1, total);
            }
            summary.push(self.process_document(document).await);
        }

        summary.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "OCR processing completed: {} complete, {} partial, {} failed ({} skipped) in {}ms",
            summary.completed,
            summary.partial,
            summary.failed,
            summary.skipped,
            summary.total_duration_ms
        );
        if let Some(cb) = self.progress() {
            cb.on_batch_complete(
                summary.completed + summary.partial,
                summary.failed - summary.skipped,
            );
        }

        Ok(summary)
    }

    /// Classify and process a single file. Unsupported extensions produce a
    /// `Failed` report and no output.
    pub async fn process_path(&self, path: impl AsRef<Path>) -> DocumentReport {
        let path = path.as_ref();
        match InputDocument::from_path(path) {
            Ok(document) => self.process_document(&document).await,
            Err(error) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.skip(&name, error)
            }
        }
    }

    /// Render, recognise and merge one document.
    ///
    /// Always writes `{output_dir}/{stem}.txt` (possibly empty) unless the
    /// write itself fails.
    pub async fn process_document(&self, document: &InputDocument) -> DocumentReport {
        let start = Instant::now();
        let mut report = DocumentReport::new(&document.file_name, Some(document.kind));
        info!("Processing {}...", document.file_name);

        // ── Rendering ────────────────────────────────────────────────────
        report.state = DocumentState::Rendering;
        let rendered = self.renderer().render(document).await;
        report.expected_pages = rendered.expected_pages;
        report.rendered_pages = rendered.images.len();
        report.errors.extend(rendered.errors);

        let mut images = rendered.images;
        order_pages(&mut images);
        let _images_guard = PageImageGuard::new(
            &self.config.temp_dir,
            &images,
            self.config.keep_page_images,
        );
        if let Some(cb) = self.progress() {
            cb.on_document_rendered(&document.file_name, images.len());
        }

        // ── Recognizing ──────────────────────────────────────────────────
        report.state = DocumentState::Recognizing;
        self.recognize_pages(&document.file_name, &images, &mut report)
            .await;

        // ── Merging ──────────────────────────────────────────────────────
        report.state = DocumentState::Merging;
        let merged = self.merge_pages(&images, &mut report).await;

        let output_path = self.config.merged_text_path(&document.stem);
        match tokio::fs::write(&output_path, &merged).await {
            Ok(()) => {
                info!("Final merged text saved to {}", output_path.display());
                report.output_bytes = merged.len();
                report.output_path = Some(output_path);
                report.state = if report.errors.is_empty() && report.missing_pages() == 0 {
                    DocumentState::Complete
                } else {
                    DocumentState::Partial
                };
                if let Some(cb) = self.progress() {
                    cb.on_document_complete(
                        &document.file_name,
                        report.recognized_pages,
                        report.recognized_pages + report.missing_pages(),
                    );
                }
            }
            Err(e) => {
                warn!("Failed to write {}: {}", output_path.display(), e);
                report.errors.push(DocumentError::OutputWriteFailed {
                    path: output_path,
                    detail: e.to_string(),
                });
                report.state = DocumentState::Failed;
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn renderer(&self) -> PageRenderer {
        PageRenderer::new(
            &self.config.temp_dir,
            self.config.dpi,
            Arc::clone(&self.rasterizer),
            Arc::clone(&self.converter),
        )
    }

    fn progress(&self) -> Option<&ProgressCallback> {
        self.config.progress_callback.as_ref()
    }

    fn skip(&self, name: &str, error: DocumentError) -> DocumentReport {
        info!("Skipping {}: {}", name, error);
        if let Some(cb) = self.progress() {
            cb.on_document_skipped(name, &error.to_string());
        }
        let mut report = DocumentReport::new(name, None);
        report.state = DocumentState::Failed;
        report.errors.push(error);
        report
    }

    /// One OCR call per page, in sequence order. A failure is recorded and
    /// the loop moves on to the next page.
    async fn recognize_pages(&self, document: &str, images: &[String], report: &mut DocumentReport) {
        let total = images.len();
        for (i, name) in images.iter().enumerate() {
            let page_num = i + 1;
            let image_path = self.config.temp_dir.join(name);
            let output_base = self.config.output_dir.join(file_stem(name));

            // A text file left over from an earlier run must not stand in for
            // this page if the engine fails now.
            remove_if_present(&self.config.raw_text_path(name)).await;

            match self.recognizer.recognize(&image_path, &output_base).await {
                Ok(path) => {
                    debug!(
                        "{} page {}: {} wrote {}",
                        document,
                        page_num,
                        self.recognizer.name(),
                        path.display()
                    );
                    if let Some(cb) = self.progress() {
                        cb.on_page_recognized(document, page_num, total);
                    }
                }
                Err(e) => {
                    if let Some(cb) = self.progress() {
                        cb.on_page_error(document, page_num, total, &e.to_string());
                    }
                    report.errors.push(e);
                }
            }
        }
    }

    /// Concatenate the cleaned text of every page that has a raw text file,
    /// deleting each raw file once it has been read.
    async fn merge_pages(&self, images: &[String], report: &mut DocumentReport) -> String {
        let mut merged = String::new();
        for name in images {
            let raw_path = self.config.raw_text_path(name);
            let raw = match tokio::fs::read(&raw_path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("No OCR text for {}; page skipped", name);
                    continue;
                }
                Err(e) => {
                    warn!("Cannot read {}: {}; page skipped", raw_path.display(), e);
                    continue;
                }
            };

            merged.push_str(&clean_ocr_text(&String::from_utf8_lossy(&raw)));
            merged.push('\n');
            report.recognized_pages += 1;

            if let Err(e) = tokio::fs::remove_file(&raw_path).await {
                warn!("Failed to delete {}: {}", raw_path.display(), e);
            }
        }
        merged
    }
}

/// Removes a document's page images when dropped, unless told to keep them.
struct PageImageGuard {
    paths: Vec<PathBuf>,
    keep: bool,
}

impl PageImageGuard {
    fn new(dir: &Path, images: &[String], keep: bool) -> Self {
        Self {
            paths: images.iter().map(|n| dir.join(n)).collect(),
            keep,
        }
    }
}

impl Drop for PageImageGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for path in &self.paths {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to delete page image {}: {}", path.display(), e);
                }
            }
        }
    }
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed stale {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove stale {}: {}", path.display(), e),
    }
}

/// Run a full batch with the default collaborators.
pub async fn run_batch(config: PipelineConfig) -> Result<BatchSummary, PipelineError> {
    DocumentPipeline::new(config).run().await
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(config: PipelineConfig) -> Result<BatchSummary, PipelineError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PipelineError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(config))
}
