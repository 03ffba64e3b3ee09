//! Error types for the edgequake-doc2txt library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PipelineError`]: **Fatal**. The batch cannot run at all (directory
//!   roots cannot be created, input directory unreadable, invalid
//!   configuration). Returned as `Err(PipelineError)` from
//!   [`crate::convert::DocumentPipeline::run`].
//!
//! * [`DocumentError`]: **Non-fatal**. One document or one page failed
//!   (unsupported extension, render glitch, OCR exit code) but the batch
//!   carries on. Stored inside [`crate::output::DocumentReport`] so callers
//!   can see exactly which pages are missing from a merged text file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2txt library.
///
/// Per-document and per-page failures use [`DocumentError`] and are recorded
/// on the document report rather than propagated here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One of the input/output/temp roots could not be created.
    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input directory exists but could not be listed.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library next to the\n\
binary, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    /// Unexpected internal error (task join failure, runtime creation).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document or page.
///
/// The pipeline logs it, stores it on the report and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DocumentError {
    /// Extension is not one of pdf, docx, png, jpg, jpeg.
    #[error("Unsupported file type '{extension}' for '{file}'")]
    UnsupportedFormat { file: String, extension: String },

    /// The PDF could not be opened or a page failed to rasterise.
    /// `page` is 1-indexed; `None` means the whole document failed to open.
    #[error("Rasterisation failed{}: {detail}", page_suffix(.page))]
    RenderFailed { page: Option<usize>, detail: String },

    /// Office-to-PDF conversion failed; the document has no page images.
    #[error("Conversion to PDF failed for '{file}': {detail}")]
    ConversionFailed { file: String, detail: String },

    /// Copying an image input into the page-image directory failed.
    #[error("Failed to copy '{file}' into the page-image directory: {detail}")]
    CopyFailed { file: String, detail: String },

    /// The OCR engine exited with a non-zero status or could not be spawned.
    #[error("OCR failed for '{image}' (status {status:?}): {stderr}")]
    OcrFailed {
        image: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The merged text file could not be written.
    #[error("Failed to write '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },
}

fn page_suffix(page: &Option<usize>) -> String {
    match page {
        Some(p) => format!(" for page {p}"),
        None => String::new(),
    }
}
