//! Progress-callback trait for per-document and per-page pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the batch walks the input directory.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2txt::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     recognized: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for PageCounter {
//!     fn on_page_recognized(&self, document: &str, page_num: usize, total_pages: usize) {
//!         self.recognized.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{document}: page {page_num}/{total_pages}");
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { recognized: AtomicUsize::new(0) });
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, but the trait is
/// `Send + Sync` so a callback can be shared with other threads (a terminal
/// progress bar ticking on its own thread, for instance).
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after discovery, before the first document.
    ///
    /// # Arguments
    /// * `total_documents`: supported documents that will be processed
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document enters rendering.
    fn on_document_start(&self, document: &str, index: usize, total_documents: usize) {
        let _ = (document, index, total_documents);
    }

    /// Called once the page images for a document are on disk.
    fn on_document_rendered(&self, document: &str, page_count: usize) {
        let _ = (document, page_count);
    }

    /// Called after the OCR engine succeeded on a page.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed position in sequence order
    /// * `total_pages`: page images rendered for this document
    fn on_page_recognized(&self, document: &str, page_num: usize, total_pages: usize) {
        let _ = (document, page_num, total_pages);
    }

    /// Called after the OCR engine failed on a page.
    fn on_page_error(&self, document: &str, page_num: usize, total_pages: usize, error: &str) {
        let _ = (document, page_num, total_pages, error);
    }

    /// Called when the merged text file has been written.
    ///
    /// `total_pages` counts every page the document is known to have,
    /// including pages that failed to render.
    fn on_document_complete(&self, document: &str, recognized_pages: usize, total_pages: usize) {
        let _ = (document, recognized_pages, total_pages);
    }

    /// Called for an input file the pipeline will not process.
    fn on_document_skipped(&self, document: &str, reason: &str) {
        let _ = (document, reason);
    }

    /// Called once after every document has been attempted.
    ///
    /// `completed` includes partial documents. `failed` counts documents
    /// that were attempted and produced no output; skipped files are
    /// reported through [`on_document_skipped`](Self::on_document_skipped)
    /// only.
    fn on_batch_complete(&self, completed: usize, failed: usize) {
        let _ = (completed, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
