//! Result types returned by a batch run.
//!
//! A merged text file says nothing about which pages were lost along the way;
//! [`DocumentReport`] carries that bookkeeping (expected vs. recognized pages
//! and the per-page errors) next to the output path.

use crate::error::DocumentError;
use crate::pipeline::input::DocumentKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a document ended up in the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    Discovered,
    Rendering,
    Recognizing,
    Merging,
    /// Merged output written and every rendered page was recognized.
    Complete,
    /// Merged output written, but some pages are missing from it.
    Partial,
    /// No output written (unsupported format or output write failure).
    Failed,
}

/// Per-document outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Source filename as found in the input directory.
    pub file_name: String,
    /// `None` when the extension was not recognised.
    pub kind: Option<DocumentKind>,
    pub state: DocumentState,
    /// Page count reported by the rasteriser, when it opened the document.
    /// Always 1 for image inputs.
    pub expected_pages: Option<usize>,
    /// Page images written to the temp directory.
    pub rendered_pages: usize,
    /// Pages whose OCR text made it into the merged output.
    pub recognized_pages: usize,
    /// Non-fatal errors, in the order they happened.
    pub errors: Vec<DocumentError>,
    /// Merged text file, if it was written.
    pub output_path: Option<PathBuf>,
    /// Byte length of the merged text.
    pub output_bytes: usize,
    pub duration_ms: u64,
}

impl DocumentReport {
    pub(crate) fn new(file_name: impl Into<String>, kind: Option<DocumentKind>) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
            state: DocumentState::Discovered,
            expected_pages: None,
            rendered_pages: 0,
            recognized_pages: 0,
            errors: Vec::new(),
            output_path: None,
            output_bytes: 0,
            duration_ms: 0,
        }
    }

    /// Pages known to exist that are absent from the merged output.
    pub fn missing_pages(&self) -> usize {
        self.expected_pages
            .unwrap_or(self.rendered_pages)
            .max(self.rendered_pages)
            .saturating_sub(self.recognized_pages)
    }

    /// `true` if the document produced an output file.
    pub fn has_output(&self) -> bool {
        self.output_path.is_some()
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// One report per supported document, plus one per unsupported input.
    pub documents: Vec<DocumentReport>,
    pub completed: usize,
    pub partial: usize,
    pub failed: usize,
    /// Unsupported inputs (also counted in `failed`).
    pub skipped: usize,
    pub total_duration_ms: u64,
}

impl BatchSummary {
    pub(crate) fn push(&mut self, report: DocumentReport) {
        match report.state {
            DocumentState::Complete => self.completed += 1,
            DocumentState::Partial => self.partial += 1,
            _ => {
                self.failed += 1;
                if report
                    .errors
                    .iter()
                    .any(|e| matches!(e, DocumentError::UnsupportedFormat { .. }))
                {
                    self.skipped += 1;
                }
            }
        }
        self.documents.push(report);
    }

    /// Total pages recognized across the batch.
    pub fn recognized_pages(&self) -> usize {
        self.documents.iter().map(|d| d.recognized_pages).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pages_uses_expected_count() {
        let mut r = DocumentReport::new("a.pdf", Some(DocumentKind::Pdf));
        r.expected_pages = Some(5);
        r.rendered_pages = 4;
        r.recognized_pages = 3;
        assert_eq!(r.missing_pages(), 2);
    }

    #[test]
    fn missing_pages_without_expected_count() {
        let mut r = DocumentReport::new("a.docx", Some(DocumentKind::Docx));
        r.rendered_pages = 2;
        r.recognized_pages = 2;
        assert_eq!(r.missing_pages(), 0);
    }

    #[test]
    fn summary_counts_states() {
        let mut s = BatchSummary::default();

        let mut ok = DocumentReport::new("a.png", Some(DocumentKind::Image));
        ok.state = DocumentState::Complete;
        s.push(ok);

        let mut partial = DocumentReport::new("b.pdf", Some(DocumentKind::Pdf));
        partial.state = DocumentState::Partial;
        s.push(partial);

        let mut skipped = DocumentReport::new("c.txt", None);
        skipped.state = DocumentState::Failed;
        skipped.errors.push(DocumentError::UnsupportedFormat {
            file: "c.txt".into(),
            extension: "txt".into(),
        });
        s.push(skipped);

        assert_eq!(s.completed, 1);
        assert_eq!(s.partial, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.documents.len(), 3);
    }

    #[test]
    fn state_serialises_snake_case() {
        let json = serde_json::to_string(&DocumentState::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
