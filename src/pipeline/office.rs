//! Office-document conversion: DOCX → intermediate PDF.
//!
//! Word documents have no page geometry until a layout engine flows them, so
//! the renderer first asks an office suite to print the document to PDF and
//! then rasterises that PDF like any other. [`DocumentConverter`] is the
//! capability; [`LibreOfficeConverter`] runs
//! `soffice --headless --convert-to pdf --outdir <dir> <file>` and waits for
//! it. Anything other than a zero exit status with the expected PDF on disk
//! aborts the conversion for that document.

use crate::error::DocumentError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Capability: turn a word-processor document into a PDF.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert `source` into a PDF written inside `out_dir`, returning its path.
    async fn convert_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, DocumentError>;
}

/// LibreOffice in headless mode.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    binary: String,
}

impl LibreOfficeConverter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

#[async_trait]
impl DocumentConverter for LibreOfficeConverter {
    async fn convert_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, DocumentError> {
        let file = display_name(source);
        debug!(
            "Running: {} --headless --convert-to pdf --outdir {} {}",
            self.binary,
            out_dir.display(),
            source.display()
        );

        let output = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source)
            .output()
            .await
            .map_err(|e| DocumentError::ConversionFailed {
                file: file.clone(),
                detail: format!("failed to start '{}': {e}", self.binary),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                "{} exited with {:?} converting {}: {}",
                self.binary,
                output.status.code(),
                file,
                stderr
            );
            return Err(DocumentError::ConversionFailed {
                file,
                detail: format!("exit status {:?}: {stderr}", output.status.code()),
            });
        }

        let pdf_path = converted_pdf_path(source, out_dir);
        if !pdf_path.is_file() {
            return Err(DocumentError::ConversionFailed {
                file,
                detail: format!("expected output '{}' was not produced", pdf_path.display()),
            });
        }

        info!("Converted {} → {}", file, pdf_path.display());
        Ok(pdf_path)
    }
}

/// LibreOffice names its output after the source stem: `report.docx` →
/// `{out_dir}/report.pdf`.
pub fn converted_pdf_path(source: &Path, out_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "converted".into());
    let mut name = stem;
    name.push(".pdf");
    out_dir.join(name)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
