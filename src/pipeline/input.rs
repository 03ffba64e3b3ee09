//! Input discovery: list the input directory and classify each entry.
//!
//! Classification is by extension only (case-insensitive). Anything that is
//! not a PDF, DOCX or raster image is rejected here, before any rendering
//! work starts, so an unsupported file never leaves partial artefacts behind.

use crate::error::{DocumentError, PipelineError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// PNG or JPEG, passed straight to the OCR engine.
    Image,
}

impl DocumentKind {
    /// Accepts `pdf`, `docx`, `png`, `jpg` and `jpeg`, in any case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }
}

/// A source document in the input directory. Never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    pub path: PathBuf,
    /// Filename including extension.
    pub file_name: String,
    /// Filename without its final extension; names every derived artefact.
    pub stem: String,
    pub kind: DocumentKind,
}

impl InputDocument {
    /// Classify `path` by its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let kind = DocumentKind::from_extension(&extension).ok_or_else(|| {
            DocumentError::UnsupportedFormat {
                file: file_name.clone(),
                extension: extension.to_ascii_lowercase(),
            }
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            stem,
            kind,
        })
    }
}

/// Result of scanning the input directory.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Supported documents, sorted by filename.
    pub documents: Vec<InputDocument>,
    /// Regular files that were rejected, with the reason.
    pub rejected: Vec<(PathBuf, DocumentError)>,
}

/// List regular files in `dir` and classify them.
///
/// Entries are sorted by filename so a batch processes documents in the same
/// order on every platform. Sub-directories are ignored.
pub fn discover(dir: &Path) -> Result<Discovery, PipelineError> {
    let unreadable = |source| PipelineError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut discovery = Discovery::default();
    for path in paths {
        match InputDocument::from_path(&path) {
            Ok(doc) => {
                debug!("Discovered {:?} document: {}", doc.kind, doc.file_name);
                discovery.documents.push(doc);
            }
            Err(e) => discovery.rejected.push((path, e)),
        }
    }
    Ok(discovery)
}
