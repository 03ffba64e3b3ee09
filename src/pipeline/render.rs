//! Page rendering: turn one input document into page-image files.
//!
//! | Kind  | Strategy |
//! |-------|----------|
//! | PDF   | rasterise every page at the configured DPI → `{stem}_page{N}.png` |
//! | DOCX  | convert to PDF in a scoped temp dir, then rasterise as above |
//! | Image | copy unchanged into the page-image directory |
//!
//! Rendering is partial-failure tolerant: a page that fails to rasterise
//! ends the document, but every page written before it is kept and returned.
//! Nothing here returns `Err`; failures are logged and carried back in
//! [`RenderedPages::errors`].

use crate::error::DocumentError;
use crate::pipeline::input::{DocumentKind, InputDocument};
use crate::pipeline::office::DocumentConverter;
use crate::pipeline::raster::{PageSink, PdfRasterizer};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Page images produced for one document.
#[derive(Debug, Default)]
pub struct RenderedPages {
    /// Filenames inside the page-image directory, in render order.
    pub images: Vec<String>,
    /// Page count of the source, when the renderer could open it.
    pub expected_pages: Option<usize>,
    pub errors: Vec<DocumentError>,
}

impl RenderedPages {
    fn failed(error: DocumentError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }
}

/// Renders documents into `image_dir`.
#[derive(Clone)]
pub struct PageRenderer {
    image_dir: PathBuf,
    dpi: u32,
    rasterizer: Arc<dyn PdfRasterizer>,
    converter: Arc<dyn DocumentConverter>,
}

impl PageRenderer {
    pub fn new(
        image_dir: impl Into<PathBuf>,
        dpi: u32,
        rasterizer: Arc<dyn PdfRasterizer>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Self {
        Self {
            image_dir: image_dir.into(),
            dpi,
            rasterizer,
            converter,
        }
    }

    /// Render `document` with the strategy for its kind.
    pub async fn render(&self, document: &InputDocument) -> RenderedPages {
        let rendered = match document.kind {
            DocumentKind::Pdf => self.render_pdf(&document.path, &document.stem).await,
            DocumentKind::Docx => self.render_docx(document).await,
            DocumentKind::Image => self.copy_image(document).await,
        };
        for e in &rendered.errors {
            warn!("{}: {}", document.file_name, e);
        }
        info!(
            "{}: {} page image(s) rendered",
            document.file_name,
            rendered.images.len()
        );
        rendered
    }

    /// Rasterise a PDF on the blocking pool, naming pages after `stem`.
    pub async fn render_pdf(&self, pdf_path: &Path, stem: &str) -> RenderedPages {
        let rasterizer = Arc::clone(&self.rasterizer);
        let path = pdf_path.to_path_buf();
        let dpi = self.dpi;
        let mut writer = PngPageWriter::new(&self.image_dir, stem);

        let result = tokio::task::spawn_blocking(move || {
            let outcome = rasterizer.rasterize(&path, dpi, &mut writer);
            (writer, outcome)
        })
        .await;

        match result {
            Ok((writer, outcome)) => {
                let mut rendered = RenderedPages {
                    images: writer.written,
                    expected_pages: writer.page_count,
                    errors: Vec::new(),
                };
                if let Err(e) = outcome {
                    rendered.errors.push(e);
                }
                rendered
            }
            Err(e) => RenderedPages::failed(DocumentError::RenderFailed {
                page: None,
                detail: format!("render task panicked: {e}"),
            }),
        }
    }

    /// Convert a DOCX to PDF in a scoped temp dir, then rasterise it.
    ///
    /// The intermediate PDF lives in a [`TempDir`] that is removed when this
    /// function returns, whichever branch it returns from.
    async fn render_docx(&self, document: &InputDocument) -> RenderedPages {
        let scratch = match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => {
                return RenderedPages::failed(DocumentError::ConversionFailed {
                    file: document.file_name.clone(),
                    detail: format!("cannot create scratch directory: {e}"),
                })
            }
        };

        let pdf_path = match self
            .converter
            .convert_to_pdf(&document.path, scratch.path())
            .await
        {
            Ok(p) => p,
            Err(e) => return RenderedPages::failed(e),
        };

        debug!("Intermediate PDF: {}", pdf_path.display());
        self.render_pdf(&pdf_path, &document.stem).await
    }

    /// Images are already pages: copy them under their original filename.
    async fn copy_image(&self, document: &InputDocument) -> RenderedPages {
        let dest = self.image_dir.join(&document.file_name);
        match tokio::fs::copy(&document.path, &dest).await {
            Ok(_) => RenderedPages {
                images: vec![document.file_name.clone()],
                expected_pages: Some(1),
                errors: Vec::new(),
            },
            Err(e) => RenderedPages {
                expected_pages: Some(1),
                ..RenderedPages::failed(DocumentError::CopyFailed {
                    file: document.file_name.clone(),
                    detail: e.to_string(),
                })
            },
        }
    }
}

/// Filename for page `index` (0-based) of a document.
pub fn page_image_name(stem: &str, index: usize) -> String {
    format!("{stem}_page{}.png", index + 1)
}

/// [`PageSink`] that encodes every page to PNG in the image directory.
struct PngPageWriter {
    dir: PathBuf,
    stem: String,
    page_count: Option<usize>,
    written: Vec<String>,
}

impl PngPageWriter {
    fn new(dir: &Path, stem: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            stem: stem.to_string(),
            page_count: None,
            written: Vec::new(),
        }
    }
}

impl PageSink for PngPageWriter {
    fn begin(&mut self, page_count: usize) {
        self.page_count = Some(page_count);
        self.written.reserve(page_count);
    }

    fn page(&mut self, index: usize, image: DynamicImage) -> Result<(), DocumentError> {
        let name = page_image_name(&self.stem, index);
        let path = self.dir.join(&name);
        if let Err(e) = image.save_with_format(&path, ImageFormat::Png) {
            // The encoder may have created the file before failing.
            let _ = std::fs::remove_file(&path);
            return Err(DocumentError::RenderFailed {
                page: Some(index + 1),
                detail: format!("PNG encode failed: {e}"),
            });
        }
        self.written.push(name);
        Ok(())
    }
}
