//! PDF rasterisation via pdfium.
//!
//! ## Page streaming
//!
//! Each page goes to a [`PageSink`] as soon as it is rendered, so at most one
//! page bitmap (~25 MB at 300 DPI for a letter page) is alive at a time. Pages
//! delivered before a failure stay delivered.
//!
//! pdfium is a blocking C library; callers run [`PdfRasterizer::rasterize`]
//! inside `tokio::task::spawn_blocking`.

use crate::error::{DocumentError, PipelineError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Receives rendered pages in document order.
pub trait PageSink {
    /// Called once, after the document opened, with its page count.
    fn begin(&mut self, page_count: usize);

    /// Called for each page; `index` is 0-based.
    fn page(&mut self, index: usize, image: DynamicImage) -> Result<(), DocumentError>;
}

/// Capability: rasterise every page of a PDF.
pub trait PdfRasterizer: Send + Sync {
    /// Render each page of `pdf_path` at `dpi` and feed it to `sink`.
    ///
    /// Stops at the first failure and returns it; pages already delivered to
    /// the sink stay delivered.
    fn rasterize(&self, pdf_path: &Path, dpi: u32, sink: &mut dyn PageSink)
        -> Result<(), DocumentError>;
}

/// [`PdfRasterizer`] backed by the pdfium library.
///
/// The library is bound on every call, so a batch of images alone never
/// needs pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl PdfRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        dpi: u32,
        sink: &mut dyn PageSink,
    ) -> Result<(), DocumentError> {
        let pdfium = bind_pdfium().map_err(|e| DocumentError::RenderFailed {
            page: None,
            detail: e.to_string(),
        })?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| DocumentError::RenderFailed {
                page: None,
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        info!("PDF loaded: {} pages", page_count);
        sink.begin(page_count);

        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

        for (index, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                DocumentError::RenderFailed {
                    page: Some(index + 1),
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                index + 1,
                image.width(),
                image.height()
            );
            sink.page(index, image)?;
        }

        Ok(())
    }
}

/// Bind to a pdfium shared library.
///
/// Resolution order: `PDFIUM_LIB_PATH` (path to the library file), the
/// platform library name in the working directory, then the system library
/// search path.
pub fn bind_pdfium() -> Result<Pdfium, PipelineError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PipelineError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}
