//! Pipeline stages for document-to-text conversion.
//!
//! Each submodule implements exactly one transformation step, and every
//! external program sits behind a small trait so the orchestration in
//! [`crate::convert`] can be exercised without pdfium, LibreOffice or
//! Tesseract installed.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ sequence ──▶ ocr ──▶ postprocess ──▶ merged .txt
//! (scan)   (raster/    (page N     (tesseract) (cleanup)
//!           office)     order)
//! ```
//!
//! 1. [`input`]: list the input directory, classify by extension
//! 2. [`render`]: produce page images; PDFs go through [`raster`],
//!    DOCX files through [`office`] first
//! 3. [`sequence`]: order page images by their embedded page number
//! 4. [`ocr`]: one recognition call per page image
//! 5. [`postprocess`]: line-level noise removal on the raw OCR text

pub mod input;
pub mod ocr;
pub mod office;
pub mod postprocess;
pub mod raster;
pub mod render;
pub mod sequence;
