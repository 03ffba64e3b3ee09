//! Batch pipeline tests with in-process fakes for pdfium, LibreOffice and
//! Tesseract. No external programs are needed.

use async_trait::async_trait;
use edgequake_doc2txt::pipeline::ocr::text_path_for;
use edgequake_doc2txt::pipeline::office::converted_pdf_path;
use edgequake_doc2txt::{
    DocumentConverter, DocumentError, DocumentKind, DocumentPipeline, DocumentState, PageRecognizer,
    PageSink, PdfRasterizer, PipelineConfig, PipelineProgressCallback,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Fakes ────────────────────────────────────────────────────────────────

/// Emits `pages` small blank images for any PDF.
struct FakeRasterizer {
    pages: usize,
}

impl PdfRasterizer for FakeRasterizer {
    fn rasterize(&self, _pdf: &Path, _dpi: u32, sink: &mut dyn PageSink) -> Result<(), DocumentError> {
        sink.begin(self.pages);
        for i in 0..self.pages {
            let img = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
            sink.page(i, DynamicImage::ImageRgba8(img))?;
        }
        Ok(())
    }
}

/// Announces `pages` pages, delivers `delivered` of them, then fails.
struct TruncatingRasterizer {
    pages: usize,
    delivered: usize,
}

impl PdfRasterizer for TruncatingRasterizer {
    fn rasterize(&self, _pdf: &Path, _dpi: u32, sink: &mut dyn PageSink) -> Result<(), DocumentError> {
        sink.begin(self.pages);
        for i in 0..self.delivered {
            let img = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
            sink.page(i, DynamicImage::ImageRgba8(img))?;
        }
        Err(DocumentError::RenderFailed {
            page: Some(self.delivered + 1),
            detail: "page render failed".to_string(),
        })
    }
}

/// Returns canned text per page-image filename; names without an entry fail.
#[derive(Default)]
struct FakeRecognizer {
    texts: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRecognizer {
    fn with(pages: &[(&str, &str)]) -> Self {
        Self {
            texts: pages
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRecognizer for FakeRecognizer {
    async fn recognize(&self, image: &Path, output_base: &Path) -> Result<PathBuf, DocumentError> {
        let name = image.file_name().unwrap().to_string_lossy().into_owned();
        self.calls.lock().unwrap().push(name.clone());
        assert!(image.is_file(), "page image {} should exist during OCR", image.display());

        match self.texts.get(&name) {
            Some(text) => {
                let path = text_path_for(output_base);
                std::fs::write(&path, text).unwrap();
                Ok(path)
            }
            None => Err(DocumentError::OcrFailed {
                image: name,
                status: Some(1),
                stderr: "Error in pixReadStream".into(),
            }),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Writes a placeholder PDF where LibreOffice would.
struct FakeConverter;

#[async_trait]
impl DocumentConverter for FakeConverter {
    async fn convert_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, DocumentError> {
        let pdf = converted_pdf_path(source, out_dir);
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        Ok(pdf)
    }
}

struct BrokenConverter;

#[async_trait]
impl DocumentConverter for BrokenConverter {
    async fn convert_to_pdf(&self, source: &Path, _out_dir: &Path) -> Result<PathBuf, DocumentError> {
        Err(DocumentError::ConversionFailed {
            file: source.file_name().unwrap().to_string_lossy().into_owned(),
            detail: "exit status Some(1)".into(),
        })
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl PipelineProgressCallback for RecordingProgress {
    fn on_batch_start(&self, total_documents: usize) {
        self.events.lock().unwrap().push(format!("batch:{total_documents}"));
    }
    fn on_document_start(&self, document: &str, index: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start:{document}:{index}/{total}"));
    }
    fn on_page_error(&self, document: &str, page_num: usize, _total: usize, _error: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page_error:{document}:{page_num}"));
    }
    fn on_document_complete(&self, document: &str, recognized: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done:{document}:{recognized}/{total}"));
    }
    fn on_document_skipped(&self, document: &str, _reason: &str) {
        self.events.lock().unwrap().push(format!("skip:{document}"));
    }
    fn on_batch_complete(&self, completed: usize, failed: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("batch_done:{completed}:{failed}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn workspace() -> TempDir {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("input")).unwrap();
    root
}

fn config(root: &TempDir) -> PipelineConfig {
    PipelineConfig::builder().root(root.path()).build().unwrap()
}

fn pipeline(
    config: PipelineConfig,
    pages: usize,
    recognizer: Arc<FakeRecognizer>,
) -> DocumentPipeline {
    DocumentPipeline::new(config)
        .with_rasterizer(Arc::new(FakeRasterizer { pages }))
        .with_converter(Arc::new(FakeConverter))
        .with_recognizer(recognizer)
}

fn put_input(root: &TempDir, name: &str) {
    std::fs::write(root.path().join("input").join(name), b"source bytes").unwrap();
}

fn read_output(root: &TempDir, name: &str) -> String {
    std::fs::read_to_string(root.path().join("output").join(name)).unwrap()
}

fn dir_entries(dir: PathBuf) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_image_output_is_cleaned_text_plus_newline() {
    let root = workspace();
    put_input(&root, "scan.png");
    let raw = "  • Hello    world  \n12/31/2023, 5:45 PM\nfile:///tmp/scan.html\n\n- second line";
    let ocr = Arc::new(FakeRecognizer::with(&[("scan.png", raw)]));

    let summary = pipeline(config(&root), 0, ocr).run().await.unwrap();

    assert_eq!(read_output(&root, "scan.txt"), "Hello world\nsecond line\n");
    assert_eq!(summary.completed, 1);
    let report = &summary.documents[0];
    assert_eq!(report.kind, Some(DocumentKind::Image));
    assert_eq!(report.state, DocumentState::Complete);
    assert_eq!(report.expected_pages, Some(1));
    assert_eq!(report.recognized_pages, 1);
    assert_eq!(report.output_bytes, "Hello world\nsecond line\n".len());
}

#[tokio::test]
async fn failed_page_is_left_out_and_reported() {
    let root = workspace();
    put_input(&root, "report.pdf");
    let ocr = Arc::new(FakeRecognizer::with(&[
        ("report_page1.png", "page one"),
        ("report_page3.png", "page three"),
    ]));

    let summary = pipeline(config(&root), 3, ocr.clone()).run().await.unwrap();

    assert_eq!(read_output(&root, "report.txt"), "page one\npage three\n");
    assert_eq!(
        ocr.calls(),
        vec!["report_page1.png", "report_page2.png", "report_page3.png"]
    );

    let report = &summary.documents[0];
    assert_eq!(report.state, DocumentState::Partial);
    assert_eq!(report.expected_pages, Some(3));
    assert_eq!(report.rendered_pages, 3);
    assert_eq!(report.recognized_pages, 2);
    assert_eq!(report.missing_pages(), 1);
    assert!(matches!(
        report.errors.as_slice(),
        [DocumentError::OcrFailed { image, .. }] if image == "report_page2.png"
    ));
    assert_eq!(summary.partial, 1);
}

#[tokio::test]
async fn pages_merge_in_numeric_order() {
    let root = workspace();
    put_input(&root, "book.pdf");
    let texts: Vec<(String, String)> = (1..=12)
        .map(|n| (format!("book_page{n}.png"), format!("p{n}")))
        .collect();
    let pairs: Vec<(&str, &str)> = texts.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    let ocr = Arc::new(FakeRecognizer::with(&pairs));

    pipeline(config(&root), 12, ocr.clone()).run().await.unwrap();

    let expected: String = (1..=12).map(|n| format!("p{n}\n")).collect();
    assert_eq!(read_output(&root, "book.txt"), expected);
    assert_eq!(ocr.calls()[9], "book_page10.png");
}

#[tokio::test]
async fn unsupported_input_is_skipped() {
    let root = workspace();
    put_input(&root, "notes.txt");
    put_input(&root, "scan.jpg");
    let ocr = Arc::new(FakeRecognizer::with(&[("scan.jpg", "text")]));

    let summary = pipeline(config(&root), 0, ocr.clone()).run().await.unwrap();

    assert!(!root.path().join("output/notes.txt").exists());
    assert_eq!(read_output(&root, "scan.txt"), "text\n");
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(ocr.calls(), vec!["scan.jpg"]);

    let skipped = summary
        .documents
        .iter()
        .find(|d| d.file_name == "notes.txt")
        .unwrap();
    assert_eq!(skipped.state, DocumentState::Failed);
    assert!(!skipped.has_output());
}

#[tokio::test]
async fn rerun_overwrites_previous_output() {
    let root = workspace();
    put_input(&root, "scan.png");

    let first = Arc::new(FakeRecognizer::with(&[("scan.png", "first run, much longer text")]));
    pipeline(config(&root), 0, first).run().await.unwrap();
    assert_eq!(read_output(&root, "scan.txt"), "first run, much longer text\n");

    let second = Arc::new(FakeRecognizer::with(&[("scan.png", "second")]));
    pipeline(config(&root), 0, second).run().await.unwrap();
    assert_eq!(read_output(&root, "scan.txt"), "second\n");
}

#[tokio::test]
async fn docx_conversion_failure_writes_empty_output() {
    let root = workspace();
    put_input(&root, "memo.docx");
    let ocr = Arc::new(FakeRecognizer::default());

    let summary = pipeline(config(&root), 2, ocr.clone())
        .with_converter(Arc::new(BrokenConverter))
        .run()
        .await
        .unwrap();

    assert_eq!(read_output(&root, "memo.txt"), "");
    assert!(ocr.calls().is_empty());
    let report = &summary.documents[0];
    assert_eq!(report.state, DocumentState::Partial);
    assert_eq!(report.expected_pages, None);
    assert!(matches!(report.errors[0], DocumentError::ConversionFailed { .. }));
}

#[tokio::test]
async fn docx_pages_are_named_after_the_docx() {
    let root = workspace();
    put_input(&root, "memo.docx");
    let ocr = Arc::new(FakeRecognizer::with(&[
        ("memo_page1.png", "Dear team,"),
        ("memo_page2.png", "• Regards"),
    ]));

    let summary = pipeline(config(&root), 2, ocr).run().await.unwrap();

    assert_eq!(read_output(&root, "memo.txt"), "Dear team,\nRegards\n");
    assert_eq!(summary.documents[0].kind, Some(DocumentKind::Docx));
    assert_eq!(summary.documents[0].state, DocumentState::Complete);
}

#[tokio::test]
async fn transient_files_are_removed() {
    let root = workspace();
    put_input(&root, "report.pdf");
    let ocr = Arc::new(FakeRecognizer::with(&[
        ("report_page1.png", "a"),
        ("report_page2.png", "b"),
    ]));

    pipeline(config(&root), 2, ocr).run().await.unwrap();

    assert_eq!(dir_entries(root.path().join("output")), vec!["report.txt"]);
    assert!(dir_entries(root.path().join("temp_images")).is_empty());
}

#[tokio::test]
async fn page_images_kept_when_configured() {
    let root = workspace();
    put_input(&root, "report.pdf");
    let config = PipelineConfig::builder()
        .root(root.path())
        .keep_page_images(true)
        .build()
        .unwrap();
    let ocr = Arc::new(FakeRecognizer::with(&[("report_page1.png", "a")]));

    pipeline(config, 2, ocr).run().await.unwrap();

    assert_eq!(
        dir_entries(root.path().join("temp_images")),
        vec!["report_page1.png", "report_page2.png"]
    );
}

#[tokio::test]
async fn stale_page_text_is_not_merged() {
    let root = workspace();
    put_input(&root, "report.pdf");
    std::fs::create_dir_all(root.path().join("output")).unwrap();
    std::fs::write(root.path().join("output/report_page2.txt"), "stale").unwrap();
    let ocr = Arc::new(FakeRecognizer::with(&[("report_page1.png", "fresh")]));

    pipeline(config(&root), 2, ocr).run().await.unwrap();

    assert_eq!(read_output(&root, "report.txt"), "fresh\n");
}

#[tokio::test]
async fn batch_continues_past_failures_and_reports_progress() {
    let root = workspace();
    put_input(&root, "a.pdf");
    put_input(&root, "b.docx");
    put_input(&root, "c.png");
    put_input(&root, "d.csv");

    let progress = Arc::new(RecordingProgress::default());
    let config = PipelineConfig::builder()
        .root(root.path())
        .progress_callback(progress.clone())
        .build()
        .unwrap();
    let ocr = Arc::new(FakeRecognizer::with(&[
        ("a_page1.png", "alpha"),
        ("c.png", "gamma"),
    ]));

    let summary = pipeline(config, 1, ocr)
        .with_converter(Arc::new(BrokenConverter))
        .run()
        .await
        .unwrap();

    assert_eq!(read_output(&root, "a.txt"), "alpha\n");
    assert_eq!(read_output(&root, "b.txt"), "");
    assert_eq!(read_output(&root, "c.txt"), "gamma\n");
    assert_eq!(summary.documents.len(), 4);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.partial, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.recognized_pages(), 2);

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(events.first().map(String::as_str), Some("batch:3"));
    assert!(events.contains(&"skip:d.csv".to_string()));
    assert!(events.contains(&"start:b.docx:2/3".to_string()));
    assert!(events.contains(&"done:a.pdf:1/1".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("batch_done:3:0"));
}

#[tokio::test]
async fn truncated_render_reports_full_page_count() {
    let root = workspace();
    put_input(&root, "short.pdf");

    let progress = Arc::new(RecordingProgress::default());
    let config = PipelineConfig::builder()
        .root(root.path())
        .progress_callback(progress.clone())
        .build()
        .unwrap();
    let ocr = Arc::new(FakeRecognizer::with(&[
        ("short_page1.png", "one"),
        ("short_page2.png", "two"),
    ]));

    let summary = pipeline(config, 0, ocr)
        .with_rasterizer(Arc::new(TruncatingRasterizer { pages: 4, delivered: 2 }))
        .run()
        .await
        .unwrap();

    let report = &summary.documents[0];
    assert_eq!(report.state, DocumentState::Partial);
    assert_eq!(report.missing_pages(), 2);
    assert_eq!(read_output(&root, "short.txt"), "one\ntwo\n");

    let events = progress.events.lock().unwrap().clone();
    assert!(events.contains(&"done:short.pdf:2/4".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("batch_done:1:0"));
}

#[tokio::test]
async fn empty_input_directory_is_not_an_error() {
    let root = tempfile::tempdir().unwrap();
    let ocr = Arc::new(FakeRecognizer::default());

    let summary = pipeline(config(&root), 0, ocr).run().await.unwrap();

    assert!(summary.documents.is_empty());
    assert!(root.path().join("input").is_dir());
    assert!(root.path().join("output").is_dir());
    assert!(root.path().join("temp_images").is_dir());
}

#[tokio::test]
async fn process_path_handles_single_files() {
    let root = workspace();
    put_input(&root, "scan.jpeg");
    let p = pipeline(config(&root), 0, Arc::new(FakeRecognizer::with(&[("scan.jpeg", "x")])));
    p.prepare_directories().unwrap();

    let ok = p.process_path(root.path().join("input/scan.jpeg")).await;
    assert_eq!(ok.state, DocumentState::Complete);
    assert_eq!(read_output(&root, "scan.txt"), "x\n");

    let skipped = p.process_path(root.path().join("input/readme.md")).await;
    assert_eq!(skipped.state, DocumentState::Failed);
    assert!(matches!(
        skipped.errors[0],
        DocumentError::UnsupportedFormat { .. }
    ));
}
