//! Configuration types for the document-to-text batch pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Directory roots live here instead of in
//! process-wide state, so two pipelines pointed at different trees can run
//! in the same process and tests can aim a pipeline at a `TempDir`.

use crate::error::PipelineError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Rendering resolution used for PDF and DOCX pages.
pub const DEFAULT_DPI: u32 = 300;

/// Tesseract language pack passed via `-l`.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Configuration for one batch run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`], which reproduces the historical layout of
/// `./input`, `./output` and `./temp_images` relative to the working
/// directory.
///
/// # Example
/// ```rust
/// use edgequake_doc2txt::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input_dir("scans")
///     .output_dir("text")
///     .dpi(200)
///     .language("deu")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory scanned for source documents. Read-only to the pipeline.
    pub input_dir: PathBuf,

    /// Directory receiving one `{stem}.txt` per document, plus the
    /// transient per-page OCR text files.
    pub output_dir: PathBuf,

    /// Directory receiving the transient page images.
    pub temp_dir: PathBuf,

    /// Rasterisation DPI for PDF and DOCX pages. Range: 72–600. Default: 300.
    ///
    /// Tesseract's accuracy drops sharply below ~200 DPI on body text; 300 is
    /// the resolution its training data assumes.
    pub dpi: u32,

    /// OCR language (Tesseract `-l` value, e.g. `eng`, `deu+fra`). Default: `eng`.
    pub language: String,

    /// Tesseract executable. Default: `tesseract` (resolved through `PATH`).
    pub tesseract_bin: String,

    /// LibreOffice executable used for DOCX → PDF. Default: `soffice`.
    pub soffice_bin: String,

    /// Run Tesseract inside this container via `docker exec` instead of
    /// locally. Default: `None`.
    pub docker_container: Option<String>,

    /// Where [`PipelineConfig::temp_dir`] is mounted inside the container.
    pub container_temp_dir: PathBuf,

    /// Where [`PipelineConfig::output_dir`] is mounted inside the container.
    pub container_output_dir: PathBuf,

    /// Leave page images in `temp_dir` after a document completes. Default: false.
    pub keep_page_images: bool,

    /// Receives per-document and per-page events. Not serialised.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            temp_dir: PathBuf::from("./temp_images"),
            dpi: DEFAULT_DPI,
            language: DEFAULT_LANGUAGE.to_string(),
            tesseract_bin: "tesseract".to_string(),
            soffice_bin: "soffice".to_string(),
            docker_container: None,
            container_temp_dir: PathBuf::from("/app/temp_images"),
            container_output_dir: PathBuf::from("/app/output"),
            keep_page_images: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("temp_dir", &self.temp_dir)
            .field("dpi", &self.dpi)
            .field("language", &self.language)
            .field("tesseract_bin", &self.tesseract_bin)
            .field("soffice_bin", &self.soffice_bin)
            .field("docker_container", &self.docker_container)
            .field("keep_page_images", &self.keep_page_images)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path of the merged text file for a document stem.
    pub fn merged_text_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.txt"))
    }

    /// Path of the raw OCR text Tesseract writes for a page image.
    pub fn raw_text_path(&self, image_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.txt", file_stem(image_name)))
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl fmt::Debug for PipelineConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    /// Set all three roots under one base directory, using the default
    /// `input`, `output` and `temp_images` names.
    pub fn root(self, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        self.input_dir(base.join("input"))
            .output_dir(base.join("output"))
            .temp_dir(base.join("temp_images"))
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn tesseract_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.tesseract_bin = bin.into();
        self
    }

    pub fn soffice_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.soffice_bin = bin.into();
        self
    }

    pub fn docker_container(mut self, name: impl Into<String>) -> Self {
        self.config.docker_container = Some(name.into());
        self
    }

    pub fn container_dirs(
        mut self,
        temp_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        self.config.container_temp_dir = temp_dir.into();
        self.config.container_output_dir = output_dir.into();
        self
    }

    pub fn keep_page_images(mut self, keep: bool) -> Self {
        self.config.keep_page_images = keep;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(PipelineError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.language.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.tesseract_bin.trim().is_empty() || c.soffice_bin.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Executable names must not be empty".into(),
            ));
        }
        if c.docker_container.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(PipelineError::InvalidConfig(
                "Docker container name must not be empty".into(),
            ));
        }
        for (name, dir) in [
            ("output", &c.output_dir),
            ("temp", &c.temp_dir),
        ] {
            if dir == &c.input_dir {
                return Err(PipelineError::InvalidConfig(format!(
                    "The {name} directory must differ from the input directory ({})",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

/// Filename without its final extension (`"a.b.png"` → `"a.b"`).
pub(crate) fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}
