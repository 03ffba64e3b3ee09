//! OCR boundary: hand one page image to the recognition engine.
//!
//! The pipeline only needs "image path in, text file out (or a failure)", so
//! that is all [`PageRecognizer`] promises. [`TesseractRecognizer`] fulfils
//! it by running the `tesseract` CLI, either locally or inside a running
//! container through `docker exec`. Tests substitute an in-process fake.
//!
//! No retries: a non-zero exit is logged with its stderr and reported back as
//! [`DocumentError::OcrFailed`]; the merge step then finds no text file for
//! that page and skips it.

use crate::config::PipelineConfig;
use crate::error::DocumentError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Capability: recognise the text in one page image.
#[async_trait]
pub trait PageRecognizer: Send + Sync {
    /// Recognise `image` and write the raw text to `{output_base}.txt`.
    ///
    /// Returns the path of the text file on success. The engine owns the file
    /// format; the pipeline only reads it back as UTF-8 (lossily).
    async fn recognize(&self, image: &Path, output_base: &Path) -> Result<PathBuf, DocumentError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str {
        "ocr"
    }
}

/// Runs `tesseract <image> <output_base> -l <lang>`.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    language: String,
    docker: Option<DockerExec>,
}

/// Host → container path mapping for `docker exec` invocations.
#[derive(Debug, Clone)]
struct DockerExec {
    container: String,
    host_temp_dir: PathBuf,
    host_output_dir: PathBuf,
    container_temp_dir: PathBuf,
    container_output_dir: PathBuf,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            docker: None,
        }
    }

    /// Build from the pipeline configuration, honouring `docker_container`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut recognizer = Self::new(&config.tesseract_bin, &config.language);
        if let Some(ref container) = config.docker_container {
            recognizer.docker = Some(DockerExec {
                container: container.clone(),
                host_temp_dir: config.temp_dir.clone(),
                host_output_dir: config.output_dir.clone(),
                container_temp_dir: config.container_temp_dir.clone(),
                container_output_dir: config.container_output_dir.clone(),
            });
        }
        recognizer
    }

    /// Program and arguments for one invocation.
    fn command_line(&self, image: &Path, output_base: &Path) -> (String, Vec<String>) {
        let mut args = Vec::new();
        let (program, image, output_base) = match self.docker {
            Some(ref d) => {
                args.push("exec".to_string());
                args.push(d.container.clone());
                args.push(self.binary.clone());
                (
                    "docker".to_string(),
                    remap(image, &d.host_temp_dir, &d.container_temp_dir),
                    remap(output_base, &d.host_output_dir, &d.container_output_dir),
                )
            }
            None => (
                self.binary.clone(),
                image.to_path_buf(),
                output_base.to_path_buf(),
            ),
        };
        args.push(image.to_string_lossy().into_owned());
        args.push(output_base.to_string_lossy().into_owned());
        args.push("-l".to_string());
        args.push(self.language.clone());
        (program, args)
    }
}

#[async_trait]
impl PageRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &Path, output_base: &Path) -> Result<PathBuf, DocumentError> {
        let start = Instant::now();
        let image_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (program, args) = self.command_line(image, output_base);
        debug!("Running: {} {}", program, args.join(" "));

        let output = Command::new(&program)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                warn!("Failed to start {} for {}: {}", program, image_name, e);
                DocumentError::OcrFailed {
                    image: image_name.clone(),
                    status: None,
                    stderr: format!("failed to start '{program}': {e}"),
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                "Tesseract error for {} (status {:?}): {}",
                image_name,
                output.status.code(),
                stderr
            );
            return Err(DocumentError::OcrFailed {
                image: image_name,
                status: output.status.code(),
                stderr,
            });
        }

        info!(
            "OCR done: {} ({}ms)",
            image_name,
            start.elapsed().as_millis()
        );
        Ok(text_path_for(output_base))
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Tesseract appends `.txt` to the output base it is given.
pub fn text_path_for(output_base: &Path) -> PathBuf {
    let mut s = output_base.as_os_str().to_os_string();
    s.push(".txt");
    PathBuf::from(s)
}

/// Re-root `path` from `host_root` onto `container_root`; paths outside the
/// host root keep only their filename.
fn remap(path: &Path, host_root: &Path, container_root: &Path) -> PathBuf {
    match path.strip_prefix(host_root) {
        Ok(rest) => container_root.join(rest),
        Err(_) => container_root.join(path.file_name().unwrap_or(path.as_os_str())),
    }
}
