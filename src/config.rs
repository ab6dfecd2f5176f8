//! Configuration types for image assembly and remote document conversion.
//!
//! All behaviour is controlled through [`ConverterConfig`], built via its
//! [`ConverterConfigBuilder`]. Keeping every knob in one struct lets the CLI,
//! tests and embedding hosts share one shape and override only what they
//! care about.

use crate::error::ConverterError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default remote job API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.cloudconvert.com/v2";

/// Name of the artifact folder under the application home.
pub const ARTIFACT_FOLDER_NAME: &str = "pdfconverter";

/// Configuration for the conversion pipeline.
///
/// Built via [`ConverterConfig::builder()`], [`ConverterConfig::from_env()`]
/// or [`ConverterConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfconverter::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .api_key("secret")
///     .poll_interval_ms(2_000)
///     .max_poll_attempts(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_poll_attempts, 30);
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Base URL of the remote job API. Default: [`DEFAULT_API_URL`].
    pub api_base_url: String,

    /// Bearer token sent on every job API call.
    pub api_key: Option<String>,

    /// Delay between two job status checks, in milliseconds. Default: 6000.
    pub poll_interval_ms: u64,

    /// Maximum number of status checks before giving up. Default: 20.
    ///
    /// Together with `poll_interval_ms` this bounds how long a conversion may
    /// tie up its caller: roughly two minutes with the defaults.
    pub max_poll_attempts: u32,

    /// Per-request timeout for job API calls and uploads, in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Timeout for downloading the converted file, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Directory holding every produced file.
    pub artifact_dir: PathBuf,

    /// Directory for normalised copies of opaque inputs.
    pub scratch_dir: PathBuf,

    /// How many images are read and encoded at once during assembly. Default: 4.
    ///
    /// Page order never depends on this value.
    pub concurrency: usize,

    /// Conversion engine requested from the remote service. Default: "office".
    pub engine: String,

    /// Program invoked to turn the generated HTML into a PDF. Default: "wkhtmltopdf".
    pub rasterizer_program: String,

    /// Extra arguments placed before the input and output paths.
    pub rasterizer_args: Vec<String>,

    /// Path to a pdfium shared library. Falls back to the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional observer for job and assembly progress.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        let home = default_home();
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            poll_interval_ms: 6_000,
            max_poll_attempts: 20,
            request_timeout_secs: 60,
            download_timeout_secs: 120,
            artifact_dir: home.join(ARTIFACT_FOLDER_NAME),
            scratch_dir: std::env::temp_dir().join("pdfconverter-scratch"),
            concurrency: 4,
            engine: "office".to_string(),
            rasterizer_program: "wkhtmltopdf".to_string(),
            rasterizer_args: vec!["--quiet".to_string()],
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("artifact_dir", &self.artifact_dir)
            .field("scratch_dir", &self.scratch_dir)
            .field("concurrency", &self.concurrency)
            .field("engine", &self.engine)
            .field("rasterizer_program", &self.rasterizer_program)
            .field("rasterizer_args", &self.rasterizer_args)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `CLOUDCONVERT_API_KEY` | `api_key` |
    /// | `CLOUDCONVERT_API_URL` | `api_base_url` |
    /// | `PDFCONVERTER_HOME` | parent of `artifact_dir` |
    /// | `PDFIUM_LIB_PATH` | `pdfium_lib_path` |
    pub fn from_env() -> Result<Self, ConverterError> {
        let mut builder = Self::builder();
        if let Some(key) = non_empty_env("CLOUDCONVERT_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(url) = non_empty_env("CLOUDCONVERT_API_URL") {
            builder = builder.api_base_url(url);
        }
        if let Some(home) = non_empty_env("PDFCONVERTER_HOME") {
            builder = builder.artifact_dir(PathBuf::from(home).join(ARTIFACT_FOLDER_NAME));
        }
        if let Some(lib) = non_empty_env("PDFIUM_LIB_PATH") {
            builder = builder.pdfium_lib_path(lib);
        }
        builder.build()
    }

    /// Delay between two status checks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Builder for [`ConverterConfig`].
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl fmt::Debug for ConverterConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConverterConfigBuilder {
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.artifact_dir = dir.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = dir.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.config.engine = engine.into();
        self
    }

    /// Set the HTML-to-PDF program and the arguments placed before `<input> <output>`.
    pub fn rasterizer(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.config.rasterizer_program = program.into();
        self.config.rasterizer_args = args;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConverterError> {
        let c = &self.config;
        if c.max_poll_attempts == 0 {
            return Err(ConverterError::InvalidConfig(
                "max_poll_attempts must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(ConverterError::InvalidConfig(
                "concurrency must be ≥ 1".into(),
            ));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(ConverterError::InvalidConfig(format!(
                "api_base_url must be an HTTP/HTTPS URL, got '{}'",
                c.api_base_url
            )));
        }
        if c.rasterizer_program.trim().is_empty() {
            return Err(ConverterError::InvalidConfig(
                "rasterizer program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// A document format understood by the remote conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
}

impl DocumentFormat {
    /// Format name as sent to the remote service.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Doc => "doc",
        }
    }

    /// Guess the format from a file name or path.
    pub fn from_extension(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "doc" => Some(DocumentFormat::Doc),
            _ => None,
        }
    }

    /// MIME type of files in this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Doc => "application/msword",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a document conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// PDF in, DOCX out.
    PdfToWord,
    /// DOCX (or legacy DOC) in, PDF out.
    WordToPdf,
}

impl Direction {
    /// Input format, refined by the source's extension where it matters.
    ///
    /// A Word-to-PDF conversion accepts legacy `.doc` files as well as `.docx`.
    pub fn source_format(self, source: &str) -> DocumentFormat {
        match self {
            Direction::PdfToWord => DocumentFormat::Pdf,
            Direction::WordToPdf => match DocumentFormat::from_extension(source) {
                Some(DocumentFormat::Doc) => DocumentFormat::Doc,
                _ => DocumentFormat::Docx,
            },
        }
    }

    pub fn target_format(self) -> DocumentFormat {
        match self {
            Direction::PdfToWord => DocumentFormat::Docx,
            Direction::WordToPdf => DocumentFormat::Pdf,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Application home: `$XDG_DATA_HOME`, else `$HOME/.local/share`, else the temp dir.
fn default_home() -> PathBuf {
    if let Some(xdg) = non_empty_env("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Some(home) = non_empty_env("HOME").or_else(|| non_empty_env("USERPROFILE")) {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
