//! URI normalisation: make any input reference readable at a local path.
//!
//! Plain paths and `file://` URLs are used as they are. Anything else
//! (`content://` handles from a document provider, `data:` URIs, HTTP URLs)
//! is read through a [`ContentResolver`], passed through a base64 round
//! trip, and written to a private temp file in the scratch directory. The
//! temp file lives as long as the returned [`NormalizedSource`].
//!
//! Normalisation never fails. If a copy cannot be made the original URI is
//! handed back as [`NormalizedSource::Unresolved`] and the caller gets a
//! [`ConverterError::LocalRead`] when it actually tries to use it.

use crate::error::ConverterError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Reads the bytes behind an opaque URI.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn read(&self, uri: &str) -> io::Result<Vec<u8>>;
}

/// Resolves `data:` URIs in-process and `http(s)://` URLs with reqwest.
///
/// Provider handles such as `content://` need a host-supplied resolver.
#[derive(Debug, Clone)]
pub struct DefaultContentResolver {
    client: reqwest::Client,
}

impl DefaultContentResolver {
    pub fn new(timeout_secs: u64) -> Result<Self, ConverterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ConverterError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentResolver for DefaultContentResolver {
    async fn read(&self, uri: &str) -> io::Result<Vec<u8>> {
        if let Some(rest) = uri.strip_prefix("data:") {
            return decode_data_uri(rest);
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            let response = self
                .client
                .get(uri)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(io::Error::other)?;
            let bytes = response.bytes().await.map_err(io::Error::other)?;
            return Ok(bytes.to_vec());
        }
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no resolver for '{}'", scheme_of(uri).unwrap_or("?")),
        ))
    }
}

fn decode_data_uri(rest: &str) -> io::Result<Vec<u8>> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "data URI without ','"))?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// An input made readable.
#[derive(Debug)]
pub enum NormalizedSource {
    /// The input already was a filesystem path.
    Local(PathBuf),
    /// A private copy of an opaque input; deleted on drop.
    Copied(NamedTempFile),
    /// The copy failed; the original URI is passed through unchanged.
    Unresolved(String),
}

impl NormalizedSource {
    /// Local path, if there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            NormalizedSource::Local(p) => Some(p),
            NormalizedSource::Copied(file) => Some(file.path()),
            NormalizedSource::Unresolved(_) => None,
        }
    }

    /// Read the whole input. `uri` is the caller's original reference, used in errors.
    pub async fn read(&self, uri: &str) -> Result<Vec<u8>, ConverterError> {
        let path = self.path().ok_or_else(|| ConverterError::LocalRead {
            uri: uri.to_string(),
            source: io::Error::new(
                io::ErrorKind::Unsupported,
                "source could not be made readable",
            ),
        })?;
        tokio::fs::read(path).await.map_err(|e| ConverterError::LocalRead {
            uri: uri.to_string(),
            source: e,
        })
    }
}

/// Turns input references into readable local paths.
#[derive(Clone)]
pub struct UriNormalizer {
    scratch_dir: PathBuf,
    resolver: Arc<dyn ContentResolver>,
}

impl std::fmt::Debug for UriNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UriNormalizer")
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

impl UriNormalizer {
    pub fn new(scratch_dir: impl Into<PathBuf>, resolver: Arc<dyn ContentResolver>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            resolver,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Make `uri` readable. Never fails; see the module docs.
    pub async fn normalize(&self, uri: &str) -> NormalizedSource {
        if uri.is_empty() {
            return NormalizedSource::Unresolved(String::new());
        }

        match scheme_of(uri) {
            None => NormalizedSource::Local(PathBuf::from(uri)),
            Some(scheme) if scheme.eq_ignore_ascii_case("file") => {
                match reqwest::Url::parse(uri).ok().and_then(|u| u.to_file_path().ok()) {
                    Some(path) => NormalizedSource::Local(path),
                    None => {
                        warn!("Malformed file URI '{}', using it unchanged", uri);
                        NormalizedSource::Unresolved(uri.to_string())
                    }
                }
            }
            Some(_) => match self.copy_opaque(uri).await {
                Ok(file) => {
                    debug!("Normalised {} → {}", redact(uri), file.path().display());
                    NormalizedSource::Copied(file)
                }
                Err(e) => {
                    warn!("Could not copy {}, using original URI: {}", redact(uri), e);
                    NormalizedSource::Unresolved(uri.to_string())
                }
            },
        }
    }

    async fn copy_opaque(&self, uri: &str) -> io::Result<NamedTempFile> {
        let bytes = self.resolver.read(uri).await?;

        let encoded = STANDARD.encode(&bytes);
        let decoded = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let suffix = extension_hint(uri)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| ".tmp".to_string());
        let file = tempfile::Builder::new()
            .prefix("tmp_")
            .suffix(&suffix)
            .tempfile_in(&self.scratch_dir)?;
        tokio::fs::write(file.path(), &decoded).await?;
        Ok(file)
    }
}

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]+):").expect("valid regex"));

/// URI scheme, if any. Single letters are Windows drive letters, not schemes.
fn scheme_of(uri: &str) -> Option<&str> {
    SCHEME
        .captures(uri)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Best guess at a file extension, so later MIME inference still works on the copy.
fn extension_hint(uri: &str) -> Option<String> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let mime = rest.split([';', ',']).next().unwrap_or_default();
        return match mime {
            "image/png" => Some("png".into()),
            "image/jpeg" | "image/jpg" => Some("jpg".into()),
            "application/pdf" => Some("pdf".into()),
            _ => None,
        };
    }
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}

/// Keep long `data:` payloads out of the logs.
fn redact(uri: &str) -> &str {
    if uri.starts_with("data:") {
        uri.split(',').next().unwrap_or("data:")
    } else {
        uri
    }
}
