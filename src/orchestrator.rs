//! Remote document conversion: create → upload → poll → download → store.
//!
//! ```text
//! uri ──▶ normalize ──▶ POST /jobs ──▶ upload ──▶ GET /jobs/{id} × N ──▶ download ──▶ store
//!                        created       uploading      processing            finished
//! ```
//!
//! The four remote steps are exposed individually so hosts can drive them
//! (and tests can exercise them) one at a time. [`convert`] composes them
//! strictly in order and tracks the client-side [`JobPhase`]; a step never
//! starts before the previous one has succeeded.
//!
//! How to upload is decided once, from the job creation response, and
//! carried in [`CreatedJob`]. Polling is sequential: at most one status
//! request is in flight per job.
//!
//! [`convert`]: RemoteConversionOrchestrator::convert

use crate::client::RemoteClient;
use crate::config::{ConverterConfig, DocumentFormat};
use crate::error::{ConverterError, UploadShapeError};
use crate::job::{job_request_body, ConversionJob, JobPhase, JobStatus, UploadTarget};
use crate::pipeline::normalize::UriNormalizer;
use crate::progress::ProgressCallback;
use crate::store::{sanitize_file_name, LocalArtifactStore, RecentFile};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// A job as returned by creation, with its upload shape already decided.
#[derive(Debug, Clone)]
pub struct CreatedJob {
    pub job: ConversionJob,
    pub upload_target: Result<UploadTarget, UploadShapeError>,
}

/// A converted file sitting in a private temporary directory.
///
/// The directory is removed when this value is dropped.
#[derive(Debug)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub filename: String,
    pub bytes: u64,
    _dir: TempDir,
}

/// Drives one document through the remote job API.
pub struct RemoteConversionOrchestrator {
    client: RemoteClient,
    normalizer: UriNormalizer,
    store: Arc<LocalArtifactStore>,
    engine: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
    progress: Option<ProgressCallback>,
}

impl RemoteConversionOrchestrator {
    pub fn new(
        config: &ConverterConfig,
        normalizer: UriNormalizer,
        store: Arc<LocalArtifactStore>,
    ) -> Result<Self, ConverterError> {
        Ok(Self {
            client: RemoteClient::new(config)?,
            normalizer,
            store,
            engine: config.engine.clone(),
            poll_interval: config.poll_interval(),
            max_poll_attempts: config.max_poll_attempts,
            progress: config.progress_callback.clone(),
        })
    }

    /// Submit the import → convert → export task graph.
    pub async fn create_job(
        &self,
        input: DocumentFormat,
        output: DocumentFormat,
    ) -> Result<CreatedJob, ConverterError> {
        let body = job_request_body(input, output, &self.engine);
        let job = self.client.create_job(&body).await?;
        let upload_target = UploadTarget::from_job(&job);
        match &upload_target {
            Ok(target) => debug!("Job {} upload target: {}", job.id, target.url()),
            Err(e) => warn!("Job {} has no usable upload target: {}", job.id, e),
        }
        Ok(CreatedJob { job, upload_target })
    }

    /// Send the file at `local_path` to the job's upload target.
    pub async fn upload(&self, created: &CreatedJob, local_path: &Path) -> Result<u64, ConverterError> {
        let target = created.upload_target.clone()?;
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| ConverterError::LocalRead {
                uri: local_path.display().to_string(),
                source: e,
            })?;
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let sent = self.client.upload(&target, &file_name, bytes).await?;
        if let Some(ref cb) = self.progress {
            cb.on_upload_complete(&created.job.id, sent);
        }
        Ok(sent)
    }

    /// Re-fetch the job until it is `finished` or `error`.
    ///
    /// A job that is already terminal is settled without a request. After
    /// the last attempt the call fails with [`ConverterError::PollTimeout`]
    /// without sleeping again.
    pub async fn poll_until_terminal(&self, job: &ConversionJob) -> Result<ConversionJob, ConverterError> {
        if job.status.is_terminal() {
            return settle(job.clone());
        }

        for attempt in 1..=self.max_poll_attempts {
            let current = self.client.get_job(&job.id).await?;
            debug!(
                "Job {} status {} (check {}/{})",
                job.id, current.status, attempt, self.max_poll_attempts
            );
            if let Some(ref cb) = self.progress {
                cb.on_poll(&job.id, attempt, self.max_poll_attempts, current.status);
            }

            if current.status.is_terminal() {
                return settle(current);
            }
            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(ConverterError::PollTimeout {
            job_id: job.id.clone(),
            attempts: self.max_poll_attempts,
        })
    }

    /// Fetch the first exported file of a finished job.
    pub async fn download_result(&self, job: &ConversionJob) -> Result<DownloadedFile, ConverterError> {
        let exported = job.exported_file().ok_or_else(|| ConverterError::NoOutputFile {
            job_id: job.id.clone(),
        })?;

        let filename = exported
            .filename
            .as_deref()
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| format!("converted_{}", Utc::now().timestamp_millis()));

        let dir = TempDir::new().map_err(|e| ConverterError::Internal(e.to_string()))?;
        let path = dir.path().join(&filename);
        let bytes = self.client.download(&exported.url, &path).await?;

        if let Some(ref cb) = self.progress {
            cb.on_download_complete(&job.id, &filename, bytes);
        }
        Ok(DownloadedFile {
            path,
            filename,
            bytes,
            _dir: dir,
        })
    }

    /// Convert the document at `uri` from `from` to `to` and store the result.
    pub async fn convert(
        &self,
        uri: &str,
        from: DocumentFormat,
        to: DocumentFormat,
    ) -> Result<RecentFile, ConverterError> {
        let start = Instant::now();
        info!("Converting {} ({} → {})", uri, from, to);

        let source = self.normalizer.normalize(uri).await;
        let local_path = source
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConverterError::LocalRead {
                uri: uri.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "source could not be made readable",
                ),
            })?;

        let created = self.create_job(from, to).await?;
        let mut phase = PhaseTracker::new(&created.job.id, self.progress.as_ref());

        phase.advance(JobPhase::Uploading)?;
        self.upload(&created, &local_path).await?;

        phase.advance(JobPhase::Processing)?;
        let finished = match self.poll_until_terminal(&created.job).await {
            Ok(job) => job,
            Err(e) => {
                let end = match &e {
                    ConverterError::PollTimeout { .. } => Some(JobPhase::Timeout),
                    ConverterError::RemoteTask { .. } => Some(JobPhase::Error),
                    _ => None,
                };
                if let Some(end) = end {
                    phase.advance(end)?;
                }
                return Err(e);
            }
        };
        phase.advance(JobPhase::from_remote(finished.status))?;

        let downloaded = self.download_result(&finished).await?;
        let file = self.store.save(&downloaded.path, &downloaded.filename).await?;
        if let Some(ref cb) = self.progress {
            cb.on_saved(&file);
        }

        info!(
            "Job {} → {} in {}ms",
            finished.id,
            file.name,
            start.elapsed().as_millis()
        );
        Ok(file)
    }
}

fn settle(job: ConversionJob) -> Result<ConversionJob, ConverterError> {
    match job.status {
        JobStatus::Finished => Ok(job),
        JobStatus::Error => Err(job.task_error()),
        JobStatus::Created | JobStatus::WaitingUpload | JobStatus::Processing | JobStatus::Unknown => {
            Err(ConverterError::Internal(format!(
                "job {} settled while still {}",
                job.id, job.status
            )))
        }
    }
}

/// Enforces legal [`JobPhase`] transitions for one conversion.
struct PhaseTracker<'a> {
    job_id: String,
    phase: JobPhase,
    progress: Option<&'a ProgressCallback>,
}

impl<'a> PhaseTracker<'a> {
    fn new(job_id: &str, progress: Option<&'a ProgressCallback>) -> Self {
        if let Some(cb) = progress {
            cb.on_phase(job_id, JobPhase::Created);
        }
        Self {
            job_id: job_id.to_string(),
            phase: JobPhase::Created,
            progress,
        }
    }

    fn advance(&mut self, next: JobPhase) -> Result<(), ConverterError> {
        if !self.phase.can_advance_to(next) {
            return Err(ConverterError::Internal(format!(
                "job {}: illegal transition {} → {}",
                self.job_id, self.phase, next
            )));
        }
        debug!("Job {}: {} → {}", self.job_id, self.phase, next);
        self.phase = next;
        if let Some(cb) = self.progress {
            cb.on_phase(&self.job_id, next);
        }
        Ok(())
    }
}
