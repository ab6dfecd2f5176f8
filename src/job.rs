//! Remote conversion job model.
//!
//! A job is created on the remote service as a small task graph
//! (`import/upload` → `convert` → `export/url`) and then observed through
//! status snapshots. The wire statuses are parsed once into enums here so
//! the orchestrator never compares free-form strings.
//!
//! ## Two state machines
//!
//! * [`JobStatus`] is what the remote service reports for the whole job.
//! * [`JobPhase`] is the client's view of its own progress. It adds an
//!   `uploading` step between `created` and `processing`, and a `timeout`
//!   end state the service knows nothing about.

use crate::config::DocumentFormat;
use crate::error::{ConverterError, UploadShapeError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Task names used in the job description.
pub const IMPORT_TASK: &str = "import-1";
pub const CONVERT_TASK: &str = "convert-1";
pub const EXPORT_TASK: &str = "export-1";

// ── Remote statuses ──────────────────────────────────────────────────────

/// Status of a whole job as reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    /// The service spells this `waiting`.
    #[serde(alias = "waiting")]
    WaitingUpload,
    Processing,
    Finished,
    Error,
    /// A status this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// `finished` and `error` end a job; nothing follows them.
    pub fn is_terminal(self) -> bool {
        match self {
            JobStatus::Finished | JobStatus::Error => true,
            JobStatus::Created
            | JobStatus::WaitingUpload
            | JobStatus::Processing
            | JobStatus::Unknown => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Created => "created",
            JobStatus::WaitingUpload => "waiting_upload",
            JobStatus::Processing => "processing",
            JobStatus::Finished => "finished",
            JobStatus::Error => "error",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Status of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Waiting,
    Processing,
    Finished,
    Error,
    #[serde(other)]
    Unknown,
}

/// What a task does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOperation {
    #[serde(rename = "import/upload")]
    ImportUpload,
    #[serde(rename = "convert")]
    Convert,
    #[serde(rename = "export/url")]
    ExportUrl,
    #[serde(other)]
    Other,
}

/// One named stage of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTask {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub operation: TaskOperation,
    pub status: TaskStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

/// A snapshot of a remote job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub tasks: Vec<JobTask>,
}

/// The `{ "data": … }` wrapper around every job response.
#[derive(Debug, Deserialize)]
pub(crate) struct JobEnvelope {
    pub data: ConversionJob,
}

impl ConversionJob {
    /// The upload task, matched by name first and by operation second.
    pub fn import_task(&self) -> Option<&JobTask> {
        self.tasks
            .iter()
            .find(|t| t.name == IMPORT_TASK)
            .or_else(|| {
                self.tasks
                    .iter()
                    .find(|t| t.operation == TaskOperation::ImportUpload)
            })
    }

    /// The first task that ended in `error`.
    pub fn failed_task(&self) -> Option<&JobTask> {
        self.tasks.iter().find(|t| t.status == TaskStatus::Error)
    }

    /// Turn an `error` snapshot into the failing task's error.
    pub fn task_error(&self) -> ConverterError {
        match self.failed_task() {
            Some(task) => ConverterError::RemoteTask {
                task: task.name.clone(),
                message: task
                    .message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
            None => ConverterError::RemoteTask {
                task: String::new(),
                message: "Unknown error".to_string(),
            },
        }
    }

    /// The first file produced by a finished `export/url` task.
    pub fn exported_file(&self) -> Option<ExportedFile> {
        let task = self.tasks.iter().find(|t| {
            t.operation == TaskOperation::ExportUrl && t.status == TaskStatus::Finished
        })?;
        let file = task.result.as_ref()?.get("files")?.as_array()?.first()?;
        let url = file.get("url")?.as_str()?.to_string();
        Some(ExportedFile {
            url,
            filename: file
                .get("filename")
                .and_then(Value::as_str)
                .map(str::to_string),
            size: file.get("size").and_then(Value::as_u64),
        })
    }
}

/// Descriptor of a converted file ready for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub url: String,
    pub filename: Option<String>,
    pub size: Option<u64>,
}

/// Build the task graph submitted to `POST /jobs`.
pub fn job_request_body(input: DocumentFormat, output: DocumentFormat, engine: &str) -> Value {
    json!({
        "tasks": {
            IMPORT_TASK: { "operation": "import/upload" },
            CONVERT_TASK: {
                "operation": "convert",
                "input": IMPORT_TASK,
                "input_format": input.as_str(),
                "output_format": output.as_str(),
                "engine": engine,
            },
            EXPORT_TASK: { "operation": "export/url", "input": CONVERT_TASK },
        }
    })
}

// ── Upload target ────────────────────────────────────────────────────────

/// Where and how the input file must be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadTarget {
    /// POST every field plus the file as multipart form data.
    FormUpload {
        url: String,
        fields: BTreeMap<String, String>,
    },
    /// PUT the raw bytes.
    DirectUpload { url: String },
}

impl UploadTarget {
    pub fn url(&self) -> &str {
        match self {
            UploadTarget::FormUpload { url, .. } | UploadTarget::DirectUpload { url } => url,
        }
    }

    /// Decide the upload shape from a freshly created job.
    ///
    /// `result.form = { url, parameters }` is a form upload and `result.url`
    /// a direct upload. Neither, both, or a form missing its URL or
    /// parameters is rejected.
    pub fn from_job(job: &ConversionJob) -> Result<Self, UploadShapeError> {
        let task = job.import_task().ok_or_else(|| unsupported("job has no import task"))?;
        let result = task
            .result
            .as_ref()
            .ok_or_else(|| unsupported("import task has no result"))?;

        let form = result.get("form").filter(|v| !v.is_null());
        let direct = result.get("url").filter(|v| !v.is_null());

        match (form, direct) {
            (Some(_), Some(_)) => Err(unsupported(
                "import task offers both a form and a direct upload URL",
            )),
            (Some(form), None) => {
                let url = form
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| unsupported("form upload without a URL"))?;
                let params = form
                    .get("parameters")
                    .and_then(Value::as_object)
                    .ok_or_else(|| unsupported("form upload without parameters"))?;
                let mut fields = BTreeMap::new();
                for (key, value) in params {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        other => {
                            return Err(unsupported(&format!(
                                "form field '{key}' is not a scalar: {other}"
                            )))
                        }
                    };
                    fields.insert(key.clone(), text);
                }
                Ok(UploadTarget::FormUpload {
                    url: url.to_string(),
                    fields,
                })
            }
            (None, Some(url)) => {
                let url = url
                    .as_str()
                    .ok_or_else(|| unsupported("direct upload URL is not a string"))?;
                Ok(UploadTarget::DirectUpload {
                    url: url.to_string(),
                })
            }
            (None, None) => Err(unsupported("import task result has no upload target")),
        }
    }
}

fn unsupported(detail: &str) -> UploadShapeError {
    UploadShapeError {
        detail: detail.to_string(),
    }
}

// ── Client-side phase machine ────────────────────────────────────────────

/// Client-side lifecycle of one conversion request.
///
/// ```text
/// created ──▶ uploading ──▶ processing ──┬──▶ finished
///                                         ├──▶ error
///                                         └──▶ timeout
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Created,
    Uploading,
    Processing,
    Finished,
    Error,
    Timeout,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Finished | JobPhase::Error | JobPhase::Timeout)
    }

    /// Whether `self → next` is a legal forward step.
    pub fn can_advance_to(self, next: JobPhase) -> bool {
        match (self, next) {
            (JobPhase::Created, JobPhase::Uploading)
            | (JobPhase::Uploading, JobPhase::Processing)
            | (JobPhase::Processing, JobPhase::Finished)
            | (JobPhase::Processing, JobPhase::Error)
            | (JobPhase::Processing, JobPhase::Timeout) => true,
            (
                JobPhase::Created
                | JobPhase::Uploading
                | JobPhase::Processing
                | JobPhase::Finished
                | JobPhase::Error
                | JobPhase::Timeout,
                _,
            ) => false,
        }
    }

    /// The phase a remote status snapshot implies once processing has begun.
    pub fn from_remote(status: JobStatus) -> JobPhase {
        match status {
            JobStatus::Finished => JobPhase::Finished,
            JobStatus::Error => JobPhase::Error,
            JobStatus::Created
            | JobStatus::WaitingUpload
            | JobStatus::Processing
            | JobStatus::Unknown => JobPhase::Processing,
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobPhase::Created => "created",
            JobPhase::Uploading => "uploading",
            JobPhase::Processing => "processing",
            JobPhase::Finished => "finished",
            JobPhase::Error => "error",
            JobPhase::Timeout => "timeout",
        };
        f.write_str(s)
    }
}
