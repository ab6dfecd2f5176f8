//! HTTP plumbing for the remote job API.
//!
//! [`RemoteClient`] knows how to talk to the service and nothing about the
//! order of operations; sequencing lives in
//! [`crate::orchestrator::RemoteConversionOrchestrator`].
//!
//! Job endpoints carry the bearer token. Upload and download URLs are
//! presigned by the service and are called without it.

use crate::config::ConverterConfig;
use crate::error::ConverterError;
use crate::job::{ConversionJob, JobEnvelope, UploadTarget};
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Thin async client over the job API.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    download_http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteClient {
    pub fn new(config: &ConverterConfig) -> Result<Self, ConverterError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConverterError::Internal(format!("Failed to build HTTP client: {e}")))?;
        let download_http = Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
            .map_err(|e| ConverterError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            download_http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// `POST /jobs`. A non-2xx answer becomes [`ConverterError::RemoteJobCreation`]
    /// with the status and raw body.
    pub async fn create_job(&self, body: &Value) -> Result<ConversionJob, ConverterError> {
        let url = self.jobs_url();
        let response = self
            .authorize(self.http.post(&url).json(body))
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| request_error(&url, e))?;
        if !status.is_success() {
            return Err(ConverterError::RemoteJobCreation {
                status: status.as_u16(),
                body: text,
            });
        }

        let job = parse_job(&url, &text)?;
        info!("Created job {} ({})", job.id, job.status);
        Ok(job)
    }

    /// `GET /jobs/{id}`.
    pub async fn get_job(&self, job_id: &str) -> Result<ConversionJob, ConverterError> {
        let url = format!("{}/{}", self.jobs_url(), job_id);
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| request_error(&url, e))?;
        if !status.is_success() {
            return Err(ConverterError::RemoteRequest {
                url,
                reason: format!("HTTP {}: {}", status, text.trim()),
            });
        }
        parse_job(&url, &text)
    }

    /// Send `bytes` to the upload target. Returns the number of bytes sent.
    pub async fn upload(
        &self,
        target: &UploadTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<u64, ConverterError> {
        let len = bytes.len() as u64;
        let url = target.url().to_string();

        let request = match target {
            UploadTarget::FormUpload { fields, .. } => {
                let mut form = Form::new();
                for (key, value) in fields {
                    form = form.text(key.clone(), value.clone());
                }
                let part = Part::bytes(bytes)
                    .file_name(file_name.to_string())
                    .mime_str("application/octet-stream")
                    .map_err(|e| upload_error(&url, e))?;
                debug!("Form upload of {} ({} bytes) to {}", file_name, len, url);
                self.http.post(&url).multipart(form.part("file", part))
            }
            UploadTarget::DirectUpload { .. } => {
                debug!("Direct upload of {} ({} bytes) to {}", file_name, len, url);
                self.http.put(&url).body(bytes)
            }
        };

        let response = request.send().await.map_err(|e| upload_error(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConverterError::UploadTransport {
                url,
                reason: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        info!("Uploaded {} bytes", len);
        Ok(len)
    }

    /// Stream `url` into `dest`. Returns the number of bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, ConverterError> {
        let response = self
            .download_http
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(url, e))?;

        if !response.status().is_success() {
            return Err(ConverterError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        write_body(url, response, dest).await
    }
}

async fn write_body(url: &str, response: Response, dest: &Path) -> Result<u64, ConverterError> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| download_error(url, e))?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| download_error(url, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| download_error(url, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| download_error(url, e))?;

    info!("Downloaded {} bytes to {}", written, dest.display());
    Ok(written)
}

fn parse_job(url: &str, text: &str) -> Result<ConversionJob, ConverterError> {
    serde_json::from_str::<JobEnvelope>(text)
        .map(|envelope| envelope.data)
        .map_err(|e| ConverterError::RemoteRequest {
            url: url.to_string(),
            reason: format!("unexpected job response: {e}"),
        })
}

fn request_error(url: &str, e: impl std::fmt::Display) -> ConverterError {
    ConverterError::RemoteRequest {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

fn upload_error(url: &str, e: impl std::fmt::Display) -> ConverterError {
    ConverterError::UploadTransport {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

fn download_error(url: &str, e: impl std::fmt::Display) -> ConverterError {
    ConverterError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    }
}
