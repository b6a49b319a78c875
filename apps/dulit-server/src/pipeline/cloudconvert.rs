//! Job-based conversion API (CloudConvert v2)
//!
//! One job carries three tasks: an upload import, the docx to pdf
//! conversion and a URL export. The source file goes to the upload form
//! handed out by the import task, then the job is polled until it settles.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::convert::{ConversionStrategy, Converted};
use super::error::PipelineError;
use crate::config::{ConversionKind, DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS};

const IMPORT_TASK: &str = "import-file";
const CONVERT_TASK: &str = "convert-file";
const EXPORT_TASK: &str = "export-file";

/// How often and for how long a job is polled
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Deadline for the whole job, upload included
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobEnvelope {
    data: Job,
}

#[derive(Debug, Deserialize)]
struct Job {
    id: String,
    status: String,
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
struct Task {
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<TaskResult>,
}

#[derive(Debug, Deserialize)]
struct TaskResult {
    #[serde(default)]
    form: Option<UploadForm>,
    #[serde(default)]
    files: Vec<ExportedFile>,
}

#[derive(Debug, Deserialize)]
struct UploadForm {
    url: String,
    #[serde(default)]
    parameters: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ExportedFile {
    url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobStatus {
    Pending,
    Finished,
    Failed,
}

impl JobStatus {
    fn parse(status: &str) -> Self {
        match status {
            "finished" => JobStatus::Finished,
            "error" | "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

impl Job {
    fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    fn failure_message(&self) -> String {
        self.tasks
            .iter()
            .find(|t| t.status.as_deref() == Some("error"))
            .map(|t| {
                format!(
                    "task {} failed: {}",
                    t.name,
                    t.message.as_deref().unwrap_or("no message")
                )
            })
            .unwrap_or_else(|| format!("job {} ended with status {}", self.id, self.status))
    }

    fn export_url(&self) -> Option<String> {
        self.task(EXPORT_TASK)?
            .result
            .as_ref()?
            .files
            .first()
            .map(|f| f.url.clone())
    }
}

/// Converts through a remote job API, polling until the job settles
pub struct JobPollingConverter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    policy: PollPolicy,
}

impl JobPollingConverter {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            policy,
        }
    }

    async fn create_job(&self) -> Result<Job, PipelineError> {
        let mut tasks = serde_json::Map::new();
        tasks.insert(
            IMPORT_TASK.to_string(),
            serde_json::json!({ "operation": "import/upload" }),
        );
        tasks.insert(
            CONVERT_TASK.to_string(),
            serde_json::json!({
                "operation": "convert",
                "input": IMPORT_TASK,
                "input_format": "docx",
                "output_format": "pdf"
            }),
        );
        tasks.insert(
            EXPORT_TASK.to_string(),
            serde_json::json!({ "operation": "export/url", "input": CONVERT_TASK }),
        );
        let request = serde_json::json!({ "tasks": tasks, "tag": "dulit-pass" });

        let response = self
            .client
            .post(format!("{}/v2/jobs", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Conversion(format!("Failed to create job: {}", e)))?;

        parse_job(response).await
    }

    async fn fetch_job(&self, job_id: &str) -> Result<Job, PipelineError> {
        let response = self
            .client
            .get(format!("{}/v2/jobs/{}", self.base_url, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| PipelineError::Conversion(format!("Failed to fetch job {}: {}", job_id, e)))?;

        parse_job(response).await
    }

    async fn upload_source(&self, form: &UploadForm, source: &Path) -> Result<(), PipelineError> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.docx")
            .to_string();
        let bytes = tokio::fs::read(source).await?;

        let mut multipart = reqwest::multipart::Form::new();
        for (key, value) in &form.parameters {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            multipart = multipart.text(key.clone(), value);
        }
        multipart = multipart.part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&form.url)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| PipelineError::Upload(format!("Failed to upload source: {}", e)))?;

        let status = response.status();
        if !status.is_success() && !status.is_redirection() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upload(format!(
                "Upload form returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn run_job(&self, source: &Path) -> Result<String, PipelineError> {
        let job = self.create_job().await?;
        tracing::debug!(job_id = %job.id, "Conversion job created");

        let form = job
            .task(IMPORT_TASK)
            .and_then(|t| t.result.as_ref())
            .and_then(|r| r.form.as_ref())
            .ok_or_else(|| {
                PipelineError::Conversion(format!("Job {} has no upload form", job.id))
            })?;
        self.upload_source(form, source).await?;

        loop {
            let current = self.fetch_job(&job.id).await?;
            match JobStatus::parse(&current.status) {
                JobStatus::Finished => {
                    tracing::debug!(job_id = %job.id, "Conversion job finished");
                    return current.export_url().ok_or_else(|| {
                        PipelineError::Conversion(format!("Job {} finished without export URL", job.id))
                    });
                }
                JobStatus::Failed => {
                    return Err(PipelineError::Conversion(current.failure_message()));
                }
                JobStatus::Pending => {
                    tracing::trace!(job_id = %job.id, status = %current.status, "Job still running");
                    tokio::time::sleep(self.policy.interval).await;
                }
            }
        }
    }
}

async fn parse_job(response: reqwest::Response) -> Result<Job, PipelineError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::Conversion(format!(
            "Conversion API returned {}: {}",
            status, body
        )));
    }

    let envelope: JobEnvelope = response
        .json()
        .await
        .map_err(|e| PipelineError::Conversion(format!("Failed to parse job: {}", e)))?;
    Ok(envelope.data)
}

#[async_trait]
impl ConversionStrategy for JobPollingConverter {
    fn kind(&self) -> ConversionKind {
        ConversionKind::JobPolling
    }

    async fn convert(&self, source: &Path, cancel: &CancellationToken) -> Result<Converted, PipelineError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = tokio::time::timeout(self.policy.timeout, self.run_job(source)) => {
                result
                    .map_err(|_| PipelineError::Timeout(self.policy.timeout.as_secs()))?
                    .map(Converted::Hosted)
            }
        }
    }
}
