//! Delivery of finished files to remote storage

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;

use super::error::PipelineError;

/// Sends a local file somewhere public and returns its URL
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, path: &Path) -> Result<String, PipelineError>;
}

/// JSON body understood by the script endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptUpload<'a> {
    file_name: &'a str,
    file_data: String,
}

/// Uploads base64-encoded files to a web script endpoint.
///
/// The script stores the file (converting DOCX to PDF on the way when it
/// receives one) and answers with `{"pdfUrl": "..."}`.
pub struct ScriptUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl ScriptUploader {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub async fn upload_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<String, PipelineError> {
        let payload = ScriptUpload {
            file_name,
            file_data: base64::engine::general_purpose::STANDARD.encode(bytes),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PipelineError::Upload(format!("Failed to reach script endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upload(format!(
                "Script endpoint returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Upload(format!("Failed to parse response: {}", e)))?;

        extract_url(&result).ok_or_else(|| {
            PipelineError::Upload(format!("Script response has no URL: {}", result))
        })
    }
}

#[async_trait]
impl Delivery for ScriptUploader {
    async fn deliver(&self, path: &Path) -> Result<String, PipelineError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PipelineError::Upload(format!("Invalid file name: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;

        tracing::debug!(file_name, size = bytes.len(), "Uploading file to script endpoint");
        self.upload_bytes(file_name, &bytes).await
    }
}

fn extract_url(result: &serde_json::Value) -> Option<String> {
    ["pdfUrl", "url"]
        .iter()
        .filter_map(|key| result[*key].as_str())
        .find(|url| !url.is_empty())
        .map(str::to_string)
}
