//! Pass generation orchestrator
//!
//! Runs one request through render → convert → deliver and removes every
//! file it created, whatever the outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::convert::{ConversionStrategy, Converted};
use super::deliver::Delivery;
use super::error::PipelineError;
use super::id::generate_unique_id;
use super::template::{TemplateFields, TemplateRenderer};

/// Raw `/generate-doc` body; `dayNumber` may be a string or a number
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequestBody {
    #[serde(default)]
    pub first_name: serde_json::Value,
    #[serde(default)]
    pub day_number: serde_json::Value,
}

/// Validated pass request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub first_name: String,
    pub day_number: String,
}

impl DocumentRequest {
    pub fn new(first_name: impl Into<String>, day_number: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            day_number: day_number.into(),
        }
    }

    /// Returns `None` when either field is absent, empty or a zero number.
    /// Whitespace-only strings count as present.
    pub fn from_body(body: &DocumentRequestBody) -> Option<Self> {
        let first_name = match &body.first_name {
            serde_json::Value::String(s) if !s.is_empty() => s.clone(),
            _ => return None,
        };
        let day_number = match &body.day_number {
            serde_json::Value::String(s) if !s.is_empty() => s.clone(),
            serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
            _ => return None,
        };
        Some(Self::new(first_name, day_number))
    }

    fn fields(&self) -> TemplateFields {
        TemplateFields {
            first_name: self.first_name.clone(),
            day_number: self.day_number.clone(),
        }
    }
}

/// Successful pipeline outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPass {
    pub url: String,
    pub unique_id: String,
}

/// Pipeline progress, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    IdGenerated,
    Rendered,
    Converted,
    Uploaded,
    CleanedUp,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::IdGenerated => "id_generated",
            PipelineStage::Rendered => "rendered",
            PipelineStage::Converted => "converted",
            PipelineStage::Uploaded => "uploaded",
            PipelineStage::CleanedUp => "cleaned_up",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Files created for one request. Removed on cleanup and again on drop,
/// so an abandoned request leaves nothing behind.
#[derive(Debug, Default)]
struct Artifacts {
    paths: Vec<PathBuf>,
}

impl Artifacts {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to remove artifact: {}", e);
                }
            }
        }
        removed
    }
}

impl Drop for Artifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Keep names filesystem-safe
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn artifact_file_name(request: &DocumentRequest, unique_id: &str) -> String {
    format!(
        "Dulit-pass-{}-{}-{}.docx",
        sanitize_component(&request.first_name),
        sanitize_component(&request.day_number),
        unique_id
    )
}

/// Pass generation pipeline, parameterized over the conversion strategy
pub struct PassGenerator {
    renderer: TemplateRenderer,
    converter: Arc<dyn ConversionStrategy>,
    delivery: Option<Arc<dyn Delivery>>,
    temp_dir: PathBuf,
    shutdown: CancellationToken,
}

impl PassGenerator {
    pub fn new(
        renderer: TemplateRenderer,
        converter: Arc<dyn ConversionStrategy>,
        delivery: Option<Arc<dyn Delivery>>,
        temp_dir: impl Into<PathBuf>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            renderer,
            converter,
            delivery,
            temp_dir: temp_dir.into(),
            shutdown,
        }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Generate a pass and return its public URL
    pub async fn generate(&self, request: &DocumentRequest) -> Result<GeneratedPass, PipelineError> {
        tracing::debug!(stage = %PipelineStage::Start, strategy = ?self.converter.kind(), "Generating pass");

        let unique_id = generate_unique_id();
        tracing::debug!(stage = %PipelineStage::IdGenerated, unique_id = %unique_id);

        let mut artifacts = Artifacts::default();
        let cancel = self.shutdown.child_token();
        let result = self.run(request, &unique_id, &mut artifacts, &cancel).await;

        let removed = artifacts.cleanup();
        tracing::debug!(stage = %PipelineStage::CleanedUp, unique_id = %unique_id, removed);

        match result {
            Ok(url) => {
                tracing::info!(stage = %PipelineStage::Done, unique_id = %unique_id, url = %url, "Pass generated");
                Ok(GeneratedPass { url, unique_id })
            }
            Err(e) => {
                tracing::warn!(stage = %PipelineStage::Failed, unique_id = %unique_id, kind = e.kind(), "Pass generation failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &DocumentRequest,
        unique_id: &str,
        artifacts: &mut Artifacts,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let docx_path = self.temp_dir.join(artifact_file_name(request, unique_id));
        artifacts.track(docx_path.clone());
        self.renderer.render(&request.fields(), &docx_path).await?;
        tracing::debug!(stage = %PipelineStage::Rendered, path = %docx_path.display());

        // a failed conversion can still leave partial output behind
        if let Some(expected) = self.converter.output_path(&docx_path) {
            artifacts.track(expected);
        }
        let converted = self.converter.convert(&docx_path, cancel).await?;
        tracing::debug!(stage = %PipelineStage::Converted, unique_id);

        let url = match converted {
            Converted::Hosted(url) => url,
            Converted::File(pdf_path) => {
                artifacts.track(pdf_path.clone());
                let delivery = self.delivery.as_ref().ok_or_else(|| {
                    PipelineError::Upload("No delivery endpoint configured".to_string())
                })?;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                    url = delivery.deliver(&pdf_path) => url?,
                }
            }
        };

        if url.is_empty() {
            return Err(PipelineError::Upload("Remote side returned an empty URL".to_string()));
        }
        tracing::debug!(stage = %PipelineStage::Uploaded, unique_id);

        Ok(url)
    }
}
