//! Local LibreOffice conversion

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::convert::{ConversionStrategy, Converted};
use super::error::PipelineError;
use crate::config::ConversionKind;

/// Converts with a local `soffice --headless` process
pub struct LocalConverter {
    binary: String,
    timeout: Duration,
}

impl LocalConverter {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Check if the converter binary can be started
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

fn output_dir(source: &Path) -> &Path {
    source
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Path soffice writes for `source` in `out_dir`
fn pdf_output_path(source: &Path, out_dir: &Path) -> Result<PathBuf, PipelineError> {
    let stem = source.file_stem().ok_or_else(|| {
        PipelineError::Conversion(format!("Source has no file name: {}", source.display()))
    })?;
    let mut file_name = stem.to_os_string();
    file_name.push(".pdf");
    Ok(out_dir.join(file_name))
}

#[async_trait]
impl ConversionStrategy for LocalConverter {
    fn kind(&self) -> ConversionKind {
        ConversionKind::Local
    }

    fn output_path(&self, source: &Path) -> Option<PathBuf> {
        pdf_output_path(source, output_dir(source)).ok()
    }

    async fn convert(&self, source: &Path, cancel: &CancellationToken) -> Result<Converted, PipelineError> {
        let out_dir = output_dir(source);
        let output = pdf_output_path(source, out_dir)?;

        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source)
            .stdin(Stdio::null())
            // dropping the future kills the child
            .kill_on_drop(true);
        let run = command.output();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = tokio::time::timeout(self.timeout, run) => result,
        };

        let output_status = result
            .map_err(|_| PipelineError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                PipelineError::Conversion(format!("Failed to run {}: {}", self.binary, e))
            })?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(PipelineError::Conversion(format!(
                "{} failed: {}",
                self.binary,
                stderr.trim()
            )));
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(PipelineError::Conversion(format!(
                "{} produced no output at {}",
                self.binary,
                output.display()
            )));
        }

        tracing::debug!(output = %output.display(), "Local conversion finished");
        Ok(Converted::File(output))
    }
}
