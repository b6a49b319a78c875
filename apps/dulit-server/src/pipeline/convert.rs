//! Conversion strategies
//!
//! Defines the strategy trait shared by all DOCX to PDF backends and the
//! remote-script backend, which converts and stores in a single call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::deliver::Delivery;
use super::error::PipelineError;
use crate::config::ConversionKind;

/// Where a converted document ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    /// PDF written locally; still has to be delivered
    File(PathBuf),
    /// Remote side already stored the PDF at this URL
    Hosted(String),
}

/// DOCX to PDF conversion backend
#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    /// Get the strategy type
    fn kind(&self) -> ConversionKind;

    /// Local file the backend may write for `source`, even on failure
    fn output_path(&self, _source: &Path) -> Option<PathBuf> {
        None
    }

    /// Convert `source`, giving up when `cancel` fires
    async fn convert(&self, source: &Path, cancel: &CancellationToken) -> Result<Converted, PipelineError>;
}

/// Ships the DOCX to a script endpoint that converts and uploads it
pub struct RemoteScriptConverter {
    uploader: Arc<dyn Delivery>,
}

impl RemoteScriptConverter {
    pub fn new(uploader: Arc<dyn Delivery>) -> Self {
        Self { uploader }
    }
}

#[async_trait]
impl ConversionStrategy for RemoteScriptConverter {
    fn kind(&self) -> ConversionKind {
        ConversionKind::RemoteScript
    }

    async fn convert(&self, source: &Path, cancel: &CancellationToken) -> Result<Converted, PipelineError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            url = self.uploader.deliver(source) => url.map(Converted::Hosted),
        }
    }
}

/// Mock strategy for testing
#[cfg(test)]
pub struct MockConverter {
    pub outcome: MockOutcome,
}

#[cfg(test)]
pub enum MockOutcome {
    Hosted(String),
    /// Write a PDF next to the source and return it
    LocalFile,
    Fail,
}

#[cfg(test)]
#[async_trait]
impl ConversionStrategy for MockConverter {
    fn kind(&self) -> ConversionKind {
        match self.outcome {
            MockOutcome::LocalFile => ConversionKind::Local,
            _ => ConversionKind::RemoteScript,
        }
    }

    async fn convert(&self, source: &Path, _cancel: &CancellationToken) -> Result<Converted, PipelineError> {
        match &self.outcome {
            MockOutcome::Hosted(url) => Ok(Converted::Hosted(url.clone())),
            MockOutcome::LocalFile => {
                let pdf = source.with_extension("pdf");
                tokio::fs::write(&pdf, b"%PDF-1.7").await?;
                Ok(Converted::File(pdf))
            }
            MockOutcome::Fail => Err(PipelineError::Conversion("mock failure".to_string())),
        }
    }
}
