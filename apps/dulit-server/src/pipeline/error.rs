//! Pipeline error types
//!
//! Every adapter in the pipeline reports failures through this one type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Template missing, unreadable or not a DOCX archive
    #[error("Template error: {0}")]
    Template(String),

    /// Converter unavailable, crashed, or remote job reported failure
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Remote endpoint rejected the file or answered without a URL
    #[error("Upload error: {0}")]
    Upload(String),

    /// Conversion did not finish before the deadline
    #[error("Conversion timed out after {0} seconds")]
    Timeout(u64),

    /// Request was cancelled (client gone or server shutting down)
    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Short tag used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Template(_) => "template",
            PipelineError::Conversion(_) => "conversion",
            PipelineError::Upload(_) => "upload",
            PipelineError::Timeout(_) => "timeout",
            PipelineError::Cancelled => "cancelled",
            PipelineError::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Upload(err.to_string())
    }
}
