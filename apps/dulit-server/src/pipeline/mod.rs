//! Pass generation pipeline
//!
//! Fills the pass template, converts it to PDF and hands back a public URL.
//!
//! Conversion backends:
//! - Local LibreOffice (`soffice --headless`), followed by script delivery
//! - Remote script endpoint that converts and stores in one call
//! - Job-based conversion API polled until the export URL is ready
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dulit_server::pipeline::{DocumentRequest, PassGenerator};
//!
//! let generator = PassGenerator::new(renderer, converter, delivery, temp_dir, shutdown);
//! let request = DocumentRequest::new("Ada", "2");
//! let pass = generator.generate(&request).await?;
//! println!("{} -> {}", pass.unique_id, pass.url);
//! ```

mod cloudconvert;
mod convert;
mod deliver;
mod error;
mod generator;
mod id;
mod local;
mod template;

pub use cloudconvert::{JobPollingConverter, PollPolicy};
pub use convert::{ConversionStrategy, Converted, RemoteScriptConverter};
pub use deliver::{Delivery, ScriptUploader};
pub use error::PipelineError;
pub use generator::{DocumentRequest, DocumentRequestBody, GeneratedPass, PassGenerator, PipelineStage};
pub use id::{generate_unique_id, UNIQUE_ID_LEN};
pub use local::LocalConverter;
pub use template::{validate_template, TemplateFields, TemplateRenderer};

#[cfg(test)]
pub(crate) use convert::{MockConverter, MockOutcome};
#[cfg(test)]
pub(crate) use template::tests::write_docx;
