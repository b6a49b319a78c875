//! DOCX template rendering
//!
//! A DOCX file is a ZIP archive; the visible text lives in `word/document.xml`
//! plus optional header/footer parts. Placeholders use the `{{ Name }}` form.

use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::PipelineError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Values substituted into the pass template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFields {
    pub first_name: String,
    pub day_number: String,
}

impl TemplateFields {
    fn get(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "FirstName" => Some(&self.first_name),
            "DayNumber" => Some(&self.day_number),
            _ => None,
        }
    }
}

/// Renders the pass template stored at a fixed path
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template_path: PathBuf,
}

impl TemplateRenderer {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Fill the template and write the result to `output`
    pub async fn render(&self, fields: &TemplateFields, output: &Path) -> Result<(), PipelineError> {
        let template = self.template_path.clone();
        let fields = fields.clone();
        let output = output.to_path_buf();

        tokio::task::spawn_blocking(move || render_docx(&template, &fields, &output))
            .await
            .map_err(|e| PipelineError::Template(format!("Render task failed: {}", e)))?
    }

    /// Replace the stored template with an uploaded one.
    ///
    /// The upload is validated first and written next to the old template
    /// before being renamed over it.
    pub async fn replace(&self, bytes: &[u8]) -> Result<(), PipelineError> {
        validate_template(bytes)?;

        if let Some(parent) = self.template_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let staging = self.template_path.with_extension("docx.upload");
        tokio::fs::write(&staging, bytes).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.template_path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        tracing::info!(path = %self.template_path.display(), size = bytes.len(), "Template replaced");
        Ok(())
    }
}

/// Check that `bytes` look like a DOCX document
pub fn validate_template(bytes: &[u8]) -> Result<(), PipelineError> {
    let archive = open_archive(Cursor::new(bytes))?;
    ensure_document_part(&archive)
}

fn open_archive<R: Read + Seek>(reader: R) -> Result<ZipArchive<R>, PipelineError> {
    ZipArchive::new(reader)
        .map_err(|e| PipelineError::Template(format!("Template is not a DOCX archive: {}", e)))
}

fn ensure_document_part<R: Read + Seek>(archive: &ZipArchive<R>) -> Result<(), PipelineError> {
    if archive.file_names().any(|name| name == DOCUMENT_PART) {
        Ok(())
    } else {
        Err(PipelineError::Template(format!(
            "Template has no {} part",
            DOCUMENT_PART
        )))
    }
}

fn zip_error(e: zip::result::ZipError) -> PipelineError {
    PipelineError::Template(e.to_string())
}

fn render_docx(template: &Path, fields: &TemplateFields, output: &Path) -> Result<(), PipelineError> {
    let file = File::open(template).map_err(|e| {
        PipelineError::Template(format!(
            "Cannot open template {}: {}",
            template.display(),
            e
        ))
    })?;
    let mut archive = open_archive(file)?;
    ensure_document_part(&archive)?;

    let out_file = File::create(output).map_err(|e| {
        PipelineError::Template(format!("Cannot create {}: {}", output.display(), e))
    })?;
    let mut writer = ZipWriter::new(out_file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_error)?;
        let name = entry.name().to_string();

        if is_fillable_part(&name) {
            let mut xml = String::new();
            entry
                .read_to_string(&mut xml)
                .map_err(|e| PipelineError::Template(format!("Cannot read {}: {}", name, e)))?;
            let filled = fill_placeholders(&xml, fields);

            writer.start_file(name, options).map_err(zip_error)?;
            writer
                .write_all(filled.as_bytes())
                .map_err(|e| PipelineError::Template(e.to_string()))?;
        } else {
            writer.raw_copy_file(entry).map_err(zip_error)?;
        }
    }

    writer.finish().map_err(zip_error)?;
    Ok(())
}

fn is_fillable_part(name: &str) -> bool {
    if name == DOCUMENT_PART {
        return true;
    }
    name.strip_prefix("word/")
        .map(|rest| {
            !rest.contains('/')
                && rest.ends_with(".xml")
                && (rest.starts_with("header") || rest.starts_with("footer"))
        })
        .unwrap_or(false)
}

/// Replace known `{{ Name }}` placeholders in a WordprocessingML part.
///
/// Word may split a placeholder over several runs, so markup between the
/// braces is ignored when reading the name and re-emitted after the value to
/// keep the XML balanced.
fn fill_placeholders(xml: &str, fields: &TemplateFields) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let inner = &after[..end];
        // a stray `{{` earlier in the part must not swallow a later placeholder
        if let Some(nested) = inner.rfind("{{") {
            let restart = start + 2 + nested;
            out.push_str(&rest[start..restart]);
            rest = &rest[restart..];
            continue;
        }

        let (text, markup) = split_markup(inner);
        match fields.get(text.trim()) {
            Some(value) => {
                out.push_str(&html_escape::encode_text(value));
                out.push_str(&markup);
            }
            None => {
                out.push_str("{{");
                out.push_str(inner);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Separate character data from tags
fn split_markup(fragment: &str) -> (String, String) {
    let mut text = String::new();
    let mut markup = String::new();
    let mut in_tag = false;

    for c in fragment.chars() {
        match c {
            '<' => {
                in_tag = true;
                markup.push(c);
            }
            '>' if in_tag => {
                in_tag = false;
                markup.push(c);
            }
            _ if in_tag => markup.push(c),
            _ => text.push(c),
        }
    }

    (text, markup)
}
