//! Export orchestration: pick a renderer, name the file, write it safely.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::format::FormatLocale;
use crate::images::ImageLoader;
use crate::report::ReportRequest;

/// Output formats the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Xlsx,
    /// Word-compatible HTML saved as `.doc`.
    Doc,
    Docx,
    Csv,
    /// Standalone preview page.
    Html,
}

impl ExportFormat {
    pub fn all() -> [Self; 6] {
        [Self::Pdf, Self::Xlsx, Self::Doc, Self::Docx, Self::Csv, Self::Html]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Doc => "application/msword",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "doc" | "word" => Ok(Self::Doc),
            "docx" => Ok(Self::Docx),
            "csv" => Ok(Self::Csv),
            "html" | "preview" => Ok(Self::Html),
            other => Err(format!("Unknown export format: {other}")),
        }
    }
}

/// Failure of one export attempt.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to render {format}: {source:#}")]
    Render {
        format: ExportFormat,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

/// A rendered file ready to be saved or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Render `request` in `format`. Nothing is written to disk.
pub fn export(
    request: &ReportRequest,
    format: ExportFormat,
    locale: &FormatLocale,
    loader: &dyn ImageLoader,
) -> Result<ExportArtifact, ExportError> {
    if request.template.columns.is_empty() {
        let err = ExportError::InvalidTemplate(format!(
            "template \"{}\" has no columns",
            request.template.name
        ));
        error!("Export {format} failed: {err}");
        return Err(err);
    }

    let rendered: anyhow::Result<Vec<u8>> = match format {
        ExportFormat::Pdf => crate::pdf::generate_pdf_report(request, locale, loader),
        ExportFormat::Xlsx => crate::xlsx::generate_xlsx_report(request, locale),
        ExportFormat::Doc => Ok(crate::word::generate_word_report(request, locale).into_bytes()),
        ExportFormat::Docx => crate::docx::generate_docx_report(request, locale),
        ExportFormat::Csv => crate::csv::generate_csv_report(request, locale).map(String::into_bytes),
        ExportFormat::Html => {
            Ok(crate::preview::render_preview_document(request, locale, None).into_bytes())
        }
    };

    match rendered {
        Ok(bytes) => {
            let filename = export_filename(request, format);
            info!(
                format = %format,
                rows = request.rows.len(),
                size = bytes.len(),
                "Exported {filename}"
            );
            Ok(ExportArtifact {
                filename,
                mime_type: format.mime_type().to_string(),
                bytes,
            })
        }
        Err(source) => {
            error!("Export {format} failed: {source:#}");
            Err(ExportError::Render { format, source })
        }
    }
}

/// `{slug(title)}_{yyyy-mm-dd}.{ext}`
pub fn export_filename(request: &ReportRequest, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        slugify(&request.title),
        request.generated_at.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Lower-case, whitespace runs to `_`, path separators dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_gap = false;
    for c in title.trim().chars() {
        if c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
            pending_gap = true;
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_gap && !slug.is_empty() {
            slug.push('_');
        }
        pending_gap = false;
        slug.extend(c.to_lowercase());
    }
    if slug.is_empty() {
        "rapport".to_string()
    } else {
        slug
    }
}

/// Write `artifact` into `dir` through a temporary file that is renamed into
/// place, so a failed write never leaves a partial file behind.
pub fn save_artifact(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(&artifact.filename);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&artifact.bytes)?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;
    info!("Saved {}", target.display());
    Ok(target)
}
