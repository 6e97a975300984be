//! File ingestion pipeline.
//!
//! Classifies each user-selected file into one of three handling paths —
//! plain text (decoded locally), PDF (uploaded for backend-side
//! extraction), unsupported (fixed placeholder) — and assembles one
//! [`SourceRecord`] per file.
//!
//! Failure policy: ingestion never fails as a whole. Every per-file failure
//! is converted into an inline placeholder string in the record's content;
//! the placeholders below are kept byte-for-byte from the source system
//! because downstream consumers treat them as sentinel values. Files are
//! processed sequentially, in input order, and the finished batch is
//! returned as one unit — partial batches are never surfaced.

use std::path::{Path, PathBuf};

use crate::models::{IdSource, SourceRecord};
use crate::registry::Registry;

pub const MIME_PDF: &str = "application/pdf";

/// Name suffixes treated as plain text in addition to any `text/*` MIME.
const TEXT_EXTENSIONS: [&str; 11] = [
    ".txt", ".md", ".csv", ".json", ".xml", ".html", ".htm", ".log", ".yaml", ".yml", ".ini",
];

/// Placeholder content for a local file that could not be read.
pub fn read_failure_placeholder(name: &str) -> String {
    format!("[파일 읽기 실패: {}]", name)
}

/// Placeholder content when the backend returned no extracted text.
pub const PDF_EXTRACTION_FAILED: &str = "[PDF 텍스트 추출 실패]";

/// Placeholder content when the extraction upload itself failed.
pub fn upload_error_placeholder(err: &str) -> String {
    format!("[PDF 업로드 중 오류: {}]", err)
}

/// Placeholder content for files outside the supported type set.
pub fn unsupported_placeholder(name: &str) -> String {
    format!("[지원되지 않는 파일 형식: {}]", name)
}

/// Handling path for one file. First match wins: text, then PDF, then
/// the unsupported fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Pdf,
    Unsupported,
}

pub fn classify(name: &str, mime_type: &str) -> FileKind {
    if is_text_file(name, mime_type) {
        FileKind::Text
    } else if mime_type == MIME_PDF || name.to_lowercase().ends_with(".pdf") {
        FileKind::Pdf
    } else {
        FileKind::Unsupported
    }
}

pub fn is_text_file(name: &str, mime_type: &str) -> bool {
    let lower = name.to_lowercase();
    mime_type.starts_with("text/") || TEXT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Infer a MIME type from the file name, standing in for the declared type
/// a browser would supply. Unknown extensions get `application/octet-stream`.
pub fn guess_mime(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let ext = lower.rsplit('.').next().unwrap_or("");
    match ext {
        "txt" | "log" | "ini" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "yaml" | "yml" => "application/yaml",
        "pdf" => MIME_PDF,
        _ => "application/octet-stream",
    }
}

/// Ingest a batch of local files into source records.
///
/// One record per input path, in input order, each with a fresh identifier
/// from `ids`. PDFs are uploaded to the extraction endpoint with
/// `selected_indexes` as the targeting parameter. Total latency is the sum
/// of per-file round trips; there is no fan-out and no cancellation.
pub async fn ingest_files(
    paths: &[PathBuf],
    selected_indexes: &[String],
    registry: &Registry,
    ids: &dyn IdSource,
) -> Vec<SourceRecord> {
    let mut batch = Vec::with_capacity(paths.len());

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = guess_mime(&name).to_string();

        let content = match classify(&name, &mime_type) {
            FileKind::Text => read_text(path, &name).await,
            FileKind::Pdf => {
                upload_for_extraction(path, &name, &mime_type, selected_indexes, registry).await
            }
            FileKind::Unsupported => {
                tracing::warn!(%name, %mime_type, "unsupported file type");
                unsupported_placeholder(&name)
            }
        };

        batch.push(SourceRecord {
            id: ids.next_id(),
            name,
            mime_type,
            content,
        });
    }

    batch
}

async fn read_text(path: &Path, name: &str) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(%name, error = %e, "file read failed");
            read_failure_placeholder(name)
        }
    }
}

async fn upload_for_extraction(
    path: &Path,
    name: &str,
    mime_type: &str,
    selected_indexes: &[String],
    registry: &Registry,
) -> String {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(%name, error = %e, "file read failed before upload");
            return upload_error_placeholder(&e.to_string());
        }
    };

    match registry
        .upload_document(name, bytes, mime_type, selected_indexes)
        .await
    {
        Ok(reply) => match reply.extracted_text.filter(|t| !t.is_empty()) {
            Some(text) => text,
            None => PDF_EXTRACTION_FAILED.to_string(),
        },
        Err(e) => {
            tracing::warn!(%name, error = %e, "extraction upload failed");
            upload_error_placeholder(&e.to_string())
        }
    }
}
