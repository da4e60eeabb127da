//! Document extraction for docchat.
//!
//! Turns an uploaded file (raw bytes plus a declared [`DocumentKind`]) into
//! one flat string. PDF pages are read in page order and concatenated with no
//! separator; plain text is decoded as UTF-8 verbatim.
//!
//! Nothing is retained: the input is borrowed and dropped by the caller.

pub mod pdf;
pub mod text;

use std::path::Path;

use docchat_core::document::{DocumentKind, LoadedDocument};
use docchat_core::error::ExtractionError;
use tracing::{debug, info};

pub use pdf::ExtractedPdf;

/// Extract flat text from `bytes` declared as `kind`.
///
/// Fails on an empty input, a malformed or password-protected PDF, invalid
/// UTF-8, or a document that contains no text at all.
pub fn extract(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractionError> {
    extract_with_pages(bytes, kind).map(|(text, _)| text)
}

/// Like [`extract`], also reporting how many pages were read (1 for text).
pub fn extract_with_pages(
    bytes: &[u8],
    kind: DocumentKind,
) -> Result<(String, usize), ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::Empty);
    }

    let (text, pages) = match kind {
        DocumentKind::Pdf => {
            let pdf = pdf::extract_pages(bytes)?;
            let count = pdf.page_count();
            (pdf.into_text(), count)
        }
        DocumentKind::Text => (text::decode(bytes)?, 1),
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }

    debug!(%kind, pages, chars = text.len(), "Extracted document text");
    Ok((text, pages))
}

/// Read a file fully into memory, infer its kind from the extension, and
/// extract it. The bytes are dropped before returning.
pub async fn load_file(path: &Path) -> Result<LoadedDocument, ExtractionError> {
    let kind = DocumentKind::from_path(path)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| ExtractionError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let (text, page_count) = extract_with_pages(&bytes, kind)?;
    drop(bytes);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    info!(document = %name, %kind, page_count, "Loaded document");
    Ok(LoadedDocument::new(name, kind, text, page_count))
}
