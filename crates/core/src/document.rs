//! Uploaded document types.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ExtractionError;

/// The declared type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Infer the kind from a file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Result<Self, ExtractionError> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" | "text" | "md" => Ok(Self::Text),
            other => Err(ExtractionError::UnsupportedKind(format!(".{other}"))),
        }
    }

    /// Infer the kind from a file path.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExtractionError::UnsupportedKind(path.display().to_string()))?;
        Self::from_extension(ext)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => f.write_str("pdf"),
            DocumentKind::Text => f.write_str("text"),
        }
    }
}

/// Flat text extracted from one uploaded file.
///
/// Owned by a session and replaced wholesale when a new file is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedDocument {
    /// Display name (usually the file name)
    pub name: String,

    /// What the file was parsed as
    pub kind: DocumentKind,

    /// The extracted text
    pub text: String,

    /// Number of pages read (1 for plain text)
    pub page_count: usize,
}

impl LoadedDocument {
    pub fn new(name: impl Into<String>, kind: DocumentKind, text: impl Into<String>, page_count: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            text: text.into(),
            page_count,
        }
    }

    /// Character count, used by the session's size policy.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_extension("txt").unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::from_extension("md").unwrap(), DocumentKind::Text);
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = DocumentKind::from_extension("docx").unwrap_err();
        assert_eq!(err, ExtractionError::UnsupportedKind(".docx".into()));
    }

    #[test]
    fn kind_from_path_without_extension() {
        let err = DocumentKind::from_path(Path::new("/tmp/resume")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedKind(_)));
    }

    #[test]
    fn char_count_counts_unicode_scalars() {
        let doc = LoadedDocument::new("cv.txt", DocumentKind::Text, "héllo", 1);
        assert_eq!(doc.char_count(), 5);
    }
}
