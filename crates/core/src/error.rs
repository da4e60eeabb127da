//! Error types for the docchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them so the
//! session loop can hand callers one exhaustive, checkable result type.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all docchat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Document errors ---
    #[error("Could not read document: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Document is too large: {chars} characters (limit {limit})")]
    DocumentTooLarge { chars: usize, limit: usize },

    // --- Generation errors ---
    #[error("Generation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Generation is disabled: no API key configured")]
    GenerationDisabled,

    // --- Session errors ---
    #[error("{0}")]
    GuardRejected(String),

    #[error("Message is empty")]
    EmptyInput,

    #[error("Unknown action '{0}' (expected roast, score or improve)")]
    UnknownAction(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the hosted text-generation backend.
///
/// Exactly three kinds, so callers can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Credential missing or rejected by the provider.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model identifier is not known to the provider.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Any other provider-side failure: network, quota, malformed response.
    #[error("{}", transport_message(.status_code, .message))]
    Transport {
        status_code: Option<u16>,
        message: String,
    },
}

fn transport_message(status_code: &Option<u16>, message: &str) -> String {
    match status_code {
        Some(code) => format!("Provider request failed (status {code}): {message}"),
        None => format!("Provider request failed: {message}"),
    }
}

impl ProviderError {
    /// A transport failure that never reached an HTTP status (DNS, TLS, reset...).
    pub fn network(message: impl Into<String>) -> Self {
        Self::Transport {
            status_code: None,
            message: message.into(),
        }
    }

    /// A transport failure with the HTTP status the provider answered with.
    pub fn status(status_code: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status_code: Some(status_code),
            message: message.into(),
        }
    }
}

/// Failures turning an uploaded file into flat text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("The file is empty")]
    Empty,

    #[error("No extractable text found (scanned or image-only document?)")]
    NoText,

    #[error("Malformed PDF: {0}")]
    MalformedPdf(String),

    /// Opening the PDF needs a user password.
    #[error("The PDF is password-protected")]
    PasswordProtected,

    #[error("Unsupported text encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Unsupported file type: {0} (expected .pdf or .txt)")]
    UnsupportedKind(String),

    #[error("Failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_displays_status() {
        let err = Error::Provider(ProviderError::status(429, "Resource has been exhausted"));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("exhausted"));
    }

    #[test]
    fn network_error_has_no_status() {
        let err = ProviderError::network("connection reset");
        assert_eq!(err.to_string(), "Provider request failed: connection reset");
    }

    #[test]
    fn extraction_error_converts() {
        let err: Error = ExtractionError::Empty.into();
        assert!(matches!(err, Error::Extraction(ExtractionError::Empty)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn password_protected_is_its_own_kind() {
        let err: Error = ExtractionError::PasswordProtected.into();
        assert_eq!(err.to_string(), "Could not read document: The PDF is password-protected");
    }

    #[test]
    fn guard_rejection_is_shown_verbatim() {
        let err = Error::GuardRejected("Please upload a PDF first!".into());
        assert_eq!(err.to_string(), "Please upload a PDF first!");
    }
}
