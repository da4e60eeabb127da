//! Plain-text decoding.

use docchat_core::error::ExtractionError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode `bytes` as UTF-8, verbatim apart from a leading byte-order mark.
pub fn decode(bytes: &[u8]) -> Result<String, ExtractionError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        ExtractionError::UnsupportedEncoding(format!(
            "not valid UTF-8 (invalid byte at offset {})",
            e.utf8_error().valid_up_to()
        ))
    })
}
