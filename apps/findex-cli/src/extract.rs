use std::path::Path;

use findex_core::error::ExtractError;
use findex_core::traits::TextExtractor;

/// Extractor for plain-text formats. Anything outside the supported
/// extension set is `UnsupportedFormat`; undecodable bytes are
/// `CorruptFile`. Either way the pipeline fails just that document.
pub struct PlainTextExtractor;

const SUPPORTED: &[&str] = &["txt", "md"];

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !SUPPORTED.contains(&ext.as_str()) {
            return Err(ExtractError::UnsupportedFormat(ext));
        }
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes)
            .map_err(|_| ExtractError::CorruptFile("text is not valid UTF-8".into()))
    }
}
