//! Source document text extraction.

use serde::Deserialize;
use thiserror::Error;

use crate::DomainError;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No text extractor for .{0} files")]
    Unsupported(String),

    #[error("Document could not be read: {0}")]
    Malformed(String),
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], extension: &str) -> Result<String, ExtractionError>;
}

/// Handles plain-text formats only; binary office formats are reported as unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], extension: &str) -> Result<String, ExtractionError> {
        match extension.to_lowercase().as_str() {
            "txt" | "md" | "csv" => decode_lossy(bytes),
            other => Err(ExtractionError::Unsupported(other.to_string())),
        }
    }
}

/// Decodes UTF-8, dropping byte sequences that are not valid UTF-8.
///
/// Fails only when the input had bytes but none of them were readable.
fn decode_lossy(bytes: &[u8]) -> Result<String, ExtractionError> {
    let decoded = String::from_utf8_lossy(bytes);
    let text: String = decoded
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect();
    if text.trim().is_empty() && matches!(decoded, std::borrow::Cow::Owned(_)) {
        return Err(ExtractionError::Malformed("no readable text".to_string()));
    }
    Ok(text)
}

/// What to do when extraction fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionPolicy {
    /// Keep the request with empty text and flag it for manual follow-up.
    #[default]
    Proceed,
    /// Refuse the request.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub error: Option<String>,
}

pub fn extract_with_policy(
    extractor: &dyn TextExtractor,
    bytes: &[u8],
    extension: &str,
    policy: ExtractionPolicy,
) -> Result<Extraction, DomainError> {
    match extractor.extract(bytes, extension) {
        Ok(text) => Ok(Extraction { text, error: None }),
        Err(e) => match policy {
            ExtractionPolicy::Proceed => Ok(Extraction {
                text: String::new(),
                error: Some(e.to_string()),
            }),
            ExtractionPolicy::Reject => Err(DomainError::validation(e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let text = PlainTextExtractor.extract("\u{feff}Hello".as_bytes(), "TXT").unwrap();
        assert_eq!(text, "Hello");
    }

    #[test]
    fn test_unsupported_and_malformed() {
        assert!(matches!(
            PlainTextExtractor.extract(b"%PDF-1.7", "pdf"),
            Err(ExtractionError::Unsupported(_))
        ));
        assert!(matches!(
            PlainTextExtractor.extract(&[0xff, 0xfe, 0xfd], "txt"),
            Err(ExtractionError::Malformed(_))
        ));
    }

    #[test]
    fn test_latin1_bytes_are_dropped_not_fatal() {
        let text = PlainTextExtractor
            .extract(b"Caf\xe9 soci\xe9t\xe9 offre 2024", "txt")
            .unwrap();
        assert_eq!(text, "Caf socit offre 2024");
        assert_eq!(crate::services::count_words(&text), 4);

        let result = extract_with_policy(
            &PlainTextExtractor,
            b"Prix: 12 \xe0 l'unit\xe9",
            "md",
            ExtractionPolicy::Proceed,
        )
        .unwrap();
        assert!(result.error.is_none());
        assert!(result.text.contains("12"));
    }

    #[test]
    fn test_empty_file_is_not_malformed() {
        assert_eq!(PlainTextExtractor.extract(b"", "txt").unwrap(), "");
    }

    #[test]
    fn test_proceed_policy_flags_failure() {
        let result =
            extract_with_policy(&PlainTextExtractor, b"binary", "docx", ExtractionPolicy::Proceed)
                .unwrap();
        assert_eq!(result.text, "");
        assert!(result.error.unwrap().contains("docx"));
    }

    #[test]
    fn test_reject_policy_fails() {
        let result =
            extract_with_policy(&PlainTextExtractor, b"binary", "docx", ExtractionPolicy::Reject);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_policy_from_config_string() {
        let policy: ExtractionPolicy = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(policy, ExtractionPolicy::Reject);
    }
}
