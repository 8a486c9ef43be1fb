//! Common validation utilities.
//!
//! Functions here follow the `validator` custom-function signature so they can
//! be used in `#[validate(custom(function = "..."))]` attributes.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref LANGUAGE_CODE: Regex = Regex::new(r"^[A-Za-z]{2,3}([-_][A-Za-z0-9]{2,8})?$").unwrap();
    static ref HANDLE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,64}$").unwrap();
}

/// Minimum password length for self-registered accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// File extensions accepted for source documents.
pub const ACCEPTED_SOURCE_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "doc", "docx"];

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a language code such as `en`, `IT` or `pt-BR`.
pub fn validate_language_code(code: &str) -> Result<(), ValidationError> {
    if LANGUAGE_CODE.is_match(code.trim()) {
        Ok(())
    } else {
        Err(error(
            "language_code",
            "Language must be a 2-3 letter code with optional region",
        ))
    }
}

/// Lowercases and trims a language code so rate lookups match regardless of input casing.
pub fn normalize_language_code(code: &str) -> String {
    code.trim().replace('_', "-").to_lowercase()
}

/// Validates a user handle.
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    if HANDLE.is_match(handle) {
        Ok(())
    } else {
        Err(error(
            "handle",
            "Handle must be 3-64 characters of letters, digits, '.', '_' or '-'",
        ))
    }
}

/// Validates password length.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(error(
            "password_length",
            "Password must be at least 8 characters",
        ))
    }
}

/// Returns the lowercased extension of a file name, if any.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Validates that a source document has an accepted extension.
pub fn validate_source_file_name(file_name: &str) -> Result<(), ValidationError> {
    match file_extension(file_name) {
        Some(ext) if ACCEPTED_SOURCE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(error(
            "file_type",
            "Unsupported file type; use txt, md, pdf, doc or docx",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert!(validate_language_code("en").is_ok());
        assert!(validate_language_code("IT").is_ok());
        assert!(validate_language_code("pt-BR").is_ok());
        assert!(validate_language_code("zh_Hant").is_ok());
        assert!(validate_language_code("e").is_err());
        assert!(validate_language_code("english!").is_err());
        assert!(validate_language_code("").is_err());
    }

    #[test]
    fn test_normalize_language_code() {
        assert_eq!(normalize_language_code(" EN "), "en");
        assert_eq!(normalize_language_code("pt_BR"), "pt-br");
    }

    #[test]
    fn test_handles() {
        assert!(validate_handle("translator1").is_ok());
        assert!(validate_handle("anna.rossi-2").is_ok());
        assert!(validate_handle("ab").is_err());
        assert!(validate_handle("has space").is_err());
        assert!(validate_handle("<script>").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("12345678").is_ok());
        assert!(validate_password_strength("1234567").is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("contract.DOCX"), Some("docx".into()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".into()));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".env"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_source_file_names() {
        assert!(validate_source_file_name("brochure.txt").is_ok());
        assert!(validate_source_file_name("brochure.PDF").is_ok());
        assert!(validate_source_file_name("brochure.exe").is_err());
        assert!(validate_source_file_name("brochure").is_err());
    }
}
