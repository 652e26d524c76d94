//! Input validation for the text field

use crate::error::{Error, Result};

/// Trim the raw text field value and reject it if nothing remains.
///
/// No length cap or content filtering is applied; the trimmed text is passed on
/// verbatim.
pub fn validate_input(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_input() {
        for raw in ["", " ", "\t", "\n  \r\n", "\u{3000}"] {
            assert!(
                matches!(validate_input(raw), Err(Error::EmptyInput)),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(validate_input("  hello world \n").unwrap(), "hello world");
    }

    #[test]
    fn test_keeps_inner_content_verbatim() {
        let long = "x".repeat(4096);
        assert_eq!(validate_input(&long).unwrap(), long);
        assert_eq!(validate_input("a  b").unwrap(), "a  b");
    }
}
