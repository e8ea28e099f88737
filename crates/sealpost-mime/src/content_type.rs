//! Content-Type handling for container parts.

use crate::error::{Error, Result};

/// Characters trimmed from the end of a container's media type.
const TRAILING_WS: [char; 4] = [' ', '\t', '\r', '\n'];

/// Appends a `boundary` parameter to a container's Content-Type value.
///
/// The value is trimmed at the end and terminated with `;` if it does
/// not already end with one; the parameter goes on a folded
/// continuation line.
///
/// ```
/// use sealpost_mime::with_boundary;
///
/// let value = with_boundary("multipart/mixed", "=-=01-abc=-=").unwrap();
/// assert_eq!(value, "multipart/mixed;\n\tboundary=\"=-=01-abc=-=\"");
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] if the value is empty or only
/// whitespace.
pub fn with_boundary(value: &str, boundary: &str) -> Result<String> {
    if value.is_empty() {
        return Err(Error::InvalidValue("empty Content-Type".to_string()));
    }

    let trimmed = value.trim_end_matches(TRAILING_WS);
    if trimmed.is_empty() {
        return Err(Error::InvalidValue(
            "Content-Type consists only of whitespace".to_string(),
        ));
    }

    let separator = if trimmed.ends_with(';') { "" } else { ";" };
    Ok(format!("{trimmed}{separator}\n\tboundary=\"{boundary}\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_plain_media_type() {
        let value = with_boundary("multipart/signed", "B").unwrap();
        assert_eq!(value, "multipart/signed;\n\tboundary=\"B\"");
    }

    #[test]
    fn test_existing_semicolon() {
        let value = with_boundary("multipart/signed; protocol=\"application/pgp-signature\";", "B")
            .unwrap();
        assert_eq!(
            value,
            "multipart/signed; protocol=\"application/pgp-signature\";\n\tboundary=\"B\""
        );
    }

    #[test]
    fn test_trailing_whitespace() {
        let value = with_boundary("multipart/mixed;  \t\n", "B").unwrap();
        assert_eq!(value, "multipart/mixed;\n\tboundary=\"B\"");

        let value = with_boundary("multipart/mixed \n", "B").unwrap();
        assert_eq!(value, "multipart/mixed;\n\tboundary=\"B\"");
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            with_boundary("", "B").unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
        assert_eq!(
            with_boundary(" \t\n", "B").unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
    }
}
