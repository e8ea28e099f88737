//! Ordered header storage for a single MIME part.

use crate::error::{Error, Result};

/// Canonical spelling of the MIME version header.
pub const MIME_VERSION: &str = "MIME-Version";
/// Canonical spelling of the content type header.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Canonical spelling of the date header.
pub const DATE: &str = "Date";

/// Transforms a header name into its canonical capitalization.
///
/// `MIME-Version` is special-cased; every other name gets the first
/// letter of each hyphen-separated segment upper-cased and the rest
/// lower-cased. Conversion stops at the first `:`.
///
/// ```
/// use sealpost_mime::capitalize;
///
/// assert_eq!(capitalize("content-type"), "Content-Type");
/// assert_eq!(capitalize("mime-version"), "MIME-Version");
/// ```
#[must_use]
pub fn capitalize(name: &str) -> String {
    if name.eq_ignore_ascii_case(MIME_VERSION) {
        return MIME_VERSION.to_string();
    }

    let (head, tail) = name
        .find(':')
        .map_or((name, ""), |colon| name.split_at(colon));

    let mut out = String::with_capacity(name.len());
    let mut first = true;
    for c in head.chars() {
        if c == '-' {
            first = true;
            out.push(c);
        } else if first {
            out.push(c.to_ascii_uppercase());
            first = false;
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    out.push_str(tail);
    out
}

/// A single header line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    /// Canonical header name.
    pub name: String,
    /// Header value, without the trailing line feed.
    pub value: String,
}

/// Headers of one part, kept in insertion order.
///
/// Duplicate names are allowed; the order is the order of output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Headers {
    headers: Vec<Header>,
}

impl Headers {
    /// Creates a new empty header list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Canonicalizes `name` and appends the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the list cannot grow.
    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        self.headers.try_reserve(1).map_err(Error::out_of_memory)?;
        self.headers.push(Header {
            name: capitalize(name),
            value: value.to_string(),
        });
        Ok(())
    }

    /// Canonicalizes `name` and inserts the header at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the list cannot grow.
    pub(crate) fn insert(&mut self, index: usize, name: &str, value: &str) -> Result<()> {
        self.headers.try_reserve(1).map_err(Error::out_of_memory)?;
        let index = index.min(self.headers.len());
        self.headers.insert(
            index,
            Header {
                name: capitalize(name),
                value: value.to_string(),
            },
        );
        Ok(())
    }

    /// Returns the index of the first header with a canonical name.
    #[must_use]
    pub fn position(&self, canonical_name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.name == canonical_name)
    }

    /// Checks whether a header with this exact canonical name exists.
    #[must_use]
    pub fn has(&self, canonical_name: &str) -> bool {
        self.headers.iter().any(|h| h.name == canonical_name)
    }

    /// Gets the first value stored under a canonical name.
    #[must_use]
    pub fn get(&self, canonical_name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name == canonical_name)
            .map(|h| h.value.as_str())
    }

    /// Returns an iterator over the headers in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.headers.iter()
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if no header has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_capitalize_regular() {
        assert_eq!(capitalize("content-type"), "Content-Type");
        assert_eq!(capitalize("CONTENT-TRANSFER-ENCODING"), "Content-Transfer-Encoding");
        assert_eq!(capitalize("subject"), "Subject");
        assert_eq!(capitalize("x-mailer"), "X-Mailer");
    }

    #[test]
    fn test_capitalize_mime_version() {
        assert_eq!(capitalize("mime-version"), "MIME-Version");
        assert_eq!(capitalize("MIME-VERSION"), "MIME-Version");
        assert_eq!(capitalize("Mime-Version"), "MIME-Version");
    }

    #[test]
    fn test_capitalize_stops_at_colon() {
        assert_eq!(capitalize("x-foo:BAR-baz"), "X-Foo:BAR-baz");
    }

    #[test]
    fn test_capitalize_edge_cases() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("-"), "-");
        assert_eq!(capitalize("a--b"), "A--B");
        assert_eq!(capitalize("ärger-x"), "ärger-X");
    }

    #[test]
    fn test_append_keeps_order() {
        let mut headers = Headers::new();
        headers.append("to", "bob@example.org").unwrap();
        headers.append("from", "alice@example.org").unwrap();
        headers.append("to", "carol@example.org").unwrap();

        let names: Vec<_> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["To", "From", "To"]);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("To"), Some("bob@example.org"));
    }

    #[test]
    fn test_has_is_exact() {
        let mut headers = Headers::new();
        assert!(headers.is_empty());
        headers.append("content-type", "text/plain").unwrap();
        assert!(headers.has(CONTENT_TYPE));
        assert!(!headers.has("content-type"));
        assert!(!headers.has(MIME_VERSION));
    }

    #[test]
    fn test_insert_and_position() {
        let mut headers = Headers::new();
        headers.append("subject", "s").unwrap();
        headers.insert(0, "mime-version", "1.0").unwrap();
        headers.insert(99, "x-last", "z").unwrap();

        let names: Vec<_> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, [MIME_VERSION, "Subject", "X-Last"]);
        assert_eq!(headers.position("Subject"), Some(1));
        assert_eq!(headers.position(DATE), None);
    }

    proptest! {
        #[test]
        fn prop_capitalize_idempotent(name in "[A-Za-z0-9-]{0,24}") {
            let once = capitalize(&name);
            prop_assert_eq!(capitalize(&once), once.clone());
            prop_assert_eq!(once.len(), name.len());
        }

        #[test]
        fn prop_capitalize_case_insensitive(name in "[A-Za-z-]{1,24}") {
            prop_assert_eq!(
                capitalize(&name.to_ascii_lowercase()),
                capitalize(&name.to_ascii_uppercase())
            );
        }
    }
}
