//! `application/x-www-form-urlencoded` payload decoding.

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::record::Record;

/// Errors that can occur while decoding a form payload.
///
/// Any of these rejects the whole payload; nothing is partially saved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    /// The payload, or a percent-decoded field, is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A field did not contain exactly one `=`.
    #[error("malformed field {token:?}: expected exactly one '='")]
    MalformedPair {
        /// The offending `&`-separated token, still encoded.
        token: String,
    },
}

/// Decode a raw form body into a [`Record`].
///
/// The body is split on `&` and `=` before percent-decoding, so encoded
/// separators (`%26`, `%3D`) end up as literal characters in names and
/// values. Later duplicates of a field name overwrite earlier ones.
///
/// # Errors
///
/// Returns [`FormError`] if the payload is not UTF-8 or any token lacks
/// exactly one `=`.
pub fn parse(payload: &[u8]) -> Result<Record, FormError> {
    let text = std::str::from_utf8(payload)?;

    let mut record = Record::new();
    for token in text.split('&') {
        let (name, value) = split_pair(token)?;
        record.insert(unquote_plus(name)?, unquote_plus(value)?);
    }
    Ok(record)
}

fn split_pair(token: &str) -> Result<(&str, &str), FormError> {
    match token.split_once('=') {
        Some((name, value)) if !value.contains('=') => Ok((name, value)),
        _ => Err(FormError::MalformedPair {
            token: token.to_string(),
        }),
    }
}

/// Percent-decode a form component, treating `+` as a space.
///
/// Malformed escapes such as `%zz` are kept literally.
///
/// # Errors
///
/// Returns [`FormError::InvalidUtf8`] if the decoded bytes are not UTF-8.
pub fn unquote_plus(component: &str) -> Result<String, FormError> {
    let spaced = component.replace('+', " ");
    let decoded = percent_decode_str(&spaced).decode_utf8()?;
    Ok(decoded.into_owned())
}
