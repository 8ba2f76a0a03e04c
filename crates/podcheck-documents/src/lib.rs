//! Podcheck Documents: turns fetched pod documents into a format-agnostic
//! [`ParsedDocument`].
//!
//! Two families are understood:
//! - Turtle triples, matched by predicate fragment
//! - XML tags, matched by qualified element name
//!
//! Both are driven by the single rule table in [`rules`].

pub mod error;
pub mod rules;
pub mod tags;
pub mod triples;

use url::Url;

use podcheck_core::{DocumentFormat, ParsedDocument};

pub use error::DocumentError;
pub use rules::{FieldRule, FIELD_RULES};

/// Parse `body` as exactly one family.
pub fn parse_as(
    body: &str,
    format: DocumentFormat,
    base: Option<&Url>,
) -> Result<ParsedDocument, DocumentError> {
    match format {
        DocumentFormat::Triples => triples::parse_triples(body, base),
        DocumentFormat::Tags => tags::parse_tags(body),
    }
}

/// Parse `body`, trying the hinted family first and the other one second.
///
/// Fails only when the body is valid in neither family.
pub fn parse(
    body: &str,
    hint: DocumentFormat,
    base: Option<&Url>,
) -> Result<ParsedDocument, DocumentError> {
    let hinted_error = match parse_as(body, hint, base) {
        Ok(doc) => return Ok(doc),
        Err(e) => e,
    };

    let fallback = hint.other();
    tracing::debug!(
        hint = %hint,
        fallback = %fallback,
        error = %hinted_error,
        "hinted document format failed, trying fallback"
    );

    parse_as(body, fallback, base).map_err(|fallback_error| DocumentError::Unparsable {
        hinted: hint,
        hinted_error: hinted_error.to_string(),
        fallback,
        fallback_error: fallback_error.to_string(),
    })
}
