//! Turtle documents: predicate-fragment lookup over the parsed triples.

use oxiri::Iri;
use rio_api::model::{Literal, Term};
use rio_api::parser::TriplesParser;
use rio_turtle::{TurtleError, TurtleParser};
use url::Url;

use podcheck_core::{DocumentFormat, ParsedDocument};

use crate::error::DocumentError;
use crate::rules::FIELD_RULES;

/// A parsed statement reduced to what field lookup needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub predicate: String,
    pub object: String,
}

/// Parse a Turtle body into its statements, in document order.
///
/// Relative IRIs (e.g. `<#me>`) are resolved against `base`.
pub fn parse_statements(body: &str, base: Option<&Url>) -> Result<Vec<Statement>, DocumentError> {
    let base_iri = base
        .map(|url| Iri::parse(url.to_string()))
        .transpose()
        .map_err(|e| DocumentError::BaseIri(e.to_string()))?;

    let mut statements = Vec::new();
    TurtleParser::new(body.as_bytes(), base_iri)
        .parse_all(&mut |triple| -> Result<(), TurtleError> {
            statements.push(Statement {
                predicate: triple.predicate.iri.to_string(),
                object: object_value(&triple.object),
            });
            Ok(())
        })
        .map_err(|e| DocumentError::Turtle(e.to_string()))?;

    Ok(statements)
}

/// Parse a Turtle body and apply the field rule table.
pub fn parse_triples(body: &str, base: Option<&Url>) -> Result<ParsedDocument, DocumentError> {
    let statements = parse_statements(body, base)?;
    Ok(extract_fields(&statements))
}

/// For each rule, the first statement whose predicate contains one of the
/// rule's fragments supplies the value.
pub fn extract_fields(statements: &[Statement]) -> ParsedDocument {
    let mut doc = ParsedDocument::new(DocumentFormat::Triples);
    for rule in FIELD_RULES {
        if let Some(stmt) = statements.iter().find(|s| rule.matches_predicate(&s.predicate)) {
            doc.insert(rule.field, stmt.object.clone());
        }
    }
    doc
}

fn object_value(term: &Term<'_>) -> String {
    match term {
        Term::NamedNode(node) => node.iri.to_string(),
        Term::BlankNode(node) => node.id.to_string(),
        Term::Literal(Literal::Simple { value })
        | Term::Literal(Literal::LanguageTaggedString { value, .. })
        | Term::Literal(Literal::Typed { value, .. }) => value.to_string(),
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}
