//! The field extraction rule table shared by both document families.

use podcheck_core::Field;

/// How one logical field is located in each document family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: Field,
    /// Substrings searched for in triple predicate IRIs; any one matches.
    pub predicate_fragments: &'static [&'static str],
    /// Qualified element name, matched exactly.
    pub tag: &'static str,
}

impl FieldRule {
    pub fn matches_predicate(&self, predicate_iri: &str) -> bool {
        self.predicate_fragments
            .iter()
            .any(|fragment| predicate_iri.contains(fragment))
    }

    pub fn matches_tag(&self, qualified_name: &[u8]) -> bool {
        qualified_name == self.tag.as_bytes()
    }
}

/// One rule per field. Within a document the first matching triple or
/// element supplies the value.
///
/// The Dublin Core fragments match RDF/XML records that a pod served as
/// Turtle.
pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::DisplayName,
        predicate_fragments: &["#fn", "/elements/1.1/Name"],
        tag: "dc:Name",
    },
    FieldRule {
        field: Field::BirthDate,
        predicate_fragments: &["#bday", "/elements/1.1/DateOfBirth"],
        tag: "dc:DateOfBirth",
    },
    FieldRule {
        field: Field::CreditScore,
        predicate_fragments: &["/elements/1.1/SchufaScore"],
        tag: "dc:SchufaScore",
    },
    FieldRule {
        field: Field::AttestedScore,
        predicate_fragments: &["/elements/1.1/score"],
        tag: "dc:score",
    },
];

/// The rule for an element name, if any.
pub fn rule_for_tag(qualified_name: &[u8]) -> Option<&'static FieldRule> {
    FIELD_RULES.iter().find(|r| r.matches_tag(qualified_name))
}

/// The rule for a field.
pub fn rule_for_field(field: Field) -> &'static FieldRule {
    FIELD_RULES
        .iter()
        .find(|r| r.field == field)
        .unwrap_or_else(|| unreachable!("every field has a rule"))
}
