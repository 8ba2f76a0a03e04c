use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Logical field names a fetched document can supply, independent of its
/// source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// The subject's full name.
    DisplayName,
    /// A birth date (plaintext on the subject side, digest on the authority side).
    BirthDate,
    /// The subject's self-asserted credit score.
    CreditScore,
    /// The authority's digest of the credit score.
    AttestedScore,
}

impl Field {
    /// Human-readable label used in status text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DisplayName => "display name",
            Self::BirthDate => "date of birth",
            Self::CreditScore => "credit score",
            Self::AttestedScore => "attested score",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The two document families the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Linked-data triples (Turtle).
    Triples,
    /// Tag-based markup (XML / RDF-XML).
    Tags,
}

impl DocumentFormat {
    /// The family tried when this one fails to parse.
    pub fn other(self) -> Self {
        match self {
            Self::Triples => Self::Tags,
            Self::Tags => Self::Triples,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triples => write!(f, "triples"),
            Self::Tags => write!(f, "tags"),
        }
    }
}

/// Format-agnostic field mapping extracted from one fetched document.
///
/// The first value recorded for a field wins; later values are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    format: DocumentFormat,
    fields: BTreeMap<Field, String>,
}

impl ParsedDocument {
    /// Create an empty document of the given format.
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            fields: BTreeMap::new(),
        }
    }

    /// Record a value unless the field already has one. Returns whether it was stored.
    pub fn insert(&mut self, field: Field, value: impl Into<String>) -> bool {
        if self.fields.contains_key(&field) {
            return false;
        }
        self.fields.insert(field, value.into());
        true
    }

    /// Look up a field.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Look up a field that the caller cannot proceed without.
    pub fn require(&self, field: Field) -> Result<&str, PipelineError> {
        self.get(field).ok_or(PipelineError::FieldMissing(field))
    }

    /// The family that actually parsed.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field was found.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The attributes that can be verified, each a descriptor of field names,
/// expected document formats, and result phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationKind {
    DateOfBirth,
    CreditScore,
}

impl VerificationKind {
    pub const ALL: [VerificationKind; 2] = [Self::DateOfBirth, Self::CreditScore];

    /// Lowercase label, e.g. "date of birth".
    pub fn label(&self) -> &'static str {
        match self {
            Self::DateOfBirth => "date of birth",
            Self::CreditScore => "credit score",
        }
    }

    /// Capitalised label for the start of a line.
    pub fn title(&self) -> &'static str {
        match self {
            Self::DateOfBirth => "Date of birth",
            Self::CreditScore => "Credit score",
        }
    }

    /// Field holding the claimed value in the subject document.
    pub fn claim_field(&self) -> Field {
        match self {
            Self::DateOfBirth => Field::BirthDate,
            Self::CreditScore => Field::CreditScore,
        }
    }

    /// Field holding the attested digest in the authority document.
    pub fn attestation_field(&self) -> Field {
        match self {
            Self::DateOfBirth => Field::BirthDate,
            Self::CreditScore => Field::AttestedScore,
        }
    }

    /// Format expected for the subject's own document.
    pub fn subject_format(&self) -> DocumentFormat {
        match self {
            Self::DateOfBirth => DocumentFormat::Triples,
            Self::CreditScore => DocumentFormat::Tags,
        }
    }

    /// Format expected for the authority's attestation document.
    pub fn authority_format(&self) -> DocumentFormat {
        DocumentFormat::Tags
    }

    /// Path segment / CLI spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateOfBirth => "date-of-birth",
            Self::CreditScore => "credit-score",
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-of-birth" | "dob" => Ok(Self::DateOfBirth),
            "credit-score" | "score" => Ok(Self::CreditScore),
            other => Err(PipelineError::InvalidInput(format!(
                "unknown verification kind: {}",
                other
            ))),
        }
    }
}

/// A claimed value paired with the authority's attested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub kind: VerificationKind,
    pub claimed: String,
    pub attested: String,
}

/// Outcome of a digest comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Match,
    Mismatch,
}

/// Terminal value of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum VerificationResult {
    /// The claimed value matches the authority's attestation.
    Verified {
        display_name: String,
        claimed_value: String,
    },
    /// Both values are present but do not match.
    Invalid {
        display_name: String,
        claimed_value: String,
    },
    /// The run could not reach a verdict.
    Unavailable { reason: String },
}

impl VerificationResult {
    /// Build a result from a verdict over present values.
    pub fn from_verdict(verdict: Verdict, display_name: String, claimed_value: String) -> Self {
        match verdict {
            Verdict::Match => Self::Verified {
                display_name,
                claimed_value,
            },
            Verdict::Mismatch => Self::Invalid {
                display_name,
                claimed_value,
            },
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// User-facing status text for this result.
    pub fn render(&self, kind: VerificationKind) -> String {
        match self {
            Self::Verified {
                display_name,
                claimed_value,
            } => format!(
                "Name: [{}]\n{}: [{}]\n{} has been verified",
                display_name,
                kind.title(),
                claimed_value,
                kind.title()
            ),
            Self::Invalid {
                display_name,
                claimed_value,
            } => format!(
                "Name: [{}]\n{}: [{}]\n{} is not valid",
                display_name,
                kind.title(),
                claimed_value,
                kind.title()
            ),
            Self::Unavailable { reason } => reason.clone(),
        }
    }
}
