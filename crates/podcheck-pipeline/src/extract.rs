//! Claim and Attestation Extractors: projections from a parsed document
//! onto the fields a verification kind needs.

use podcheck_core::{Field, ParsedDocument, PipelineError, VerificationKind};

/// The subject's claimed value and the name it is displayed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub display_name: String,
    pub value: String,
}

/// Pull the claimed value and display name out of the subject's document.
pub fn extract_claim(kind: VerificationKind, doc: &ParsedDocument) -> Result<Claim, PipelineError> {
    let value = doc.require(kind.claim_field())?;
    let display_name = doc.require(Field::DisplayName)?;
    Ok(Claim {
        display_name: display_name.to_string(),
        value: value.to_string(),
    })
}

/// Pull the attested comparison value out of the authority's document.
pub fn extract_attestation(
    kind: VerificationKind,
    doc: &ParsedDocument,
) -> Result<String, PipelineError> {
    doc.require(kind.attestation_field()).map(str::to_string)
}
