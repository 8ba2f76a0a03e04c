use podcheck_core::{DocumentFormat, PipelineError};

/// Document parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid Turtle: {0}")]
    Turtle(String),

    #[error("invalid XML: {0}")]
    Xml(String),

    #[error("invalid base IRI: {0}")]
    BaseIri(String),

    #[error("body is neither {hinted} ({hinted_error}) nor {fallback} ({fallback_error})")]
    Unparsable {
        hinted: DocumentFormat,
        hinted_error: String,
        fallback: DocumentFormat,
        fallback_error: String,
    },
}

impl From<DocumentError> for PipelineError {
    fn from(err: DocumentError) -> Self {
        PipelineError::ParseFailure(err.to_string())
    }
}
