use thiserror::Error;

/// Errors raised while extracting facts from an XBRL instance document.
///
/// `Parse` and `ContextResolution` are fatal for the whole document: the
/// caller should record the filing as invalid and move on. The remaining
/// variants concern a single context or fact element; the extraction loop
/// logs them and skips the element.
#[derive(Error, Debug)]
pub enum XbrlError {
    /// The input bytes are not well-formed XML.
    #[error("not a well-formed XBRL instance document: {0}")]
    Parse(#[from] roxmltree::Error),

    /// A required document-level context could not be resolved.
    #[error("context resolution failed: {0}")]
    ContextResolution(String),

    /// A period date is not an ISO `YYYY-MM-DD` date.
    #[error("malformed date {text:?} in context {context_id}")]
    DateFormat { context_id: String, text: String },

    /// A per-element numeric field (e.g. `decimals`) is malformed.
    #[error("malformed {field} value {text:?} on element {concept}")]
    ValueFormat {
        concept: String,
        field: &'static str,
        text: String,
    },

    /// A fact value exceeds the configured integer-digit bound.
    #[error("value for {concept} has {digits} integer digits, bound is {max}")]
    ValueRange {
        concept: String,
        digits: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, XbrlError>;
