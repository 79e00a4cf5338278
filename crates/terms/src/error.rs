use thiserror::Error;

use crate::Term;

/// The errors that can occur while constructing a term.
#[derive(Error, Debug, Clone)]
pub enum TermError {
    /// The term would violate one of the structural invariants of its variant.
    #[error("malformed term: {0}")]
    Malformed(String),

    /// An operation received a term of a shape it cannot handle, for example a
    /// non-list as the tail of a cons.
    #[error("{operation} expected {expected}, but got {term}")]
    IllegalShape {
        operation: &'static str,
        expected: &'static str,
        term: Term,
    },
}

impl TermError {
    /// Shorthand to construct a [TermError::IllegalShape].
    pub(crate) fn illegal_shape(operation: &'static str, expected: &'static str, term: &Term) -> Self {
        TermError::IllegalShape {
            operation,
            expected,
            term: term.clone(),
        }
    }
}
