use thiserror::Error;

use terma_terms::Term;
use terma_terms::TermError;
use terma_terms::TermVar;

/// The reasons why two terms cannot be unified.
#[derive(Error, Debug, Clone)]
pub enum UnificationError {
    /// Binding the variable would create an infinite term, since its
    /// representative occurs in the term through the given occurrence.
    #[error("cannot bind {variable} to {term}, since its representative {representative} occurs in it as {occurrence}")]
    OccursCheck {
        variable: TermVar,
        occurrence: TermVar,
        representative: TermVar,
        term: Term,
    },

    /// The terms differ in their labels.
    #[error("cannot unify {left} with {right}: {reason}")]
    Mismatch { left: Term, right: Term, reason: String },

    /// Reassembling a list concatenation failed, because a variable in list
    /// position is bound to a term that is not a list.
    #[error(transparent)]
    Term(#[from] TermError),
}
