use std::fmt;

use terma_terms::Term;
use terma_terms::TermError;
use terma_terms::TermVar;

use crate::EquivalenceClass;
use crate::Substitution;

/// The substitution that maps every variable to itself.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptySubstitution;

impl Substitution for EmptySubstitution {
    fn find(&self, _var: &TermVar) -> Option<TermVar> {
        None
    }

    fn value(&self, _var: &TermVar) -> Option<Term> {
        None
    }

    fn to_map(&self) -> Vec<EquivalenceClass> {
        Vec::new()
    }

    fn len(&self) -> usize {
        0
    }

    fn apply(&self, term: &Term) -> Result<Term, TermError> {
        Ok(term.clone())
    }
}

impl fmt::Debug for EmptySubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[]")
    }
}
