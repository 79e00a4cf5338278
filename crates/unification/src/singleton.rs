use std::fmt;

use terma_collections::VecSet;
use terma_collections::vecset;
use terma_terms::Term;
use terma_terms::TermVar;

use crate::EquivalenceClass;
use crate::Substitution;
use crate::substitution::format_substitution;

/// A substitution with a single binding. When the term is a variable both
/// variables form one class, with the term as representative.
#[derive(Clone, PartialEq, Eq)]
pub struct SingletonSubstitution {
    var: TermVar,
    term: Term,
}

impl SingletonSubstitution {
    pub fn new(var: TermVar, term: Term) -> Self {
        debug_assert!(
            term.as_var() != Some(&var),
            "A variable that maps to itself is not a binding"
        );
        debug_assert!(
            !term.iter().any(|subterm| subterm.as_var() == Some(&var)),
            "The variable cannot occur in its own binding"
        );

        Self { var, term }
    }

    pub fn var(&self) -> &TermVar {
        &self.var
    }

    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl Substitution for SingletonSubstitution {
    fn find(&self, var: &TermVar) -> Option<TermVar> {
        match self.term.as_var() {
            Some(representative) if var == representative || *var == self.var => Some(representative.clone()),
            _ if *var == self.var => Some(var.clone()),
            _ => None,
        }
    }

    fn value(&self, var: &TermVar) -> Option<Term> {
        (*var == self.var && !self.term.is_var()).then(|| self.term.clone())
    }

    fn to_map(&self) -> Vec<EquivalenceClass> {
        let class = match self.term.as_var() {
            Some(representative) => EquivalenceClass {
                variables: vecset![self.var.clone(), representative.clone()],
                value: None,
            },
            None => EquivalenceClass {
                variables: VecSet::singleton(self.var.clone()),
                value: Some(self.term.clone()),
            },
        };

        vec![class]
    }

    fn len(&self) -> usize {
        1
    }
}

impl fmt::Debug for SingletonSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_substitution(f, self)
    }
}
