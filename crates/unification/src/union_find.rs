#![forbid(unsafe_code)]

use std::fmt;

use terma_collections::DisjointMap;
use terma_collections::VecSet;
use terma_terms::Term;
use terma_terms::TermVar;

use crate::EquivalenceClass;
use crate::Substitution;
use crate::UnificationError;
use crate::engine;
use crate::engine::BindingStore;
use crate::substitution::format_substitution;

/// A mutable substitution backed by a [DisjointMap], which compresses the
/// paths of the variables it looks up during unification.
#[derive(Clone, Default)]
pub struct UnionFindSubstitution {
    classes: DisjointMap<TermVar, Option<Term>>,
}

impl UnionFindSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the substitution such that both terms become equal. The
    /// substitution is consumed, since a failed unification leaves it in an
    /// unspecified state.
    pub fn unify(self, left: &Term, right: &Term) -> Result<Self, UnificationError> {
        self.unify_all([(left.clone(), right.clone())])
    }

    /// Extends the substitution such that the terms of every pair become equal.
    pub fn unify_all(mut self, pairs: impl IntoIterator<Item = (Term, Term)>) -> Result<Self, UnificationError> {
        engine::unify_pairs(&mut self, pairs)?;
        Ok(self)
    }
}

impl Substitution for UnionFindSubstitution {
    fn find(&self, var: &TermVar) -> Option<TermVar> {
        self.classes.representative(var)
    }

    fn value(&self, var: &TermVar) -> Option<Term> {
        self.classes.get(var).cloned().flatten()
    }

    fn to_map(&self) -> Vec<EquivalenceClass> {
        self.classes
            .classes()
            .into_iter()
            .map(|class| EquivalenceClass {
                variables: VecSet::from_iter(class.members),
                value: class.value.clone(),
            })
            .collect()
    }
}

impl BindingStore for UnionFindSubstitution {
    fn representative(&mut self, var: &TermVar) -> Option<TermVar> {
        self.classes.find(var)
    }

    fn class_value(&self, var: &TermVar) -> Option<Term> {
        self.value(var)
    }

    fn bind(&mut self, var: TermVar, term: Term) {
        if !self.classes.set(&var, Some(term.clone())) {
            self.classes.insert(var, Some(term));
        }
    }

    fn merge(&mut self, left: TermVar, right: TermVar) -> Option<(Term, Term)> {
        let mut pending = None;
        self.classes.union(left, right, || None, |from, into| merge_values(from, into, &mut pending));
        pending
    }
}

/// Combines the values of two merged classes. When both have a value the
/// surviving one is kept, and both are stored in `pending` to be unified.
pub(crate) fn merge_values(from: Option<Term>, into: Option<Term>, pending: &mut Option<(Term, Term)>) -> Option<Term> {
    match (from, into) {
        (Some(from), Some(into)) => {
            *pending = Some((from, into.clone()));
            Some(into)
        }
        (from, into) => into.or(from),
    }
}

impl fmt::Debug for UnionFindSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_substitution(f, self)
    }
}
