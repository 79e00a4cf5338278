#![forbid(unsafe_code)]

use std::fmt;

use terma_collections::PersistentDisjointMap;
use terma_collections::VecSet;
use terma_terms::Term;
use terma_terms::TermVar;

use crate::EquivalenceClass;
use crate::Substitution;
use crate::UnificationError;
use crate::engine;
use crate::engine::BindingStore;
use crate::substitution::format_substitution;
use crate::union_find::merge_values;

/// A substitution backed by a [PersistentDisjointMap]. Cloning is constant
/// time, and unification returns a new substitution that shares its
/// structure with the original, which stays valid.
#[derive(Clone, Default)]
pub struct PersistentSubstitution {
    classes: PersistentDisjointMap<TermVar, Option<Term>>,
}

impl PersistentSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the substitution that additionally makes both terms equal.
    pub fn unify(&self, left: &Term, right: &Term) -> Result<Self, UnificationError> {
        self.unify_all([(left.clone(), right.clone())])
    }

    /// Returns the substitution that additionally makes the terms of every pair equal.
    pub fn unify_all(&self, pairs: impl IntoIterator<Item = (Term, Term)>) -> Result<Self, UnificationError> {
        let mut result = self.clone();
        engine::unify_pairs(&mut result, pairs)?;
        Ok(result)
    }

    /// Returns the number of variables in all classes.
    pub fn variable_count(&self) -> usize {
        self.classes.len()
    }
}

impl Substitution for PersistentSubstitution {
    fn find(&self, var: &TermVar) -> Option<TermVar> {
        self.classes.find(var)
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

impl BindingStore for PersistentSubstitution {
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

impl fmt::Debug for PersistentSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_substitution(f, self)
    }
}
