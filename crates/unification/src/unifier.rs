#![forbid(unsafe_code)]

use std::fmt;

use log::debug;

use terma_terms::Term;
use terma_terms::TermError;
use terma_terms::TermVar;

use crate::EmptySubstitution;
use crate::EquivalenceClass;
use crate::PersistentSubstitution;
use crate::SingletonSubstitution;
use crate::Substitution;
use crate::UnificationError;
use crate::engine::BindingStore;
use crate::substitution::format_substitution;

/// The result of unification, in the most compact representation for the
/// number of bindings.
#[derive(Clone)]
pub enum Unifier {
    Empty(EmptySubstitution),
    Singleton(SingletonSubstitution),
    General(PersistentSubstitution),
}

/// Returns the most general unifier of both terms, or `None` if they cannot be unified.
pub fn unify(left: &Term, right: &Term) -> Option<Unifier> {
    Unifier::default().unify(left, right)
}

/// Returns the most general unifier that unifies the terms of every pair.
pub fn unify_all(pairs: impl IntoIterator<Item = (Term, Term)>) -> Option<Unifier> {
    Unifier::default().unify_all(pairs)
}

/// Returns the most general unifier of both terms, or the reason why they cannot be unified.
pub fn try_unify(left: &Term, right: &Term) -> Result<Unifier, UnificationError> {
    Unifier::default().try_unify(left, right)
}

/// Returns the most general unifier of every pair, or the reason why they cannot be unified.
pub fn try_unify_all(pairs: impl IntoIterator<Item = (Term, Term)>) -> Result<Unifier, UnificationError> {
    Unifier::default().try_unify_all(pairs)
}

impl Unifier {
    /// Returns the unifier that additionally unifies both terms.
    pub fn unify(&self, left: &Term, right: &Term) -> Option<Unifier> {
        self.unify_all([(left.clone(), right.clone())])
    }

    /// Returns the unifier that additionally unifies the terms of every pair.
    pub fn unify_all(&self, pairs: impl IntoIterator<Item = (Term, Term)>) -> Option<Unifier> {
        match self.try_unify_all(pairs) {
            Ok(unifier) => Some(unifier),
            Err(error) => {
                debug!("No unifier: {error}");
                None
            }
        }
    }

    pub fn try_unify(&self, left: &Term, right: &Term) -> Result<Unifier, UnificationError> {
        self.try_unify_all([(left.clone(), right.clone())])
    }

    pub fn try_unify_all(&self, pairs: impl IntoIterator<Item = (Term, Term)>) -> Result<Unifier, UnificationError> {
        let substitution = self.to_persistent().unify_all(pairs)?;
        Ok(Unifier::compact(substitution))
    }

    /// Selects the representation for the given substitution.
    pub fn compact(substitution: PersistentSubstitution) -> Unifier {
        let classes = substitution.to_map();
        let [class] = classes.as_slice() else {
            return if classes.is_empty() {
                Unifier::Empty(EmptySubstitution)
            } else {
                Unifier::General(substitution)
            };
        };

        match (class.variables.as_slice(), &class.value) {
            ([var], Some(value)) => Unifier::Singleton(SingletonSubstitution::new(var.clone(), value.clone())),
            ([first, second], None) => {
                let alias = if substitution.find(first).as_ref() == Some(first) {
                    second
                } else {
                    first
                };
                let representative = substitution.find(alias).unwrap_or_else(|| alias.clone());
                Unifier::Singleton(SingletonSubstitution::new(alias.clone(), Term::from(representative)))
            }
            _ => Unifier::General(substitution),
        }
    }

    /// Returns the bindings as a persistent substitution.
    pub fn to_persistent(&self) -> PersistentSubstitution {
        match self {
            Unifier::Empty(_) => PersistentSubstitution::new(),
            Unifier::Singleton(singleton) => {
                let mut result = PersistentSubstitution::new();
                match singleton.term().as_var() {
                    Some(representative) => {
                        result.merge(representative.clone(), singleton.var().clone());
                    }
                    None => result.bind(singleton.var().clone(), singleton.term().clone()),
                }
                result
            }
            Unifier::General(substitution) => substitution.clone(),
        }
    }
}

impl Default for Unifier {
    fn default() -> Self {
        Unifier::Empty(EmptySubstitution)
    }
}

impl Substitution for Unifier {
    fn find(&self, var: &TermVar) -> Option<TermVar> {
        match self {
            Unifier::Empty(substitution) => substitution.find(var),
            Unifier::Singleton(substitution) => substitution.find(var),
            Unifier::General(substitution) => substitution.find(var),
        }
    }

    fn value(&self, var: &TermVar) -> Option<Term> {
        match self {
            Unifier::Empty(substitution) => substitution.value(var),
            Unifier::Singleton(substitution) => substitution.value(var),
            Unifier::General(substitution) => substitution.value(var),
        }
    }

    fn to_map(&self) -> Vec<EquivalenceClass> {
        match self {
            Unifier::Empty(substitution) => substitution.to_map(),
            Unifier::Singleton(substitution) => substitution.to_map(),
            Unifier::General(substitution) => substitution.to_map(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Unifier::Empty(substitution) => substitution.len(),
            Unifier::Singleton(substitution) => substitution.len(),
            Unifier::General(substitution) => substitution.len(),
        }
    }

    fn apply(&self, term: &Term) -> Result<Term, TermError> {
        match self {
            Unifier::Empty(substitution) => substitution.apply(term),
            Unifier::Singleton(substitution) => substitution.apply(term),
            Unifier::General(substitution) => substitution.apply(term),
        }
    }
}

impl fmt::Debug for Unifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_substitution(f, self)
    }
}
