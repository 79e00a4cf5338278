#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::fmt;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use terma_collections::VecSet;
use terma_terms::Term;
use terma_terms::TermBuilder;
use terma_terms::TermError;
use terma_terms::TermTransformer;
use terma_terms::TermVar;
use terma_terms::Yield;

/// An equivalence class of a substitution: variables that are unified with
/// each other, and the term they are bound to, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquivalenceClass {
    pub variables: VecSet<TermVar>,
    pub value: Option<Term>,
}

impl fmt::Display for EquivalenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.variables.iter().format(", "))?;
        if let Some(value) = &self.value {
            write!(f, " -> {value}")?;
        }
        Ok(())
    }
}

/// A mapping from variables to terms. Variables are partitioned into
/// equivalence classes with at most one value each. Variables that the
/// substitution does not know map to themselves.
pub trait Substitution {
    /// Returns the representative of the class of the variable, or `None`
    /// when the variable is unknown.
    fn find(&self, var: &TermVar) -> Option<TermVar>;

    /// Returns the value of the class of the variable.
    fn value(&self, var: &TermVar) -> Option<Term>;

    /// Returns all the equivalence classes.
    fn to_map(&self) -> Vec<EquivalenceClass>;

    /// Returns the number of variables that do not map to themselves.
    fn len(&self) -> usize {
        self.to_map()
            .iter()
            .map(|class| class.variables.len() - usize::from(class.value.is_none()))
            .sum()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true iff the variable belongs to some class.
    fn contains(&self, var: &TermVar) -> bool {
        self.find(var).is_some()
    }

    /// Returns the term the variable maps to: the value of its class, or the
    /// representative when the class has no value. Returns `None` when the
    /// variable maps to itself. With `instantiate` the substitution is
    /// applied to the result.
    fn get(&self, var: &TermVar, instantiate: bool) -> Result<Option<Term>, TermError> {
        let term = match self.value(var) {
            Some(value) => value,
            None => match self.find(var) {
                Some(representative) if representative != *var => Term::from(representative),
                _ => return Ok(None),
            },
        };

        if instantiate {
            self.apply(&term).map(Some)
        } else {
            Ok(Some(term))
        }
    }

    /// Replaces every variable in the term by the term it maps to, until a
    /// fixed point is reached. List concatenations whose variables are
    /// resolved are reassembled, which fails when a variable in list
    /// position is bound to a non-list.
    fn apply(&self, term: &Term) -> Result<Term, TermError> {
        // The instantiated value of every representative that has been resolved.
        let resolved: RefCell<FxHashMap<TermVar, Term>> = RefCell::new(FxHashMap::default());

        TermTransformer::<Term, Resolve>::new().evaluate(
            term.clone(),
            |args, term| {
                if term.is_ground() {
                    return Ok(Yield::Term(term));
                }

                let Some(var) = term.as_var() else {
                    for child in term.children() {
                        args.push(child.clone());
                    }
                    return Ok(Yield::Construct(Resolve::Copy(term)));
                };

                let Some(representative) = self.find(var) else {
                    return Ok(Yield::Term(term));
                };

                if let Some(result) = resolved.borrow().get(&representative) {
                    return Ok(Yield::Term(result.clone()));
                }

                match self.value(&representative) {
                    Some(value) => {
                        args.push(value);
                        Ok(Yield::Construct(Resolve::Bound(representative)))
                    }
                    None if representative == *var => Ok(Yield::Term(term)),
                    None => Ok(Yield::Term(Term::from(representative))),
                }
            },
            |resolve, mut children| match resolve {
                Resolve::Copy(term) => TermBuilder::rebuild(&term, children),
                Resolve::Bound(representative) => {
                    let result = children.pop().expect("A bound variable has exactly one value");
                    resolved.borrow_mut().insert(representative, result.clone());
                    Ok(result)
                }
            },
        )
    }

    /// Returns true iff both terms are equal after applying the substitution.
    fn are_equal(&self, left: &Term, right: &Term) -> Result<bool, TermError> {
        Ok(self.apply(left)? == self.apply(right)?)
    }

    /// Returns true iff the term has no variables after applying the substitution.
    fn is_ground(&self, term: &Term) -> bool {
        let mut visited: FxHashSet<Term> = FxHashSet::default();
        let mut visited_classes: FxHashSet<TermVar> = FxHashSet::default();
        let mut stack = vec![term.clone()];

        while let Some(current) = stack.pop() {
            if current.is_ground() || !visited.insert(current.clone()) {
                continue;
            }

            let Some(var) = current.as_var() else {
                stack.extend(current.children().cloned());
                continue;
            };

            let Some(representative) = self.find(var) else {
                return false;
            };

            if visited_classes.insert(representative.clone()) {
                match self.value(&representative) {
                    Some(value) => stack.push(value),
                    None => return false,
                }
            }
        }

        true
    }
}

/// How [Substitution::apply] constructs a result.
enum Resolve {
    /// Copy the term with the resolved children.
    Copy(Term),
    /// The value of the class of this representative.
    Bound(TermVar),
}

/// Prints the classes of a substitution.
pub(crate) fn format_substitution(f: &mut fmt::Formatter<'_>, substitution: &impl Substitution) -> fmt::Result {
    write!(f, "[{}]", substitution.to_map().iter().format(", "))
}
