#![forbid(unsafe_code)]

use log::debug;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use terma_terms::Term;
use terma_terms::TermBuilder;
use terma_terms::TermError;
use terma_terms::TermKind;
use terma_terms::TermVar;
use terma_terms::cons;
use terma_terms::list;
use terma_utilities::debug_trace;

use crate::UnificationError;

/// The operations of a union-find backed substitution that the engine needs.
pub(crate) trait BindingStore {
    /// Returns the representative of the class of the variable.
    fn representative(&mut self, var: &TermVar) -> Option<TermVar>;

    /// Returns the value of the class of the variable.
    fn class_value(&self, var: &TermVar) -> Option<Term>;

    /// Sets the value of the class of the variable, adding the variable when it is unknown.
    fn bind(&mut self, var: TermVar, term: Term);

    /// Merges the classes of both variables. Returns the value of the
    /// absorbed class and the value of the surviving class when both had one.
    fn merge(&mut self, left: TermVar, right: TermVar) -> Option<(Term, Term)>;
}

/// Extends the store such that the terms of every pair become equal.
///
/// Returns an error when that is not possible, in which case the store is
/// left in an unspecified state.
pub(crate) fn unify_pairs<S: BindingStore>(
    store: &mut S,
    pairs: impl IntoIterator<Item = (Term, Term)>,
) -> Result<(), UnificationError> {
    let mut worklist: Vec<(Term, Term)> = pairs.into_iter().collect();
    worklist.reverse();

    // Pairs with a concatenation that can only be solved once its variable is bound.
    let mut postponed: Vec<(Term, Term)> = Vec::new();

    let mut steps = 0usize;
    let mut bindings = 0usize;
    let mut bindings_at_retry = 0usize;
    loop {
        while let Some((left, right)) = worklist.pop() {
            steps += 1;
            debug_trace!("Unifying {left} and {right}");

            if left == right {
                continue;
            }

            match (left.as_var(), right.as_var()) {
                (Some(left), Some(right)) => {
                    bindings += usize::from(unify_variables(store, left, right, &mut worklist)?)
                }
                (Some(var), None) => bindings += usize::from(unify_variable(store, var, &right, &mut worklist)?),
                (None, Some(var)) => bindings += usize::from(unify_variable(store, var, &left, &mut worklist)?),
                (None, None) => unify_terms(store, left, right, &mut worklist, &mut postponed)?,
            }
        }

        if postponed.is_empty() {
            break;
        }

        if bindings == bindings_at_retry {
            let (left, right) = postponed.swap_remove(0);
            return Err(UnificationError::Mismatch {
                left,
                right,
                reason: "the concatenation has no unique solution while its variable is unbound".to_string(),
            });
        }

        debug_trace!("Retrying {} postponed pairs", postponed.len());
        bindings_at_retry = bindings;
        worklist.extend(postponed.drain(..).rev());
    }

    debug!("Unification succeeded after {steps} steps with {bindings} new bindings");
    Ok(())
}

/// Unifies a variable with a term that is not a variable. Returns true iff
/// the class of the variable has been bound.
fn unify_variable<S: BindingStore>(
    store: &mut S,
    var: &TermVar,
    term: &Term,
    worklist: &mut Vec<(Term, Term)>,
) -> Result<bool, UnificationError> {
    let representative = store.representative(var).unwrap_or_else(|| var.clone());

    if let Some(value) = store.class_value(&representative) {
        worklist.push((value, term.clone()));
        return Ok(false);
    }

    occurs_check(store, var, &representative, term)?;
    debug_trace!("Binding {representative} to {term}");
    store.bind(representative, term.clone());
    Ok(true)
}

/// Unifies two variables by merging their classes. Returns true iff the
/// classes were different.
fn unify_variables<S: BindingStore>(
    store: &mut S,
    left: &TermVar,
    right: &TermVar,
    worklist: &mut Vec<(Term, Term)>,
) -> Result<bool, UnificationError> {
    let left_representative = store.representative(left).unwrap_or_else(|| left.clone());
    let right_representative = store.representative(right).unwrap_or_else(|| right.clone());
    if left_representative == right_representative {
        return Ok(false);
    }

    // The merged class is bound to the value of either side, so neither
    // representative may occur in the value of the other side.
    if let Some(value) = store.class_value(&left_representative) {
        occurs_check(store, right, &right_representative, &value)?;
    }
    if let Some(value) = store.class_value(&right_representative) {
        occurs_check(store, left, &left_representative, &value)?;
    }

    debug_trace!("Merging {left_representative} and {right_representative}");
    if let Some((from, into)) = store.merge(left_representative, right_representative) {
        worklist.push((from, into));
    }

    Ok(true)
}

/// Unifies two terms that are not variables. A pair with a concatenation that
/// cannot be decided yet is added to `postponed`.
fn unify_terms<S: BindingStore>(
    store: &mut S,
    left: Term,
    right: Term,
    worklist: &mut Vec<(Term, Term)>,
    postponed: &mut Vec<(Term, Term)>,
) -> Result<(), UnificationError> {
    // A concatenation can be resolved further once its variable is bound.
    if let Some(resolved) = resolve_concatenation(store, &left)? {
        worklist.push((resolved, right));
        return Ok(());
    }
    if let Some(resolved) = resolve_concatenation(store, &right)? {
        worklist.push((left, resolved));
        return Ok(());
    }

    let solved = match (left.kind(), right.kind()) {
        (TermKind::Concat { .. }, TermKind::Concat { .. }) => None,
        (TermKind::Concat { .. }, _) => Some(unify_concatenation(store, &left, &right, worklist)?),
        (_, TermKind::Concat { .. }) => Some(unify_concatenation(store, &right, &left, worklist)?),
        _ => None,
    };
    match solved {
        Some(true) => return Ok(()),
        Some(false) => {
            debug_trace!("Postponing {left} and {right}");
            postponed.push((left, right));
            return Ok(());
        }
        None => {}
    }

    if !left.equals(&right, false, false) {
        return Err(mismatch(&left, &right));
    }

    let children: SmallVec<[(Term, Term); 4]> = left.children().cloned().zip(right.children().cloned()).collect();
    worklist.extend(children.into_iter().rev());
    Ok(())
}

/// Unifies a concatenation whose variable is unbound with a term that is
/// neither a variable nor a concatenation. The known elements at the front of
/// both lists are unified pairwise. A concatenation `X ++ r` with a closed
/// list `r` against a closed list binds `X` to the elements in front of `r`.
///
/// Returns false when the pair can only be decided once more variables are bound.
fn unify_concatenation<S: BindingStore>(
    store: &mut S,
    concatenation: &Term,
    target: &Term,
    worklist: &mut Vec<(Term, Term)>,
) -> Result<bool, UnificationError> {
    let TermKind::Concat { left, right } = concatenation.kind() else {
        unreachable!("Only called with a concatenation");
    };

    if let Some(resolved) = resolve_tail(store, target)? {
        worklist.push((concatenation.clone(), resolved));
        return Ok(true);
    }

    let (elements, tail) = left
        .list_elements()
        .expect("The left operand of a concatenation is a list");
    let Some((target_elements, target_rest)) = target.list_elements() else {
        return Err(mismatch(concatenation, target));
    };

    let shared = elements.len().min(target_elements.len());
    if shared > 0 {
        let remainder = TermBuilder::concat_lists(&prepend(&elements[shared..], tail)?, right)?;
        worklist.push((remainder, prepend(&target_elements[shared..], target_rest)?));
        worklist.extend(
            elements[..shared]
                .iter()
                .cloned()
                .zip(target_elements[..shared].iter().cloned())
                .rev(),
        );
        return Ok(true);
    }

    if !elements.is_empty() {
        // The target is the empty list.
        return Err(mismatch(concatenation, target));
    }

    let (suffix, suffix_rest) = right
        .list_elements()
        .expect("The right operand of a concatenation is a list");
    if matches!(target_rest.kind(), TermKind::Nil) {
        if suffix.len() > target_elements.len() {
            return Err(mismatch(concatenation, target));
        }

        if matches!(suffix_rest.kind(), TermKind::Nil) {
            let split = target_elements.len() - suffix.len();
            worklist.extend(suffix.into_iter().zip(target_elements[split..].iter().cloned()).rev());
            worklist.push((tail, list(target_elements[..split].iter().cloned())));
            return Ok(true);
        }
    }

    Ok(false)
}

/// Returns the list with the value of its tail variable filled in, or `None`
/// when the list does not end in a bound variable.
fn resolve_tail<S: BindingStore>(store: &mut S, term: &Term) -> Result<Option<Term>, UnificationError> {
    let Some((elements, rest)) = term.list_elements() else {
        return Ok(None);
    };
    let Some(var) = rest.as_var() else {
        return Ok(None);
    };

    let Some(value) = store
        .representative(var)
        .and_then(|representative| store.class_value(&representative))
    else {
        return Ok(None);
    };

    Ok(Some(prepend(&elements, value)?))
}

/// Returns the list with the given elements in front of `tail`.
fn prepend(elements: &[Term], tail: Term) -> Result<Term, TermError> {
    elements.iter().rev().try_fold(tail, |tail, head| cons(head.clone(), tail))
}

/// Fails when the representative of the variable occurs in the term, after
/// following the values of the classes of its variables. Every subterm and
/// every class is visited at most once, and ground subterms are skipped.
fn occurs_check<S: BindingStore>(
    store: &mut S,
    variable: &TermVar,
    representative: &TermVar,
    term: &Term,
) -> Result<(), UnificationError> {
    let mut visited: FxHashSet<Term> = FxHashSet::default();
    let mut visited_classes: FxHashSet<TermVar> = FxHashSet::default();
    let mut stack = vec![term.clone()];

    while let Some(current) = stack.pop() {
        if current.is_ground() || !visited.insert(current.clone()) {
            continue;
        }

        let Some(occurrence) = current.as_var() else {
            stack.extend(current.children().cloned());
            continue;
        };

        let occurrence_representative = store
            .representative(occurrence)
            .unwrap_or_else(|| occurrence.clone());

        if occurrence_representative == *representative {
            return Err(UnificationError::OccursCheck {
                variable: variable.clone(),
                occurrence: occurrence.clone(),
                representative: occurrence_representative,
                term: term.clone(),
            });
        }

        if visited_classes.insert(occurrence_representative.clone()) {
            if let Some(value) = store.class_value(&occurrence_representative) {
                stack.push(value);
            }
        }
    }

    Ok(())
}

/// Returns the concatenation with the value of its variable filled in, or
/// `None` when the term is not a concatenation or its variable is unbound.
fn resolve_concatenation<S: BindingStore>(store: &mut S, term: &Term) -> Result<Option<Term>, UnificationError> {
    let TermKind::Concat { left, right } = term.kind() else {
        return Ok(None);
    };

    let (elements, tail) = left
        .list_elements()
        .expect("The left operand of a concatenation is a list");
    let var = tail
        .as_var()
        .expect("The left operand of a concatenation ends in a variable");

    let Some(value) = store
        .representative(var)
        .and_then(|representative| store.class_value(&representative))
    else {
        return Ok(None);
    };

    let prefix = TermBuilder::concat_lists(&list(elements), &value)?;
    Ok(Some(TermBuilder::concat_lists(&prefix, right)?))
}

fn mismatch(left: &Term, right: &Term) -> UnificationError {
    UnificationError::Mismatch {
        left: left.clone(),
        right: right.clone(),
        reason: mismatch_reason(left, right),
    }
}

/// Describes why the labels of both terms differ.
fn mismatch_reason(left: &Term, right: &Term) -> String {
    match (left.kind(), right.kind()) {
        (TermKind::Appl { op: left_op, args: left_args }, TermKind::Appl { op: right_op, args: right_args }) => {
            format!(
                "different constructors {left_op}/{} and {right_op}/{}",
                left_args.len(),
                right_args.len()
            )
        }
        (TermKind::Concat { .. }, _) | (_, TermKind::Concat { .. }) if left.is_list() && right.is_list() => {
            "the lengths of the concatenation and the list cannot match".to_string()
        }
        (left_kind, right_kind) if left_kind.name() == right_kind.name() => "different values".to_string(),
        (left_kind, right_kind) => format!("different kinds {} and {}", left_kind.name(), right_kind.name()),
    }
}

#[cfg(test)]
mod tests {
    use terma_terms::appl;
    use terma_terms::int;
    use terma_terms::nil;
    use terma_terms::string;
    use terma_terms::var;

    use super::*;

    #[test]
    fn test_mismatch_reason() {
        assert_eq!(
            mismatch_reason(&appl("Foo", [int(1)]), &appl("Bar", [])),
            "different constructors Foo/1 and Bar/0"
        );
        assert_eq!(mismatch_reason(&string("a"), &string("b")), "different values");
        assert_eq!(mismatch_reason(&int(1), &nil()), "different kinds integer and nil");

        let concatenation = TermBuilder::concat_lists(&var("XS"), &list([int(1)])).unwrap();
        assert!(mismatch_reason(&concatenation, &nil()).contains("concatenation"));
        assert_eq!(
            mismatch_reason(&int(0), &concatenation),
            "different kinds integer and concatenation"
        );
    }
}
