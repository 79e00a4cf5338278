#![forbid(unsafe_code)]

use std::convert::Infallible;
use std::sync::Arc;

use terma_utilities::debug_trace;

use crate::Attachment;
use crate::Attachments;
use crate::Term;
use crate::TermError;
use crate::TermKind;
use crate::TermTransformer;
use crate::TermVar;
use crate::Yield;

/// The construction protocol for terms. All functions check the invariants of
/// the variants, and normalise list concatenations, such that only
/// concatenations whose left operand ends in a variable remain.
///
/// The `copy_*` functions return the given instance when none of the
/// subterms change.
pub struct TermBuilder;

impl TermBuilder {
    pub fn new_int(value: i64, attachments: Attachments) -> Result<Term, TermError> {
        build(TermKind::Int(value), attachments)
    }

    pub fn new_real(value: f64, attachments: Attachments) -> Result<Term, TermError> {
        build(TermKind::Real(value), attachments)
    }

    pub fn new_string(value: impl Into<Arc<str>>, attachments: Attachments) -> Result<Term, TermError> {
        build(TermKind::String(value.into()), attachments)
    }

    /// Creates the application `op(args...)`.
    pub fn new_appl(
        op: impl Into<Arc<str>>,
        args: impl IntoIterator<Item = Term>,
        attachments: Attachments,
    ) -> Result<Term, TermError> {
        build(
            TermKind::Appl {
                op: op.into(),
                args: args.into_iter().collect(),
            },
            attachments,
        )
    }

    pub fn new_nil(attachments: Attachments) -> Result<Term, TermError> {
        build(TermKind::Nil, attachments)
    }

    /// Creates the list `head :: tail`. A concatenation tail is normalised, so
    /// that `h :: (xs ++ ys)` becomes `(h :: xs) ++ ys`, in which case the
    /// attachments end up on the new cons.
    pub fn new_list(head: Term, tail: Term, attachments: Attachments) -> Result<Term, TermError> {
        match tail.kind() {
            TermKind::Nil | TermKind::Cons { .. } | TermKind::Var(_) => build(TermKind::Cons { head, tail }, attachments),
            TermKind::Concat { left, right } => {
                let left = Self::new_list(head, left.clone(), attachments)?;
                build(
                    TermKind::Concat {
                        left,
                        right: right.clone(),
                    },
                    Attachments::empty(),
                )
            }
            _ => Err(TermError::illegal_shape("new_list", "a list as tail", &tail)),
        }
    }

    /// Creates the closed list of the given elements. The attachments belong
    /// to the outermost cons, or to the nil when there are no elements.
    pub fn new_list_from(elements: impl IntoIterator<Item = Term>, attachments: Attachments) -> Result<Term, TermError> {
        let elements: Vec<Term> = elements.into_iter().collect();
        let Some((first, rest)) = elements.split_first() else {
            return Self::new_nil(attachments);
        };

        Self::new_list(first.clone(), list(rest.iter().cloned()), attachments)
    }

    pub fn new_none(attachments: Attachments) -> Result<Term, TermError> {
        build(TermKind::None, attachments)
    }

    pub fn new_some(element: Term, attachments: Attachments) -> Result<Term, TermError> {
        build(TermKind::Some(element), attachments)
    }

    pub fn new_var(name: impl Into<Arc<str>>, attachments: Attachments) -> Result<Term, TermError> {
        build(TermKind::Var(TermVar::new(name)), attachments)
    }

    /// Concatenates two lists, the right operand can be any list.
    ///
    /// The concatenation is resolved as far as possible: `[] ++ r = r`,
    /// `l ++ [] = l`, and the elements of a closed list distribute over the
    /// right operand. Only when the left operand ends in a variable a
    /// concatenation node remains, where `(xs ++ as) ++ bs` is associated to
    /// the right.
    pub fn concat_lists(left: &Term, right: &Term) -> Result<Term, TermError> {
        if !right.is_list() {
            return Err(TermError::illegal_shape("concat_lists", "a list as right operand", right));
        }

        match left.kind() {
            TermKind::Nil => Ok(right.clone()),
            _ if matches!(right.kind(), TermKind::Nil) && left.is_list() => Ok(left.clone()),
            TermKind::Var(_) => concat_node(left.clone(), right.clone()),
            TermKind::Concat {
                left: prefix,
                right: middle,
            } => {
                let suffix = Self::concat_lists(middle, right)?;
                concat_node(prefix.clone(), suffix)
            }
            TermKind::Cons { .. } => {
                let mut cells = Vec::new();
                let mut current = left;
                while let TermKind::Cons { tail, .. } = current.kind() {
                    cells.push(current);
                    current = tail;
                }

                if current.is_var() {
                    return concat_node(left.clone(), right.clone());
                }

                // A closed list, so the cells are copied onto the right operand.
                cells.into_iter().rev().try_fold(right.clone(), |tail, cell| match cell.kind() {
                    TermKind::Cons { head, .. } => Self::new_list(head.clone(), tail, cell.attachments().clone()),
                    _ => unreachable!("Only cons cells were collected"),
                })
            }
            _ => Err(TermError::illegal_shape("concat_lists", "a list as left operand", left)),
        }
    }

    /// Returns the application with the given arguments, keeping the name and attachments.
    pub fn copy_appl(term: &Term, args: impl IntoIterator<Item = Term>) -> Result<Term, TermError> {
        let TermKind::Appl { op, args: current } = term.kind() else {
            return Err(TermError::illegal_shape("copy_appl", "an application", term));
        };

        let args: Vec<Term> = args.into_iter().collect();
        if args.len() == current.len() && args.iter().zip(current).all(|(new, old)| new.ptr_eq(old)) {
            return Ok(term.clone());
        }

        build(TermKind::Appl { op: op.clone(), args }, term.attachments().clone())
    }

    /// Returns the cons with the given head and tail, keeping the attachments.
    /// The result is a concatenation when the new tail is one.
    pub fn copy_list(term: &Term, head: Term, tail: Term) -> Result<Term, TermError> {
        let TermKind::Cons {
            head: current_head,
            tail: current_tail,
        } = term.kind()
        else {
            return Err(TermError::illegal_shape("copy_list", "a cons", term));
        };

        if head.ptr_eq(current_head) && tail.ptr_eq(current_tail) {
            return Ok(term.clone());
        }

        Self::new_list(head, tail, term.attachments().clone())
    }

    /// Returns the some with the given element, keeping the attachments.
    pub fn copy_some(term: &Term, element: Term) -> Result<Term, TermError> {
        let TermKind::Some(current) = term.kind() else {
            return Err(TermError::illegal_shape("copy_some", "a some", term));
        };

        if element.ptr_eq(current) {
            return Ok(term.clone());
        }

        build(TermKind::Some(element), term.attachments().clone())
    }

    /// Returns the concatenation of the given operands, which is resolved
    /// further by [TermBuilder::concat_lists] when the operands changed.
    pub fn copy_concat(term: &Term, left: Term, right: Term) -> Result<Term, TermError> {
        let TermKind::Concat {
            left: current_left,
            right: current_right,
        } = term.kind()
        else {
            return Err(TermError::illegal_shape("copy_concat", "a concatenation", term));
        };

        if left.ptr_eq(current_left) && right.ptr_eq(current_right) {
            return Ok(term.clone());
        }

        Self::concat_lists(&left, &right)
    }

    /// Returns the term with the given children, in the order of
    /// [Term::children], using the copy function of its variant.
    pub fn rebuild(term: &Term, children: Vec<Term>) -> Result<Term, TermError> {
        if children.len() != term.arity() {
            return Err(TermError::Malformed(format!(
                "a {} with {} children cannot be rebuilt from {} children",
                term.kind().name(),
                term.arity(),
                children.len()
            )));
        }

        match term.kind() {
            TermKind::Appl { .. } => Self::copy_appl(term, children),
            TermKind::Cons { .. } => {
                let [head, tail] = pair(children);
                Self::copy_list(term, head, tail)
            }
            TermKind::Concat { .. } => {
                let [left, right] = pair(children);
                Self::copy_concat(term, left, right)
            }
            TermKind::Some(_) => {
                let element = children.into_iter().next().expect("The arity was checked");
                Self::copy_some(term, element)
            }
            TermKind::Int(_)
            | TermKind::Real(_)
            | TermKind::String(_)
            | TermKind::Nil
            | TermKind::None
            | TermKind::Var(_) => Ok(term.clone()),
        }
    }

    /// Returns the term with its own attachments replaced. Returns the same
    /// instance when the attachments are unchanged. Fails for a
    /// concatenation, which cannot carry attachments.
    pub fn with_attachments(term: &Term, attachments: Attachments) -> Result<Term, TermError> {
        if term.attachments().ptr_eq(&attachments) || *term.attachments() == attachments {
            return Ok(term.clone());
        }

        build(term.kind().clone(), attachments)
    }
}

/// Removes the attachments of the term and all its subterms.
pub fn strip_attachments(term: &Term) -> Term {
    let result: Result<Term, Infallible> = TermTransformer::<Term, Term>::new().evaluate(
        term.clone(),
        |args, term| {
            if term.arity() == 0 && term.attachments().is_empty() {
                return Ok(Yield::Term(term));
            }

            for child in term.children() {
                args.push(child.clone());
            }
            Ok(Yield::Construct(term))
        },
        |term, children| {
            let unchanged = children.iter().zip(term.children()).all(|(new, old)| new.ptr_eq(old));
            if unchanged && term.attachments().is_empty() {
                Ok(term)
            } else {
                Ok(Term::from_parts(term.kind().with_children(children), Attachments::empty()))
            }
        },
    );

    match result {
        Ok(term) => term,
        Err(never) => match never {},
    }
}

/// Checks the invariants of the variant and its attachments.
pub(crate) fn validate(kind: &TermKind, attachments: &Attachments) -> Result<(), TermError> {
    if let Some(separators) = attachments.get(Attachments::SEPARATORS) {
        let Attachment::Separators(separators) = separators else {
            return Err(TermError::Malformed(format!(
                "the {} attachment must hold separators",
                Attachments::SEPARATORS
            )));
        };

        let expected = match kind {
            TermKind::Appl { args, .. } => Some(args.len() + 1),
            TermKind::Cons { .. } => Some(2),
            _ => None,
        };

        if let Some(expected) = expected {
            if separators.len() != expected {
                return Err(TermError::Malformed(format!(
                    "a {} needs {expected} separators, but got {}",
                    kind.name(),
                    separators.len()
                )));
            }
        }
    }

    match kind {
        TermKind::Cons { tail, .. } => {
            if !matches!(tail.kind(), TermKind::Nil | TermKind::Cons { .. } | TermKind::Var(_)) {
                return Err(TermError::Malformed(format!(
                    "the tail of a cons cannot be a {}",
                    tail.kind().name()
                )));
            }
        }
        TermKind::Concat { left, right } => {
            if !attachments.is_empty() {
                return Err(TermError::Malformed(
                    "a list concatenation cannot carry attachments".to_string(),
                ));
            }

            let (_, rest) = left.list_elements().unwrap_or_else(|| (Vec::new(), left.clone()));
            if !rest.is_var() {
                return Err(TermError::Malformed(format!(
                    "the left operand of a concatenation must end in a variable, but got {left}"
                )));
            }

            if !right.is_list() || matches!(right.kind(), TermKind::Nil) {
                return Err(TermError::Malformed(format!(
                    "the right operand of a concatenation must be a non-empty list, but got {right}"
                )));
            }
        }
        TermKind::Int(_)
        | TermKind::Real(_)
        | TermKind::String(_)
        | TermKind::Appl { .. }
        | TermKind::Nil
        | TermKind::None
        | TermKind::Some(_)
        | TermKind::Var(_) => {}
    }

    Ok(())
}

fn build(kind: TermKind, attachments: Attachments) -> Result<Term, TermError> {
    validate(&kind, &attachments)?;
    Ok(Term::from_parts(kind, attachments))
}

fn concat_node(left: Term, right: Term) -> Result<Term, TermError> {
    debug_trace!("Creating concatenation {left} ++ {right}");
    build(TermKind::Concat { left, right }, Attachments::empty())
}

fn pair(children: Vec<Term>) -> [Term; 2] {
    <[Term; 2]>::try_from(children).unwrap_or_else(|_| unreachable!("The arity was checked"))
}

impl From<TermVar> for Term {
    fn from(var: TermVar) -> Term {
        Term::from_parts(TermKind::Var(var), Attachments::empty())
    }
}

// Shorthands that construct terms without attachments. Only the list
// operations can fail, since their tail must be a list.

pub fn int(value: i64) -> Term {
    Term::from_parts(TermKind::Int(value), Attachments::empty())
}

pub fn real(value: f64) -> Term {
    Term::from_parts(TermKind::Real(value), Attachments::empty())
}

pub fn string(value: impl Into<Arc<str>>) -> Term {
    Term::from_parts(TermKind::String(value.into()), Attachments::empty())
}

pub fn appl(op: impl Into<Arc<str>>, args: impl IntoIterator<Item = Term>) -> Term {
    Term::from_parts(
        TermKind::Appl {
            op: op.into(),
            args: args.into_iter().collect(),
        },
        Attachments::empty(),
    )
}

/// An application with the empty name.
pub fn tuple(args: impl IntoIterator<Item = Term>) -> Term {
    appl("", args)
}

pub fn nil() -> Term {
    Term::from_parts(TermKind::Nil, Attachments::empty())
}

pub fn cons(head: Term, tail: Term) -> Result<Term, TermError> {
    TermBuilder::new_list(head, tail, Attachments::empty())
}

/// A closed list of the given elements.
pub fn list(elements: impl IntoIterator<Item = Term>) -> Term {
    let elements: Vec<Term> = elements.into_iter().collect();
    elements.into_iter().rev().fold(nil(), |tail, head| {
        Term::from_parts(TermKind::Cons { head, tail }, Attachments::empty())
    })
}

pub fn none() -> Term {
    Term::from_parts(TermKind::None, Attachments::empty())
}

pub fn some(element: Term) -> Term {
    Term::from_parts(TermKind::Some(element), Attachments::empty())
}

pub fn var(name: impl Into<Arc<str>>) -> Term {
    Term::from(TermVar::new(name))
}

#[cfg(test)]
mod tests {
    use terma_utilities::cast;
    use test_log::test;

    use super::*;

    fn separators(count: usize) -> Attachments {
        Attachments::separators(vec![" "; count])
    }

    #[test]
    fn test_concat_nil_is_identity() {
        let xs = var("XS");
        assert!(TermBuilder::concat_lists(&nil(), &xs).unwrap().ptr_eq(&xs));
        assert!(TermBuilder::concat_lists(&xs, &nil()).unwrap().ptr_eq(&xs));

        let closed = list([int(1), int(2)]);
        assert!(TermBuilder::concat_lists(&closed, &nil()).unwrap().ptr_eq(&closed));
    }

    #[test]
    fn test_concat_closed_prefix_distributes() {
        let xs = var("XS");
        let result = TermBuilder::concat_lists(&list([int(1)]), &xs).unwrap();
        assert_eq!(result, cons(int(1), xs.clone()).unwrap());

        let result = TermBuilder::concat_lists(&list([int(1), int(2)]), &list([int(3)])).unwrap();
        assert_eq!(result, list([int(1), int(2), int(3)]));
    }

    #[test]
    fn test_concat_open_prefix_is_kept() {
        let open = cons(int(1), var("XS")).unwrap();
        let result = TermBuilder::concat_lists(&open, &list([int(2)])).unwrap();

        let (left, right) = cast!(result.kind(), TermKind::Concat { left, right } => (left, right));
        assert!(left.ptr_eq(&open));
        assert_eq!(*right, list([int(2)]));
    }

    #[test]
    fn test_concat_is_associated_to_the_right() {
        let xs_as = TermBuilder::concat_lists(&var("XS"), &var("AS")).unwrap();
        let result = TermBuilder::concat_lists(&xs_as, &var("BS")).unwrap();

        let (left, right) = cast!(result.kind(), TermKind::Concat { left, right } => (left, right));
        assert_eq!(*left, var("XS"));
        assert_eq!(*right, TermBuilder::concat_lists(&var("AS"), &var("BS")).unwrap());
    }

    #[test]
    fn test_concat_distributes_into_a_concatenation() {
        // [1] ++ (XS ++ [2]) = (1 :: XS) ++ [2]
        let xs_2 = TermBuilder::concat_lists(&var("XS"), &list([int(2)])).unwrap();
        let result = TermBuilder::concat_lists(&list([int(1)]), &xs_2).unwrap();

        let (left, right) = cast!(result.kind(), TermKind::Concat { left, right } => (left, right));
        assert_eq!(*left, cons(int(1), var("XS")).unwrap());
        assert_eq!(*right, list([int(2)]));
    }

    #[test]
    fn test_concat_illegal_shapes() {
        let error = TermBuilder::concat_lists(&int(1), &var("XS")).unwrap_err();
        assert!(matches!(error, TermError::IllegalShape { operation: "concat_lists", .. }));

        let error = TermBuilder::concat_lists(&var("XS"), &some(int(1))).unwrap_err();
        assert!(matches!(error, TermError::IllegalShape { .. }));
    }

    #[test]
    fn test_new_list_normalises_concatenation_tail() {
        let tail = TermBuilder::concat_lists(&var("XS"), &var("YS")).unwrap();
        let result = TermBuilder::new_list(int(1), tail, Attachments::empty()).unwrap();

        let (left, right) = cast!(result.kind(), TermKind::Concat { left, right } => (left, right));
        assert_eq!(*left, cons(int(1), var("XS")).unwrap());
        assert_eq!(*right, var("YS"));
    }

    #[test]
    fn test_new_list_rejects_non_list_tail() {
        let error = cons(int(1), int(2)).unwrap_err();
        assert!(matches!(error, TermError::IllegalShape { operation: "new_list", .. }));
    }

    #[test]
    fn test_new_list_from() {
        let result = TermBuilder::new_list_from([int(1), int(2)], separators(2)).unwrap();
        assert_eq!(result, list([int(1), int(2)]));
        assert_eq!(result.attachments(), &separators(2));

        assert_eq!(TermBuilder::new_list_from([], Attachments::empty()).unwrap(), nil());
    }

    #[test]
    fn test_separator_count() {
        assert!(TermBuilder::new_appl("Foo", [int(1), int(2)], separators(3)).is_ok());
        assert!(matches!(
            TermBuilder::new_appl("Foo", [int(1), int(2)], separators(2)),
            Err(TermError::Malformed(_))
        ));
        assert!(matches!(
            TermBuilder::new_list(int(1), nil(), separators(3)),
            Err(TermError::Malformed(_))
        ));

        let wrong_type = Attachments::empty().with(Attachments::SEPARATORS, Attachment::Integer(1));
        assert!(matches!(
            TermBuilder::new_appl("Foo", [], wrong_type),
            Err(TermError::Malformed(_))
        ));
    }

    #[test]
    fn test_copy_returns_same_instance() {
        let term = appl("Foo", [int(1), var("X")]);
        let args: Vec<Term> = term.children().cloned().collect();
        assert!(TermBuilder::copy_appl(&term, args).unwrap().ptr_eq(&term));

        let changed = TermBuilder::copy_appl(&term, [int(1), int(2)]).unwrap();
        assert!(!changed.ptr_eq(&term));
        assert_eq!(changed, appl("Foo", [int(1), int(2)]));

        let open = cons(int(1), var("XS")).unwrap();
        let (head, tail) = cast!(open.kind(), TermKind::Cons { head, tail } => (head.clone(), tail.clone()));
        assert!(TermBuilder::copy_list(&open, head, tail).unwrap().ptr_eq(&open));

        let option = some(int(1));
        let element = cast!(option.kind(), TermKind::Some(element) => element.clone());
        assert!(TermBuilder::copy_some(&option, element).unwrap().ptr_eq(&option));
    }

    #[test]
    fn test_copy_concat_resolves_further() {
        let term = TermBuilder::concat_lists(&var("XS"), &list([int(1)])).unwrap();

        let resolved = TermBuilder::copy_concat(&term, nil(), list([int(1)])).unwrap();
        assert_eq!(resolved, list([int(1)]));

        let resolved = TermBuilder::copy_concat(&term, list([int(0)]), list([int(1)])).unwrap();
        assert_eq!(resolved, list([int(0), int(1)]));
    }

    #[test]
    fn test_copy_keeps_attachments() {
        let term = TermBuilder::new_appl("Foo", [int(1)], separators(2)).unwrap();
        let copy = TermBuilder::copy_appl(&term, [int(2)]).unwrap();
        assert_eq!(copy.attachments(), &separators(2));

        assert!(matches!(
            TermBuilder::copy_appl(&int(1), []),
            Err(TermError::IllegalShape { operation: "copy_appl", .. })
        ));
    }

    #[test]
    fn test_with_attachments() {
        let attachments = Attachments::empty().with("origin", Attachment::Text("file".to_string()));

        for term in [int(1), var("X"), nil(), none(), some(int(1)), appl("Foo", [])] {
            let attached = TermBuilder::with_attachments(&term, attachments.clone()).unwrap();
            assert_eq!(attached, term);
            assert_eq!(attached.attachments(), &attachments);
            assert!(TermBuilder::with_attachments(&attached, attachments.clone()).unwrap().ptr_eq(&attached));
        }

        let concat = TermBuilder::concat_lists(&var("XS"), &var("YS")).unwrap();
        assert!(matches!(
            TermBuilder::with_attachments(&concat, attachments),
            Err(TermError::Malformed(_))
        ));
        assert!(TermBuilder::with_attachments(&concat, Attachments::empty()).unwrap().ptr_eq(&concat));
    }

    #[test]
    fn test_strip_attachments() {
        let inner = TermBuilder::new_int(1, Attachments::empty().with("origin", Attachment::Integer(1))).unwrap();
        let term = TermBuilder::new_appl("Foo", [inner, var("X")], separators(3)).unwrap();

        let stripped = strip_attachments(&term);
        assert_eq!(stripped, term);
        assert!(stripped.iter().all(|subterm| subterm.attachments().is_empty()));

        let plain = appl("Foo", [int(1), var("X")]);
        assert!(strip_attachments(&plain).ptr_eq(&plain));
    }
}
