use terma_terms::Term;
use terma_terms::TermBuilder;
use terma_terms::TermVar;
use terma_terms::appl;
use terma_terms::cons;
use terma_terms::int;
use terma_terms::list;
use terma_terms::nil;
use terma_terms::none;
use terma_terms::some;
use terma_terms::string;
use terma_terms::var;
use terma_unification::PersistentSubstitution;
use terma_unification::Substitution;
use terma_unification::UnificationError;
use terma_unification::UnionFindSubstitution;
use terma_unification::Unifier;
use terma_unification::try_unify;
use terma_unification::try_unify_all;
use terma_unification::unify;
use terma_unification::unify_all;
use terma_utilities::TermaResult;
use terma_utilities::cast;
use test_case::test_case;
use test_log::test;

fn lookup(substitution: &impl Substitution, name: &str) -> Option<Term> {
    substitution.get(&TermVar::new(name), true).unwrap()
}

#[test]
fn test_equal_integers() {
    let unifier = unify(&int(42), &int(42)).unwrap();

    assert!(matches!(unifier, Unifier::Empty(_)));
    assert!(unifier.is_empty());
}

#[test]
fn test_different_integers() {
    assert!(unify(&int(42), &int(1337)).is_none());

    let error = try_unify(&int(42), &int(1337)).unwrap_err();
    assert!(matches!(error, UnificationError::Mismatch { .. }));
}

#[test]
fn test_chained_variables() {
    let unifier = unify(&var("X"), &int(42)).unwrap();
    let unifier = unifier.unify(&var("Y"), &var("X")).unwrap();

    assert_eq!(lookup(&unifier, "X"), Some(int(42)));
    assert_eq!(lookup(&unifier, "Y"), Some(int(42)));
    assert_eq!(
        unifier.find(&TermVar::new("X")),
        unifier.find(&TermVar::new("Y"))
    );
}

#[test]
fn test_open_list_against_closed_list() {
    let open = cons(var("X"), var("XS")).unwrap();
    let unifier = unify(&open, &list([int(1), int(42)])).unwrap();

    assert_eq!(lookup(&unifier, "X"), Some(int(1)));
    assert_eq!(lookup(&unifier, "XS"), Some(list([int(42)])));
    assert_eq!(unifier.len(), 2);
}

#[test]
fn test_constructors() {
    let unifier = unify(&appl("Foo", [var("X")]), &appl("Foo", [int(1)])).unwrap();
    assert_eq!(lookup(&unifier, "X"), Some(int(1)));

    assert!(unify(&appl("Foo", [var("X")]), &appl("Bar", [int(1)])).is_none());

    let error = try_unify(&appl("Foo", [var("X")]), &appl("Bar", [int(1)])).unwrap_err();
    let reason = cast!(error, UnificationError::Mismatch { reason, .. } => reason);
    assert!(reason.contains("Foo/1"), "{reason}");
    assert!(reason.contains("Bar/1"), "{reason}");
}

#[test]
fn test_concatenation_resolved_after_binding() {
    let concatenation = TermBuilder::concat_lists(&var("X"), &list([int(1)])).unwrap();
    assert_eq!(concatenation.to_string(), "?X ++ [1]");

    let unifier = unify(&var("X"), &nil()).unwrap();
    assert_eq!(unifier.apply(&concatenation).unwrap(), list([int(1)]));
}

#[test]
fn test_concatenation_unifies_with_list_once_bound() {
    let concatenation = TermBuilder::concat_lists(&var("X"), &list([int(1)])).unwrap();

    let unifier = unify_all([
        (var("X"), list([var("Y")])),
        (concatenation, list([int(0), var("Z")])),
    ])
    .unwrap();

    assert_eq!(lookup(&unifier, "Y"), Some(int(0)));
    assert_eq!(lookup(&unifier, "Z"), Some(int(1)));
    assert_eq!(lookup(&unifier, "X"), Some(list([int(0)])));
}

#[test]
fn test_concatenation_against_closed_list() {
    let concatenation = TermBuilder::concat_lists(&var("XS"), &list([int(1)])).unwrap();

    let unifier = unify(&concatenation, &list([int(0), int(1)])).unwrap();
    assert_eq!(lookup(&unifier, "XS"), Some(list([int(0)])));

    let unifier = unify(&list([int(1)]), &concatenation).unwrap();
    assert_eq!(lookup(&unifier, "XS"), Some(nil()));

    // The known elements in front of the variable are matched first.
    let prefixed = TermBuilder::concat_lists(&cons(var("A"), var("XS")).unwrap(), &list([int(2)])).unwrap();
    let unifier = unify(&prefixed, &list([int(1), int(2)])).unwrap();
    assert_eq!(lookup(&unifier, "A"), Some(int(1)));
    assert_eq!(lookup(&unifier, "XS"), Some(nil()));

    // The variable cannot be bound to a list that contains itself.
    assert!(unify(&concatenation, &list([var("XS"), int(1)])).is_none());
}

#[test]
fn test_concatenation_independent_of_pair_order() {
    let concatenation = TermBuilder::concat_lists(&var("XS"), &list([int(1)])).unwrap();
    let pairs = vec![
        (var("XS"), cons(int(0), var("YS")).unwrap()),
        (var("YS"), nil()),
        (concatenation.clone(), list([var("A"), var("B")])),
    ];

    let forward = unify_all(pairs.clone()).unwrap();
    let backward = unify_all(pairs.into_iter().rev().map(|(left, right)| (right, left))).unwrap();

    for unifier in [&forward, &backward] {
        assert_eq!(lookup(unifier, "A"), Some(int(0)));
        assert_eq!(lookup(unifier, "B"), Some(int(1)));
        assert_eq!(lookup(unifier, "XS"), Some(list([int(0)])));
        assert_eq!(lookup(unifier, "YS"), Some(nil()));
    }
}

#[test]
fn test_concatenation_waits_for_its_variable() {
    let concatenation = TermBuilder::concat_lists(&var("XS"), &list([int(1)])).unwrap();
    let open = cons(int(0), var("YS")).unwrap();

    // Only decidable once XS is bound by the second pair.
    let pairs = vec![(concatenation.clone(), open.clone()), (var("XS"), list([int(0)]))];
    for pairs in [pairs.clone(), pairs.into_iter().rev().collect()] {
        let unifier = unify_all(pairs).unwrap();
        assert_eq!(lookup(&unifier, "YS"), Some(list([int(1)])));
    }

    // Or once the tail of the list is bound.
    let unifier = unify_all([(concatenation.clone(), open.clone()), (var("YS"), list([int(1)]))]).unwrap();
    assert_eq!(lookup(&unifier, "XS"), Some(list([int(0)])));

    // Without the binding there is no single most general unifier.
    let error = try_unify(&concatenation, &open).unwrap_err();
    let reason = cast!(error, UnificationError::Mismatch { reason, .. } => reason);
    assert!(reason.contains("unbound"), "{reason}");
}

#[test]
fn test_concatenation_bound_to_a_non_list() {
    let concatenation = TermBuilder::concat_lists(&var("X"), &list([int(1)])).unwrap();
    let unifier = unify(&var("X"), &int(0)).unwrap();

    assert!(unifier.apply(&concatenation).is_err());
}

#[test]
fn test_occurs_check() {
    let error = try_unify(&var("X"), &appl("f", [var("X")])).unwrap_err();
    let variable = cast!(error, UnificationError::OccursCheck { variable, .. } => variable);
    assert_eq!(variable, TermVar::new("X"));

    // The cycle is only visible through the binding of Y.
    assert!(unify_all([
        (var("X"), appl("f", [var("Y")])),
        (var("Y"), some(var("X"))),
    ])
    .is_none());

    // Through two classes that are merged.
    assert!(unify_all([
        (var("X"), appl("f", [var("Y")])),
        (var("Z"), var("Y")),
        (var("Z"), var("X")),
    ])
    .is_none());
}

#[test]
fn test_occurs_check_on_long_lists() {
    let variables: Vec<Term> = (0..20_000).map(|index| var(format!("V{index}"))).collect();

    let unifier = unify(&var("XS"), &list(variables.clone())).unwrap();
    assert_eq!(lookup(&unifier, "XS"), Some(list(variables.clone())));
    assert!(!unifier.is_ground(&var("XS")));

    let cyclic = list(variables.iter().cloned().chain([var("XS")]));
    assert!(unify(&var("XS"), &cyclic).is_none());

    let bound = unify_all(variables.iter().map(|variable| (variable.clone(), int(0)))).unwrap();
    assert!(bound.unify(&var("XS"), &list(variables)).unwrap().is_ground(&var("XS")));
}

#[test]
fn test_error_message_of_deeply_nested_term() {
    let depth = 200_000;
    let mut term = int(0);
    for _ in 0..depth {
        term = appl("f", [term]);
    }

    assert!(unify(&term, &appl("g", [])).is_none());

    let message = try_unify(&term, &appl("g", [])).unwrap_err().to_string();
    assert!(message.starts_with("cannot unify f(f("), "{}", &message[..40]);
    assert!(message.ends_with("different constructors f/1 and g/0"));
}

#[test]
fn test_merged_classes_unify_their_values() {
    let unifier = unify_all([
        (var("X"), appl("pair", [var("A"), int(2)])),
        (var("Y"), appl("pair", [int(1), var("B")])),
        (var("X"), var("Y")),
    ])
    .unwrap();

    assert_eq!(lookup(&unifier, "A"), Some(int(1)));
    assert_eq!(lookup(&unifier, "B"), Some(int(2)));
    assert_eq!(lookup(&unifier, "X"), Some(appl("pair", [int(1), int(2)])));
    assert!(unifier.are_equal(&var("X"), &var("Y")).unwrap());
}

#[test_case(none(), some(int(1)) ; "none and some")]
#[test_case(string("a"), string("b") ; "different strings")]
#[test_case(list([int(1)]), list([int(1), int(2)]) ; "lists of different length")]
#[test_case(appl("f", [int(1)]), appl("f", [int(1), int(2)]) ; "different arities")]
#[test_case(nil(), int(0) ; "nil and integer")]
#[test_case(TermBuilder::concat_lists(&var("XS"), &list([int(1)])).unwrap(), int(1) ; "concatenation and integer")]
#[test_case(TermBuilder::concat_lists(&var("XS"), &list([int(1), int(2)])).unwrap(), list([int(2)]) ; "concatenation longer than list")]
#[test_case(TermBuilder::concat_lists(&cons(int(0), var("XS")).unwrap(), &list([int(1)])).unwrap(), list([int(1)]) ; "concatenation with different first element")]
fn test_mismatched_kinds_and_arities(left: Term, right: Term) {
    assert!(unify(&left, &right).is_none());
    assert!(unify(&right, &left).is_none());

    let error = try_unify(&left, &right).unwrap_err();
    assert!(matches!(error, UnificationError::Mismatch { .. }), "{error}");
}

#[test]
fn test_failure_is_all_or_nothing() {
    let unifier = unify(&var("X"), &int(1)).unwrap();
    let result = try_unify_all([(var("Y"), int(2)), (var("X"), int(3))]);
    assert!(result.is_ok());

    assert!(unifier.unify_all([(var("Y"), int(2)), (var("X"), int(3))]).is_none());
    assert_eq!(lookup(&unifier, "Y"), None);
    assert_eq!(lookup(&unifier, "X"), Some(int(1)));
}

#[test]
fn test_substitution_implementations_agree() {
    let left = appl("f", [var("X"), list([var("Y"), var("Z")]), some(var("Y"))]);
    let right = appl("f", [appl("g", [var("Y")]), list([int(1), var("W")]), var("V")]);

    let mutable = UnionFindSubstitution::new().unify(&left, &right).unwrap();
    let persistent = PersistentSubstitution::new().unify(&left, &right).unwrap();
    let unifier = unify(&left, &right).unwrap();

    let expected = appl("f", [appl("g", [int(1)]), list([int(1), var("W")]), some(int(1))]);
    assert_eq!(mutable.apply(&left).unwrap().to_string(), persistent.apply(&left).unwrap().to_string());
    assert_eq!(unifier.apply(&left).unwrap(), persistent.apply(&right).unwrap());

    // W and Z are aliases, so either one may be the representative.
    let instantiated = unifier.apply(&left).unwrap();
    assert!(
        instantiated == expected
            || instantiated == appl("f", [appl("g", [int(1)]), list([int(1), var("Z")]), some(int(1))])
    );

    assert!(unifier.is_ground(&var("X")));
    assert!(!unifier.is_ground(&var("Z")));
    assert!(unifier.contains(&TermVar::new("V")));
    assert!(!unifier.contains(&TermVar::new("Q")));
}

#[test]
fn test_errors_convert_into_catch_all() -> TermaResult<()> {
    let unifier = try_unify(&appl("f", [var("X"), var("Y")]), &appl("f", [int(1), var("X")]))?;
    assert_eq!(unifier.apply(&var("Y"))?, int(1));

    let error = try_unify(&var("X"), &list([var("X")])).map(|_| ()).map_err(terma_utilities::TermaError::from);
    assert!(error.unwrap_err().is::<UnificationError>());
    Ok(())
}
