use rand::Rng;

use terma_terms::Rewrite;
use terma_terms::Term;
use terma_terms::TermError;
use terma_terms::random_term;
use terma_terms::transform;
use terma_terms::variable_names;
use terma_unification::Substitution;
use terma_unification::Unifier;
use terma_unification::unify;
use terma_utilities::random_test;

fn symbols() -> Vec<(String, usize)> {
    vec![("f".to_string(), 2), ("g".to_string(), 1), ("h".to_string(), 3)]
}

fn constants() -> Vec<String> {
    vec!["a".to_string(), "b".to_string()]
}

/// Replaces every variable by a random term over the variables `Y0`, `Y1`, ...
fn random_instance(rng: &mut impl Rng, term: &Term) -> Term {
    let replacements: Vec<Term> = (0..4)
        .map(|index| {
            let names = vec![format!("Y{index}")];
            let depth = rng.random_range(0..5);
            random_term(rng, &symbols(), &constants(), &names, depth)
        })
        .collect();

    transform::<_, TermError>(term, |subterm| {
        Ok(match subterm.as_var() {
            Some(var) => {
                let index: usize = var.name()[1..].parse().unwrap();
                Rewrite::Replace(replacements[index].clone())
            }
            None => Rewrite::Keep,
        })
    })
    .unwrap()
}

/// Checks that the unifier makes both terms equal and is idempotent.
fn check_unifier(unifier: &Unifier, left: &Term, right: &Term) {
    let instance = unifier.apply(left).unwrap();
    assert_eq!(instance, unifier.apply(right).unwrap(), "{unifier:?} does not unify {left} and {right}");
    assert_eq!(unifier.apply(&instance).unwrap(), instance);
}

#[test]
fn test_random_reflexivity() {
    random_test(100, |rng| {
        let depth = rng.random_range(1..20);
        let term = random_term(rng, &symbols(), &constants(), &variable_names(3), depth);
        let unifier = unify(&term, &term).unwrap();

        assert!(matches!(unifier, Unifier::Empty(_)));
        assert_eq!(unifier.apply(&term).unwrap(), term);
    })
}

#[test]
fn test_random_instances_unify() {
    random_test(100, |rng| {
        let depth = rng.random_range(1..20);
        let term = random_term(rng, &symbols(), &constants(), &variable_names(4), depth);
        let instance = random_instance(rng, &term);

        let unifier = unify(&term, &instance).unwrap_or_else(|| panic!("{term} and {instance} should unify"));
        check_unifier(&unifier, &term, &instance);
    })
}

#[test]
fn test_random_symmetry() {
    random_test(100, |rng| {
        let variables = variable_names(3);
        let depth = rng.random_range(1..10);
        let left = random_term(rng, &symbols(), &constants(), &variables, depth);
        let depth = rng.random_range(1..10);
        let right = random_term(rng, &symbols(), &constants(), &variables, depth);

        match (unify(&left, &right), unify(&right, &left)) {
            (Some(forward), Some(backward)) => {
                check_unifier(&forward, &left, &right);
                check_unifier(&backward, &right, &left);

                // Most general unifiers are equal up to a renaming of variables.
                let forward_instance = forward.apply(&left).unwrap();
                let backward_instance = backward.apply(&left).unwrap();
                assert_eq!(
                    forward_instance.free_variables().len(),
                    backward_instance.free_variables().len()
                );
                assert!(unify(&forward_instance, &backward_instance).is_some());
            }
            (None, None) => {}
            (forward, backward) => panic!(
                "Unifying {left} and {right} is not symmetric: {forward:?} and {backward:?}"
            ),
        }
    })
}
