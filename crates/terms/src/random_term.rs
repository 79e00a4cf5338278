#![forbid(unsafe_code)]

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::Term;
use crate::appl;
use crate::int;
use crate::list;
use crate::none;
use crate::some;
use crate::var;

/// Creates a random term from the given function symbols with their arity,
/// constants and variables. Performs `iterations` constructions, where
/// every construction picks its arguments from the terms created so far,
/// such that subterms are shared. Lists and options are created as well.
pub fn random_term(
    rng: &mut impl Rng,
    symbols: &[(String, usize)],
    constants: &[String],
    variables: &[String],
    iterations: usize,
) -> Term {
    debug_assert!(
        !constants.is_empty(),
        "We need constants to be able to create a term"
    );

    let mut subterms: Vec<Term> = constants
        .iter()
        .map(|name| appl(name.as_str(), []))
        .chain(variables.iter().map(|name| var(name.as_str())))
        .chain([int(0), int(1), none()])
        .collect();

    let mut result = pick(rng, &subterms);
    for _ in 0..iterations {
        let term = match rng.random_range(0..10) {
            0 => {
                let length = rng.random_range(0..4);
                list((0..length).map(|_| pick(rng, &subterms)).collect::<Vec<_>>())
            }
            1 => some(pick(rng, &subterms)),
            _ => match symbols.choose(rng) {
                Some((symbol, arity)) => appl(
                    symbol.as_str(),
                    (0..*arity).map(|_| pick(rng, &subterms)).collect::<Vec<_>>(),
                ),
                None => pick(rng, &subterms),
            },
        };

        // Make this term available as another subterm that can be used.
        subterms.push(term.clone());
        result = term;
    }

    result
}

/// Returns a uniformly chosen term of the given non-empty slice.
fn pick(rng: &mut impl Rng, subterms: &[Term]) -> Term {
    subterms
        .choose(rng)
        .expect("There is at least one subterm")
        .clone()
}

/// Returns the variable names `X0`, `X1`, ... up to the given number.
pub fn variable_names(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("X{index}")).collect()
}
