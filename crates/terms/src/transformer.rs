#![forbid(unsafe_code)]

use terma_utilities::debug_trace;

use crate::Term;
use crate::TermBuilder;
use crate::TermError;

/// Constructs a [Term] from an input of (inductive) type `I` without
/// recursion, so that deep inputs such as long lists do not overflow the
/// system stack. See [TermTransformer::evaluate] for more details.
pub struct TermTransformer<I, C> {
    terms: Vec<Option<Term>>,
    configs: Vec<Config<I, C>>,
}

/// The result of the `transformer` function of [TermTransformer::evaluate].
pub enum Yield<C> {
    /// The result for this input, as is.
    Term(Term),
    /// Construct the result from `C` and the results of the inputs that were
    /// pushed to the argument stack.
    Construct(C),
}

/// The outcome of the function given to [transform] for a single subterm.
pub enum Rewrite {
    /// Keep the subterm and transform its children.
    Keep,
    /// Replace the subterm by the given term, which is not transformed.
    Replace(Term),
    /// Replace the subterm by the given term, which is transformed in turn.
    /// The caller must ensure that this terminates.
    Expand(Term),
}

/// Applies the function to every subterm of the given term, in pre-order,
/// and rebuilds the term bottom-up through the copy functions of the
/// [TermBuilder]. When nothing is rewritten the result is the given instance.
pub fn transform<F, E>(term: &Term, mut function: F) -> Result<Term, E>
where
    F: FnMut(&Term) -> Result<Rewrite, E>,
    E: From<TermError>,
{
    TermTransformer::<Term, Rebuild>::new().evaluate(
        term.clone(),
        |args, term| match function(&term)? {
            Rewrite::Replace(result) => Ok(Yield::Term(result)),
            Rewrite::Expand(result) => {
                args.push(result);
                Ok(Yield::Construct(Rebuild::Forward))
            }
            Rewrite::Keep => {
                if term.arity() == 0 {
                    return Ok(Yield::Term(term));
                }

                for child in term.children() {
                    args.push(child.clone());
                }
                Ok(Yield::Construct(Rebuild::Copy(term)))
            }
        },
        |rebuild, mut children| match rebuild {
            Rebuild::Copy(term) => Ok(TermBuilder::rebuild(&term, children)?),
            Rebuild::Forward => Ok(children.pop().expect("An expanded term has exactly one result")),
        },
    )
}

/// How [transform] constructs a result.
#[derive(Debug)]
enum Rebuild {
    Copy(Term),
    Forward,
}

impl<I, C> TermTransformer<I, C> {
    pub fn new() -> TermTransformer<I, C> {
        TermTransformer {
            terms: vec![],
            configs: vec![],
        }
    }

    /// Constructs a term from the given input of (inductive) type `I`
    /// without using the system stack.
    ///
    /// The `transformer` function is applied to every input. It either
    /// yields a result term directly, or it pushes more inputs to the
    /// argument stack and yields an instance of `C`. In the latter case
    /// `construct` is called with that instance and the results of the pushed
    /// inputs, in the order in which they were pushed.
    ///
    /// # Example
    ///
    /// To rewrite a term with a function `f : &Term -> Option<Term>` the input
    /// `I` is [Term] and `C` the term that is rebuilt. The `transformer`
    /// yields `f(input)` when that is some term, and otherwise pushes the
    /// children of the input and yields the input itself. The `construct`
    /// function then copies the input with the transformed children.
    pub fn evaluate<E, F, G>(&mut self, input: I, mut transformer: F, mut construct: G) -> Result<Term, E>
    where
        F: FnMut(&mut ArgStack<'_, I, C>, I) -> Result<Yield<C>, E>,
        G: FnMut(C, Vec<Term>) -> Result<Term, E>,
    {
        self.terms.clear();
        self.configs.clear();

        self.terms.push(None);
        self.configs.push(Config::Apply(input, 0));

        while let Some(config) = self.configs.pop() {
            match config {
                Config::Apply(input, result) => {
                    // Applies the transformer to this input, which pushes its arguments.
                    let top_of_stack = self.configs.len();
                    let mut args = ArgStack::new(&mut self.terms, &mut self.configs);

                    match transformer(&mut args, input)? {
                        Yield::Construct(input) => {
                            // Constructed after all the pushed arguments have been evaluated.
                            let arity = args.len();
                            self.configs.insert(top_of_stack, Config::Construct(input, arity, result));
                        }
                        Yield::Term(term) => {
                            self.terms[result] = Some(term);
                        }
                    }
                }
                Config::Construct(input, arity, result) => {
                    let first = self.terms.len() - arity;
                    let arguments: Vec<Term> = self.terms.drain(first..).flatten().collect();
                    debug_assert_eq!(arguments.len(), arity, "Every argument has been evaluated");

                    self.terms[result] = Some(construct(input, arguments)?);
                }
            }

            debug_trace!("Transformer stack: {} terms, {} configs", self.terms.len(), self.configs.len());
        }

        debug_assert!(self.terms.len() == 1, "Expect exactly one term on the result stack");

        Ok(self
            .terms
            .pop()
            .flatten()
            .expect("The input has been evaluated to a term"))
    }
}

impl<I, C> Default for TermTransformer<I, C> {
    fn default() -> Self {
        Self::new()
    }
}

enum Config<I, C> {
    Apply(I, usize),
    Construct(C, usize, usize),
}

/// The arguments of a single input, stored on the shared stack.
pub struct ArgStack<'a, I, C> {
    terms: &'a mut Vec<Option<Term>>,
    configs: &'a mut Vec<Config<I, C>>,
    top_of_stack: usize,
}

impl<'a, I, C> ArgStack<'a, I, C> {
    fn new(terms: &'a mut Vec<Option<Term>>, configs: &'a mut Vec<Config<I, C>>) -> ArgStack<'a, I, C> {
        let top_of_stack = terms.len();
        ArgStack {
            terms,
            configs,
            top_of_stack,
        }
    }

    /// Returns the number of arguments pushed.
    pub fn len(&self) -> usize {
        self.terms.len() - self.top_of_stack
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes an input, whose result becomes the next argument of the construction.
    pub fn push(&mut self, input: I) {
        self.configs.push(Config::Apply(input, self.terms.len()));
        self.terms.push(None);
    }
}
