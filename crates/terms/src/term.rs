#![forbid(unsafe_code)]

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::iter::Chain;
use std::slice;
use std::sync::Arc;
use std::sync::OnceLock;

use rustc_hash::FxHasher;

use terma_collections::VecSet;

use crate::Attachments;

/// The name of a logic variable. This is the key type of substitutions, the
/// attachments of a variable term are not part of it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermVar {
    name: Arc<str>,
}

impl TermVar {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the name of the variable.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TermVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

impl fmt::Debug for TermVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// The variants of a term. Terms are only constructed through the
/// [crate::TermBuilder] or the shorthand functions, which maintain the
/// invariants documented on the variants.
#[derive(Clone)]
pub enum TermKind {
    Int(i64),
    /// Compared and hashed by its bit pattern.
    Real(f64),
    String(Arc<str>),
    /// A constructor application, the arity is the number of arguments.
    Appl { op: Arc<str>, args: Vec<Term> },
    Nil,
    /// The tail is a nil, a cons or a variable, never a concatenation.
    Cons { head: Term, tail: Term },
    /// The left operand is a variable, or a cons list that ends in a variable.
    /// The right operand is a list other than nil. Never carries attachments.
    Concat { left: Term, right: Term },
    None,
    Some(Term),
    Var(TermVar),
}

impl TermKind {
    /// Returns the same variant with the given children, in the order of [Term::children].
    pub(crate) fn with_children(&self, children: Vec<Term>) -> TermKind {
        let mut children = children.into_iter();
        let mut next = || children.next().expect("The number of children must match the variant");

        match self {
            TermKind::Appl { op, args } => TermKind::Appl {
                op: op.clone(),
                args: (0..args.len()).map(|_| next()).collect(),
            },
            TermKind::Cons { .. } => TermKind::Cons {
                head: next(),
                tail: next(),
            },
            TermKind::Concat { .. } => TermKind::Concat {
                left: next(),
                right: next(),
            },
            TermKind::Some(_) => TermKind::Some(next()),
            TermKind::Int(_)
            | TermKind::Real(_)
            | TermKind::String(_)
            | TermKind::Nil
            | TermKind::None
            | TermKind::Var(_) => self.clone(),
        }
    }

    /// Returns a short name of the variant, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TermKind::Int(_) => "integer",
            TermKind::Real(_) => "real",
            TermKind::String(_) => "string",
            TermKind::Appl { .. } => "application",
            TermKind::Nil => "nil",
            TermKind::Cons { .. } => "cons",
            TermKind::Concat { .. } => "concatenation",
            TermKind::None => "none",
            TermKind::Some(_) => "some",
            TermKind::Var(_) => "variable",
        }
    }
}

/// The iterator over the direct subterms of a term.
pub type Children<'a> = Chain<slice::Iter<'a, Term>, slice::Iter<'a, Term>>;

/// An immutable first-order term. Cloning is cheap, and the subterms are
/// shared between all terms that contain them.
///
/// # Details
///
/// The [PartialEq] and [Hash] implementations compare the structure of the
/// terms and ignore attachments. Use [Term::equals] and [Term::hash_with] to
/// only compare the top-level labels, or to include attachments.
#[derive(Clone)]
pub struct Term {
    shared: Arc<SharedTerm>,
}

/// The actually shared part of a term.
struct SharedTerm {
    kind: TermKind,
    attachments: Attachments,

    /// The hash of the structure, ignoring attachments.
    hash: u64,

    /// True iff the term contains no variables.
    ground: bool,

    attached_hash: OnceLock<u64>,
    free_variables: OnceLock<VecSet<TermVar>>,
}

impl Term {
    /// Creates the term without checking the invariants of the variant.
    pub(crate) fn from_parts(kind: TermKind, attachments: Attachments) -> Term {
        #[cfg(feature = "terma_debug")]
        debug_assert!(
            crate::builder::validate(&kind, &attachments).is_ok(),
            "The term violates the invariants of its variant"
        );

        let mut hasher = shallow_hasher(&kind);
        let mut ground = !matches!(kind, TermKind::Var(_));
        for child in children_of(&kind) {
            hasher.write_u64(child.shared.hash);
            ground &= child.shared.ground;
        }

        let free_variables = OnceLock::new();
        if ground {
            let _ = free_variables.set(VecSet::new());
        }

        Term {
            shared: Arc::new(SharedTerm {
                kind,
                attachments,
                hash: hasher.finish(),
                ground,
                attached_hash: OnceLock::new(),
                free_variables,
            }),
        }
    }

    /// Returns the variant of this term.
    pub fn kind(&self) -> &TermKind {
        &self.shared.kind
    }

    pub fn attachments(&self) -> &Attachments {
        &self.shared.attachments
    }

    /// Returns the direct subterms in order: the arguments of an application,
    /// the head and tail of a cons, both operands of a concatenation, and the
    /// element of a some.
    pub fn children(&self) -> Children<'_> {
        children_of(&self.shared.kind)
    }

    /// Returns the number of direct subterms.
    pub fn arity(&self) -> usize {
        self.children().count()
    }

    /// Returns true iff both are the same instance.
    pub fn ptr_eq(&self, other: &Term) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn is_var(&self) -> bool {
        matches!(self.shared.kind, TermKind::Var(_))
    }

    /// Returns the variable if this term is one.
    pub fn as_var(&self) -> Option<&TermVar> {
        match &self.shared.kind {
            TermKind::Var(var) => Some(var),
            _ => None,
        }
    }

    /// Returns true iff the term can be used in list position, which includes variables.
    pub fn is_list(&self) -> bool {
        matches!(
            self.shared.kind,
            TermKind::Nil | TermKind::Cons { .. } | TermKind::Concat { .. } | TermKind::Var(_)
        )
    }

    /// Returns true iff no variable occurs in this term.
    pub fn is_ground(&self) -> bool {
        self.shared.ground
    }

    /// Returns the elements of the cons cells at the front of this list,
    /// together with the rest of the list, which is a nil, a variable or a
    /// concatenation. Returns `None` if this term is not a list.
    pub fn list_elements(&self) -> Option<(Vec<Term>, Term)> {
        if !self.is_list() {
            return None;
        }

        let mut elements = Vec::new();
        let mut current = self;
        while let TermKind::Cons { head, tail } = current.kind() {
            elements.push(head.clone());
            current = tail;
        }

        Some((elements, current.clone()))
    }

    /// Returns the variables that occur in this term, computed once.
    pub fn free_variables(&self) -> &VecSet<TermVar> {
        if let Some(variables) = self.shared.free_variables.get() {
            return variables;
        }

        fill_bottom_up(
            self,
            |term| term.shared.free_variables.get().is_some(),
            |term| {
                let variables = match term.kind() {
                    TermKind::Var(var) => VecSet::singleton(var.clone()),
                    _ => term.children().fold(VecSet::new(), |result, child| {
                        result.union(child.shared.free_variables.get().expect("Children are filled first"))
                    }),
                };
                let _ = term.shared.free_variables.set(variables);
            },
        );

        self.shared
            .free_variables
            .get()
            .expect("The free variables have been computed")
    }

    /// Compares two terms. With `compare_subterms` false only the label of the
    /// variant is compared: the constructor name and arity, the scalar value or
    /// the variable name. With `compare_attachments` the attachments of every
    /// compared term must be equal as well.
    pub fn equals(&self, other: &Term, compare_subterms: bool, compare_attachments: bool) -> bool {
        if !compare_subterms {
            return shallow_equals(self.kind(), other.kind())
                && (!compare_attachments || self.attachments() == other.attachments());
        }

        let mut stack = vec![(self, other)];
        while let Some((left, right)) = stack.pop() {
            if left.ptr_eq(right) {
                continue;
            }

            if left.shared.hash != right.shared.hash || !shallow_equals(left.kind(), right.kind()) {
                return false;
            }

            if compare_attachments && left.attachments() != right.attachments() {
                return false;
            }

            stack.extend(left.children().zip(right.children()));
        }

        true
    }

    /// Returns the hash that corresponds to [Term::equals] with the same flags.
    pub fn hash_with(&self, compare_subterms: bool, compare_attachments: bool) -> u64 {
        match (compare_subterms, compare_attachments) {
            (false, false) => shallow_hasher(self.kind()).finish(),
            (false, true) => {
                let mut hasher = shallow_hasher(self.kind());
                self.attachments().hash(&mut hasher);
                hasher.finish()
            }
            (true, false) => self.shared.hash,
            (true, true) => self.attached_hash(),
        }
    }

    /// Returns an iterator over all subterms in pre-order, starting with this term.
    pub fn iter(&self) -> TermIterator<'_> {
        TermIterator { stack: vec![self] }
    }

    fn attached_hash(&self) -> u64 {
        if let Some(hash) = self.shared.attached_hash.get() {
            return *hash;
        }

        fill_bottom_up(
            self,
            |term| term.shared.attached_hash.get().is_some(),
            |term| {
                let mut hasher = shallow_hasher(term.kind());
                term.attachments().hash(&mut hasher);
                for child in term.children() {
                    hasher.write_u64(*child.shared.attached_hash.get().expect("Children are filled first"));
                }
                let _ = term.shared.attached_hash.set(hasher.finish());
            },
        );

        *self.shared.attached_hash.get().expect("The hash has been computed")
    }
}

impl Drop for SharedTerm {
    fn drop(&mut self) {
        // Drops long lists without recursion, which would overflow the stack.
        let mut stack = take_children(&mut self.kind);
        while let Some(term) = stack.pop() {
            if let Some(mut shared) = Arc::into_inner(term.shared) {
                stack.extend(take_children(&mut shared.kind));
            }
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, true, false)
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.shared.hash);
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")?;
        if !self.attachments().is_empty() {
            write!(f, " {:?}", self.attachments())?;
        }
        Ok(())
    }
}

/// An iterator over all subterms of a [Term] in pre-order, i.e., for
/// `f(g(a), b)` it visits `f(g(a), b)`, `g(a)`, `a` and `b`.
pub struct TermIterator<'a> {
    stack: Vec<&'a Term>,
}

impl<'a> Iterator for TermIterator<'a> {
    type Item = &'a Term;

    fn next(&mut self) -> Option<Self::Item> {
        let term = self.stack.pop()?;
        self.stack.extend(term.children().rev());
        Some(term)
    }
}

const NO_TERMS: &[Term] = &[];

fn children_of(kind: &TermKind) -> Children<'_> {
    let (first, second): (&[Term], &[Term]) = match kind {
        TermKind::Appl { args, .. } => (args.as_slice(), NO_TERMS),
        TermKind::Cons { head, tail } => (slice::from_ref(head), slice::from_ref(tail)),
        TermKind::Concat { left, right } => (slice::from_ref(left), slice::from_ref(right)),
        TermKind::Some(element) => (slice::from_ref(element), NO_TERMS),
        TermKind::Int(_)
        | TermKind::Real(_)
        | TermKind::String(_)
        | TermKind::Nil
        | TermKind::None
        | TermKind::Var(_) => (NO_TERMS, NO_TERMS),
    };

    first.iter().chain(second.iter())
}

/// Moves the children out of the given variant, leaving a leaf behind.
fn take_children(kind: &mut TermKind) -> Vec<Term> {
    match std::mem::replace(kind, TermKind::Nil) {
        TermKind::Appl { args, .. } => args,
        TermKind::Cons { head, tail } => vec![head, tail],
        TermKind::Concat { left, right } => vec![left, right],
        TermKind::Some(element) => vec![element],
        TermKind::Int(_)
        | TermKind::Real(_)
        | TermKind::String(_)
        | TermKind::Nil
        | TermKind::None
        | TermKind::Var(_) => Vec::new(),
    }
}

/// Compares the labels of both variants, ignoring the children.
fn shallow_equals(left: &TermKind, right: &TermKind) -> bool {
    match (left, right) {
        (TermKind::Int(left), TermKind::Int(right)) => left == right,
        (TermKind::Real(left), TermKind::Real(right)) => left.to_bits() == right.to_bits(),
        (TermKind::String(left), TermKind::String(right)) => left == right,
        (TermKind::Appl { op: left, args: l }, TermKind::Appl { op: right, args: r }) => {
            left == right && l.len() == r.len()
        }
        (TermKind::Var(left), TermKind::Var(right)) => left == right,
        (TermKind::Nil, TermKind::Nil)
        | (TermKind::Cons { .. }, TermKind::Cons { .. })
        | (TermKind::Concat { .. }, TermKind::Concat { .. })
        | (TermKind::None, TermKind::None)
        | (TermKind::Some(_), TermKind::Some(_)) => true,
        _ => false,
    }
}

/// Returns a hasher that has consumed the label of the variant.
fn shallow_hasher(kind: &TermKind) -> FxHasher {
    let mut hasher = FxHasher::default();
    std::mem::discriminant(kind).hash(&mut hasher);

    match kind {
        TermKind::Int(value) => value.hash(&mut hasher),
        TermKind::Real(value) => value.to_bits().hash(&mut hasher),
        TermKind::String(value) => value.hash(&mut hasher),
        TermKind::Appl { op, args } => {
            op.hash(&mut hasher);
            args.len().hash(&mut hasher);
        }
        TermKind::Var(var) => var.hash(&mut hasher),
        TermKind::Nil | TermKind::Cons { .. } | TermKind::Concat { .. } | TermKind::None | TermKind::Some(_) => {}
    }

    hasher
}

/// Fills a cache of every subterm without recursion. The `fill` function is
/// called on a term after it has been called on all its children that were
/// not `is_filled` yet.
fn fill_bottom_up(term: &Term, is_filled: impl Fn(&Term) -> bool, fill: impl Fn(&Term)) {
    let mut stack = vec![(term, false)];

    while let Some((term, expanded)) = stack.pop() {
        if is_filled(term) {
            // Shared subterms can be pushed more than once.
            continue;
        }

        if expanded {
            fill(term);
        } else {
            stack.push((term, true));
            stack.extend(term.children().filter(|child| !is_filled(child)).map(|child| (child, false)));
        }
    }
}
