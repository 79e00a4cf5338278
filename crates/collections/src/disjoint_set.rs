#![forbid(unsafe_code)]

use std::fmt;
use std::hash::Hash;

use delegate::delegate;
use itertools::Itertools;

use crate::DisjointMap;
use crate::PersistentDisjointMap;

/// A union-find structure over opaque elements, with union by rank and path
/// compression. This is a [DisjointMap] without values.
#[derive(Clone)]
pub struct DisjointSet<K> {
    map: DisjointMap<K, ()>,
}

impl<K: Clone + Eq + Hash> DisjointSet<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self { map: DisjointMap::new() }
    }

    delegate! {
        to self.map {
            /// Returns the number of elements, over all classes.
            pub fn len(&self) -> usize;

            /// Returns true iff there are no elements.
            pub fn is_empty(&self) -> bool;

            /// Returns true iff the element belongs to some class.
            pub fn contains(&self, key: &K) -> bool;

            /// Returns the representative of the class of the element, compressing the path to it.
            pub fn find(&mut self, key: &K) -> Option<K>;

            /// Returns true iff both elements are present and in the same class.
            pub fn same_class(&mut self, a: &K, b: &K) -> bool;

            /// Returns the representatives of all classes.
            pub fn representatives(&self) -> impl Iterator<Item = &K>;
        }
    }

    /// Adds the element as a singleton class, returns false if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        self.map.insert(key, ())
    }

    /// Merges the classes of both elements, adding elements that are not yet
    /// present. Returns false iff they were already in the same class.
    pub fn union(&mut self, a: K, b: K) -> bool {
        self.map.union(a, b, || (), |_, _| ())
    }

    /// Returns the members of every class.
    pub fn classes(&self) -> Vec<Vec<K>> {
        self.map.classes().into_iter().map(|class| class.members).collect()
    }
}

/// The persistent variant of [DisjointSet], see [PersistentDisjointMap].
#[derive(Clone)]
pub struct PersistentDisjointSet<K: Eq + Hash> {
    map: PersistentDisjointMap<K, ()>,
}

impl<K: Clone + Eq + Hash> PersistentDisjointSet<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            map: PersistentDisjointMap::new(),
        }
    }

    delegate! {
        to self.map {
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            pub fn contains(&self, key: &K) -> bool;

            /// Returns the representative of the class of the element, without modifying the set.
            pub fn find(&self, key: &K) -> Option<K>;

            pub fn same_class(&self, a: &K, b: &K) -> bool;
            pub fn representatives(&self) -> impl Iterator<Item = &K>;
        }
    }

    pub fn insert(&mut self, key: K) -> bool {
        self.map.insert(key, ())
    }

    /// Merges the classes of both elements, see [DisjointSet::union].
    pub fn union(&mut self, a: K, b: K) -> bool {
        self.map.union(a, b, || (), |_, _| ())
    }

    pub fn classes(&self) -> Vec<Vec<K>> {
        self.map.classes().into_iter().map(|class| class.members).collect()
    }
}

impl<K: Clone + Eq + Hash> Default for DisjointSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> Default for PersistentDisjointSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug> fmt::Debug for DisjointSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_classes(f, self.classes())
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug> fmt::Debug for PersistentDisjointSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_classes(f, self.classes())
    }
}

fn format_classes<K: fmt::Debug>(f: &mut fmt::Formatter<'_>, classes: Vec<Vec<K>>) -> fmt::Result {
    write!(
        f,
        "[{}]",
        classes
            .iter()
            .format_with(", ", |class, f| f(&format_args!("{{{:?}}}", class.iter().format(", "))))
    )
}
