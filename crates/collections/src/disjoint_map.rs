#![forbid(unsafe_code)]

use std::fmt;
use std::hash::Hash;

use itertools::Itertools;
use rpds::HashTrieMapSync;
use rustc_hash::FxHashMap;

use crate::DisjointClass;
use crate::disjoint_forest;
use crate::disjoint_forest::Node;
use crate::disjoint_forest::NodeStore;

/// A union-find structure that associates a value with every equivalence
/// class. Lookups through [DisjointMap::find] compress the paths they follow.
///
/// # Details
///
/// Classes are merged by rank. When two classes are merged, their values are
/// combined by the function given to [DisjointMap::union], which receives the
/// value of the absorbed representative first and the value of the surviving
/// representative second.
#[derive(Clone)]
pub struct DisjointMap<K, V> {
    forest: FxHashMap<K, Node<K, V>>,
}

impl<K: Clone + Eq + Hash, V: Clone> DisjointMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            forest: FxHashMap::default(),
        }
    }

    /// Returns the number of elements, over all classes.
    pub fn len(&self) -> usize {
        self.forest.node_count()
    }

    /// Returns true iff the map has no elements.
    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Returns true iff the element belongs to some class.
    pub fn contains(&self, key: &K) -> bool {
        self.forest.contains_key(key)
    }

    /// Adds the element as a singleton class with the given value. Returns
    /// false, and leaves the map unchanged, if the element is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        disjoint_forest::insert_singleton(&mut self.forest, key, value)
    }

    /// Returns the representative of the class of the element, or `None` when
    /// the element is unknown.
    pub fn find(&mut self, key: &K) -> Option<K> {
        disjoint_forest::find_compress(&mut self.forest, key)
    }

    /// Returns the representative of the class without compressing paths.
    pub fn representative(&self, key: &K) -> Option<K> {
        disjoint_forest::find_root(&self.forest, key).cloned()
    }

    /// Returns the value of the class of the element.
    pub fn get(&self, key: &K) -> Option<&V> {
        disjoint_forest::class_value(&self.forest, key)
    }

    /// Returns a mutable reference to the value of the class of the element.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let root = self.find(key)?;
        match self.forest.get_mut(&root) {
            Some(Node::Root { value, .. }) => Some(value),
            _ => unreachable!("find always returns a representative"),
        }
    }

    /// Replaces the value of the class of the element, returns false if the element is unknown.
    pub fn set(&mut self, key: &K, value: V) -> bool {
        disjoint_forest::set_value(&mut self.forest, key, value)
    }

    /// Merges the classes of `a` and `b`. Elements that are not present are
    /// added; when neither is present they form a new class with value
    /// `default()`. When two classes are merged, the lower ranked
    /// representative is absorbed (on equal ranks the one of `b`) and the new
    /// value is `unify(absorbed value, surviving value)`.
    ///
    /// Returns false iff both were already in the same class.
    pub fn union<D, U>(&mut self, a: K, b: K, default: D, unify: U) -> bool
    where
        D: FnOnce() -> V,
        U: FnOnce(V, V) -> V,
    {
        disjoint_forest::union(&mut self.forest, a, b, default, unify)
    }

    /// Returns true iff both elements are present and in the same class.
    pub fn same_class(&mut self, a: &K, b: &K) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Returns the representatives of all classes.
    pub fn representatives(&self) -> impl Iterator<Item = &K> {
        disjoint_forest::representatives(&self.forest)
    }

    /// Returns all classes with their members and values.
    pub fn classes(&self) -> Vec<DisjointClass<'_, K, V>> {
        disjoint_forest::classes(&self.forest)
    }
}

impl<K: Clone + Eq + Hash, V: Clone> Default for DisjointMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A persistent variant of [DisjointMap]. Cloning is constant time and the
/// clones share their structure, and lookups never modify the structure, so
/// older versions stay valid while a clone is extended.
#[derive(Clone)]
pub struct PersistentDisjointMap<K: Eq + Hash, V> {
    forest: HashTrieMapSync<K, Node<K, V>>,
}

impl<K: Clone + Eq + Hash, V: Clone> PersistentDisjointMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            forest: HashTrieMapSync::new_sync(),
        }
    }

    /// Returns the number of elements, over all classes.
    pub fn len(&self) -> usize {
        self.forest.node_count()
    }

    /// Returns true iff the map has no elements.
    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Returns true iff the element belongs to some class.
    pub fn contains(&self, key: &K) -> bool {
        self.forest.contains_key(key)
    }

    /// Adds the element as a singleton class, see [DisjointMap::insert].
    pub fn insert(&mut self, key: K, value: V) -> bool {
        disjoint_forest::insert_singleton(&mut self.forest, key, value)
    }

    /// Returns the representative of the class of the element, or `None` when
    /// the element is unknown. Does not compress paths.
    pub fn find(&self, key: &K) -> Option<K> {
        disjoint_forest::find_root(&self.forest, key).cloned()
    }

    /// Returns the value of the class of the element.
    pub fn get(&self, key: &K) -> Option<&V> {
        disjoint_forest::class_value(&self.forest, key)
    }

    /// Replaces the value of the class of the element, returns false if the element is unknown.
    pub fn set(&mut self, key: &K, value: V) -> bool {
        disjoint_forest::set_value(&mut self.forest, key, value)
    }

    /// Merges the classes of `a` and `b`, see [DisjointMap::union].
    pub fn union<D, U>(&mut self, a: K, b: K, default: D, unify: U) -> bool
    where
        D: FnOnce() -> V,
        U: FnOnce(V, V) -> V,
    {
        disjoint_forest::union(&mut self.forest, a, b, default, unify)
    }

    /// Returns true iff both elements are present and in the same class.
    pub fn same_class(&self, a: &K, b: &K) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Returns the representatives of all classes.
    pub fn representatives(&self) -> impl Iterator<Item = &K> {
        disjoint_forest::representatives(&self.forest)
    }

    /// Returns all classes with their members and values.
    pub fn classes(&self) -> Vec<DisjointClass<'_, K, V>> {
        disjoint_forest::classes(&self.forest)
    }
}

impl<K: Clone + Eq + Hash, V: Clone> Default for PersistentDisjointMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for DisjointMap<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_classes(f, &self.classes())
    }
}

impl<K, V> fmt::Debug for PersistentDisjointMap<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_classes(f, &self.classes())
    }
}

/// Prints the classes as `{a, b} -> value` separated by commas.
fn format_classes<K: fmt::Debug, V: fmt::Debug>(
    f: &mut fmt::Formatter<'_>,
    classes: &[DisjointClass<'_, K, V>],
) -> fmt::Result {
    write!(
        f,
        "[{}]",
        classes
            .iter()
            .format_with(", ", |class, f| f(&format_args!(
                "{{{:?}}} -> {:?}",
                class.members.iter().format(", "),
                class.value
            )))
    )
}
