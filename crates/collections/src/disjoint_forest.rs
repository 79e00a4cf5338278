//! The union by rank forest shared by the mutable and persistent disjoint
//! structures. The algorithms are written against [NodeStore] so that both the
//! hash map and the persistent hash trie backed variants use the same code.

use std::hash::Hash;

use rpds::HashTrieMapSync;
use rustc_hash::FxHashMap;

/// A node in the forest. Every element of a disjoint structure is stored with
/// either the rank and value of its class (when it is the representative), or
/// its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Node<K, V> {
    Root { rank: u32, value: V },
    Child(K),
}

/// The storage of a forest.
pub(crate) trait NodeStore<K, V> {
    fn node(&self, key: &K) -> Option<&Node<K, V>>;

    fn set_node(&mut self, key: K, node: Node<K, V>);

    fn node_count(&self) -> usize;

    fn nodes<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a Node<K, V>)> + 'a
    where
        K: 'a,
        V: 'a;
}

impl<K: Eq + Hash, V> NodeStore<K, V> for FxHashMap<K, Node<K, V>> {
    fn node(&self, key: &K) -> Option<&Node<K, V>> {
        self.get(key)
    }

    fn set_node(&mut self, key: K, node: Node<K, V>) {
        self.insert(key, node);
    }

    fn node_count(&self) -> usize {
        self.len()
    }

    fn nodes<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a Node<K, V>)> + 'a
    where
        K: 'a,
        V: 'a,
    {
        self.iter()
    }
}

impl<K: Eq + Hash, V> NodeStore<K, V> for HashTrieMapSync<K, Node<K, V>> {
    fn node(&self, key: &K) -> Option<&Node<K, V>> {
        self.get(key)
    }

    fn set_node(&mut self, key: K, node: Node<K, V>) {
        self.insert_mut(key, node);
    }

    fn node_count(&self) -> usize {
        self.size()
    }

    fn nodes<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a Node<K, V>)> + 'a
    where
        K: 'a,
        V: 'a,
    {
        self.iter()
    }
}

/// An equivalence class of a disjoint structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisjointClass<'a, K, V> {
    /// The representative of the class, which is also part of `members`.
    pub representative: K,
    /// All elements of the class, in unspecified order.
    pub members: Vec<K>,
    /// The value associated with the class.
    pub value: &'a V,
}

/// Returns the representative of the given key without changing the forest.
/// The result borrows either from the store or from the key itself.
pub(crate) fn find_root<'s, 'k, K: Eq, V: 'k, S: NodeStore<K, V>>(store: &'s S, key: &'k K) -> Option<&'k K>
where
    's: 'k,
{
    #[cfg(feature = "terma_debug")]
    let mut steps = 0usize;

    let mut current = key;
    loop {
        match store.node(current)? {
            Node::Root { .. } => return Some(current),
            Node::Child(parent) => {
                debug_assert!(parent != current, "A child node cannot be its own parent");

                #[cfg(feature = "terma_debug")]
                {
                    steps += 1;
                    debug_assert!(steps <= store.node_count(), "The forest contains a cycle");
                }

                current = parent;
            }
        }
    }
}

/// Returns the representative of the given key, and points every element on
/// the path directly to it.
pub(crate) fn find_compress<K: Clone + Eq, V, S: NodeStore<K, V>>(store: &mut S, key: &K) -> Option<K> {
    let mut path = Vec::new();
    let root = {
        let mut current = key;
        loop {
            match store.node(current)? {
                Node::Root { .. } => break current.clone(),
                Node::Child(parent) => {
                    path.push(current.clone());
                    current = parent;
                }
            }
        }
    };

    // The last element of the path already points to the root.
    path.pop();
    for element in path {
        store.set_node(element, Node::Child(root.clone()));
    }

    Some(root)
}

/// Returns the rank and value of the given representative.
pub(crate) fn root_entry<'a, K: 'a, V, S: NodeStore<K, V>>(store: &'a S, root: &K) -> (u32, &'a V) {
    match store.node(root) {
        Some(Node::Root { rank, value }) => (*rank, value),
        _ => panic!("The given element is not a representative"),
    }
}

/// Returns the value of the class of the given key.
pub(crate) fn class_value<'s, K: Eq + 's, V, S: NodeStore<K, V>>(store: &'s S, key: &K) -> Option<&'s V> {
    let root = find_root(store, key)?;
    Some(root_entry(store, root).1)
}

/// Adds the key as a new singleton class, returns false if it was already present.
pub(crate) fn insert_singleton<K, V, S: NodeStore<K, V>>(store: &mut S, key: K, value: V) -> bool {
    if store.node(&key).is_some() {
        return false;
    }

    store.set_node(key, Node::Root { rank: 0, value });
    true
}

/// Replaces the value of the class of the given key, returns false if the key is unknown.
pub(crate) fn set_value<K: Clone + Eq, V, S: NodeStore<K, V>>(store: &mut S, key: &K, value: V) -> bool {
    let Some(root) = find_root(&*store, key).cloned() else {
        return false;
    };

    let (rank, _) = root_entry(&*store, &root);
    store.set_node(root, Node::Root { rank, value });
    true
}

/// Merges the classes of the two keys using union by rank. Keys that are not
/// yet present join the class of the other key, or form a new class with the
/// value `default()` when neither is present. When two existing classes are
/// merged the new value is `unify(from, into)`, where `from` is the value of
/// the absorbed representative and `into` the value of the surviving one. On
/// equal ranks the representative of `a` survives.
///
/// Returns false iff the keys were already in the same class.
pub(crate) fn union<K, V, S, D, U>(store: &mut S, a: K, b: K, default: D, unify: U) -> bool
where
    K: Clone + Eq,
    V: Clone,
    S: NodeStore<K, V>,
    D: FnOnce() -> V,
    U: FnOnce(V, V) -> V,
{
    let root_a = find_root(&*store, &a).cloned();
    let root_b = find_root(&*store, &b).cloned();

    match (root_a, root_b) {
        (None, None) => {
            if a == b {
                store.set_node(a, Node::Root { rank: 0, value: default() });
                return false;
            }

            store.set_node(b, Node::Child(a.clone()));
            store.set_node(a, Node::Root { rank: 1, value: default() });
            true
        }
        (Some(root), None) => {
            attach(store, root, b);
            true
        }
        (None, Some(root)) => {
            attach(store, root, a);
            true
        }
        (Some(root_a), Some(root_b)) => {
            if root_a == root_b {
                return false;
            }

            let (rank_a, value_a) = root_entry(&*store, &root_a);
            let (rank_b, value_b) = root_entry(&*store, &root_b);
            let (value_a, value_b) = (value_a.clone(), value_b.clone());

            let (winner, loser, rank, from, into) = if rank_a < rank_b {
                (root_b, root_a, rank_b, value_a, value_b)
            } else if rank_a > rank_b {
                (root_a, root_b, rank_a, value_b, value_a)
            } else {
                (root_a, root_b, rank_a + 1, value_b, value_a)
            };

            let value = unify(from, into);
            store.set_node(loser, Node::Child(winner.clone()));
            store.set_node(winner, Node::Root { rank, value });
            true
        }
    }
}

/// Adds a key that is not yet present as a child of the given representative.
fn attach<K: Clone + Eq, V: Clone, S: NodeStore<K, V>>(store: &mut S, root: K, key: K) {
    let (rank, value) = root_entry(&*store, &root);
    if rank == 0 {
        // A singleton class merged with another singleton.
        let value = value.clone();
        store.set_node(root.clone(), Node::Root { rank: 1, value });
    }

    store.set_node(key, Node::Child(root));
}

/// Returns all the equivalence classes of the forest.
pub(crate) fn classes<'a, K, V, S>(store: &'a S) -> Vec<DisjointClass<'a, K, V>>
where
    K: Clone + Eq + Hash + 'a,
    V: 'a,
    S: NodeStore<K, V>,
{
    let mut index: FxHashMap<&'a K, usize> = FxHashMap::default();
    let mut result: Vec<DisjointClass<'a, K, V>> = Vec::new();

    for (key, _) in store.nodes() {
        let root = find_root(store, key).expect("Every stored key has a representative");
        let position = *index.entry(root).or_insert_with(|| {
            result.push(DisjointClass {
                representative: root.clone(),
                members: Vec::new(),
                value: root_entry(store, root).1,
            });
            result.len() - 1
        });

        result[position].members.push(key.clone());
    }

    result
}

/// Returns the representatives of all classes.
pub(crate) fn representatives<'a, K, V, S: NodeStore<K, V>>(store: &'a S) -> impl Iterator<Item = &'a K> + 'a
where
    K: 'a,
    V: 'a,
{
    store.nodes().filter_map(|(key, node)| match node {
        Node::Root { .. } => Some(key),
        Node::Child(_) => None,
    })
}
