use std::cmp::Ordering;
use std::fmt;
use std::slice::Iter;

use itertools::Itertools;

#[macro_export]
macro_rules! vecset {
    () => {
        $crate::VecSet::new()
    };
    ($($x:expr),+ $(,)?) => {{
        let mut __set = $crate::VecSet::new();
        $( let _ = __set.insert($x); )*
        __set
    }};
}

///
/// A set that is internally represented by a sorted vector. Mostly useful for
/// small sets that are built once and then only queried, such as the free
/// variables of a term.
///
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VecSet<T> {
    /// The internal storage with the invariant that the array is sorted and free of duplicates.
    sorted_array: Vec<T>,
}

impl<T: Ord> VecSet<T> {
    pub fn new() -> Self {
        Self {
            sorted_array: Vec::new(),
        }
    }

    /// Returns a new set only containing the given element.
    pub fn singleton(element: T) -> Self {
        Self {
            sorted_array: vec![element],
        }
    }

    /// Returns true iff the set contains the given element.
    pub fn contains(&self, element: &T) -> bool {
        self.sorted_array.binary_search(element).is_ok()
    }

    /// Inserts the given element into the set, returns true iff the element was
    /// inserted.
    pub fn insert(&mut self, element: T) -> bool {
        match self.sorted_array.binary_search(&element) {
            Ok(_) => false,
            Err(position) => {
                self.sorted_array.insert(position, element);
                true
            }
        }
    }

    /// Removes the given element, returns true iff it was present.
    pub fn remove(&mut self, element: &T) -> bool {
        match self.sorted_array.binary_search(element) {
            Ok(position) => {
                self.sorted_array.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    /// Returns true iff the set is empty.
    pub fn is_empty(&self) -> bool {
        self.sorted_array.is_empty()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.sorted_array.len()
    }

    /// Returns an iterator over the elements in the set, they are yielded in sorted order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.sorted_array.iter()
    }

    /// Returns the elements as a sorted slice.
    pub fn as_slice(&self) -> &[T] {
        &self.sorted_array
    }
}

impl<T: Ord + Clone> VecSet<T> {
    /// Returns the union of both sets, computed by a single merge pass.
    pub fn union(&self, other: &VecSet<T>) -> VecSet<T> {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut result = Vec::with_capacity(self.len() + other.len());
        let mut left = self.sorted_array.iter().peekable();
        let mut right = other.sorted_array.iter().peekable();

        loop {
            // An exhausted side compares as larger.
            let order = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => l.cmp(r),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };

            let next = match order {
                Ordering::Less => left.next(),
                Ordering::Greater => right.next(),
                Ordering::Equal => {
                    right.next();
                    left.next()
                }
            };
            result.extend(next.cloned());
        }

        VecSet { sorted_array: result }
    }
}

impl<T: Ord> Default for VecSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for VecSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sorted_array: Vec<T> = iter.into_iter().collect();
        sorted_array.sort_unstable();
        sorted_array.dedup();
        Self { sorted_array }
    }
}

impl<T: Ord> Extend<T> for VecSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.sorted_array.extend(iter);
        self.sorted_array.sort_unstable();
        self.sorted_array.dedup();
    }
}

impl<'a, T> IntoIterator for &'a VecSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.sorted_array.iter()
    }
}

impl<T> IntoIterator for VecSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.sorted_array.into_iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for VecSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{:?}}}", self.sorted_array.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::Rng;

    use terma_utilities::random_test;

    use super::*;

    #[test]
    fn test_vecset_macro() {
        let set = vecset![3, 1, 2, 3];
        assert_eq!(set.as_slice(), &[1, 2, 3]);
        assert!(set.contains(&2));
        assert!(!set.contains(&4));
    }

    #[test]
    fn test_random_vecset_union() {
        random_test(100, |rng| {
            let left: Vec<u32> = (0..rng.random_range(0..20)).map(|_| rng.random_range(0..32)).collect();
            let right: Vec<u32> = (0..rng.random_range(0..20)).map(|_| rng.random_range(0..32)).collect();

            let union = VecSet::from_iter(left.iter().copied()).union(&VecSet::from_iter(right.iter().copied()));
            let expected: BTreeSet<u32> = left.iter().chain(right.iter()).copied().collect();

            assert_eq!(union.iter().copied().collect::<Vec<_>>(), expected.into_iter().collect::<Vec<_>>());
        })
    }

    #[test]
    fn test_insert_remove() {
        let mut set = VecSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert_eq!(set.len(), 2);

        assert!(set.remove(&"a"));
        assert!(!set.remove(&"a"));
        assert_eq!(set.as_slice(), &["b"]);
    }
}
