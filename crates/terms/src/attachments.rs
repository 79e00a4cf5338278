use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::Term;

/// A single auxiliary value attached to a term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attachment {
    Text(String),
    Integer(i64),
    /// The layout between the children of a term, in source order.
    Separators(Vec<String>),
    /// An arbitrary term, for example the term this one originates from.
    Term(Term),
}

/// The keyed side-channel of a term. Attachments do not take part in the
/// default equality and hash of terms, but can be compared explicitly with
/// [Term::equals].
///
/// Cloning is cheap since the underlying map is shared.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Attachments {
    entries: Option<Arc<BTreeMap<String, Attachment>>>,
}

impl Attachments {
    /// The key that is used to store the layout separators.
    pub const SEPARATORS: &'static str = "separators";

    /// Returns the empty set of attachments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns attachments that only contain the given separators.
    pub fn separators<S: Into<String>>(separators: impl IntoIterator<Item = S>) -> Self {
        Self::empty().with(
            Self::SEPARATORS,
            Attachment::Separators(separators.into_iter().map(Into::into).collect()),
        )
    }

    /// Returns a copy with the given entry added, replacing a previous entry
    /// under the same key.
    pub fn with(&self, key: impl Into<String>, value: Attachment) -> Self {
        let mut entries = self.entries.as_deref().cloned().unwrap_or_default();
        entries.insert(key.into(), value);
        Self {
            entries: Some(Arc::new(entries)),
        }
    }

    /// Returns a copy without the entry for the given key.
    pub fn without(&self, key: &str) -> Self {
        match &self.entries {
            Some(entries) if entries.contains_key(key) => {
                let mut entries = entries.as_ref().clone();
                entries.remove(key);
                Self::from_map(entries)
            }
            _ => self.clone(),
        }
    }

    /// Returns the attachment stored under the given key.
    pub fn get(&self, key: &str) -> Option<&Attachment> {
        self.entries.as_ref()?.get(key)
    }

    /// Returns the layout separators, if present.
    pub fn get_separators(&self) -> Option<&[String]> {
        match self.get(Self::SEPARATORS)? {
            Attachment::Separators(separators) => Some(separators),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.len())
    }

    /// Iterates over the entries ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attachment)> {
        self.entries
            .iter()
            .flat_map(|entries| entries.iter().map(|(key, value)| (key.as_str(), value)))
    }

    /// Returns true iff both refer to the same shared map, which implies equality.
    pub fn ptr_eq(&self, other: &Attachments) -> bool {
        match (&self.entries, &other.entries) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    fn from_map(entries: BTreeMap<String, Attachment>) -> Self {
        if entries.is_empty() {
            Self::empty()
        } else {
            Self {
                entries: Some(Arc::new(entries)),
            }
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Attachment)> for Attachments {
    fn from_iter<I: IntoIterator<Item = (K, Attachment)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.iter()
                .format_with(", ", |(key, value), f| f(&format_args!("{key}: {value:?}")))
        )
    }
}
