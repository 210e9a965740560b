use std::hash::Hash;

use im::{HashMap, HashSet};

use crate::{SeqError, Sequence};

/// Persistent map: every update returns a new, structure-shared value.
#[derive(Clone)]
pub struct SeqMap<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Hash + Eq + Clone, V: Clone> SeqMap<K, V> {
    pub fn new() -> Self {
        SeqMap {
            entries: HashMap::new(),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        SeqMap {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn insert(&self, key: K, value: V) -> Self {
        let mut out = self.entries.clone();
        out.insert(key, value);
        SeqMap { entries: out }
    }

    pub fn remove(&self, key: &K) -> Self {
        let mut out = self.entries.clone();
        out.remove(key);
        SeqMap { entries: out }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn union(&self, other: &Self) -> Self {
        SeqMap {
            entries: self.entries.clone().union(other.entries.clone()),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for SeqMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone + 'static, V: Clone + 'static> SeqMap<K, V> {
    /// Materializes a sequence of pairs; later pairs win on key collisions.
    pub fn from_sequence(seq: &Sequence<(K, V)>) -> Result<Self, SeqError> {
        let mut entries = HashMap::new();
        for item in seq.iter() {
            let (key, value) = item?;
            entries.insert(key, value);
        }
        Ok(SeqMap { entries })
    }

    pub fn to_sequence(&self) -> Sequence<(K, V)> {
        Sequence::of(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        )
    }
}

#[derive(Clone)]
pub struct SeqSet<T> {
    items: HashSet<T>,
}

impl<T: Hash + Eq + Clone> SeqSet<T> {
    pub fn new() -> Self {
        SeqSet {
            items: HashSet::new(),
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        SeqSet {
            items: items.into_iter().collect(),
        }
    }

    pub fn insert(&self, item: T) -> Self {
        let mut out = self.items.clone();
        out.insert(item);
        SeqSet { items: out }
    }

    pub fn remove(&self, item: &T) -> Self {
        let mut out = self.items.clone();
        out.remove(item);
        SeqSet { items: out }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn union(&self, other: &Self) -> Self {
        SeqSet {
            items: self.items.clone().union(other.items.clone()),
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        SeqSet {
            items: self.items.clone().intersection(other.items.clone()),
        }
    }

    /// Elements of `self` that are not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        SeqSet {
            items: self
                .items
                .clone()
                .relative_complement(other.items.clone()),
        }
    }
}

impl<T: Hash + Eq + Clone> Default for SeqSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone + 'static> SeqSet<T> {
    pub fn from_sequence(seq: &Sequence<T>) -> Result<Self, SeqError> {
        let mut items = HashSet::new();
        for item in seq.iter() {
            items.insert(item?);
        }
        Ok(SeqSet { items })
    }

    pub fn to_sequence(&self) -> Sequence<T> {
        Sequence::of(self.items.iter().cloned())
    }
}
