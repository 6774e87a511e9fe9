//! Bidirectional name/column-index mapping for one model instance.

use std::collections::BTreeMap;

/// Dense, insertion-ordered mapping between variable names and column indices.
///
/// Indices are stable for the lifetime of the map. A fresh map is built for
/// every model instance, so indices are not comparable across instances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexMap {
    names: Vec<String>,
    lookup: BTreeMap<String, usize>,
}

impl IndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            lookup: BTreeMap::new(),
        }
    }

    /// Insert a name and return its index, or `None` if it is already mapped.
    pub fn insert(&mut self, name: &str) -> Option<usize> {
        if self.lookup.contains_key(name) {
            return None;
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), index);
        Some(index)
    }

    /// Return the index for `name`, inserting it at the end when absent.
    ///
    /// The flag is `true` when the name was inserted by this call.
    pub fn get_or_insert(&mut self, name: &str) -> (usize, bool) {
        match self.lookup.get(name) {
            Some(&index) => (index, false),
            None => {
                let index = self.names.len();
                self.names.push(name.to_string());
                self.lookup.insert(name.to_string(), index);
                (index, true)
            }
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `(index, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (index, name.as_str()))
    }
}
