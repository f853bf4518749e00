//! Dependency-ordered keyed container
//!
//! A [`DependencyMap`] stores payloads under keys, each entry declaring the
//! keys it depends on. The map keeps a topologically sorted view of its
//! payloads so consumers can walk them with every dependency visited before
//! its dependents. Nodes use it to order component updates.
//!
//! Dependencies on keys that are not in the map are treated as already
//! satisfied. Cycles are rejected at insert time and leave the map untouched.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Index, IndexMut};

use thiserror::Error;

/// Errors raised while maintaining the dependency order
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    /// Inserting the entry would make the dependency graph cyclic
    #[error("Dependency cycle detected at key {key}")]
    Cycle {
        /// Debug rendering of the key where the cycle closed
        key: String,
    },
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    dependencies: Vec<K>,
    payload: V,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Keyed container whose payloads are kept in dependency order.
#[derive(Debug)]
pub struct DependencyMap<K, V> {
    /// Entries in insertion order
    entries: Vec<Entry<K, V>>,

    /// Key to position in `entries`
    positions: HashMap<K, usize>,

    /// Positions in `entries`, dependencies first
    sorted: Vec<usize>,
}

impl<K, V> Default for DependencyMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            sorted: Vec::new(),
        }
    }
}

impl<K, V> DependencyMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `key`.
    ///
    /// Returns the replaced payload when `key` was already present. If the
    /// new dependency list closes a cycle the map is left exactly as it was
    /// and [`DependencyError::Cycle`] is returned.
    pub fn insert(
        &mut self,
        key: K,
        dependencies: Vec<K>,
        payload: V,
    ) -> Result<Option<V>, DependencyError> {
        let existing = self.positions.get(&key).copied();

        let mut keys: Vec<&K> = self.entries.iter().map(|entry| &entry.key).collect();
        let mut edges: Vec<&[K]> = self
            .entries
            .iter()
            .map(|entry| entry.dependencies.as_slice())
            .collect();
        match existing {
            Some(position) => edges[position] = &dependencies,
            None => {
                keys.push(&key);
                edges.push(&dependencies);
            }
        }

        let sorted = match topological_order(&keys, &edges) {
            Ok(sorted) => sorted,
            Err(position) => {
                let key = format!("{:?}", keys[position]);
                log::warn!("Rejected dependency map insert: cycle through {key}");
                return Err(DependencyError::Cycle { key });
            }
        };

        self.sorted = sorted;
        match existing {
            Some(position) => {
                let entry = &mut self.entries[position];
                entry.dependencies = dependencies;
                Ok(Some(std::mem::replace(&mut entry.payload, payload)))
            }
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push(Entry {
                    key,
                    dependencies,
                    payload,
                });
                Ok(None)
            }
        }
    }

    /// Remove the entry for `key`, returning its payload.
    ///
    /// Removing an entry never invalidates the order of the remaining ones.
    pub fn erase(&mut self, key: &K) -> Option<V> {
        let removed = self.positions.remove(key)?;
        let entry = self.entries.remove(removed);

        for position in self.positions.values_mut() {
            if *position > removed {
                *position -= 1;
            }
        }
        self.sorted.retain(|&position| position != removed);
        for position in &mut self.sorted {
            if *position > removed {
                *position -= 1;
            }
        }

        Some(entry.payload)
    }

    /// Payload stored under `key`
    pub fn find(&self, key: &K) -> Option<&V> {
        self.positions
            .get(key)
            .map(|&position| &self.entries[position].payload)
    }

    /// Mutable payload stored under `key`
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let position = *self.positions.get(key)?;
        Some(&mut self.entries[position].payload)
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Declared dependencies of `key`
    pub fn dependencies(&self, key: &K) -> Option<&[K]> {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].dependencies.as_slice())
    }

    /// Sorted position of `key`
    pub fn position(&self, key: &K) -> Option<usize> {
        let position = *self.positions.get(key)?;
        self.sorted.iter().position(|&p| p == position)
    }
}

impl<K, V> DependencyMap<K, V> {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.sorted.clear();
    }

    /// Payload at `index` in dependency order
    pub fn get(&self, index: usize) -> Option<&V> {
        self.sorted
            .get(index)
            .map(|&position| &self.entries[position].payload)
    }

    /// Mutable payload at `index` in dependency order
    pub fn get_mut(&mut self, index: usize) -> Option<&mut V> {
        let position = *self.sorted.get(index)?;
        Some(&mut self.entries[position].payload)
    }

    /// Key at `index` in dependency order
    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.sorted
            .get(index)
            .map(|&position| &self.entries[position].key)
    }

    /// Payloads in dependency order
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.sorted
            .iter()
            .map(move |&position| &self.entries[position].payload)
    }

    /// Keys in dependency order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.sorted
            .iter()
            .map(move |&position| &self.entries[position].key)
    }

    /// Consume the map, yielding `(key, dependencies, payload)` in dependency
    /// order
    pub fn into_entries(self) -> Vec<(K, Vec<K>, V)> {
        let mut slots: Vec<Option<Entry<K, V>>> = self.entries.into_iter().map(Some).collect();
        self.sorted
            .iter()
            .filter_map(|&position| slots[position].take())
            .map(|entry| (entry.key, entry.dependencies, entry.payload))
            .collect()
    }

    /// Visit every key and mutable payload in dependency order
    pub fn for_each_mut(&mut self, mut action: impl FnMut(&K, &mut V)) {
        for &position in &self.sorted {
            let entry = &mut self.entries[position];
            action(&entry.key, &mut entry.payload);
        }
    }
}

impl<K, V> Index<usize> for DependencyMap<K, V> {
    type Output = V;

    fn index(&self, index: usize) -> &V {
        &self.entries[self.sorted[index]].payload
    }
}

impl<K, V> IndexMut<usize> for DependencyMap<K, V> {
    fn index_mut(&mut self, index: usize) -> &mut V {
        let position = self.sorted[index];
        &mut self.entries[position].payload
    }
}

/// Iterative three-colour depth-first sort.
///
/// Roots are taken in insertion order and dependencies in declaration order.
/// Returns positions with dependencies first, or the position at which a
/// grey (in-progress) entry was revisited.
fn topological_order<K: Eq + Hash>(keys: &[&K], edges: &[&[K]]) -> Result<Vec<usize>, usize> {
    let lookup: HashMap<&K, usize> = keys
        .iter()
        .enumerate()
        .map(|(position, key)| (*key, position))
        .collect();

    let mut marks = vec![Mark::White; keys.len()];
    let mut order = Vec::with_capacity(keys.len());
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..keys.len() {
        if marks[root] != Mark::White {
            continue;
        }
        marks[root] = Mark::Gray;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let current = frame.0;
            if let Some(dependency) = edges[current].get(frame.1) {
                frame.1 += 1;
                let Some(&next) = lookup.get(dependency) else {
                    continue;
                };
                match marks[next] {
                    Mark::White => {
                        marks[next] = Mark::Gray;
                        stack.push((next, 0));
                    }
                    Mark::Gray => return Err(next),
                    Mark::Black => {}
                }
            } else {
                marks[current] = Mark::Black;
                order.push(current);
                stack.pop();
            }
        }
    }

    Ok(order)
}
