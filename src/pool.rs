use crate::{
    error::{Error, Result},
    node::{IndexRange, NodeKey},
};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    ops::{Add, Mul},
};

/// A value that can be blended with barycentric weights.
///
/// Any type forming a vector space over `f64` qualifies, e.g. `f64`,
/// `nalgebra::Vector3<f64>` or `nalgebra::Complex<f64>`.
pub trait Interpolant: Clone + Add<Output = Self> + Mul<f64, Output = Self> {}

impl<T: Clone + Add<Output = T> + Mul<f64, Output = T>> Interpolant for T {}

/// Storage of samples keyed by lattice node.
pub trait SamplePool {
    type Sample;

    /// Returns the sample stored at `key`, or `None` if there is none.
    fn sample(&self, key: NodeKey) -> Option<&Self::Sample>;

    /// Returns `true` if `key` holds a usable sample.
    fn is_valid(&self, key: NodeKey) -> bool {
        self.sample(key).is_some()
    }
}

impl<P: SamplePool + ?Sized> SamplePool for &P {
    type Sample = P::Sample;

    fn sample(&self, key: NodeKey) -> Option<&Self::Sample> {
        (**self).sample(key)
    }

    fn is_valid(&self, key: NodeKey) -> bool {
        (**self).is_valid(key)
    }
}

/// Samples in an ordered map, for sparse or irregular node sets.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleMap<V> {
    samples: BTreeMap<NodeKey, V>,
}

impl<V> SampleMap<V> {
    pub fn new() -> Self {
        Self {
            samples: BTreeMap::new(),
        }
    }

    /// Stores `value` at `key`, returning the sample it replaced.
    pub fn insert(&mut self, key: NodeKey, value: V) -> Option<V> {
        self.samples.insert(key, value)
    }

    pub fn remove(&mut self, key: NodeKey) -> Option<V> {
        self.samples.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates over samples in key order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &V)> {
        self.samples.iter().map(|(key, value)| (*key, value))
    }

    pub fn into_inner(self) -> BTreeMap<NodeKey, V> {
        self.samples
    }
}

impl<V> Default for SampleMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<BTreeMap<NodeKey, V>> for SampleMap<V> {
    fn from(samples: BTreeMap<NodeKey, V>) -> Self {
        Self { samples }
    }
}

impl<V> FromIterator<(NodeKey, V)> for SampleMap<V> {
    fn from_iter<I: IntoIterator<Item = (NodeKey, V)>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<V> SamplePool for SampleMap<V> {
    type Sample = V;

    fn sample(&self, key: NodeKey) -> Option<&V> {
        self.samples.get(&key)
    }
}

/// Samples in a dense row-major buffer covering an [`IndexRange`].
///
/// Built over the range a `NodeIterator` scans, every node it yields has a slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid<V> {
    range: IndexRange,
    cells: Vec<Option<V>>,
}

impl<V> SampleGrid<V> {
    /// Creates an empty grid with one slot per key in `range`.
    pub fn new(range: IndexRange) -> Self {
        Self {
            range,
            cells: (0..range.len()).map(|_| None).collect(),
        }
    }

    /// Creates a grid from row-major `cells`.
    ///
    /// Returns `None` if the number of cells does not match `range`.
    pub fn from_cells(range: IndexRange, cells: Vec<Option<V>>) -> Option<Self> {
        match cells.len() == range.len() {
            true => Some(Self { range, cells }),
            false => None,
        }
    }

    /// Creates a grid over `range`, filling each slot with `fill(key)` in parallel.
    pub fn par_from_fn<F>(range: IndexRange, fill: F) -> Self
    where
        V: Send,
        F: Fn(NodeKey) -> Option<V> + Sync,
    {
        let cells = (0..range.len())
            .into_par_iter()
            .map(|index| range.key_at(index).and_then(&fill))
            .collect();

        Self { range, cells }
    }

    pub fn range(&self) -> IndexRange {
        self.range
    }

    /// Stores `value` at `key`, returning the sample it replaced.
    ///
    /// Returns an error if `key` is outside the grid range.
    pub fn insert(&mut self, key: NodeKey, value: V) -> Result<Option<V>> {
        let index = self
            .range
            .linear_index(key)
            .ok_or(Error::KeyOutOfRange { key })?;
        Ok(self.cells[index].replace(value))
    }

    pub fn get(&self, key: NodeKey) -> Option<&V> {
        self.cells.get(self.range.linear_index(key)?)?.as_ref()
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_none())
    }

    /// Iterates over populated slots in key order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &V)> {
        self.range
            .keys()
            .zip(self.cells.iter())
            .filter_map(|(key, cell)| Some((key, cell.as_ref()?)))
    }
}

impl<V> SamplePool for SampleGrid<V> {
    type Sample = V;

    fn sample(&self, key: NodeKey) -> Option<&V> {
        self.get(key)
    }
}
