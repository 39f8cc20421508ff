use crate::{domain::Domain, geo::IsoGeo};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, iter::FusedIterator, ops::RangeInclusive};
use tracing::debug;

/// Integer indices `(i, j)` of a lattice node along the `mu` and `nu` axes.
///
/// Keys order row-major: by `i` first, then by `j`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeKey {
    i: i64,
    j: i64,
}

impl NodeKey {
    pub fn new(i: i64, j: i64) -> Self {
        Self { i, j }
    }

    pub fn i(&self) -> i64 {
        self.i
    }

    pub fn j(&self) -> i64 {
        self.j
    }
}

impl From<(i64, i64)> for NodeKey {
    fn from(tuple: (i64, i64)) -> Self {
        let (i, j) = tuple;
        Self { i, j }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// An inclusive rectangle of node keys.
///
/// Keys inside the range are laid out row-major, which gives every key a linear index
/// `(i - i_min) * num_j + (j - j_min)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexRange {
    i_min: i64,
    i_max: i64,
    j_min: i64,
    j_max: i64,
}

impl IndexRange {
    pub fn new(i: RangeInclusive<i64>, j: RangeInclusive<i64>) -> Self {
        Self {
            i_min: *i.start(),
            i_max: *i.end(),
            j_min: *j.start(),
            j_max: *j.end(),
        }
    }

    /// A range holding no keys.
    pub fn empty() -> Self {
        Self::new(0..=-1, 0..=-1)
    }

    pub fn i(&self) -> RangeInclusive<i64> {
        self.i_min..=self.i_max
    }

    pub fn j(&self) -> RangeInclusive<i64> {
        self.j_min..=self.j_max
    }

    pub fn is_empty(&self) -> bool {
        self.i_min > self.i_max || self.j_min > self.j_max
    }

    pub fn num_i(&self) -> usize {
        match self.is_empty() {
            true => 0,
            false => (self.i_max as i128 - self.i_min as i128 + 1) as usize,
        }
    }

    pub fn num_j(&self) -> usize {
        match self.is_empty() {
            true => 0,
            false => (self.j_max as i128 - self.j_min as i128 + 1) as usize,
        }
    }

    /// Number of keys in the range.
    pub fn len(&self) -> usize {
        self.num_i().saturating_mul(self.num_j())
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.i().contains(&key.i) && self.j().contains(&key.j)
    }

    /// Returns the row-major position of `key`, or `None` if `key` is outside the range.
    pub fn linear_index(&self, key: NodeKey) -> Option<usize> {
        if !self.contains(key) {
            return None;
        }

        let di = (key.i as i128 - self.i_min as i128) as usize;
        let dj = (key.j as i128 - self.j_min as i128) as usize;
        Some(di * self.num_j() + dj)
    }

    /// Inverse of [`IndexRange::linear_index`].
    pub fn key_at(&self, index: usize) -> Option<NodeKey> {
        if index >= self.len() {
            return None;
        }

        let num_j = self.num_j();
        Some(NodeKey::new(
            self.i_min + (index / num_j) as i64,
            self.j_min + (index % num_j) as i64,
        ))
    }

    /// The first key in row-major order.
    pub fn first(&self) -> Option<NodeKey> {
        match self.is_empty() {
            true => None,
            false => Some(NodeKey::new(self.i_min, self.j_min)),
        }
    }

    /// The key following `key` in row-major order, or `None` past the last key.
    pub fn successor(&self, key: NodeKey) -> Option<NodeKey> {
        if key.j < self.j_max {
            Some(NodeKey::new(key.i, key.j + 1))
        } else if key.i < self.i_max {
            Some(NodeKey::new(key.i + 1, self.j_min))
        } else {
            None
        }
    }

    /// All keys in row-major order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> {
        let js = self.j();
        self.i()
            .flat_map(move |i| js.clone().map(move |j| NodeKey::new(i, j)))
    }
}

/// Iterates over the lattice nodes that lie inside a [`Domain`].
///
/// Candidates come from [`IsoGeo::index_range_for_domain`] and are visited row-major,
/// the `nu` index `j` varying fastest. Candidates whose location falls outside the domain
/// are skipped, so every yielded key satisfies
/// `domain.contains(&geo.ref_from_key(key))`.
///
/// The iterator is single-pass; build a new one to traverse again. Skipping is lazy, so
/// a domain that fills little of its bounding box costs one containment test per
/// candidate rather than per node.
#[derive(Clone, Debug)]
pub struct NodeIterator<'a, D: ?Sized> {
    geo: &'a IsoGeo,
    domain: &'a D,
    range: IndexRange,
    current: Option<NodeKey>,
}

impl<'a, D: Domain + ?Sized> NodeIterator<'a, D> {
    pub fn new(geo: &'a IsoGeo, domain: &'a D) -> Self {
        debug_assert!(geo.is_valid());

        let range = geo.index_range_for_domain(domain);
        debug!(?range, candidates = range.len(), "scanning lattice nodes");

        let mut iter = Self {
            geo,
            domain,
            range,
            current: None,
        };
        iter.current = iter.seek(range.first());
        iter
    }

    /// The candidate range being scanned.
    pub fn range(&self) -> IndexRange {
        self.range
    }

    /// Returns `false` once the iterator is exhausted.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Walks forward from `candidate` to the first key inside the domain.
    fn seek(&self, mut candidate: Option<NodeKey>) -> Option<NodeKey> {
        while let Some(key) = candidate {
            if self.domain.contains(&self.geo.ref_from_key(key)) {
                return Some(key);
            }
            candidate = self.range.successor(key);
        }

        None
    }
}

impl<D: Domain + ?Sized> Iterator for NodeIterator<'_, D> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.current?;
        self.current = self.seek(self.range.successor(key));
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.current.and_then(|key| self.range.linear_index(key)) {
            Some(index) => (1, Some(self.range.len() - index)),
            None => (0, Some(0)),
        }
    }
}

impl<D: Domain + ?Sized> FusedIterator for NodeIterator<'_, D> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Disk, MaskDomain},
        frame::{Area, Coord, Ref},
    };
    use nalgebra::Vector2;
    use rstest::rstest;

    fn square() -> IsoGeo {
        IsoGeo::try_new(1.0, 1.0, Vector2::new(1.0, 0.0)).unwrap()
    }

    fn skewed() -> IsoGeo {
        IsoGeo::try_new(0.25, 0.6, Vector2::new(-1.0, 3.0)).unwrap()
    }

    fn area(lo: f64, hi: f64) -> Area<Ref> {
        Area::new(Coord::new(lo, lo), Coord::new(hi, hi)).unwrap()
    }

    #[test]
    fn traversal_order() {
        let geo = square();
        let domain = area(-1.5, 1.5);
        let listing: Vec<String> = NodeIterator::new(&geo, &domain)
            .map(|key| key.to_string())
            .collect();

        insta::assert_snapshot!(listing.join("\n"), @r"
        (-1, 0)
        (0, -1)
        (0, 0)
        (0, 1)
        (1, 0)
        ");
    }

    #[test]
    fn candidate_range() {
        let geo = square();
        let domain = area(-1.5, 1.5);
        let iter = NodeIterator::new(&geo, &domain);
        assert_eq!(iter.range(), IndexRange::new(-2..=2, -2..=2));
    }

    #[rstest]
    #[case(square(), area(-3.2, 2.7))]
    #[case(skewed(), area(-1.0, 2.0))]
    #[case(skewed(), area(0.1, 0.2))]
    fn yields_only_contained_nodes(#[case] geo: IsoGeo, #[case] domain: Area<Ref>) {
        for key in NodeIterator::new(&geo, &domain) {
            assert!(domain.contains(geo.ref_from_key(key)));
        }
    }

    #[rstest]
    #[case(square(), area(-3.2, 2.7))]
    #[case(skewed(), area(-1.0, 2.0))]
    fn yields_every_contained_node(#[case] geo: IsoGeo, #[case] domain: Area<Ref>) {
        let expected: Vec<NodeKey> = IndexRange::new(-60..=60, -60..=60)
            .keys()
            .filter(|key| domain.contains(geo.ref_from_key(*key)))
            .collect();
        let found: Vec<NodeKey> = NodeIterator::new(&geo, &domain).collect();

        assert!(!expected.is_empty());
        assert_eq!(found, expected);
    }

    #[test]
    fn traversal_is_repeatable() {
        let geo = skewed();
        let domain = Disk::new(Coord::new(0.3, -0.2), 1.7).unwrap();
        let first: Vec<NodeKey> = NodeIterator::new(&geo, &domain).collect();
        let second: Vec<NodeKey> = NodeIterator::new(&geo, &domain).collect();

        assert_eq!(first, second);
        assert!(first.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn empty_mask() {
        let geo = square();
        let domain = MaskDomain::new(area(-2.0, 2.0), |_: &Coord<Ref>| false);
        let mut iter = NodeIterator::new(&geo, &domain);

        assert!(!iter.is_active());
        assert_eq!(iter.next(), None);
        assert_eq!(iter.size_hint(), (0, Some(0)));
    }

    #[test]
    fn size_hint_bounds_remaining() {
        let geo = skewed();
        let domain = area(-1.0, 1.0);
        let mut iter = NodeIterator::new(&geo, &domain);
        let total = NodeIterator::new(&geo, &domain).count();

        for taken in 0..total {
            let (lower, upper) = iter.size_hint();
            assert!(lower <= total - taken);
            assert!(upper.unwrap() >= total - taken);
            iter.next();
        }
        assert_eq!(iter.next(), None);
    }

    #[rstest]
    #[case(IndexRange::new(-2..=1, 3..=5))]
    #[case(IndexRange::new(0..=0, 0..=0))]
    fn linear_index_roundtrip(#[case] range: IndexRange) {
        let keys: Vec<NodeKey> = range.keys().collect();
        assert_eq!(keys.len(), range.len());

        for (index, key) in keys.into_iter().enumerate() {
            assert_eq!(range.linear_index(key), Some(index));
            assert_eq!(range.key_at(index), Some(key));
        }
        assert_eq!(range.key_at(range.len()), None);
    }

    #[test]
    fn successor_walks_row_major() {
        let range = IndexRange::new(-2..=1, 3..=5);
        let walked: Vec<NodeKey> =
            std::iter::successors(range.first(), |key| range.successor(*key)).collect();
        assert_eq!(walked, range.keys().collect::<Vec<_>>());
    }

    #[test]
    fn empty_range() {
        let range = IndexRange::empty();
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.first(), None);
        assert_eq!(range.linear_index(NodeKey::new(0, 0)), None);
    }
}
