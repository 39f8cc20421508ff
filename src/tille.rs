use crate::{
    domain::Domain,
    error::{Error, Result},
    frame::{Coord, Ref},
    geo::IsoGeo,
    node::{IndexRange, NodeIterator, NodeKey},
    pool::{Interpolant, SampleGrid, SampleMap, SamplePool},
    triangle::Triangle,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// A triangular tessellation of a [`Domain`] by the lattice of an [`IsoGeo`].
///
/// `IsoTille` does not own samples. Populate a [`SamplePool`] at the keys
/// [`IsoTille::nodes`] yields, then interpolate anywhere in the domain.
#[derive(Clone, Debug)]
pub struct IsoTille<D> {
    geo: IsoGeo,
    domain: D,
}

impl<D: Domain> IsoTille<D> {
    /// Creates a new `IsoTille`.
    ///
    /// Returns an error if `geo` is the invalid sentinel.
    pub fn new(geo: IsoGeo, domain: D) -> Result<Self> {
        if !geo.is_valid() {
            return Err(Error::InvalidGeometry);
        }

        Ok(Self { geo, domain })
    }

    pub fn geo(&self) -> &IsoGeo {
        &self.geo
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    /// Starts a fresh traversal over every lattice node inside the domain.
    pub fn nodes(&self) -> NodeIterator<'_, D> {
        NodeIterator::new(&self.geo, &self.domain)
    }

    /// Number of lattice nodes inside the domain.
    pub fn size_valid_nodes(&self) -> usize {
        self.nodes().count()
    }

    /// Candidate keys scanned by [`IsoTille::nodes`].
    pub fn index_range(&self) -> IndexRange {
        self.geo.index_range_for_domain(&self.domain)
    }

    /// Location of `key` in the [`Ref`] frame.
    pub fn location(&self, key: NodeKey) -> Coord<Ref> {
        self.geo.ref_from_key(key)
    }

    /// The lattice triangle covering `point` and its barycentric weights.
    pub fn triangle(&self, point: &Coord<Ref>) -> Triangle {
        Triangle::covering(&self.geo.node_from_ref(point))
    }

    /// Interpolates at `point`, blending whatever `lookup` returns for the three
    /// vertices of the covering triangle.
    ///
    /// No check is made that the vertices hold samples; `lookup` decides what a
    /// missing sample contributes.
    pub fn interpolate_with<V, F>(&self, point: &Coord<Ref>, lookup: F) -> V
    where
        V: Interpolant,
        F: FnMut(NodeKey) -> V,
    {
        self.triangle(point).blend_with(lookup)
    }

    /// Interpolates at `point` from the samples in `pool`.
    ///
    /// Returns `None` unless all three vertices of the covering triangle hold a
    /// valid sample.
    pub fn interpolate<P>(&self, point: &Coord<Ref>, pool: &P) -> Option<P::Sample>
    where
        P: SamplePool + ?Sized,
        P::Sample: Interpolant,
    {
        self.triangle(point).try_blend(|key| match pool.is_valid(key) {
            true => pool.sample(key).cloned(),
            false => None,
        })
    }

    /// Evaluates `source` at every node inside the domain in parallel.
    pub fn par_sample_map<V, F>(&self, source: F) -> SampleMap<V>
    where
        V: Send,
        F: Fn(Coord<Ref>) -> V + Sync,
    {
        let geo = self.geo;
        let keys: Vec<NodeKey> = self.nodes().collect();
        debug!(nodes = keys.len(), "sampling lattice nodes");

        keys.into_par_iter()
            .map(|key| (key, source(geo.ref_from_key(key))))
            .collect::<BTreeMap<_, _>>()
            .into()
    }

    /// Like [`IsoTille::par_sample_map`], but into a dense grid over
    /// [`IsoTille::index_range`].
    pub fn par_sample_grid<V, F>(&self, source: F) -> SampleGrid<V>
    where
        D: Sync,
        V: Send,
        F: Fn(Coord<Ref>) -> V + Sync,
    {
        let (geo, domain) = (&self.geo, &self.domain);
        let range = self.index_range();
        debug!(?range, candidates = range.len(), "sampling lattice grid");

        SampleGrid::par_from_fn(range, |key| {
            let point = geo.ref_from_key(key);
            domain.contains(&point).then(|| source(point))
        })
    }
}
