use crate::{
    domain::Domain,
    error::{Error, Result},
    frame::{Area, Coord, Ref, Tile},
    node::{IndexRange, NodeKey},
    split::{QuantumFrac, Splitter},
};
use nalgebra::{Matrix2, Vector2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Smallest admissible `1 - cos²` between the two skew directions.
const MIN_SINE_SQUARED: f64 = 1e-12;

/// A point in the node frame: an index plus a fraction of a cell along each skew axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeFrac {
    mu: QuantumFrac,
    nu: QuantumFrac,
}

impl NodeFrac {
    pub fn new(mu: QuantumFrac, nu: QuantumFrac) -> Self {
        Self { mu, nu }
    }

    pub fn mu(&self) -> &QuantumFrac {
        &self.mu
    }

    pub fn nu(&self) -> &QuantumFrac {
        &self.nu
    }
}

/// Geometry of a skewed triangular lattice.
///
/// The lattice is spanned by two unit skew directions
///
/// ```text
/// u = normalize(da * adir - db * bdir)
/// v = normalize(da * adir + db * bdir)
/// ```
///
/// where `adir` is the alignment direction and `bdir` is `adir` rotated by +90 degrees.
/// Lattice nodes sit at `i * step * u + j * step * v` with `step = hypot(da, db)`. Each
/// cell is split along its `(i, j)-(i+1, j+1)` diagonal, which has length `2 * da` along
/// `adir`, into two isosceles triangles of height `db`. `db = sqrt(3) * da` gives
/// equilateral triangles.
///
/// Points move between three frames:
/// - [`Ref`]: the orthogonal frame of the working domain.
/// - [`Tile`]: the skewed `(mu, nu)` frame, `p = mu * u + nu * v`.
/// - node: [`NodeFrac`], the tile frame quantized into lattice indices and fractions.
///
/// A degenerate construction yields an invalid instance (see [`IsoGeo::is_valid`]) whose
/// components are all NaN. No transform of an invalid instance may be trusted.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IsoGeo {
    da: f64,
    db: f64,
    u: Vector2<f64>,
    v: Vector2<f64>,
    bar_u: Vector2<f64>,
    bar_v: Vector2<f64>,
    mu: Splitter,
    nu: Splitter,
}

impl IsoGeo {
    /// Creates a new `IsoGeo`, falling back to the invalid sentinel if the inputs
    /// describe a degenerate lattice.
    pub fn new(da: f64, db: f64, avec: Vector2<f64>) -> Self {
        Self::try_new(da, db, avec).unwrap_or_else(|err| {
            warn!(%err, "degenerate lattice geometry");
            Self::invalid()
        })
    }

    /// Creates a new `IsoGeo` from primary spacing `da`, secondary spacing `db` and
    /// alignment direction `avec`.
    ///
    /// Returns an error if a spacing is negative or not finite, both spacings are zero,
    /// `avec` is zero or not finite, or the resulting skew directions are parallel.
    pub fn try_new(da: f64, db: f64, avec: Vector2<f64>) -> Result<Self> {
        if !(da.is_finite() && db.is_finite() && da >= 0.0 && db >= 0.0) || da + db == 0.0 {
            return Err(Error::InvalidSpacing { da, db });
        }

        let norm = avec.norm();
        if !(norm.is_finite() && norm > 0.0) {
            return Err(Error::InvalidDirection {
                x: avec.x,
                y: avec.y,
            });
        }

        let adir = avec / norm;
        let bdir = Vector2::new(-adir.y, adir.x);
        let step = da.hypot(db);
        let u = (adir * da - bdir * db) / step;
        let v = (adir * da + bdir * db) / step;

        let cosine = u.dot(&v);
        if 1.0 - cosine * cosine < MIN_SINE_SQUARED {
            return Err(Error::DegenerateGeometry { cosine });
        }

        // The dual basis is the Gram inverse applied to the skew directions.
        let gram = Matrix2::new(u.dot(&u), cosine, cosine, v.dot(&v));
        let inv = gram
            .try_inverse()
            .ok_or(Error::DegenerateGeometry { cosine })?;
        let bar_u = u * inv[(0, 0)] + v * inv[(0, 1)];
        let bar_v = u * inv[(1, 0)] + v * inv[(1, 1)];

        debug!(da, db, step, cosine, "constructed lattice geometry");

        Ok(Self {
            da,
            db,
            u,
            v,
            bar_u,
            bar_v,
            mu: Splitter::new(step)?,
            nu: Splitter::new(step)?,
        })
    }

    /// The invalid sentinel.
    pub fn invalid() -> Self {
        let nan = Vector2::new(f64::NAN, f64::NAN);
        Self {
            da: f64::NAN,
            db: f64::NAN,
            u: nan,
            v: nan,
            bar_u: nan,
            bar_v: nan,
            mu: Splitter::invalid(),
            nu: Splitter::invalid(),
        }
    }

    /// Returns `true` if this geometry describes a usable lattice.
    pub fn is_valid(&self) -> bool {
        self.mu.delta().is_finite()
            && self.nu.delta().is_finite()
            && self.bar_u.iter().chain(self.bar_v.iter()).all(|c| c.is_finite())
    }

    pub fn primary_spacing(&self) -> f64 {
        self.da
    }

    pub fn secondary_spacing(&self) -> f64 {
        self.db
    }

    /// Unit direction of the `mu` axis.
    pub fn u(&self) -> &Vector2<f64> {
        &self.u
    }

    /// Unit direction of the `nu` axis.
    pub fn v(&self) -> &Vector2<f64> {
        &self.v
    }

    /// Dual of `u`: `bar_u . u == 1` and `bar_u . v == 0`.
    pub fn bar_u(&self) -> &Vector2<f64> {
        &self.bar_u
    }

    /// Dual of `v`: `bar_v . v == 1` and `bar_v . u == 0`.
    pub fn bar_v(&self) -> &Vector2<f64> {
        &self.bar_v
    }

    pub fn mu_splitter(&self) -> &Splitter {
        &self.mu
    }

    pub fn nu_splitter(&self) -> &Splitter {
        &self.nu
    }

    /// Characteristic lattice spacing, `hypot(delta_mu, delta_nu)`.
    ///
    /// Useful as a neighbour search radius.
    pub fn delta(&self) -> f64 {
        self.mu.delta().hypot(self.nu.delta())
    }

    pub fn tile_from_ref(&self, point: &Coord<Ref>) -> Coord<Tile> {
        debug_assert!(self.is_valid());
        let p = point.as_vec2();
        Coord::new(p.dot(&self.bar_u), p.dot(&self.bar_v))
    }

    pub fn ref_from_tile(&self, point: &Coord<Tile>) -> Coord<Ref> {
        debug_assert!(self.is_valid());
        Coord::from_vec2(self.u * point.mu() + self.v * point.nu())
    }

    pub fn node_from_tile(&self, point: &Coord<Tile>) -> NodeFrac {
        debug_assert!(self.is_valid());
        NodeFrac::new(self.mu.split(point.mu()), self.nu.split(point.nu()))
    }

    pub fn tile_from_node(&self, node: &NodeFrac) -> Coord<Tile> {
        Coord::new(node.mu.value(), node.nu.value())
    }

    pub fn node_from_ref(&self, point: &Coord<Ref>) -> NodeFrac {
        self.node_from_tile(&self.tile_from_ref(point))
    }

    pub fn ref_from_node(&self, node: &NodeFrac) -> Coord<Ref> {
        self.ref_from_tile(&self.tile_from_node(node))
    }

    /// Drops the fractions of `node`, leaving the key of the node at the cell origin.
    pub fn indices_from_frac_pair(&self, node: &NodeFrac) -> NodeKey {
        NodeKey::new(node.mu.floor(), node.nu.floor())
    }

    /// Lifts `key` into the node frame with zero fractions.
    pub fn frac_pair_from_indices(&self, key: NodeKey) -> NodeFrac {
        NodeFrac::new(
            QuantumFrac::at_index(key.i(), self.mu.delta()),
            QuantumFrac::at_index(key.j(), self.nu.delta()),
        )
    }

    /// Location of the lattice node `key` in the [`Ref`] frame.
    pub fn ref_from_key(&self, key: NodeKey) -> Coord<Ref> {
        self.ref_from_node(&self.frac_pair_from_indices(key))
    }

    /// Bounding box in the tile frame of the bounding box of `domain`.
    ///
    /// The four corners of the domain bounds are mapped into the tile frame. Since the
    /// skew maps a rectangle to a parallelogram, the result over-approximates the true
    /// footprint; every node inside the domain falls inside it, but not every node
    /// inside it falls inside the domain.
    ///
    /// Returns `None` if the corners do not map to finite tile coordinates.
    pub fn tile_area_for_domain<D: Domain + ?Sized>(&self, domain: &D) -> Option<Area<Tile>> {
        Area::bounding(
            domain
                .area_bounds()
                .corners()
                .map(|corner| self.tile_from_ref(&corner)),
        )
    }

    /// Inclusive range of candidate node keys for `domain`.
    ///
    /// The upper index on each axis is advanced by one so cells cut by the upper
    /// boundary are covered.
    pub fn index_range_for_domain<D: Domain + ?Sized>(&self, domain: &D) -> IndexRange {
        let Some(area) = self.tile_area_for_domain(domain) else {
            return IndexRange::empty();
        };

        let lo = self.indices_from_frac_pair(&self.node_from_tile(&area.min()));
        let hi = self.indices_from_frac_pair(&self.node_from_tile(&area.max()));
        IndexRange::new(
            lo.i()..=hi.i().saturating_add(1),
            lo.j()..=hi.j().saturating_add(1),
        )
    }
}

impl Default for IsoGeo {
    fn default() -> Self {
        Self::invalid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quickcheck::{TestResult, quickcheck};
    use rstest::rstest;

    fn square() -> IsoGeo {
        IsoGeo::try_new(1.0, 1.0, Vector2::new(1.0, 0.0)).unwrap()
    }

    fn equilateral() -> IsoGeo {
        IsoGeo::try_new(0.3, 0.3 * 3f64.sqrt(), Vector2::new(2.0, 1.0)).unwrap()
    }

    #[rstest]
    #[case(0.0, 1.0, Vector2::new(1.0, 0.0))]
    #[case(1.0, 0.0, Vector2::new(1.0, 0.0))]
    #[case(1.0, 1.0, Vector2::new(0.0, 0.0))]
    #[case(1.0, 1.0, Vector2::new(f64::NAN, 1.0))]
    #[case(-1.0, 1.0, Vector2::new(1.0, 0.0))]
    #[case(0.0, 0.0, Vector2::new(1.0, 0.0))]
    #[case(1e9, 1e-9, Vector2::new(1.0, 0.0))]
    fn degenerate_geometry(#[case] da: f64, #[case] db: f64, #[case] avec: Vector2<f64>) {
        assert!(IsoGeo::try_new(da, db, avec).is_err());

        let geo = IsoGeo::new(da, db, avec);
        assert!(!geo.is_valid());
        assert!(geo.delta().is_nan());
    }

    #[test]
    fn default_is_invalid() {
        assert!(!IsoGeo::default().is_valid());
    }

    #[test]
    fn parallel_reports_cosine() {
        assert!(matches!(
            IsoGeo::try_new(0.0, 2.0, Vector2::new(0.0, 3.0)),
            Err(Error::DegenerateGeometry { cosine }) if (cosine + 1.0).abs() < 1e-12
        ));
    }

    #[rstest]
    #[case(square())]
    #[case(equilateral())]
    fn dual_basis(#[case] geo: IsoGeo) {
        assert_relative_eq!(geo.bar_u().dot(geo.u()), 1.0, epsilon = 1e-12);
        assert_relative_eq!(geo.bar_u().dot(geo.v()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(geo.bar_v().dot(geo.v()), 1.0, epsilon = 1e-12);
        assert_relative_eq!(geo.bar_v().dot(geo.u()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn square_lattice_nodes() {
        let geo = square();
        assert_relative_eq!(geo.delta(), 2.0, epsilon = 1e-12);

        let node = geo.ref_from_key(NodeKey::new(2, 1));
        assert_relative_eq!(node.x(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(node.y(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn equilateral_lattice_nodes() {
        let geo = equilateral();
        let origin = geo.ref_from_key(NodeKey::new(0, 0));
        let mu = geo.ref_from_key(NodeKey::new(1, 0));
        let nu = geo.ref_from_key(NodeKey::new(0, 1));
        let diagonal = geo.ref_from_key(NodeKey::new(1, 1));
        let side = |a: &Coord<Ref>, b: &Coord<Ref>| (a.as_vec2() - b.as_vec2()).norm();

        // Both triangles of the cell have three sides of length `2 * da`.
        for length in [
            side(&origin, &mu),
            side(&mu, &diagonal),
            side(&origin, &diagonal),
            side(&origin, &nu),
            side(&nu, &diagonal),
        ] {
            assert_relative_eq!(length, 0.6, epsilon = 1e-12);
        }
    }

    #[test]
    fn key_frac_roundtrip() {
        let geo = equilateral();
        let key = NodeKey::new(-4, 7);
        let frac = geo.frac_pair_from_indices(key);
        assert_eq!(frac.mu().residual(), 0.0);
        assert_eq!(geo.indices_from_frac_pair(&frac), key);
    }

    #[test]
    fn tile_area_is_superset() {
        let geo = equilateral();
        let area: Area<Ref> = Area::new(Coord::new(-1.3, 0.2), Coord::new(2.1, 1.7)).unwrap();
        let tile_area = geo.tile_area_for_domain(&area).unwrap();
        let range = geo.index_range_for_domain(&area);

        for i in -40..=40 {
            for j in -40..=40 {
                let key = NodeKey::new(i, j);
                let point = geo.ref_from_key(key);
                if area.contains(point) {
                    assert!(tile_area.contains(geo.tile_from_ref(&point)));
                    assert!(range.contains(key), "{key} missing from {range:?}");
                }
            }
        }
    }

    quickcheck! {
        fn ref_tile_roundtrip(x_seed: i16, y_seed: i16, angle_seed: u8) -> TestResult {
            let angle = angle_seed as f64 / u8::MAX as f64 * std::f64::consts::TAU;
            let geo = IsoGeo::new(0.7, 0.4, Vector2::new(angle.cos(), angle.sin()));
            if !geo.is_valid() {
                return TestResult::failed();
            }

            let point = Coord::<Ref>::new(x_seed as f64 / 100., y_seed as f64 / 100.);
            let result = geo.ref_from_tile(&geo.tile_from_ref(&point));

            TestResult::from_bool((result.as_vec2() - point.as_vec2()).norm() <= 1e-9)
        }

        fn tile_node_roundtrip(mu_seed: i16, nu_seed: i16) -> bool {
            let geo = equilateral();
            let point = Coord::<Tile>::new(mu_seed as f64 / 77., nu_seed as f64 / 31.);
            let node = geo.node_from_tile(&point);
            let result = geo.tile_from_node(&node);

            (0.0..1.0).contains(&node.mu().residual())
                && (0.0..1.0).contains(&node.nu().residual())
                && (result.as_vec2() - point.as_vec2()).norm() <= 1e-9
        }

        fn ref_node_roundtrip(x_seed: i16, y_seed: i16) -> bool {
            let geo = equilateral();
            let point = Coord::<Ref>::new(x_seed as f64 / 300., y_seed as f64 / 300.);
            let result = geo.ref_from_node(&geo.node_from_ref(&point));

            (result.as_vec2() - point.as_vec2()).norm() <= 1e-9
        }
    }
}
