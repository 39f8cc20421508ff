use crate::{geo::NodeFrac, node::NodeKey, pool::Interpolant};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The lattice triangle covering a point, with the barycentric weights of that point.
///
/// Each cell `(i, j)` is cut along its `(i, j)-(i+1, j+1)` diagonal. With `fm` and `fn`
/// the fractions of the point within the cell, the triangle is
///
/// ```text
/// fm <  fn:  (i, j), (i+1, j+1), (i, j+1)   weights 1 - fn, fm, fn - fm
/// fm >= fn:  (i, j), (i+1, j), (i+1, j+1)   weights 1 - fm, fm - fn, fn
/// ```
///
/// Points on the diagonal get the same weights from either side, so interpolation is
/// continuous across it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    vertices: [NodeKey; 3],
    weights: [f64; 3],
}

impl Triangle {
    /// Selects the triangle covering `node`.
    pub fn covering(node: &NodeFrac) -> Self {
        let (i, j) = (node.mu().floor(), node.nu().floor());
        let (fm, fn_) = (node.mu().residual(), node.nu().residual());
        let origin = NodeKey::new(i, j);
        let diagonal = NodeKey::new(i + 1, j + 1);

        if fm < fn_ {
            Self {
                vertices: [origin, diagonal, NodeKey::new(i, j + 1)],
                weights: [1.0 - fn_, fm, fn_ - fm],
            }
        } else {
            Self {
                vertices: [origin, NodeKey::new(i + 1, j), diagonal],
                weights: [1.0 - fm, fm - fn_, fn_],
            }
        }
    }

    pub fn vertices(&self) -> &[NodeKey; 3] {
        &self.vertices
    }

    /// Barycentric weights matching [`Triangle::vertices`]; they sum to one.
    pub fn weights(&self) -> &[f64; 3] {
        &self.weights
    }

    /// Blends the values `lookup` returns for each vertex.
    pub fn blend_with<V, F>(&self, mut lookup: F) -> V
    where
        V: Interpolant,
        F: FnMut(NodeKey) -> V,
    {
        let [a, b, c] = self.vertices;
        let [wa, wb, wc] = self.weights;
        lookup(a) * wa + lookup(b) * wb + lookup(c) * wc
    }

    /// Like [`Triangle::blend_with`], but yields `None` as soon as a vertex has no value.
    pub fn try_blend<V, F>(&self, mut lookup: F) -> Option<V>
    where
        V: Interpolant,
        F: FnMut(NodeKey) -> Option<V>,
    {
        let [a, b, c] = self.vertices;
        let [wa, wb, wc] = self.weights;
        Some(lookup(a)? * wa + lookup(b)? * wb + lookup(c)? * wc)
    }
}
