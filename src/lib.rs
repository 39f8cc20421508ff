// #![warn(missing_docs)]

//! Triangular Interpolation over Skewed Lattices
//!
//! Tessellates a 2D domain with the triangles of a skewed lattice, enumerates the
//! lattice nodes inside the domain and interpolates node samples anywhere in it.

#[allow(missing_docs)]
pub mod error;

pub mod config;
pub mod domain;
pub mod frame;
pub mod geo;
pub mod matching;
pub mod node;
pub mod pool;
pub mod split;
pub mod tille;
pub mod triangle;

pub use config::TilleParams;
pub use domain::{Disk, Domain, MaskDomain};
pub use frame::{Area, Coord, Ref, Tile};
pub use geo::{IsoGeo, NodeFrac};
pub use node::{IndexRange, NodeIterator, NodeKey};
pub use pool::{Interpolant, SampleGrid, SampleMap, SamplePool};
pub use tille::IsoTille;
pub use triangle::Triangle;
