use crate::{
    error::Result,
    frame::{Area, Coord, Ref},
    geo::IsoGeo,
    tille::IsoTille,
};
use nalgebra::Vector2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Plain description of a tessellation over a rectangular domain.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TilleParams {
    pub primary_spacing: f64,
    pub secondary_spacing: f64,
    pub alignment: (f64, f64),
    pub area_min: (f64, f64),
    pub area_max: (f64, f64),
}

impl TilleParams {
    pub fn geo(&self) -> Result<IsoGeo> {
        let (x, y) = self.alignment;
        IsoGeo::try_new(
            self.primary_spacing,
            self.secondary_spacing,
            Vector2::new(x, y),
        )
    }

    pub fn area(&self) -> Result<Area<Ref>> {
        Area::new(Coord::from(self.area_min), Coord::from(self.area_max))
    }
}

impl Default for TilleParams {
    fn default() -> Self {
        Self {
            primary_spacing: 1.0,
            secondary_spacing: 1.0,
            alignment: (1.0, 0.0),
            area_min: (-1.0, -1.0),
            area_max: (1.0, 1.0),
        }
    }
}

impl TryFrom<TilleParams> for IsoTille<Area<Ref>> {
    type Error = crate::error::Error;

    fn try_from(params: TilleParams) -> Result<Self> {
        IsoTille::new(params.geo()?, params.area()?)
    }
}
