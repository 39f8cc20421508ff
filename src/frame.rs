use crate::error::{Error, Result};
use nalgebra::Vector2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// The orthogonal `(x, y)` frame of the working domain.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ref;

/// The skewed `(mu, nu)` frame aligned with the lattice directions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tile;

/// A point expressed in `Frame`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coord<Frame> {
    inner: Vector2<f64>,
    _phan: PhantomData<Frame>,
}

impl<Frame> Coord<Frame> {
    pub fn new(a: f64, b: f64) -> Self {
        Self::from_vec2(Vector2::new(a, b))
    }

    pub fn from_vec2(inner: Vector2<f64>) -> Self {
        Self {
            inner,
            _phan: PhantomData,
        }
    }

    pub fn as_vec2(&self) -> &Vector2<f64> {
        &self.inner
    }

    pub fn into_inner(self) -> Vector2<f64> {
        self.inner
    }

    pub fn is_finite(&self) -> bool {
        self.inner.x.is_finite() && self.inner.y.is_finite()
    }
}

impl Coord<Ref> {
    pub fn x(&self) -> f64 {
        self.inner.x
    }

    pub fn y(&self) -> f64 {
        self.inner.y
    }
}

impl Coord<Tile> {
    pub fn mu(&self) -> f64 {
        self.inner.x
    }

    pub fn nu(&self) -> f64 {
        self.inner.y
    }
}

impl<Frame> AsRef<Coord<Frame>> for Coord<Frame> {
    fn as_ref(&self) -> &Coord<Frame> {
        self
    }
}

impl<Frame> From<(f64, f64)> for Coord<Frame> {
    fn from(tuple: (f64, f64)) -> Self {
        let (a, b) = tuple;
        Self::new(a, b)
    }
}

/// An axis-aligned box in `Frame`, closed on both ends.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Area<Frame> {
    min: Coord<Frame>,
    max: Coord<Frame>,
}

impl<Frame: Copy> Area<Frame> {
    /// Creates a new `Area` spanning `min` to `max`.
    ///
    /// Returns an error if a bound is not finite or `min` exceeds `max` on either axis.
    pub fn new(min: Coord<Frame>, max: Coord<Frame>) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(Error::InvalidArea);
        }

        if min.inner.x > max.inner.x || min.inner.y > max.inner.y {
            return Err(Error::InvalidArea);
        }

        Ok(Self { min, max })
    }

    /// Returns the smallest `Area` holding every point in `points`, or `None`
    /// if `points` is empty or holds a non-finite point.
    pub fn bounding<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coord<Frame>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first.inner, first.inner), |(min, max), point| {
            (min.inf(&point.inner), max.sup(&point.inner))
        });

        Self::new(Coord::from_vec2(min), Coord::from_vec2(max)).ok()
    }

    pub fn min(&self) -> Coord<Frame> {
        self.min
    }

    pub fn max(&self) -> Coord<Frame> {
        self.max
    }

    /// Returns the four corners counter-clockwise from `min`.
    pub fn corners(&self) -> [Coord<Frame>; 4] {
        let (lo, hi) = (self.min.inner, self.max.inner);
        [
            Coord::new(lo.x, lo.y),
            Coord::new(hi.x, lo.y),
            Coord::new(hi.x, hi.y),
            Coord::new(lo.x, hi.y),
        ]
    }

    pub fn contains(&self, point: impl AsRef<Coord<Frame>>) -> bool {
        let p = point.as_ref().inner;
        (self.min.inner.x..=self.max.inner.x).contains(&p.x)
            && (self.min.inner.y..=self.max.inner.y).contains(&p.y)
    }
}
