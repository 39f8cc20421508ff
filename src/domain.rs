use crate::frame::{Area, Coord, Ref};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The working region of a tessellation.
///
/// A `Domain` is a containment test over points in the [`Ref`] frame together with
/// a bounding box. The bounding box must hold every point for which `contains`
/// returns `true`.
pub trait Domain {
    fn area_bounds(&self) -> Area<Ref>;
    fn contains(&self, point: &Coord<Ref>) -> bool;
}

impl Domain for Area<Ref> {
    fn area_bounds(&self) -> Area<Ref> {
        *self
    }

    fn contains(&self, point: &Coord<Ref>) -> bool {
        Area::contains(self, point)
    }
}

impl<D: Domain + ?Sized> Domain for &D {
    fn area_bounds(&self) -> Area<Ref> {
        (**self).area_bounds()
    }

    fn contains(&self, point: &Coord<Ref>) -> bool {
        (**self).contains(point)
    }
}

impl<D: Domain + ?Sized> Domain for Box<D> {
    fn area_bounds(&self) -> Area<Ref> {
        (**self).area_bounds()
    }

    fn contains(&self, point: &Coord<Ref>) -> bool {
        (**self).contains(point)
    }
}

/// A rectangle further restricted by an arbitrary predicate, e.g. a lookup into a
/// validity mask.
#[derive(Clone, Copy, Debug)]
pub struct MaskDomain<P> {
    area: Area<Ref>,
    predicate: P,
}

impl<P> MaskDomain<P>
where
    P: Fn(&Coord<Ref>) -> bool,
{
    pub fn new(area: Area<Ref>, predicate: P) -> Self {
        Self { area, predicate }
    }
}

impl<P> Domain for MaskDomain<P>
where
    P: Fn(&Coord<Ref>) -> bool,
{
    fn area_bounds(&self) -> Area<Ref> {
        self.area
    }

    fn contains(&self, point: &Coord<Ref>) -> bool {
        self.area.contains(point) && (self.predicate)(point)
    }
}

/// A closed disk.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Disk {
    center: Coord<Ref>,
    radius: f64,
    bounds: Area<Ref>,
}

impl Disk {
    /// Creates a new `Disk`.
    ///
    /// Returns `None` if `radius` is negative or anything is not finite.
    pub fn new(center: Coord<Ref>, radius: f64) -> Option<Self> {
        if !(radius.is_finite() && radius >= 0.0) {
            return None;
        }

        let (x, y) = (center.x(), center.y());
        let bounds = Area::new(
            Coord::new(x - radius, y - radius),
            Coord::new(x + radius, y + radius),
        )
        .ok()?;

        Some(Self {
            center,
            radius,
            bounds,
        })
    }

    pub fn center(&self) -> Coord<Ref> {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Domain for Disk {
    fn area_bounds(&self) -> Area<Ref> {
        self.bounds
    }

    fn contains(&self, point: &Coord<Ref>) -> bool {
        (point.as_vec2() - self.center.as_vec2()).norm() <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn unit() -> Area<Ref> {
        Area::new(Coord::new(-1.0, -1.0), Coord::new(1.0, 1.0)).unwrap()
    }

    #[rstest]
    #[case(0.5, 0.5, true)]
    #[case(-0.5, 0.5, false)]
    #[case(1.5, 0.5, false)]
    fn mask_restricts_area(#[case] x: f64, #[case] y: f64, #[case] inside: bool) {
        let domain = MaskDomain::new(unit(), |p: &Coord<Ref>| p.x() >= 0.0);
        assert_eq!(domain.contains(&Coord::new(x, y)), inside);
        assert_eq!(domain.area_bounds(), unit());
    }

    #[rstest]
    #[case(0.0, 0.0, true)]
    #[case(2.0, 0.0, true)]
    #[case(1.5, 1.5, false)]
    fn disk_contains(#[case] x: f64, #[case] y: f64, #[case] inside: bool) {
        let disk = Disk::new(Coord::new(0.0, 0.0), 2.0).unwrap();
        assert_eq!(disk.contains(&Coord::new(x, y)), inside);
        assert!(disk.area_bounds().contains(Coord::<Ref>::new(x, y)) || !inside);
    }

    #[test]
    fn invalid_disk() {
        assert_eq!(Disk::new(Coord::new(0.0, 0.0), -1.0), None);
        assert_eq!(Disk::new(Coord::new(f64::NAN, 0.0), 1.0), None);
    }

    #[test]
    fn boxed_domain() {
        let domain: Box<dyn Domain> = Box::new(unit());
        assert!(domain.contains(&Coord::new(1.0, -1.0)));
        assert_eq!(domain.area_bounds(), unit());
    }
}
