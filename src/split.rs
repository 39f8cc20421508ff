use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scalar decomposed into a whole number of steps and a residual fraction of one step.
///
/// The residual is always on the half-open interval `[0, 1)`, also for negative values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuantumFrac {
    floor: i64,
    residual: f64,
    delta: f64,
}

impl QuantumFrac {
    /// Creates a `QuantumFrac` sitting exactly on step `floor`.
    pub fn at_index(floor: i64, delta: f64) -> Self {
        Self {
            floor,
            residual: 0.0,
            delta,
        }
    }

    /// The number of whole steps, rounded towards negative infinity.
    pub fn floor(&self) -> i64 {
        self.floor
    }

    /// The remaining fraction of a step.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Reconstructs the original scalar.
    pub fn value(&self) -> f64 {
        (self.floor as f64 + self.residual) * self.delta
    }
}

/// Splits scalars into an index and a fraction for a fixed step size.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Splitter {
    delta: f64,
}

impl Splitter {
    /// Creates a new `Splitter` with step size `delta`.
    ///
    /// Returns an error if `delta` is not positive and finite.
    pub fn new(delta: f64) -> Result<Self> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(Error::InvalidStep { delta });
        }

        Ok(Self { delta })
    }

    /// A splitter with a NaN step, used by invalid geometries.
    pub(crate) fn invalid() -> Self {
        Self { delta: f64::NAN }
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Splits `value` such that `value == (floor + residual) * delta` with
    /// `0 <= residual < 1`.
    ///
    /// Uses floor semantics so the decomposition is continuous across zero,
    /// e.g. `-6.25` with a step of `5` yields `floor = -2` and `residual = 0.75`.
    pub fn split(&self, value: f64) -> QuantumFrac {
        debug_assert!(value.is_finite(), "cannot split non-finite value {value}");

        let steps = value / self.delta;
        let whole = steps.floor();
        let mut floor = whole as i64;
        let mut residual = steps - whole;

        // Tiny negative values round the residual up to exactly one.
        if residual >= 1.0 {
            floor += 1;
            residual = 0.0;
        }

        QuantumFrac {
            floor,
            residual,
            delta: self.delta,
        }
    }
}
