//! Moving-window patch matching.
//!
//! A template patch is slid over a larger search patch and scored at every offset
//! where it fits entirely, by the sum of squared differences (SSD). The best offset is
//! the lowest score, optionally refined to sub-pixel precision.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, Vector2};
use rayon::prelude::*;
use tracing::debug;

/// Computes the SSD response surface of `template` over `search`.
///
/// Entry `(r, c)` of the output is the SSD between `template` and the window of
/// `search` whose top-left corner is `(r, c)`. The output has shape
/// `(sr - tr + 1, sc - tc + 1)`.
///
/// Returns an error if either patch is empty or `template` does not fit in `search`.
pub fn ssd_surface(template: &DMatrix<f64>, search: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (tr, tc) = template.shape();
    let (sr, sc) = search.shape();

    if tr == 0 || tc == 0 || sr == 0 || sc == 0 {
        return Err(Error::EmptyPatch);
    }

    if tr > sr || tc > sc {
        return Err(Error::PatchTooLarge {
            template: (tr, tc),
            search: (sr, sc),
        });
    }

    Ok(DMatrix::from_fn(sr - tr + 1, sc - tc + 1, |r, c| {
        let mut sum = 0.0;
        for i in 0..tr {
            for j in 0..tc {
                let diff = search[(r + i, c + j)] - template[(i, j)];
                sum += diff * diff;
            }
        }
        sum
    }))
}

/// The lowest score on a response surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub row: usize,
    pub col: usize,
    pub score: f64,
}

impl Peak {
    /// Finds the smallest finite score of `surface`, the first in row-major order on
    /// ties.
    ///
    /// Returns `None` if `surface` holds no finite score.
    pub fn best(surface: &DMatrix<f64>) -> Option<Self> {
        let mut best: Option<Self> = None;
        for row in 0..surface.nrows() {
            for col in 0..surface.ncols() {
                let score = surface[(row, col)];
                if !score.is_finite() {
                    continue;
                }

                if best.is_none_or(|peak| score < peak.score) {
                    best = Some(Self { row, col, score });
                }
            }
        }

        best
    }

    /// Refines the peak location to sub-pixel precision.
    ///
    /// Fits a parabola through the peak and its two neighbours on each axis
    /// independently. An axis is left unrefined when the peak sits on its border or
    /// the fit has no minimum. Offsets are clamped to half a pixel.
    ///
    /// Returns `(row, col)`.
    pub fn refine(&self, surface: &DMatrix<f64>) -> Vector2<f64> {
        let (nrows, ncols) = surface.shape();
        let along = |index: usize, len: usize, at: &dyn Fn(usize) -> f64| {
            if index == 0 || index + 1 >= len {
                return index as f64;
            }

            let (prev, here, next) = (at(index - 1), at(index), at(index + 1));
            let curvature = prev - 2.0 * here + next;
            if !(curvature > 0.0) {
                return index as f64;
            }

            index as f64 + (0.5 * (prev - next) / curvature).clamp(-0.5, 0.5)
        };

        Vector2::new(
            along(self.row, nrows, &|row| surface[(row, self.col)]),
            along(self.col, ncols, &|col| surface[(self.row, col)]),
        )
    }
}

/// A single match job: find `template` inside `search`.
#[derive(Clone, Copy, Debug)]
pub struct MatchContext<'a> {
    pub template: &'a DMatrix<f64>,
    pub search: &'a DMatrix<f64>,
}

impl<'a> MatchContext<'a> {
    pub fn new(template: &'a DMatrix<f64>, search: &'a DMatrix<f64>) -> Self {
        Self { template, search }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub surface: DMatrix<f64>,
    pub peak: Option<Peak>,
}

pub fn match_one(context: &MatchContext<'_>) -> Result<MatchOutcome> {
    let surface = ssd_surface(context.template, context.search)?;
    let peak = Peak::best(&surface);
    Ok(MatchOutcome { surface, peak })
}

/// Runs every job in `contexts`, split into `groups` contiguous chunks that are
/// processed in parallel.
///
/// Outcomes are returned in the order of `contexts`. Fails with the first error any
/// job reports.
pub fn par_match(contexts: &[MatchContext<'_>], groups: usize) -> Result<Vec<MatchOutcome>> {
    if groups == 0 {
        return Err(Error::ZeroGroups);
    }

    if contexts.is_empty() {
        return Ok(Vec::new());
    }

    let chunk = contexts.len().div_ceil(groups);
    debug!(jobs = contexts.len(), groups, chunk, "running match jobs");

    let outcomes: Vec<Vec<MatchOutcome>> = contexts
        .par_chunks(chunk)
        .map(|jobs| jobs.iter().map(match_one).collect::<Result<Vec<_>>>())
        .collect::<Result<_>>()?;

    Ok(outcomes.into_iter().flatten().collect())
}
