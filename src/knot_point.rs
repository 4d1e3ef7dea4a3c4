//! Knot-point data block: state, input, time, and timestep for one stage.

use crate::error::LqrError;
use crate::linalg::{MatrixView, MatrixViewMut};

/// Number of `f64`s needed for one knot point's block: `x` (size `n`)
/// immediately followed by `u` (size `m`), then `t` and `h`.
pub fn knot_point_size(n: usize, m: usize) -> usize {
    n + m + 2
}

/// A single knot point: state `x`, input `u`, time `t`, timestep `h`.
///
/// `x` and `u` are adjacent in the slab so the pair can be treated as one
/// contiguous `(n+m)`-vector where a caller needs it (the forward pass
/// does not rely on this; it matches the stage-data adjacency convention).
pub struct KnotPoint<'a> {
    n: usize,
    m: usize,
    pub x: &'a mut [f64],
    pub u: &'a mut [f64],
    t: &'a mut [f64],
    h: &'a mut [f64],
}

impl<'a> KnotPoint<'a> {
    /// Splits `slab` (which must be exactly `knot_point_size(n, m)` long).
    pub fn from_slab(slab: &'a mut [f64], n: usize, m: usize) -> Self {
        debug_assert_eq!(slab.len(), knot_point_size(n, m));
        let (x, rest) = slab.split_at_mut(n);
        let (u, rest) = rest.split_at_mut(m);
        let (t, rest) = rest.split_at_mut(1);
        let (h, rest) = rest.split_at_mut(1);
        debug_assert!(rest.is_empty());
        Self { n, m, x, u, t, h }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn m(&self) -> usize {
        self.m
    }

    /// Validates `n, m >= 1` and `t, h >= 0`.
    pub fn validate(n: usize, m: usize, t: f64, h: f64) -> Result<(), LqrError> {
        if n < 1 || m < 1 {
            return Err(LqrError::NonPositiveDimension);
        }
        if t < 0.0 || h < 0.0 {
            return Err(LqrError::NegativeTime);
        }
        Ok(())
    }

    pub fn x(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, 1, self.x)
    }
    pub fn x_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, 1, self.x)
    }
    pub fn u(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, 1, self.u)
    }
    pub fn u_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, 1, self.u)
    }
    pub fn t(&self) -> f64 {
        self.t[0]
    }
    pub fn set_t(&mut self, value: f64) {
        self.t[0] = value;
    }
    pub fn h(&self) -> f64 {
        self.h[0]
    }
    pub fn set_h(&mut self, value: f64) {
        self.h[0] = value;
    }
}
